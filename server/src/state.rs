use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::repository::AppRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: AppRegistry,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(registry: AppRegistry, config: &Config) -> Self {
        Self {
            registry,
            tokens: Arc::new(TokenService::new(
                config.jwt_secret.as_bytes(),
                config.access_token_ttl_secs,
                config.refresh_token_ttl_secs,
            )),
        }
    }
}
