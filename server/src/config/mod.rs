use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/eventhub";
const DEFAULT_JWT_SECRET: &str = "insecure-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be set in production")]
    MissingSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub storage: StorageBackend,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub allowed_origins: String,
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            storage: StorageBackend::Postgres,
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3001,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 86_400,
            allowed_origins: cors::DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if production => return Err(ConfigError::MissingSecret),
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            storage: parse_var("STORAGE_BACKEND", defaults.storage)?,
            host: parse_var("SERVER_HOST", defaults.host)?,
            port: parse_var("SERVER_PORT", defaults.port)?,
            jwt_secret,
            access_token_ttl_secs: parse_var(
                "ACCESS_TOKEN_TTL_SECS",
                defaults.access_token_ttl_secs,
            )?,
            refresh_token_ttl_secs: parse_var(
                "REFRESH_TOKEN_TTL_SECS",
                defaults.refresh_token_ttl_secs,
            )?,
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS").unwrap_or(defaults.allowed_origins),
            production,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("postgres".parse(), Ok(StorageBackend::Postgres));
        assert_eq!("MEMORY".parse(), Ok(StorageBackend::Memory));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("EVENTHUB_TEST_PORT", "not-a-port");
        let result: Result<u16, _> = parse_var("EVENTHUB_TEST_PORT", 3001);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        std::env::remove_var("EVENTHUB_TEST_PORT");
    }

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        std::env::remove_var("EVENTHUB_TEST_UNSET");
        let result: Result<u32, _> = parse_var("EVENTHUB_TEST_UNSET", 7);
        assert_eq!(result.ok(), Some(7));
    }
}
