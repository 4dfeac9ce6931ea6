use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{AppError, AppResult};

const INVALID_TOKEN: &str = "Given token not valid for any token type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies HS256 access / refresh tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    fn issue(&self, user_id: Uuid, username: &str, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type: kind,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("token signing failed: {e}")))
    }

    pub fn issue_pair(&self, user_id: Uuid, username: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user_id, username, TokenKind::Access)?,
            refresh: self.issue(user_id, username, TokenKind::Refresh)?,
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AppError::AuthError(INVALID_TOKEN.to_string())
        })?;

        if data.claims.token_type != expected {
            return Err(AppError::AuthError(INVALID_TOKEN.to_string()));
        }
        Ok(data.claims)
    }

    /// Exchanges a valid refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.verify(refresh_token, TokenKind::Refresh)?;
        self.issue(claims.sub, &claims.username, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret", 300, 3600)
    }

    #[test]
    fn test_access_token_verifies() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let pair = svc.issue_pair(user_id, "alice").unwrap();

        let claims = svc.verify(&pair.access, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let svc = service();
        let pair = svc.issue_pair(Uuid::new_v4(), "alice").unwrap();

        assert!(svc.verify(&pair.refresh, TokenKind::Access).is_err());
        assert!(svc.verify(&pair.access, TokenKind::Refresh).is_err());
        assert!(svc.refresh(&pair.access).is_err());
        assert!(svc.refresh(&pair.refresh).is_ok());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let pair = service().issue_pair(Uuid::new_v4(), "alice").unwrap();
        let other = TokenService::new(b"another-secret", 300, 3600);
        assert!(matches!(
            other.verify(&pair.access, TokenKind::Access),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // beyond the default 60s leeway
        let svc = TokenService::new(b"test-secret", -120, -120);
        let pair = svc.issue_pair(Uuid::new_v4(), "alice").unwrap();
        assert!(svc.verify(&pair.access, TokenKind::Access).is_err());
    }
}
