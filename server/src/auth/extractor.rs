use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::tokens::TokenKind;
use crate::state::AppState;
use crate::utils::AppError;

/// Requester identity resolved from `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Like [`AuthUser`] for endpoints that also serve anonymous callers.
/// A token that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid authorization header.".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(AppError::AuthError(
            "Invalid authorization header. Expected 'Bearer <token>'.".to_string(),
        )),
    }
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };

    let claims = state.tokens.verify(token, TokenKind::Access)?;

    // The account may have been removed since the token was issued.
    let user = state
        .registry
        .users()
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthError("User not found.".to_string()))?;

    Ok(Some(AuthUser {
        id: user.id,
        username: user.username,
    }))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.ok_or_else(|| {
            AppError::AuthError("Authentication credentials were not provided.".to_string())
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(resolve(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(bearer_token(&parts(None)).unwrap(), None);
    }

    #[test]
    fn test_bearer_scheme_parsed() {
        let p = parts(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&p).unwrap(), Some("abc.def.ghi"));

        let p = parts(Some("bearer xyz"));
        assert_eq!(bearer_token(&p).unwrap(), Some("xyz"));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(bearer_token(&parts(Some("Basic dXNlcjpwdw=="))).is_err());
        assert!(bearer_token(&parts(Some("Bearer "))).is_err());
    }
}
