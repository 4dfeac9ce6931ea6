use axum::extract::State;
use axum::response::Response;
use garde::Validate;
use serde::Serialize;

use crate::auth::password::{hash_password, verify_password};
use crate::models::user::{
    LoginRequest, RefreshRequest, RegisterRequest, UserSummary, ValidRegistration,
};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::{ApiJson, AppError, AppResult};

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Serialize)]
struct AccessToken {
    access: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<Response> {
    req.validate(&())?;
    let registration = ValidRegistration::from(req);
    let password = registration.password.clone();
    let password_hash = hash_password(password).await?;

    let user = state
        .registry
        .users()
        .create(registration.into_new_user(password_hash))
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::field("username", "A user with that username already exists.")
            }
            other => other,
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(created(
        UserSummary::from(user),
        "User registered successfully. Please login to get your token.",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let credentials = state
        .registry
        .users()
        .find_credentials(&req.username)
        .await?
        .ok_or_else(|| AppError::AuthError(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(req.password, credentials.password_hash).await? {
        return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
    }

    let tokens = state
        .tokens
        .issue_pair(credentials.id, &credentials.username)?;
    tracing::info!(user_id = %credentials.id, "User logged in");

    Ok(success(tokens, "Login successful"))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> AppResult<Response> {
    let access = state.tokens.refresh(&req.refresh)?;
    Ok(success(AccessToken { access }, "Token refreshed"))
}
