use axum::extract::State;
use axum::response::Response;
use garde::Validate;

use crate::auth::AuthUser;
use crate::models::ProfileChanges;
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{ApiJson, AppError, AppResult};

pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    let profile = state
        .registry
        .users()
        .find_profile(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found.".to_string()))?;

    Ok(success(profile, "Profile retrieved successfully"))
}

/// Serves both PUT and PATCH; every profile field is optional.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> AppResult<Response> {
    changes.validate(&())?;
    let profile = state
        .registry
        .users()
        .update_profile(user.id, changes)
        .await?;

    Ok(success(profile, "Profile updated successfully"))
}
