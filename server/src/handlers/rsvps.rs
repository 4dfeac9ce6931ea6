use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{CreateRsvpRequest, Rsvp, UpdateRsvpRequest};
use crate::permissions::{self, Access};
use crate::repository::Upsert;
use crate::state::AppState;
use crate::utils::response::{created, empty_success, success, Pagination};
use crate::utils::{ApiJson, ApiQuery, AppError, AppResult};

/// RSVPs are scoped to their author for reads and writes alike; anyone
/// else's is reported as missing rather than forbidden.
async fn load_own_rsvp(state: &AppState, id: Uuid, user: &AuthUser) -> AppResult<Rsvp> {
    state
        .registry
        .rsvps()
        .find_by_id(id)
        .await?
        .filter(|rsvp| permissions::owner_write_only(Access::Write, rsvp, Some(user.id)))
        .ok_or_else(|| AppError::NotFound("RSVP not found.".to_string()))
}

pub async fn list_rsvps(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> AppResult<Response> {
    let page = state
        .registry
        .rsvps()
        .list_for_user(user.id, pagination)
        .await?;

    Ok(success(page, "RSVPs retrieved successfully"))
}

/// Creates the requester's RSVP, or updates its status when one exists.
pub async fn create_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateRsvpRequest>,
) -> AppResult<Response> {
    let event = state
        .registry
        .events()
        .find_by_id(req.event)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    permissions::ensure_rsvp_eligible(&event, user.id)?;

    match state
        .registry
        .rsvps()
        .upsert(event.id, user.id, req.status)
        .await?
    {
        Upsert::Created(rsvp) => {
            tracing::info!(rsvp_id = %rsvp.id, event_id = %event.id, "RSVP created");
            Ok(created(rsvp, "RSVP created successfully"))
        }
        Upsert::Updated(rsvp) => {
            tracing::info!(rsvp_id = %rsvp.id, event_id = %event.id, "RSVP updated");
            Ok(success(rsvp, "RSVP updated successfully"))
        }
    }
}

pub async fn get_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let rsvp = load_own_rsvp(&state, id, &user).await?;
    Ok(success(rsvp, "RSVP retrieved successfully"))
}

async fn update_rsvp(
    state: AppState,
    user: AuthUser,
    id: Uuid,
    req: UpdateRsvpRequest,
    partial: bool,
) -> AppResult<Response> {
    let rsvp = load_own_rsvp(&state, id, &user).await?;

    let status = req.resolve(rsvp.status, partial)?;
    let rsvp = state.registry.rsvps().update_status(id, status).await?;

    Ok(success(rsvp, "RSVP updated successfully"))
}

pub async fn replace_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateRsvpRequest>,
) -> AppResult<Response> {
    update_rsvp(state, user, id, req, false).await
}

pub async fn patch_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateRsvpRequest>,
) -> AppResult<Response> {
    update_rsvp(state, user, id, req, true).await
}

pub async fn delete_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    load_own_rsvp(&state, id, &user).await?;

    state.registry.rsvps().delete(id).await?;
    Ok(empty_success("RSVP deleted successfully"))
}
