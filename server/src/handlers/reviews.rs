use axum::extract::{Path, State};
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::models::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::permissions;
use crate::state::AppState;
use crate::utils::response::{created, empty_success, success, Pagination};
use crate::utils::{ApiJson, ApiQuery, AppError, AppResult};

const ALREADY_REVIEWED: &str = "You have already reviewed this event. Use PUT/PATCH to update.";

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub event: Option<Uuid>,
}

async fn load_review(state: &AppState, id: Uuid) -> AppResult<Review> {
    state
        .registry
        .reviews()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    _viewer: MaybeAuthUser,
    ApiQuery(query): ApiQuery<ReviewQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> AppResult<Response> {
    let page = state
        .registry
        .reviews()
        .list(query.event, pagination)
        .await?;

    Ok(success(page, "Reviews retrieved successfully"))
}

/// Creates the requester's review; a second review of the same event is refused.
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> AppResult<Response> {
    let (event_id, values) = req.into_values()?;
    let event = state
        .registry
        .events()
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    let review = state
        .registry
        .reviews()
        .create_if_absent(event.id, user.id, values)
        .await?
        .ok_or_else(|| AppError::ValidationError(ALREADY_REVIEWED.to_string()))?;

    tracing::info!(review_id = %review.id, event_id = %event.id, rating = review.rating, "Review created");
    Ok(created(review, "Review created successfully"))
}

pub async fn get_review(
    State(state): State<AppState>,
    _viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let review = load_review(&state, id).await?;
    Ok(success(review, "Review retrieved successfully"))
}

async fn update_review(
    state: AppState,
    user: AuthUser,
    id: Uuid,
    req: UpdateReviewRequest,
    partial: bool,
) -> AppResult<Response> {
    let review = load_review(&state, id).await?;
    permissions::ensure_owner(&review, user.id)?;

    let values = req.merge(&review, partial)?;
    let review = state.registry.reviews().update(id, values).await?;

    Ok(success(review, "Review updated successfully"))
}

pub async fn replace_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> AppResult<Response> {
    update_review(state, user, id, req, false).await
}

pub async fn patch_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> AppResult<Response> {
    update_review(state, user, id, req, true).await
}

pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let review = load_review(&state, id).await?;
    permissions::ensure_owner(&review, user.id)?;

    state.registry.reviews().delete(id).await?;
    Ok(empty_success("Review deleted successfully"))
}
