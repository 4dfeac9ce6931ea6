//! Event endpoints:
//! - GET /api/events - List visible events with filters, search and ordering
//! - POST /api/events - Create an event (requester becomes organizer)
//! - GET /api/events/:id - Event details, private events for their organizer only
//! - PUT/PATCH /api/events/:id - Update (organizer only)
//! - DELETE /api/events/:id - Delete (organizer only)
//! - GET /api/events/:id/rsvps and /api/events/:id/reviews

use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::filters::EventFilter;
use crate::models::{Event, EventPatch, EventRequest};
use crate::permissions;
use crate::state::AppState;
use crate::utils::response::{created, empty_success, success, Pagination};
use crate::utils::{ApiJson, ApiQuery, AppError, AppResult};

async fn load_event(state: &AppState, id: Uuid) -> AppResult<Event> {
    state
        .registry
        .events()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))
}

pub async fn list_events(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiQuery(filter): ApiQuery<EventFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> AppResult<Response> {
    let page = state
        .registry
        .events()
        .list(viewer.id(), &filter, pagination)
        .await?;

    Ok(success(page, "Events retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<EventRequest>,
) -> AppResult<Response> {
    let values = req.into_values()?;
    let event = state.registry.events().create(user.id, values).await?;

    tracing::info!(event_id = %event.id, organizer_id = %user.id, "Event created");
    Ok(created(event, "Event created successfully"))
}

pub async fn get_event(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_can_view(&event, viewer.id())?;

    Ok(success(event, "Event retrieved successfully"))
}

pub async fn replace_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<EventRequest>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_organizer(&event, user.id)?;

    let values = req.into_values()?;
    let event = state.registry.events().update(id, values).await?;

    tracing::info!(event_id = %id, "Event replaced");
    Ok(success(event, "Event updated successfully"))
}

pub async fn patch_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<EventPatch>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_organizer(&event, user.id)?;

    let values = patch.merge(&event)?;
    let event = state.registry.events().update(id, values).await?;

    tracing::info!(event_id = %id, "Event updated");
    Ok(success(event, "Event updated successfully"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_organizer(&event, user.id)?;

    state.registry.events().delete(id).await?;

    tracing::info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted successfully"))
}

pub async fn event_rsvps(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_can_view(&event, viewer.id())?;

    let rsvps = state.registry.rsvps().list_for_event(event.id).await?;
    Ok(success(rsvps, "RSVPs retrieved successfully"))
}

pub async fn event_reviews(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let event = load_event(&state, id).await?;
    permissions::ensure_can_view(&event, viewer.id())?;

    let reviews = state.registry.reviews().list_for_event(event.id).await?;
    Ok(success(reviews, "Reviews retrieved successfully"))
}
