use axum::response::Response;
use serde::Serialize;
use serde_json::json;

use crate::utils::response::success;

pub mod auth;
pub mod events;
pub mod profile;
pub mod reviews;
pub mod rsvps;

const API_VERSION: &str = "1.0";

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventhub-api",
    };

    success(payload, "Health check successful")
}

pub async fn api_root() -> Response {
    let payload = json!({
        "version": API_VERSION,
        "endpoints": {
            "authentication": {
                "register": "/api/auth/register",
                "login": "/api/auth/login",
                "refresh_token": "/api/auth/token/refresh",
                "profile": "/api/profile",
            },
            "events": {
                "list_create": "/api/events",
                "detail": "/api/events/{id}",
                "rsvps": "/api/events/{id}/rsvps",
                "reviews": "/api/events/{id}/reviews",
                "search": "/api/events?search=keyword",
                "filter": "/api/events?location=New York",
            },
            "rsvps": {
                "list_create": "/api/rsvps",
                "detail": "/api/rsvps/{id}",
            },
            "reviews": {
                "list_create": "/api/reviews",
                "detail": "/api/reviews/{id}",
                "filter_by_event": "/api/reviews?event={event_id}",
            },
        },
        "features": [
            "JWT Authentication",
            "Event Management (CRUD)",
            "RSVP System",
            "Review System",
            "Public/Private Events",
            "Search & Filtering",
            "Pagination",
        ],
    });

    success(payload, "Welcome to the Event Management API")
}
