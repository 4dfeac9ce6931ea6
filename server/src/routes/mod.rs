use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, Config};
use crate::handlers::{api_root, auth, events, health_check, profile, reviews, rsvps};
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh_token))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::replace_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route("/:id/rsvps", get(events::event_rsvps))
        .route("/:id/reviews", get(events::event_reviews))
}

fn rsvp_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rsvps::list_rsvps).post(rsvps::create_rsvp))
        .route(
            "/:id",
            get(rsvps::get_rsvp)
                .put(rsvps::replace_rsvp)
                .patch(rsvps::patch_rsvp)
                .delete(rsvps::delete_rsvp),
        )
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/:id",
            get(reviews::get_review)
                .put(reviews::replace_review)
                .patch(reviews::patch_review)
                .delete(reviews::delete_review),
        )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/auth", auth_routes())
        .route(
            "/profile",
            get(profile::get_profile)
                .put(profile::update_profile)
                .patch(profile::update_profile),
        )
        .nest("/events", event_routes())
        .nest("/rsvps", rsvp_routes())
        .nest("/reviews", review_routes())
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state);

    apply_security_headers(router, config.production)
        .layer(create_cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
