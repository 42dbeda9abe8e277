//! HTTP surface: routing, handlers, error rendering and rate limiting.

pub mod auth;
pub mod error;
pub mod extract;
pub mod media;
pub mod notes;
pub mod rate_limit;
pub mod state;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

pub use error::ApiError;
pub use extract::AuthUser;
pub use rate_limit::RateLimiter;
pub use state::AppState;

/// Build the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    let production = state.config.server.production;
    let limiter = state.rate_limiter.clone();

    let router = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/media", get(media::list_media).post(media::upload_media))
        .route(
            "/media/{id}",
            get(media::get_media).delete(media::delete_media),
        )
        .route("/media/{id}/meta", get(media::get_media_meta))
        .route("/ws", get(ws::ws_upgrade))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let router = if production {
        router
    } else {
        router.layer(axum::middleware::map_response(error::attach_error_detail))
    };

    router.layer(axum::middleware::from_fn_with_state(
        limiter,
        rate_limit::rate_limit,
    ))
}
