//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Request bodies larger than `max_body_bytes` are rejected with 413.
pub fn build(state: AppState, max_body_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/encrypt", post(handlers::encrypt))
        .route("/decrypt", post(handlers::decrypt))
        .route("/verify", post(handlers::verify))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found);

    middleware::apply(routes, max_body_bytes).with_state(state)
}
