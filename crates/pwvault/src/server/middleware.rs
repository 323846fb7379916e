//! Shared middleware stack for the router.

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap `router` in body limiting, request tracing, timeouts and compression.
///
/// Bodies over `max_body_bytes` are refused with 413 before any handler runs.
pub fn apply<S>(router: Router<S>, max_body_bytes: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
}
