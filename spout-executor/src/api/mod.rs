use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use crate::ApiContextRef;

mod invoke;

/// Single-endpoint router: every path and method lands on the invoke handler,
/// which rejects anything but POST.
pub fn router() -> Router<ApiContextRef> {
    Router::new()
        .fallback(invoke::invoke)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::ERROR)))
}
