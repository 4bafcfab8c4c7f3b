//! Assembles the Axum [`Router`].
//!
//! The node has no fixed routes: every path is a resource IRI, so the whole
//! surface is a single fallback handler.

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{dispatch, AppState};

/// Build the complete application router with shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
