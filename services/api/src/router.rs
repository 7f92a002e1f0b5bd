//! Axum Router Configuration

use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    Router::new()
        .route("/", get(handlers::health))
        .route("/process_text", post(handlers::process_text))
        .route("/reset", post(handlers::reset))
        .route("/inspect", get(handlers::inspect))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(app_state)
}
