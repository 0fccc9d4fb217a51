pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analyst::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/process-analysis",
            post(handlers::handle_analyze),
        )
        .route(
            "/api/v1/process-suggestions",
            get(handlers::handle_list_suggestions),
        )
        .with_state(state)
}
