pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::profile::handlers as intake;
use crate::render::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CV composition
        .route("/api/v1/cv", post(handlers::handle_compose))
        .route("/api/v1/cv/intake", post(intake::handle_intake))
        .route("/api/v1/cv/preview/levels", post(handlers::handle_levels))
        .route("/api/v1/cv/:format", post(handlers::handle_download))
        .with_state(state)
}
