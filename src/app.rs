use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/setup", post(handlers::setup_form))
        .route("/refresh", post(handlers::refresh_form))
        .route("/reconfigure", post(handlers::reconfigure_form))
        .route("/health", get(handlers::health))
        .route("/api/state", get(handlers::get_state))
        .route("/api/configure", post(handlers::configure))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/reconfigure", post(handlers::reconfigure))
        .with_state(state)
}
