use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/refresh", post(handlers::refresh_form))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/issues", get(handlers::get_issues))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/status", get(handlers::get_status))
        .route("/api/token", post(handlers::save_token))
        .route("/api/tasks/:number/complete", post(handlers::complete_task))
        .route("/api/tasks/:number/claim", post(handlers::claim_task))
        .route("/api/memories/:id", get(handlers::get_memory))
        .route("/api/projects/items", post(handlers::add_project_item))
        .with_state(state)
}
