pub mod health;
pub mod news;
pub mod service;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sync with the agent service
        .route("/api/service/fetch_news", post(service::handle_fetch_news))
        .route("/api/service/fetch_status", get(service::handle_fetch_status))
        // Stored records
        .route("/api/news", get(news::handle_list_news))
        .route("/api/history", get(news::handle_history))
        .with_state(state)
}
