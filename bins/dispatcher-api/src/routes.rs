use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::snapshot))
        .route("/push_list", post(handlers::push_list))
        .route("/next_test", get(handlers::next_test))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
}
