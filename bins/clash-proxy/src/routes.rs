use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submissions", post(handlers::create_submission))
        .route("/submissions/:token", get(handlers::get_submission))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::export_metrics))
}
