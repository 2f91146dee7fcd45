use std::sync::Arc;

use axum::{routing::get, Router};

use approval_cell::router::approval_routes;
use booking_cell::router::booking_routes;
use shared_store::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Turnero API is running!" }))
        .merge(booking_routes(state.clone()))
        .merge(approval_routes(state))
}
