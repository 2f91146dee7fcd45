// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_store::AppState;

use crate::handlers;

pub fn booking_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handlers::dialogflow_webhook))
        .with_state(state)
}
