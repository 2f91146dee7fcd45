// libs/approval-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_store::AppState;

use crate::handlers;

pub fn approval_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/twilio-reply", post(handlers::twilio_reply))
        .with_state(state)
}
