// libs/approval-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form};
use tracing::debug;

use shared_store::AppState;

use crate::models::InboundMessage;
use crate::services::review::ReplyReviewService;

/// The transport gets an empty 204 regardless of what the reply contained;
/// everything else is resolved (and logged) internally.
#[axum::debug_handler]
pub async fn twilio_reply(
    State(state): State<Arc<AppState>>,
    Form(message): Form<InboundMessage>,
) -> StatusCode {
    debug!("Reply received from {}", message.from);

    let service = ReplyReviewService::new(&state.config, &state.pending);
    let outcome = service.process_reply(&message.from, &message.body).await;
    debug!("Reply handled: {:?}", outcome);

    StatusCode::NO_CONTENT
}
