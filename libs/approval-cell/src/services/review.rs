// libs/approval-cell/src/services/review.rs
use anyhow::Result;
use tracing::{error, info, warn};

use booking_cell::models::{confirmed_summary, pending_marker, CONFIRMED_MARKER};
use shared_calendar::CalendarClient;
use shared_config::AppConfig;
use shared_messaging::MessagingClient;
use shared_store::{PendingRecord, PendingStore};

use crate::models::{ReplyAction, ReplyOutcome};

pub struct ReplyReviewService<'a> {
    calendar: CalendarClient,
    messaging: MessagingClient,
    store: &'a PendingStore,
    approver: String,
}

impl<'a> ReplyReviewService<'a> {
    pub fn new(config: &AppConfig, store: &'a PendingStore) -> Self {
        Self {
            calendar: CalendarClient::new(config),
            messaging: MessagingClient::new(config),
            store,
            approver: config.doctor_whatsapp_number.clone(),
        }
    }

    /// Resolve one inbound reply. Every failure path is handled here; the
    /// webhook acknowledges the transport no matter what happened.
    pub async fn process_reply(&self, from: &str, body: &str) -> ReplyOutcome {
        if from != self.approver {
            info!("Ignoring message from {}: not the configured approver", from);
            return ReplyOutcome::IgnoredSender;
        }

        let normalized = body.trim().to_uppercase();
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.len() != 2 {
            warn!("Reply does not match the ACTION CODE format: {:?}", body);
            return ReplyOutcome::Malformed;
        }

        let Some(action) = ReplyAction::parse(tokens[0]) else {
            warn!("Unrecognized action keyword: {:?}", tokens[0]);
            return ReplyOutcome::Malformed;
        };
        let code = tokens[1];

        let Some(record) = self.store.get(code).await else {
            info!("No pending appointment found for code {}", code);
            self.notify(&format!(
                "No se encontró un turno pendiente con el ID {code}. \
                 Puede que ya haya sido procesado o que el ID sea incorrecto."
            ))
            .await;
            return ReplyOutcome::UnknownCode;
        };

        let result = match action {
            ReplyAction::Confirm => self.confirm(code, &record).await,
            ReplyAction::Reject => self.reject(code, &record).await,
        };

        match result {
            Ok(outcome) => {
                if let Err(e) = self.store.remove(code).await {
                    error!("Could not drop code {} from the pending store: {:#}", code, e);
                }
                outcome
            }
            Err(e) => {
                // The code stays in the store so a later reply can still
                // resolve it.
                error!("Processing the reply for {} failed: {:#}", code, e);
                self.notify(&format!(
                    "Hubo un error al procesar el turno {code}. \
                     Es posible que ya haya sido eliminado."
                ))
                .await;
                ReplyOutcome::Failed
            }
        }
    }

    async fn confirm(&self, code: &str, record: &PendingRecord) -> Result<ReplyOutcome> {
        let event = self.calendar.get_event(&record.event_id).await?;

        let marker = pending_marker(code);
        let summary = if event.summary.contains(&marker) {
            event.summary.replace(&marker, CONFIRMED_MARKER)
        } else {
            // The calendar UI rewrote the title; rebuild it from the stored
            // record instead of matching text.
            confirmed_summary(&record.patient_name)
        };

        self.calendar
            .patch_event_summary(&record.event_id, &summary)
            .await?;
        info!("Appointment {} confirmed", code);
        Ok(ReplyOutcome::Confirmed)
    }

    async fn reject(&self, code: &str, record: &PendingRecord) -> Result<ReplyOutcome> {
        self.calendar.delete_event(&record.event_id).await?;
        info!("Appointment {} rejected and removed from the calendar", code);
        self.notify(&format!(
            "El turno {code} fue rechazado y eliminado del calendario."
        ))
        .await;
        Ok(ReplyOutcome::Rejected)
    }

    async fn notify(&self, body: &str) {
        if let Err(e) = self.messaging.send_message(&self.approver, body).await {
            warn!("Could not message the approver: {:#}", e);
        }
    }
}
