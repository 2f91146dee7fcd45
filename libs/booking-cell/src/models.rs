// libs/booking-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ==============================================================================
// CONVERSATION WEBHOOK MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub query_result: QueryResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub intent: Intent,
    #[serde(default)]
    pub output_contexts: Vec<OutputContext>,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub display_name: String,
}

/// Conversation context carried between turns. Parameters stay untyped: the
/// upstream platform mixes plain strings, `{ "name": ... }` objects and
/// `<field>.original` fallback keys in the same map.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_messages: Option<Value>,
}

impl WebhookResponse {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            fulfillment_text: message.into(),
            fulfillment_messages: None,
        }
    }

    /// Reply with suggestion chips attached, in the shape the conversation
    /// platform renders as tappable buttons.
    pub fn with_suggestions(message: impl Into<String>, titles: Vec<String>) -> Self {
        let suggestions: Vec<Value> = titles.into_iter().map(|t| json!({ "title": t })).collect();
        Self {
            fulfillment_text: message.into(),
            fulfillment_messages: Some(json!([
                {
                    "platform": "ACTIONS_ON_GOOGLE",
                    "suggestions": { "suggestions": suggestions }
                }
            ])),
        }
    }
}

// ==============================================================================
// SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePreference {
    Manana,
    Tarde,
}

impl TimePreference {
    /// "mañana" (with or without the eñe) selects the morning window; any
    /// other value the platform hands over falls through to the afternoon.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "mañana" | "manana" => TimePreference::Manana,
            _ => TimePreference::Tarde,
        }
    }

    /// Start and end hour of the working window, clinic-local.
    pub fn window_hours(&self) -> (u32, u32) {
        match self {
            TimePreference::Manana => (9, 13),
            TimePreference::Tarde => (14, 19),
        }
    }
}

// ==============================================================================
// EVENT TITLE MARKERS
// ==============================================================================

pub const CONFIRMED_MARKER: &str = "Turno Confirmado ✅";

/// Marker embedded in a tentative event's title. The approval flow replaces
/// it once the doctor confirms.
pub fn pending_marker(code: &str) -> String {
    format!("(PENDIENTE-{code})")
}

pub fn pending_summary(code: &str, patient_name: &str) -> String {
    format!("{} Turno para {}", pending_marker(code), patient_name)
}

pub fn confirmed_summary(patient_name: &str) -> String {
    format!("{CONFIRMED_MARKER} Turno para {patient_name}")
}

/// The code is kept in the description as well as the title, so either field
/// surviving a calendar UI edit is enough to trace the appointment.
pub fn event_description(reason: &str, code: &str) -> String {
    format!("Motivo: {reason}\nID de Turno: {code}")
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("conversation context is missing")]
    MissingContext,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid date or time: {0}")]
    InvalidDateTime(String),

    #[error("calendar error: {0}")]
    Calendar(#[from] anyhow::Error),
}
