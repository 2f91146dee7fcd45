// libs/approval-cell/src/models.rs
use serde::Deserialize;

/// Inbound reply posted by the messaging transport.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
}

pub const CONFIRM_KEYWORD: &str = "CONFIRMAR";
pub const REJECT_KEYWORD: &str = "RECHAZAR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAction {
    Confirm,
    Reject,
}

impl ReplyAction {
    /// The token has already been uppercased by the caller.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            CONFIRM_KEYWORD => Some(Self::Confirm),
            REJECT_KEYWORD => Some(Self::Reject),
            _ => None,
        }
    }
}

/// How one inbound reply was resolved. The webhook acknowledges the
/// transport either way; this exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    IgnoredSender,
    Malformed,
    UnknownCode,
    Confirmed,
    Rejected,
    Failed,
}
