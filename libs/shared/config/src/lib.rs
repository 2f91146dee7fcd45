use std::env;
use std::time::Duration;

use tracing::warn;

/// Appointments are always booked in fixed-length blocks.
pub const APPOINTMENT_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub calendar_base_url: String,
    pub calendar_id: String,
    pub calendar_api_token: String,
    pub twilio_base_url: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,
    pub doctor_whatsapp_number: String,
    pub pending_file_path: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            calendar_base_url: env::var("CALENDAR_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            calendar_id: env::var("CALENDAR_ID")
                .unwrap_or_else(|_| {
                    warn!("CALENDAR_ID not set, using empty value");
                    String::new()
                }),
            calendar_api_token: env::var("CALENDAR_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("CALENDAR_API_TOKEN not set, using empty value");
                    String::new()
                }),
            twilio_base_url: env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_ACCOUNT_SID not set, using empty value");
                    String::new()
                }),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_AUTH_TOKEN not set, using empty value");
                    String::new()
                }),
            twilio_whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| "whatsapp:+14155238886".to_string()),
            doctor_whatsapp_number: env::var("DOCTOR_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| {
                    warn!("DOCTOR_WHATSAPP_NUMBER not set, using empty value");
                    String::new()
                }),
            pending_file_path: env::var("PENDING_FILE_PATH")
                .unwrap_or_else(|_| "./pending.json".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.is_calendar_configured() && self.is_messaging_configured()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.calendar_id.is_empty() && !self.calendar_api_token.is_empty()
    }

    pub fn is_messaging_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.doctor_whatsapp_number.is_empty()
    }
}

/// How a collaborator client behaves when a call fails. The default mirrors
/// the historical behavior: one attempt, no retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            request_timeout: Duration::from_secs(30),
        }
    }
}
