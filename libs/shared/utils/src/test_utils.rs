use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::AppState;

/// Knobs the cell tests actually vary: where the mock collaborators listen
/// and where the pending file lives.
pub struct TestConfig {
    pub calendar_base_url: String,
    pub twilio_base_url: String,
    pub pending_file_path: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            calendar_base_url: "http://localhost:8089".to_string(),
            twilio_base_url: "http://localhost:8090".to_string(),
            pending_file_path: "./pending-test.json".to_string(),
        }
    }
}

impl TestConfig {
    pub const CALENDAR_ID: &'static str = "clinic-calendar";
    pub const ACCOUNT_SID: &'static str = "ACtest";
    pub const DOCTOR_NUMBER: &'static str = "whatsapp:+5491133334444";

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            calendar_base_url: self.calendar_base_url.clone(),
            calendar_id: Self::CALENDAR_ID.to_string(),
            calendar_api_token: "test-calendar-token".to_string(),
            twilio_base_url: self.twilio_base_url.clone(),
            twilio_account_sid: Self::ACCOUNT_SID.to_string(),
            twilio_auth_token: "test-auth-token".to_string(),
            twilio_whatsapp_number: "whatsapp:+14155238886".to_string(),
            doctor_whatsapp_number: Self::DOCTOR_NUMBER.to_string(),
            pending_file_path: self.pending_file_path.clone(),
            port: 3000,
        }
    }

    pub fn to_app_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}
