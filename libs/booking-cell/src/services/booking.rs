// libs/booking-cell/src/services/booking.rs
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration};
use chrono_tz::Tz;
use rand::Rng;
use tracing::{debug, info};

use shared_calendar::{CalendarClient, EventDraft, EventTime};
use shared_config::{AppConfig, APPOINTMENT_DURATION_MINUTES};

use crate::models::{event_description, pending_summary};

pub struct AppointmentService {
    calendar: CalendarClient,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            calendar: CalendarClient::new(config),
        }
    }

    /// Create the tentative calendar event for one approval round and return
    /// the calendar-assigned event id. On error no event exists and the
    /// caller must not touch the pending store.
    pub async fn create_pending_appointment(
        &self,
        start: DateTime<Tz>,
        patient_name: &str,
        reason: &str,
        code: &str,
    ) -> Result<String> {
        info!("Creating pending event for {} with code {}", patient_name, code);

        let end = start + ChronoDuration::minutes(APPOINTMENT_DURATION_MINUTES);
        let draft = EventDraft {
            summary: pending_summary(code, patient_name),
            description: event_description(reason, code),
            start: EventTime::local(start),
            end: EventTime::local(end),
        };

        let event = self.calendar.insert_event(&draft).await?;
        debug!("Event {} created", event.id);
        Ok(event.id)
    }
}

/// Short code the approver types back: fixed prefix plus six random base-36
/// uppercase characters. Collisions are possible and unchecked.
pub fn generate_confirmation_code() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("T-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_codes_have_the_expected_shape() {
        for _ in 0..50 {
            let code = generate_confirmation_code();
            assert_eq!(code.len(), 8);
            assert!(code.starts_with("T-"));
            assert!(code[2..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
