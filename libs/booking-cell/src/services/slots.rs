// libs/booking-cell/src/services/slots.rs
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use shared_calendar::{CalendarClient, CalendarEvent, CLINIC_TZ};
use shared_config::AppConfig;

use crate::models::TimePreference;

pub struct SlotFinderService {
    calendar: CalendarClient,
}

impl SlotFinderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            calendar: CalendarClient::new(config),
        }
    }

    /// Free start times for `date` within the preferred working window, as
    /// ascending clinic-local HH:MM strings. An unreachable calendar
    /// degrades to an empty list; the conversation layer phrases that as
    /// "no slots available".
    pub async fn find_free_slots(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
        preference: TimePreference,
    ) -> Vec<String> {
        let (start_hour, end_hour) = preference.window_hours();
        let Some(window_start) = local_datetime(date, start_hour) else {
            warn!("Could not build a local timestamp for {} at {}:00", date, start_hour);
            return Vec::new();
        };
        let Some(window_end) = local_datetime(date, end_hour) else {
            warn!("Could not build a local timestamp for {} at {}:00", date, end_hour);
            return Vec::new();
        };

        debug!(
            "Searching {}-minute slots on {} between {} and {}",
            duration_minutes, date, window_start, window_end
        );

        let busy = match self
            .calendar
            .list_events(window_start.with_timezone(&Utc), window_end.with_timezone(&Utc))
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!("Could not fetch calendar events: {:#}", e);
                return Vec::new();
            }
        };

        let mut slots = Vec::new();
        let mut cursor = window_start;
        while cursor < window_end {
            if is_available(cursor, duration_minutes, &busy) {
                slots.push(cursor.format("%H:%M").to_string());
            }
            cursor += ChronoDuration::minutes(duration_minutes);
        }

        debug!("Free slots found: {:?}", slots);
        slots
    }
}

fn local_datetime(date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    CLINIC_TZ
        .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, 0, 0)
        .single()
}

fn is_available(slot_start: DateTime<Tz>, duration_minutes: i64, busy: &[CalendarEvent]) -> bool {
    let slot_end = slot_start + ChronoDuration::minutes(duration_minutes);
    busy.iter().all(|event| {
        match (event.start.date_time, event.end.date_time) {
            (Some(event_start), Some(event_end)) => {
                // Half-open intervals: touching boundaries do not collide.
                !(slot_start < event_end && slot_end > event_start)
            }
            // An event without explicit timestamps (all-day or malformed)
            // blocks the whole window.
            _ => false,
        }
    })
}
