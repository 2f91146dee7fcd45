use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Fixed clinic timezone. Working windows, event times and every formatted
/// date or hour shown to humans are local to it.
pub const CLINIC_TZ: Tz = chrono_tz::America::Argentina::Buenos_Aires;

/// Start or end of a calendar event. Timed events carry `dateTime`; all-day
/// events carry only `date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed boundary in the clinic timezone.
    pub fn local(instant: DateTime<Tz>) -> Self {
        Self {
            date_time: Some(instant.fixed_offset()),
            date: None,
            time_zone: Some(CLINIC_TZ.name().to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

/// Body of an event insertion. The calendar assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}
