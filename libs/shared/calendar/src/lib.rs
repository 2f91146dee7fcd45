pub mod client;
pub mod models;

pub use client::CalendarClient;
pub use models::{CalendarEvent, EventDraft, EventTime, CLINIC_TZ};
