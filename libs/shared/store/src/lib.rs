pub mod state;
pub mod store;

pub use state::AppState;
pub use store::{AppointmentStatus, PendingRecord, PendingStore};
