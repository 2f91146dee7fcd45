// libs/shared/store/src/store.rs
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// One tentative appointment awaiting the approver's decision. The status
/// lives here, next to the event id, so the approval flow never has to infer
/// state from the calendar event's title text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingRecord {
    pub event_id: String,
    pub patient_name: String,
    pub status: AppointmentStatus,
}

impl PendingRecord {
    pub fn pending(event_id: impl Into<String>, patient_name: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            patient_name: patient_name.into(),
            status: AppointmentStatus::Pending,
        }
    }
}

/// File-backed map from confirmation code to pending appointment.
///
/// The document is read fully and rewritten fully on every mutation, with no
/// persistent file handle. The mutex serializes read-modify-write cycles so
/// two concurrent requests cannot silently drop each other's entries.
pub struct PendingStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PendingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole persisted mapping. A missing, empty or malformed document
    /// reads as empty; malformed content is logged, never surfaced.
    pub async fn read(&self) -> HashMap<String, PendingRecord> {
        self.read_document()
    }

    /// Replace the persisted mapping wholesale.
    pub async fn write(&self, map: &HashMap<String, PendingRecord>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_document(map)
    }

    pub async fn get(&self, code: &str) -> Option<PendingRecord> {
        self.read_document().get(code).cloned()
    }

    pub async fn insert(&self, code: &str, record: PendingRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_document();
        map.insert(code.to_string(), record);
        self.write_document(&map)
    }

    pub async fn remove(&self, code: &str) -> Result<Option<PendingRecord>> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_document();
        let removed = map.remove(code);
        if removed.is_some() {
            self.write_document(&map)?;
        }
        Ok(removed)
    }

    fn read_document(&self) -> HashMap<String, PendingRecord> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Pending file {} does not exist yet", self.path.display());
                return HashMap::new();
            }
            Err(e) => {
                error!("Failed to read pending file {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        if data.trim().is_empty() {
            return HashMap::new();
        }

        match serde_json::from_str(&data) {
            Ok(map) => map,
            Err(e) => {
                error!(
                    "Pending file {} is malformed, treating as empty: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    // Write-to-temp-then-rename: an interrupted write leaves the previous
    // document intact.
    fn write_document(&self, map: &HashMap<String, PendingRecord>) -> Result<()> {
        let data = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        debug!("Pending file {} updated ({} entries)", self.path.display(), map.len());
        Ok(())
    }
}
