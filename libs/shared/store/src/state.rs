use shared_config::AppConfig;

use crate::store::PendingStore;

/// Process-wide state built once at startup and shared with every handler.
/// The store lives here so all requests funnel through one serialized
/// instance instead of racing on the file.
pub struct AppState {
    pub config: AppConfig,
    pub pending: PendingStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let pending = PendingStore::new(config.pending_file_path.clone());
        Self { config, pending }
    }
}
