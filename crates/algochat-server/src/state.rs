use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The corpus summary, read on every request so edits show up without a restart
    pub csv_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: Arc::new(csv_path.into()),
        }
    }
}
