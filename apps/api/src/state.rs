use std::sync::Arc;

use snapsweep_application::CleanupService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub cleanup_service: Arc<CleanupService>,
}
