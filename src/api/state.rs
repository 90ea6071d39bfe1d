//! Application state for the API server

use crate::SummaryService;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones). The task store and the
/// configuration are reached through the service, which owns them.
#[derive(Clone)]
pub struct AppState {
    /// Summarization service (task store, queue, workers)
    pub service: SummaryService,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: SummaryService) -> Self {
        Self { service }
    }
}
