//! Reports the rendered set back to the backend.
//!
//! The full set is sent every time. A failed report is dropped; the next
//! periodic tick re-sends the current state, which makes retries free.

use std::sync::Arc;

use forest_client::ForestBackend;
use tracing::debug;

/// Sends `POST /api/forest_state` with the rendered filenames.
#[derive(Debug)]
pub struct ForestStateReporter<B> {
    backend: Arc<B>,
}

impl<B> Clone for ForestStateReporter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ForestBackend> ForestStateReporter<B> {
    /// Create a reporter over `backend`.
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Send one report. Returns whether the backend accepted it.
    pub async fn report(&self, rendered: Vec<String>) -> bool {
        let count = rendered.len();
        let response = self.backend.report_forest_state(rendered).await;
        if response.ok {
            debug!(rendered = count, "forest state reported");
        } else {
            debug!(rendered = count, status = response.status, "forest state report failed");
        }
        response.ok
    }
}
