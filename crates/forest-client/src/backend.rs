//! The backend seam used by the scene coordinator.
//!
//! The coordinator only needs four calls: read the roster, report what is
//! rendered, clear the forest, and fetch a creature's image. Keeping them
//! behind a trait lets tests drive the coordinator with a scripted backend.

use std::future::Future;

use crate::api::{ApiResponse, ForestApi};
use crate::error::ClientError;

/// Backend operations the forest scene depends on.
///
/// Implementations must be cheap to share behind an `Arc` and must not
/// retry on their own; the scene decides when to call again.
pub trait ForestBackend: Send + Sync + 'static {
    /// Fetch the current creature roster (`{ items: [...] }`).
    fn latest_animals(&self) -> impl Future<Output = ApiResponse> + Send;

    /// Report the full set of rendered creature filenames.
    fn report_forest_state(&self, rendered: Vec<String>) -> impl Future<Output = ApiResponse> + Send;

    /// Remove every creature from the roster.
    fn clear_forest(&self) -> impl Future<Output = ApiResponse> + Send;

    /// Download a creature's image.
    fn fetch_asset(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

impl ForestBackend for ForestApi {
    async fn latest_animals(&self) -> ApiResponse {
        Self::latest_animals(self).await
    }

    async fn report_forest_state(&self, rendered: Vec<String>) -> ApiResponse {
        Self::report_forest_state(self, &rendered).await
    }

    async fn clear_forest(&self) -> ApiResponse {
        Self::clear_forest(self).await
    }

    async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        Self::fetch_asset(self, path).await
    }
}
