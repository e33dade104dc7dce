//! Error types for the forest scene.

use forest_client::ClientError;

/// Errors surfaced by the scene and its control handle.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A creature's image download failed.
    #[error("failed to load asset for {filename}: {source}")]
    Asset {
        /// Normalized filename of the creature.
        filename: String,
        /// The underlying client error.
        source: ClientError,
    },

    /// A creature's image download did not finish in time.
    #[error("asset for {filename} did not load within {timeout_ms} ms")]
    AssetTimeout {
        /// Normalized filename of the creature.
        filename: String,
        /// The bound that was exceeded.
        timeout_ms: u64,
    },

    /// The backend refused a roster mutation.
    #[error("backend rejected {action} (status {status})")]
    Rejected {
        /// Which mutation was attempted.
        action: &'static str,
        /// HTTP status, 0 when the backend was unreachable.
        status: u16,
    },

    /// The scene has been torn down.
    #[error("forest scene is no longer running")]
    Closed,
}
