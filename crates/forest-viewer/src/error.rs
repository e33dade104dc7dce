//! Viewer startup errors.

use forest_client::ClientError;

/// Errors raised while preparing the viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The configuration file or environment could not be read or parsed.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// The client section is present but unusable.
    #[error("client config rejected: {0}")]
    Client(#[from] ClientError),
}
