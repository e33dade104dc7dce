//! Error types for the backend client.
//!
//! JSON endpoints fold these into [`ApiResponse`](crate::ApiResponse) with
//! `ok == false`; only asset fetches and construction return them directly.

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// A URL could not be built from the configured base.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}
