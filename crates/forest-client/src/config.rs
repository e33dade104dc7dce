//! Configuration for the backend client.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

/// Default backend location (the Flask dev server).
const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Default per-request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL every API path and asset path is resolved against.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token attached to every request when present.
    #[serde(default)]
    pub token: Option<String>,

    /// Timeout for ordinary requests. Long-polls add their wait on top.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Build a config pointing at `api_base` with default timeouts.
    pub fn with_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Base URL with trailing slashes removed.
    pub fn normalized_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Check that the base is an absolute http(s) URL and the timeout is non-zero.
    pub fn validate(&self) -> Result<(), ClientError> {
        let base = self.normalized_base();
        let url = reqwest::Url::parse(base)
            .map_err(|e| ClientError::Config(format!("invalid api_base {base:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api_base must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::Config(
                "request_timeout_ms must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
