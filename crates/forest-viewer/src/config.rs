//! Viewer configuration.
//!
//! Loaded in two layers, later winning:
//!
//! 1. An optional YAML file, `forest-config.yaml` unless `FOREST_CONFIG`
//!    names another path
//! 2. `FOREST__`-prefixed environment variables, with `__` between path
//!    segments (`FOREST__CLIENT__API_BASE`, `FOREST__SCENE__POLL_INTERVAL_MS`)

use config::{Config, Environment, File, Source};
use forest_client::ClientConfig;
use forest_scene::SceneConfig;
use serde::Deserialize;

use crate::error::ViewerError;

/// Environment variable naming the config file.
const CONFIG_PATH_VAR: &str = "FOREST_CONFIG";

/// Config file used when `FOREST_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "forest-config.yaml";

/// Prefix of override variables.
const ENV_PREFIX: &str = "FOREST";

/// Everything the viewer needs to run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    /// Backend location and credentials.
    #[serde(default)]
    pub client: ClientConfig,

    /// Scene timings and camera.
    #[serde(default)]
    pub scene: SceneConfig,
}

impl ViewerConfig {
    /// Load the file (if any) and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Config`] if a source is malformed and
    /// [`ViewerError::Client`] if the resulting client section is invalid.
    pub fn load() -> Result<Self, ViewerError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::layered(File::with_name(&path).required(false))
    }

    fn layered<S>(file: S) -> Result<Self, ViewerError>
    where
        S: Source + Send + Sync + 'static,
    {
        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.client.validate()?;
        Ok(config)
    }
}
