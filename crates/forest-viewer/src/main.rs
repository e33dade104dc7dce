//! Headless Magic Forest viewer.
//!
//! Mounts a forest scene against a live backend and logs what a projected
//! viewer would show: the initial sync, each spawn cinematic, focus changes,
//! and the live creature count. Runs until Ctrl-C, then tears the scene
//! down and waits for its task to finish.
//!
//! # Configuration
//!
//! ```text
//! forest-config.yaml (or $FOREST_CONFIG)  <--  FOREST__SECTION__FIELD env vars
//! ```

mod config;
mod error;
mod observer;

use std::sync::Arc;

use anyhow::Context;
use forest_client::ForestApi;
use forest_scene::ForestContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ViewerConfig;
use crate::observer::LoggingObserver;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the HTTP client cannot be
/// built, or the Ctrl-C handler cannot be installed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("forest-viewer starting");

    let config = ViewerConfig::load().context("loading viewer configuration")?;
    info!(
        api_base = config.client.normalized_base(),
        poll_interval_ms = config.scene.poll_interval_ms,
        report_interval_ms = config.scene.report_interval_ms,
        cinematic_ms = config.scene.cinematic.total().as_millis(),
        initial_focus = config.scene.initial_focus.as_deref(),
        "configuration loaded"
    );

    let api = Arc::new(ForestApi::new(&config.client).context("building backend client")?);
    let context = ForestContext::mount(api, config.scene, LoggingObserver::default());
    info!("forest scene mounted, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl-C")?;
    info!("shutdown requested");

    context.teardown().await;
    Ok(())
}
