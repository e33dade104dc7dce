//! Spawn coordination and scene state for the Magic Forest exhibit.
//!
//! A viewer mounts a [`ForestContext`] against the backend. The context
//! keeps a local copy of the creature roster in sync by polling, plays one
//! spawn cinematic at a time for creatures approved while it is mounted,
//! and reports what it has rendered back to the backend.
//!
//! # Modules
//!
//! - [`camera`] -- Focus, release, and orbit of the scene camera
//! - [`config`] -- [`SceneConfig`], [`CinematicTiming`], [`CameraConfig`]
//! - [`context`] -- [`ForestContext`], the mounted scene and its event loop
//! - [`coordinator`] -- Roster diffing and one-at-a-time drain pacing
//! - [`entity`] -- Placement by kind and per-frame animation
//! - [`environment`] -- Time-of-day and weather look
//! - [`error`] -- [`SceneError`]
//! - [`observer`] -- [`SceneObserver`] callbacks for the mounting page
//! - [`presentation`] -- Egg, flash, reveal overlay state machine
//! - [`reporter`] -- Rendered-set reports to the backend
//! - [`store`] -- Dedup sets, spawn queue, and live entities

pub mod camera;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod entity;
pub mod environment;
pub mod error;
pub mod observer;
pub mod presentation;
pub mod reporter;
pub mod store;

pub use camera::{CameraController, CameraPose, FocusOutcome, PendingFocus};
pub use config::{CameraConfig, CinematicTiming, SceneConfig};
pub use context::{ForestContext, SceneSnapshot};
pub use coordinator::{PollOutcome, SpawnCoordinator};
pub use entity::Entity;
pub use environment::{EnvironmentState, SceneParams, scene_params};
pub use error::SceneError;
pub use observer::{NoOpObserver, SceneObserver};
pub use presentation::{PresentationMachine, PresentationPhase, PresentationState};
pub use reporter::ForestStateReporter;
pub use store::SceneStore;
