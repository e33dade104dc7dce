//! Shared wire types for the Magic Forest exhibit.
//!
//! This crate is the single source of truth for the payloads exchanged
//! between the backend HTTP API, the scene coordinator, and the browser UI.
//! Types marked with `#[ts(export)]` flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`creature`] -- Creature roster records and filename normalization
//! - [`pipeline`] -- Background-removal pipeline status (long-poll payload)
//! - [`environment`] -- Time-of-day and weather modes
//! - [`geometry`] -- Minimal 3D vector used for entity and camera poses

pub mod creature;
pub mod environment;
pub mod geometry;
pub mod pipeline;

pub use creature::{normalize_filename, CreatureKind, CreatureRecord, RosterPage};
pub use environment::{TimeMode, WeatherMode};
pub use geometry::Vec3;
pub use pipeline::{PipelineState, PipelineStatus};
