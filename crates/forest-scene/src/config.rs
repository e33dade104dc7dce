//! Scene configuration.
//!
//! Every field carries a serde default so a partial YAML section (or none
//! at all) yields the stock exhibit timings.

use std::time::Duration;

use forest_types::Vec3;
use serde::Deserialize;

/// Timing and behaviour of a mounted forest scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneConfig {
    /// Interval between roster polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Interval between forest-state reports.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Interval between render-loop frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// How long the camera follows a freshly spawned creature.
    #[serde(default = "default_spawn_focus_hold_ms")]
    pub spawn_focus_hold_ms: u64,

    /// Upper bound on a creature's image download.
    #[serde(default = "default_materialize_timeout_ms")]
    pub materialize_timeout_ms: u64,

    /// Creature to focus as soon as it appears (kiosk deep link).
    #[serde(default)]
    pub initial_focus: Option<String>,

    /// Seed for placement randomness. `None` draws from the OS.
    #[serde(default)]
    pub placement_seed: Option<u64>,

    /// Cinematic phase lengths, shared by drain pacing and the overlay.
    #[serde(default)]
    pub cinematic: CinematicTiming,

    /// Camera poses and orbit speed.
    #[serde(default)]
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            report_interval_ms: default_report_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            spawn_focus_hold_ms: default_spawn_focus_hold_ms(),
            materialize_timeout_ms: default_materialize_timeout_ms(),
            initial_focus: None,
            placement_seed: None,
            cinematic: CinematicTiming::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Roster poll interval (never zero).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Forest-state report interval (never zero).
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }

    /// Render-loop frame interval (never zero).
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Focus hold applied after a spawn cinematic.
    pub const fn spawn_focus_hold(&self) -> Duration {
        Duration::from_millis(self.spawn_focus_hold_ms)
    }

    /// Image download bound.
    pub const fn materialize_timeout(&self) -> Duration {
        Duration::from_millis(self.materialize_timeout_ms)
    }
}

/// Phase lengths of the egg, flash, reveal cinematic.
///
/// The coordinator waits [`CinematicTiming::total`] between spawn start and
/// spawn end; the overlay steps through the phases on the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CinematicTiming {
    /// Egg wobble before it cracks.
    #[serde(default = "default_egg_ms")]
    pub egg_ms: u64,

    /// White flash as the egg bursts.
    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,

    /// Creature shown full-screen before it drops into the forest.
    #[serde(default = "default_reveal_ms")]
    pub reveal_ms: u64,
}

impl Default for CinematicTiming {
    fn default() -> Self {
        Self {
            egg_ms: default_egg_ms(),
            flash_ms: default_flash_ms(),
            reveal_ms: default_reveal_ms(),
        }
    }
}

impl CinematicTiming {
    /// Delay from spawn start to the flash phase.
    pub const fn egg(&self) -> Duration {
        Duration::from_millis(self.egg_ms)
    }

    /// Delay from the flash phase to the reveal phase.
    pub const fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }

    /// Whole cinematic, spawn start to spawn end.
    pub const fn total(&self) -> Duration {
        Duration::from_millis(
            self.egg_ms
                .saturating_add(self.flash_ms)
                .saturating_add(self.reveal_ms),
        )
    }
}

/// Fixed camera poses and orbit behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CameraConfig {
    /// Camera position of the initial overview.
    #[serde(default = "default_initial_position")]
    pub initial_position: Vec3,

    /// Look-at target of the initial overview.
    #[serde(default = "default_initial_target")]
    pub initial_target: Vec3,

    /// Zoom of the initial overview.
    #[serde(default = "default_zoom")]
    pub initial_zoom: f32,

    /// Camera offset from a focused creature.
    #[serde(default = "default_focus_offset")]
    pub focus_offset: Vec3,

    /// Orbit speed while auto-rotating (30 s per turn at 1.0).
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_position: default_initial_position(),
            initial_target: default_initial_target(),
            initial_zoom: default_zoom(),
            focus_offset: default_focus_offset(),
            auto_rotate_speed: default_auto_rotate_speed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_poll_interval_ms() -> u64 {
    2000
}

const fn default_report_interval_ms() -> u64 {
    3000
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_spawn_focus_hold_ms() -> u64 {
    5000
}

const fn default_materialize_timeout_ms() -> u64 {
    10_000
}

const fn default_egg_ms() -> u64 {
    2600
}

const fn default_flash_ms() -> u64 {
    600
}

const fn default_reveal_ms() -> u64 {
    3000
}

const fn default_initial_position() -> Vec3 {
    Vec3::new(0.0, 30.0, 80.0)
}

const fn default_initial_target() -> Vec3 {
    Vec3::new(0.0, 8.0, 0.0)
}

const fn default_zoom() -> f32 {
    1.0
}

const fn default_focus_offset() -> Vec3 {
    Vec3::new(0.0, 12.0, 26.0)
}

const fn default_auto_rotate_speed() -> f32 {
    0.22
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cinematic_total_is_six_point_two_seconds() {
        assert_eq!(CinematicTiming::default().total(), Duration::from_millis(6200));
    }

    #[test]
    fn empty_section_yields_defaults() {
        let config: SceneConfig = serde_json::from_str("{}").unwrap_or_default();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.report_interval(), Duration::from_secs(3));
    }

    #[test]
    fn partial_cinematic_keeps_other_phases() {
        let config: SceneConfig =
            serde_json::from_str(r#"{"cinematic": {"egg_ms": 100}}"#).unwrap_or_default();
        assert_eq!(config.cinematic.egg_ms, 100);
        assert_eq!(config.cinematic.flash_ms, 600);
        assert_eq!(config.cinematic.total(), Duration::from_millis(3700));
    }

    #[test]
    fn zero_frame_interval_is_clamped() {
        let config = SceneConfig {
            frame_interval_ms: 0,
            ..SceneConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(1));
    }
}
