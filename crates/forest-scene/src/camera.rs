//! Camera focus control.
//!
//! The camera is either free (orbiting when auto-rotate is on) or focused
//! on one creature. Focus remembers the free pose it left so that a plain
//! release goes back to exactly where the visitor was looking. That pose is
//! only captured on the free-to-focused transition; chaining focus calls
//! keeps the original.
//!
//! A focus request for a creature that is not live yet is parked as
//! pending and applied when the creature materializes.

use std::time::Duration;

use forest_types::{Vec3, normalize_filename};
use tokio::time::Instant;
use tracing::debug;

use crate::config::CameraConfig;
use crate::store::SceneStore;

/// Radians per second of orbit at an auto-rotate speed of 1.0.
const ORBIT_RADIANS_PER_SEC: f32 = std::f32::consts::TAU / 60.0;

/// Position, look-at target, and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Camera position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Zoom factor.
    pub zoom: f32,
}

/// Result of a focus request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The camera now follows this creature.
    Focused(String),
    /// Not live yet; focus will apply when it materializes.
    Pending(String),
    /// The filename normalized to nothing.
    Ignored,
}

/// A focus request waiting for its creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFocus {
    /// Normalized filename.
    pub key: String,
    /// Hold to apply once focused.
    pub hold: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveFocus {
    key: String,
    release_at: Option<Instant>,
}

/// Owns the camera pose and the focus state.
#[derive(Debug)]
pub struct CameraController {
    config: CameraConfig,
    pose: CameraPose,
    auto_rotate: bool,
    free_pose: CameraPose,
    focus: Option<ActiveFocus>,
    pending: Option<PendingFocus>,
}

impl CameraController {
    /// Start at the initial overview, auto-rotating.
    pub const fn new(config: CameraConfig) -> Self {
        let initial = initial_pose(&config);
        Self {
            config,
            pose: initial,
            auto_rotate: true,
            free_pose: initial,
            focus: None,
            pending: None,
        }
    }

    /// Current pose.
    pub const fn pose(&self) -> CameraPose {
        self.pose
    }

    /// The fixed overview pose.
    pub const fn initial_pose(&self) -> CameraPose {
        initial_pose(&self.config)
    }

    /// Whether the camera orbits on its own.
    pub const fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Whether a creature is being followed.
    pub const fn is_focused(&self) -> bool {
        self.focus.is_some()
    }

    /// Key of the followed creature.
    pub fn focused_key(&self) -> Option<&str> {
        self.focus.as_ref().map(|focus| focus.key.as_str())
    }

    /// Parked focus request, if any.
    pub const fn pending(&self) -> Option<&PendingFocus> {
        self.pending.as_ref()
    }

    /// Move the camera onto the creature called `filename`.
    ///
    /// A non-zero `hold` schedules an automatic release at `now + hold`; a
    /// zero hold focuses until released. A creature that is not live yet
    /// becomes the pending request, replacing any earlier one.
    pub fn focus(
        &mut self,
        filename: &str,
        hold: Duration,
        store: &SceneStore,
        now: Instant,
    ) -> FocusOutcome {
        let key = normalize_filename(filename);
        if key.is_empty() {
            return FocusOutcome::Ignored;
        }
        let Some(entity) = store.entity(&key) else {
            debug!(key = %key, hold_ms = hold.as_millis(), "focus target not live yet");
            self.pending = Some(PendingFocus {
                key: key.clone(),
                hold,
            });
            return FocusOutcome::Pending(key);
        };

        if self.focus.is_none() {
            self.free_pose = self.pose;
        }
        let target = entity.position;
        self.pose = CameraPose {
            position: target + self.config.focus_offset,
            target,
            zoom: self.pose.zoom,
        };
        self.auto_rotate = false;
        self.pending = None;
        self.focus = Some(ActiveFocus {
            key: key.clone(),
            release_at: if hold.is_zero() {
                None
            } else {
                now.checked_add(hold)
            },
        });
        FocusOutcome::Focused(key)
    }

    /// Take the pending request if it is waiting for `key`.
    pub fn take_pending_for(&mut self, key: &str) -> Option<PendingFocus> {
        if self.pending.as_ref().is_some_and(|pending| pending.key == key) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Leave focus.
    ///
    /// `to_initial` goes to the overview and resumes orbiting. Otherwise the
    /// camera returns to the free pose it had before focusing and stays
    /// still. Called while not focused, a plain release lands on the
    /// overview without orbiting. Always drops the pending request and any
    /// scheduled auto-release.
    pub fn release(&mut self, to_initial: bool) {
        self.pending = None;
        let was_focused = self.focus.take().is_some();
        if to_initial {
            self.pose = self.initial_pose();
            self.auto_rotate = true;
        } else if was_focused {
            self.pose = CameraPose {
                zoom: self.pose.zoom,
                ..self.free_pose
            };
            self.auto_rotate = false;
        } else {
            let initial = self.initial_pose();
            self.pose = CameraPose {
                zoom: self.pose.zoom,
                ..initial
            };
            self.auto_rotate = false;
        }
    }

    /// Release to the overview.
    pub fn reset_to_initial(&mut self) {
        self.release(true);
    }

    /// Advance one frame.
    ///
    /// Returns `true` when the focus hold expired and the camera released
    /// itself this frame.
    pub fn tick(&mut self, now: Instant, dt: Duration) -> bool {
        let expired = self
            .focus
            .as_ref()
            .and_then(|focus| focus.release_at)
            .is_some_and(|deadline| now >= deadline);
        if expired {
            self.release(false);
            return true;
        }
        if self.auto_rotate {
            let angle = self.config.auto_rotate_speed * ORBIT_RADIANS_PER_SEC * dt.as_secs_f32();
            self.pose.position = self.pose.position.rotated_about_y(self.pose.target, angle);
        }
        false
    }

    /// Drop focus and any pending request, back to the free pose.
    pub fn forget(&mut self) {
        self.pending = None;
        if self.focus.take().is_some() {
            self.pose = CameraPose {
                zoom: self.pose.zoom,
                ..self.free_pose
            };
        }
    }
}

const fn initial_pose(config: &CameraConfig) -> CameraPose {
    CameraPose {
        position: config.initial_position,
        target: config.initial_target,
        zoom: config.initial_zoom,
    }
}
