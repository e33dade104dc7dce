//! Observer interface for the page that mounts the scene.
//!
//! Calls arrive on the scene task, synchronously and in event order.
//! Implementations should return quickly and must not block: a slow
//! observer stalls polling and the render loop.

use forest_types::CreatureRecord;

/// Receives scene events. Every method defaults to a no-op.
pub trait SceneObserver: Send {
    /// A creature's cinematic is starting.
    fn on_spawn_start(&mut self, _creature: &CreatureRecord) {}

    /// The running cinematic finished.
    fn on_spawn_end(&mut self, _creature: &CreatureRecord) {}

    /// Human-readable status line changed.
    fn on_status_change(&mut self, _status: &str) {}

    /// Number of live creatures changed.
    fn on_count_change(&mut self, _count: usize) {}

    /// The camera entered (`true`) or left (`false`) focus mode.
    fn on_focus_mode_change(&mut self, _focused: bool) {}
}

/// An observer that ignores everything.
pub struct NoOpObserver;

impl SceneObserver for NoOpObserver {}
