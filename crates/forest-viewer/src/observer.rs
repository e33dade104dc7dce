//! Observer that turns scene events into log lines.

use forest_scene::SceneObserver;
use forest_types::CreatureRecord;
use tracing::info;

/// Logs every scene callback and remembers the last live count.
#[derive(Debug, Default)]
pub struct LoggingObserver {
    live: usize,
}

impl SceneObserver for LoggingObserver {
    fn on_spawn_start(&mut self, creature: &CreatureRecord) {
        info!(
            filename = %creature.filename,
            kind = creature.kind.as_str(),
            name = %creature.display_name(),
            "spawn started"
        );
    }

    fn on_spawn_end(&mut self, creature: &CreatureRecord) {
        info!(filename = %creature.filename, "spawn finished");
    }

    fn on_status_change(&mut self, status: &str) {
        info!(status, "status");
    }

    fn on_count_change(&mut self, count: usize) {
        if count != self.live {
            info!(previous = self.live, count, "creature count changed");
            self.live = count;
        }
    }

    fn on_focus_mode_change(&mut self, focused: bool) {
        info!(focused, "focus mode");
    }
}
