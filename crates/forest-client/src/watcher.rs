//! Long-poll watcher for the pipeline status.
//!
//! The operator dashboard keeps one request parked on
//! `pipeline_status?wait=1&since=<last version>`. The server answers as soon
//! as the version moves or the wait expires. A version that did not move
//! past the last one seen carries no new information and is swallowed.

use forest_types::PipelineStatus;
use tracing::debug;

use crate::api::{ForestApi, PipelineQuery};

/// Tracks the last seen pipeline version across long-polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineWatcher {
    last_version: u64,
    wait_secs: u32,
    primed: bool,
}

impl PipelineWatcher {
    /// Create a watcher that parks each request for up to `wait_secs`.
    pub const fn new(wait_secs: u32) -> Self {
        Self {
            last_version: 0,
            wait_secs,
            primed: false,
        }
    }

    /// Last version surfaced to the caller.
    pub const fn last_version(&self) -> u64 {
        self.last_version
    }

    /// Forget the last version (after the operator clears the forest the
    /// server-side counter keeps going, but the dashboard starts over).
    pub const fn reset(&mut self) {
        self.last_version = 0;
        self.primed = false;
    }

    /// Decide whether a received status is news.
    ///
    /// The first status is always surfaced so the dashboard has something
    /// to show; after that only strictly increasing versions are.
    pub fn accept(&mut self, status: PipelineStatus) -> Option<PipelineStatus> {
        if self.primed && status.version <= self.last_version {
            return None;
        }
        self.primed = true;
        self.last_version = status.version;
        Some(status)
    }

    /// Issue one long-poll and return the status if it is news.
    ///
    /// Failures and undecodable bodies return `None` and leave the version
    /// untouched, so the next call asks for the same range again.
    pub async fn next_change(&mut self, api: &ForestApi) -> Option<PipelineStatus> {
        let query = PipelineQuery::long_poll(self.wait_secs, self.last_version);
        let response = api.pipeline_status(query).await;
        if !response.ok {
            debug!(status = response.status, "pipeline status poll failed");
            return None;
        }
        let status: PipelineStatus = response.decode()?;
        self.accept(status)
    }
}

impl Default for PipelineWatcher {
    fn default() -> Self {
        Self::new(PipelineQuery::default().timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(version: u64) -> PipelineStatus {
        PipelineStatus {
            version,
            ..PipelineStatus::default()
        }
    }

    #[test]
    fn first_status_is_always_news() {
        let mut watcher = PipelineWatcher::new(20);
        assert!(watcher.accept(status(0)).is_some());
        assert_eq!(watcher.last_version(), 0);
    }

    #[test]
    fn non_increasing_versions_are_swallowed() {
        let mut watcher = PipelineWatcher::new(20);
        assert!(watcher.accept(status(3)).is_some());
        assert!(watcher.accept(status(3)).is_none());
        assert!(watcher.accept(status(2)).is_none());
        assert!(watcher.accept(status(4)).is_some());
        assert_eq!(watcher.last_version(), 4);
    }

    #[test]
    fn reset_starts_over() {
        let mut watcher = PipelineWatcher::default();
        let _ = watcher.accept(status(9));
        watcher.reset();
        assert_eq!(watcher.last_version(), 0);
        assert!(watcher.accept(status(1)).is_some());
    }
}
