//! Spawn coordination: roster polling, dedup, and drain pacing.
//!
//! The coordinator is the synchronous half of the spawn loop. The scene
//! task performs the I/O and waits, then reports back here:
//!
//! 1. [`SpawnCoordinator::begin_poll`] / [`SpawnCoordinator::finish_poll`]
//!    bracket one roster fetch. The first successful fetch is the initial
//!    sync; later ones queue unseen creatures. A fetch that started before
//!    the last [`SpawnCoordinator::clear`] is discarded.
//! 2. [`SpawnCoordinator::begin_drain`] pops the queue head unless a
//!    cinematic is already running, and [`SpawnCoordinator::finish_spawn`]
//!    releases the guard once the cinematic has been waited out.

use forest_client::ApiResponse;
use forest_types::{CreatureRecord, RosterPage};
use tracing::{debug, info};

use crate::store::SceneStore;

/// What a finished poll means for the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Baseline roster received; materialize these without a cinematic.
    InitialSync(Vec<CreatureRecord>),
    /// This many unseen creatures were queued.
    Arrivals(usize),
    /// The fetch failed; try again next interval.
    Disconnected,
    /// The fetch started before a clear; its roster is out of date.
    Stale,
}

/// Dedup, queue, and pacing guards around the [`SceneStore`].
#[derive(Debug, Default)]
pub struct SpawnCoordinator {
    store: SceneStore,
    poll_in_flight: bool,
    is_spawning: bool,
    generation: u64,
}

impl SpawnCoordinator {
    /// Create a coordinator with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the store.
    pub const fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Mutable view of the store.
    pub const fn store_mut(&mut self) -> &mut SceneStore {
        &mut self.store
    }

    /// Whether a cinematic is running.
    pub const fn is_spawning(&self) -> bool {
        self.is_spawning
    }

    /// Whether a roster fetch is outstanding.
    pub const fn poll_in_flight(&self) -> bool {
        self.poll_in_flight
    }

    /// Clears seen so far; every clear starts a new roster generation.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Claim the poll slot.
    ///
    /// Returns the roster generation to hand back to
    /// [`SpawnCoordinator::finish_poll`], or `None` if a fetch is still
    /// outstanding.
    pub const fn begin_poll(&mut self) -> Option<u64> {
        if self.poll_in_flight {
            return None;
        }
        self.poll_in_flight = true;
        Some(self.generation)
    }

    /// Fold a roster response into the store and release the poll slot.
    ///
    /// A 2xx response whose body is missing or malformed counts as an
    /// empty roster. A response from an earlier generation only releases
    /// the slot.
    pub fn finish_poll(&mut self, generation: u64, response: &ApiResponse) -> PollOutcome {
        self.poll_in_flight = false;
        if generation != self.generation {
            debug!(generation, current = self.generation, "roster fetched before clear dropped");
            return PollOutcome::Stale;
        }
        if !response.ok {
            return PollOutcome::Disconnected;
        }
        let items = response
            .decode::<RosterPage>()
            .map(|page| page.items)
            .unwrap_or_default();

        if self.store.initial_sync_done() {
            let queued = self.store.enqueue_new(items);
            if queued > 0 {
                info!(queued, queue_len = self.store.queue_len(), "new creatures queued");
            }
            PollOutcome::Arrivals(queued)
        } else {
            let fresh = self.store.initial_sync(items);
            info!(creatures = fresh.len(), "initial forest sync");
            PollOutcome::InitialSync(fresh)
        }
    }

    /// Start the next cinematic if none is running.
    ///
    /// Returns the creature to present, or `None` when a cinematic is
    /// already running or nothing is queued.
    pub fn begin_drain(&mut self) -> Option<CreatureRecord> {
        if self.is_spawning {
            return None;
        }
        let next = self.store.pop_next()?;
        self.is_spawning = true;
        debug!(filename = %next.filename, remaining = self.store.queue_len(), "cinematic starting");
        Some(next)
    }

    /// Release the drain guard after a cinematic.
    pub const fn finish_spawn(&mut self) {
        self.is_spawning = false;
    }

    /// Forget every creature and abandon any running cinematic.
    ///
    /// A roster fetch already in flight is left to finish but its reply
    /// will be dropped.
    pub fn clear(&mut self) {
        self.store.clear();
        self.is_spawning = false;
        self.generation = self.generation.wrapping_add(1);
    }
}
