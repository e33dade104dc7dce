//! Overlay state machine for a single spawn cinematic.
//!
//! ```text
//! Idle --start--> Egg --egg_ms--> Flash --flash_ms--> Reveal --end--> Idle
//! ```
//!
//! The two timed transitions run on one owned timer task. Starting a new
//! cinematic aborts that task before arming a fresh one, and every state
//! carries a generation number so a timer that lost the race with an abort
//! can never overwrite a newer cinematic. Only [`PresentationMachine::end`]
//! returns the overlay to [`PresentationPhase::Idle`]; the coordinator calls
//! it after waiting the same [`CinematicTiming::total`].

use std::sync::Arc;

use forest_types::CreatureRecord;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::CinematicTiming;

/// Phase of the spawn overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentationPhase {
    /// No overlay.
    #[default]
    Idle,
    /// Egg wobbling on screen.
    Egg,
    /// Egg bursting.
    Flash,
    /// Creature shown full-screen.
    Reveal,
}

/// What the overlay is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresentationState {
    /// Current phase.
    pub phase: PresentationPhase,
    /// Creature being revealed, `None` while idle.
    pub creature: Option<CreatureRecord>,
    /// Incremented on every start and end.
    pub generation: u64,
}

/// Drives the overlay through its phases.
#[derive(Debug)]
pub struct PresentationMachine {
    timing: CinematicTiming,
    state: Arc<watch::Sender<PresentationState>>,
    timer: Option<JoinHandle<()>>,
}

impl PresentationMachine {
    /// Create an idle machine using the shared cinematic timing.
    pub fn new(timing: CinematicTiming) -> Self {
        let (tx, _rx) = watch::channel(PresentationState::default());
        Self {
            timing,
            state: Arc::new(tx),
            timer: None,
        }
    }

    /// Timing this machine steps through.
    pub const fn timing(&self) -> CinematicTiming {
        self.timing
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> PresentationState {
        self.state.borrow().clone()
    }

    /// Begin a cinematic for `creature`, cancelling any running one.
    pub fn start(&mut self, creature: CreatureRecord) {
        self.cancel_timer();

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation = state.generation.wrapping_add(1);
            state.phase = PresentationPhase::Egg;
            state.creature = Some(creature);
            generation = state.generation;
        });
        debug!(generation, "cinematic started");

        let state = Arc::clone(&self.state);
        let timing = self.timing;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timing.egg()).await;
            advance(&state, generation, PresentationPhase::Flash);
            tokio::time::sleep(timing.flash()).await;
            advance(&state, generation, PresentationPhase::Reveal);
        }));
    }

    /// Clear the overlay.
    pub fn end(&mut self) {
        self.cancel_timer();
        self.state.send_modify(|state| {
            state.generation = state.generation.wrapping_add(1);
            state.phase = PresentationPhase::Idle;
            state.creature = None;
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for PresentationMachine {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn advance(state: &watch::Sender<PresentationState>, generation: u64, phase: PresentationPhase) {
    state.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        current.phase = phase;
        true
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use forest_types::CreatureKind;

    use super::*;

    fn fox() -> CreatureRecord {
        CreatureRecord::new("fox.png", CreatureKind::Ground)
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn phases_follow_the_shared_timing() {
        let timing = CinematicTiming::default();
        let mut machine = PresentationMachine::new(timing);
        machine.start(fox());
        assert_eq!(machine.current().phase, PresentationPhase::Egg);

        settle(timing.egg_ms - 1).await;
        assert_eq!(machine.current().phase, PresentationPhase::Egg);
        settle(2).await;
        assert_eq!(machine.current().phase, PresentationPhase::Flash);
        settle(timing.flash_ms).await;
        assert_eq!(machine.current().phase, PresentationPhase::Reveal);

        // Reveal holds until the coordinator ends the cinematic.
        settle(60_000).await;
        assert_eq!(machine.current().phase, PresentationPhase::Reveal);
        machine.end();
        assert_eq!(machine.current(), PresentationState {
            phase: PresentationPhase::Idle,
            creature: None,
            generation: 2,
        });
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_the_previous_timers() {
        let timing = CinematicTiming::default();
        let mut machine = PresentationMachine::new(timing);
        machine.start(fox());
        settle(timing.egg_ms - 100).await;

        machine.start(CreatureRecord::new("owl.png", CreatureKind::Sky));
        // The first cinematic would have flashed here.
        settle(200).await;
        let state = machine.current();
        assert_eq!(state.phase, PresentationPhase::Egg);
        assert_eq!(state.creature.map(|c| c.filename), Some("owl.png".to_owned()));

        settle(timing.egg_ms).await;
        assert_eq!(machine.current().phase, PresentationPhase::Flash);
    }

    #[tokio::test(start_paused = true)]
    async fn end_mid_cinematic_stays_idle() {
        let timing = CinematicTiming::default();
        let mut machine = PresentationMachine::new(timing);
        let mut rx = machine.subscribe();
        machine.start(fox());
        machine.end();
        settle(timing.total().as_millis().try_into().unwrap_or(u64::MAX)).await;
        assert_eq!(machine.current().phase, PresentationPhase::Idle);
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().phase, PresentationPhase::Idle);
    }
}
