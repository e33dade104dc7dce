//! The mounted forest scene.
//!
//! [`ForestContext::mount`] spawns one task that exclusively owns the store,
//! the camera, the environment, and the overlay machine. Everything that
//! touches that state runs on this task, one event at a time:
//!
//! - **Poll interval**: fetch the roster (skipped while a fetch is out)
//! - **Report interval**: send the rendered set
//! - **Frame interval**: animate entities, orbit the camera, expire focus
//! - **Finished I/O and timers**: roster replies, cinematic waits, image
//!   downloads, reports, clears
//! - **Commands** from the [`ForestContext`] handle
//!
//! Network calls and waits run as child tasks in a [`JoinSet`] and come back
//! as events, so nothing ever blocks the loop. Teardown (or dropping the
//! handle) ends the loop; the `JoinSet` and the overlay timer are aborted
//! with it.

use std::sync::Arc;
use std::time::Duration;

use forest_client::{ApiResponse, ForestBackend};
use forest_types::{CreatureRecord, TimeMode, WeatherMode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::camera::{CameraController, CameraPose, FocusOutcome};
use crate::config::SceneConfig;
use crate::coordinator::{PollOutcome, SpawnCoordinator};
use crate::entity::{self, Entity};
use crate::environment::{EnvironmentState, SceneParams};
use crate::error::SceneError;
use crate::observer::SceneObserver;
use crate::presentation::{PresentationMachine, PresentationState};
use crate::reporter::ForestStateReporter;

/// Depth of the command channel.
const COMMAND_BUFFER: usize = 32;

/// Point-in-time view of the scene, for dashboards and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// Keys of live entities, sorted.
    pub live: Vec<String>,
    /// Keys awaiting their cinematic, head first.
    pub queued: Vec<String>,
    /// Number of creatures observed this session.
    pub spawned: usize,
    /// Creature whose cinematic is running.
    pub current_spawn: Option<String>,
    /// Whether the baseline roster has been received.
    pub initial_sync_done: bool,
    /// Camera pose.
    pub camera: CameraPose,
    /// Whether the camera orbits on its own.
    pub auto_rotate: bool,
    /// Followed creature.
    pub focused: Option<String>,
    /// Creature a focus request is waiting for.
    pub pending_focus: Option<String>,
    /// Selected environment modes.
    pub environment: EnvironmentState,
}

enum Command {
    Focus {
        filename: String,
        hold: Duration,
        reply: oneshot::Sender<FocusOutcome>,
    },
    Release {
        to_initial: bool,
        reply: oneshot::Sender<()>,
    },
    ApplyTime {
        mode: TimeMode,
        reply: oneshot::Sender<SceneParams>,
    },
    ApplyWeather {
        mode: WeatherMode,
        reply: oneshot::Sender<SceneParams>,
    },
    ClearForest {
        reply: oneshot::Sender<Result<u64, SceneError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SceneSnapshot>,
    },
    Shutdown,
}

enum TaskEvent {
    Roster {
        generation: u64,
        response: ApiResponse,
    },
    CinematicElapsed(CreatureRecord),
    Materialized {
        record: CreatureRecord,
        result: Result<(), SceneError>,
    },
    Reported,
    Cleared {
        response: ApiResponse,
        reply: oneshot::Sender<Result<u64, SceneError>>,
    },
}

#[derive(Debug, Deserialize)]
struct ClearReply {
    #[serde(default)]
    removed: u64,
}

/// Handle to a mounted forest scene.
///
/// Dropping the handle stops the scene; [`ForestContext::teardown`] also
/// waits for the scene task to finish.
#[derive(Debug)]
pub struct ForestContext {
    commands: mpsc::Sender<Command>,
    presentation: watch::Receiver<PresentationState>,
    task: JoinHandle<()>,
}

impl ForestContext {
    /// Mount a scene over `backend` and start polling immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount<B, O>(backend: Arc<B>, config: SceneConfig, observer: O) -> Self
    where
        B: ForestBackend,
        O: SceneObserver + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let presentation = PresentationMachine::new(config.cinematic);
        let presentation_rx = presentation.subscribe();
        let rng = config
            .placement_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        info!(
            poll_interval_ms = config.poll_interval_ms,
            report_interval_ms = config.report_interval_ms,
            cinematic_ms = config.cinematic.total().as_millis(),
            "mounting forest scene"
        );

        let scene = SceneTask {
            reporter: ForestStateReporter::new(Arc::clone(&backend)),
            backend,
            camera: CameraController::new(config.camera),
            config,
            observer,
            coordinator: SpawnCoordinator::new(),
            environment: EnvironmentState::default(),
            presentation,
            rng,
            tasks: JoinSet::new(),
            current_spawn: None,
            cinematic: None,
        };
        let task = tokio::spawn(scene.run(rx));

        Self {
            commands,
            presentation: presentation_rx,
            task,
        }
    }

    /// Follow a creature. A zero `hold` focuses until released.
    pub async fn focus(&self, filename: &str, hold: Duration) -> Result<FocusOutcome, SceneError> {
        self.call(|reply| Command::Focus {
            filename: filename.to_owned(),
            hold,
            reply,
        })
        .await
    }

    /// Leave focus, to the free pose or (`to_initial`) the overview.
    pub async fn release(&self, to_initial: bool) -> Result<(), SceneError> {
        self.call(|reply| Command::Release { to_initial, reply }).await
    }

    /// Return to the overview and resume orbiting.
    pub async fn reset_to_initial(&self) -> Result<(), SceneError> {
        self.release(true).await
    }

    /// Switch time of day.
    pub async fn apply_time_mode(&self, mode: TimeMode) -> Result<SceneParams, SceneError> {
        self.call(|reply| Command::ApplyTime { mode, reply }).await
    }

    /// Switch weather.
    pub async fn apply_weather_mode(&self, mode: WeatherMode) -> Result<SceneParams, SceneError> {
        self.call(|reply| Command::ApplyWeather { mode, reply }).await
    }

    /// Clear the roster on the backend, then every local creature.
    ///
    /// Calls the backend exactly once. Returns how many creatures the
    /// backend removed.
    pub async fn clear_forest(&self) -> Result<u64, SceneError> {
        self.call(|reply| Command::ClearForest { reply }).await?
    }

    /// Current state of the scene.
    pub async fn snapshot(&self) -> Result<SceneSnapshot, SceneError> {
        self.call(|reply| Command::Snapshot { reply }).await
    }

    /// Watch the spawn overlay.
    pub fn presentation(&self) -> watch::Receiver<PresentationState> {
        self.presentation.clone()
    }

    /// Stop every timer and task and wait for the scene to finish.
    pub async fn teardown(self) {
        // The loop may already be gone; the join below covers both cases.
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "forest scene task ended abnormally");
        }
        info!("forest scene torn down");
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SceneError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_send| SceneError::Closed)?;
        rx.await.map_err(|_recv| SceneError::Closed)
    }
}

// ---------------------------------------------------------------------------
// Scene task
// ---------------------------------------------------------------------------

struct SceneTask<B, O> {
    backend: Arc<B>,
    config: SceneConfig,
    observer: O,
    coordinator: SpawnCoordinator,
    camera: CameraController,
    environment: EnvironmentState,
    presentation: PresentationMachine,
    reporter: ForestStateReporter<B>,
    rng: StdRng,
    tasks: JoinSet<TaskEvent>,
    current_spawn: Option<CreatureRecord>,
    cinematic: Option<AbortHandle>,
}

impl<B, O> SceneTask<B, O>
where
    B: ForestBackend,
    O: SceneObserver,
{
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mounted_at = Instant::now();
        let mut last_frame = mounted_at;

        let mut poll = tokio::time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let report_every = self.config.report_interval();
        let first_report = mounted_at.checked_add(report_every).unwrap_or(mounted_at);
        let mut report = tokio::time::interval_at(first_report, report_every);
        report.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame = tokio::time::interval(self.config.frame_interval());
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(filename) = self.config.initial_focus.clone() {
            self.focus(&filename, Duration::ZERO);
        }

        loop {
            tokio::select! {
                command = commands.recv() => {
                    // A dropped handle stops the scene like an explicit teardown.
                    let Some(command) = command else { break };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    match joined {
                        Ok(event) => self.handle_event(event),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!(error = %e, "scene child task failed"),
                    }
                }
                _ = poll.tick() => self.poll(),
                _ = report.tick() => self.report(),
                now = frame.tick() => {
                    let dt = now.saturating_duration_since(last_frame);
                    last_frame = now;
                    self.frame(now, now.saturating_duration_since(mounted_at), dt);
                }
            }
        }

        self.tasks.abort_all();
        self.presentation.end();
        debug!("forest scene loop stopped");
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Returns `false` when the loop should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Focus {
                filename,
                hold,
                reply,
            } => {
                let outcome = self.focus(&filename, hold);
                let _ = reply.send(outcome);
            }
            Command::Release { to_initial, reply } => {
                self.release(to_initial);
                let _ = reply.send(());
            }
            Command::ApplyTime { mode, reply } => {
                let params = self.environment.apply_time(mode);
                info!(time = ?mode, weather = ?self.environment.weather(), "time mode applied");
                let _ = reply.send(params);
            }
            Command::ApplyWeather { mode, reply } => {
                let params = self.environment.apply_weather(mode);
                info!(time = ?self.environment.time(), weather = ?mode, "weather mode applied");
                let _ = reply.send(params);
            }
            Command::ClearForest { reply } => {
                let backend = Arc::clone(&self.backend);
                self.tasks.spawn(async move {
                    let response = backend.clear_forest().await;
                    TaskEvent::Cleared { response, reply }
                });
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => return false,
        }
        true
    }

    // -----------------------------------------------------------------------
    // Child task results
    // -----------------------------------------------------------------------

    fn handle_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Roster {
                generation,
                response,
            } => self.on_roster(generation, &response),
            TaskEvent::CinematicElapsed(record) => self.on_cinematic_elapsed(record),
            TaskEvent::Materialized { record, result } => self.on_materialized(record, result),
            TaskEvent::Reported => {}
            TaskEvent::Cleared { response, reply } => self.on_cleared(&response, reply),
        }
    }

    fn poll(&mut self) {
        let Some(generation) = self.coordinator.begin_poll() else {
            debug!("previous roster poll still in flight");
            return;
        };
        let backend = Arc::clone(&self.backend);
        self.tasks.spawn(async move {
            TaskEvent::Roster {
                generation,
                response: backend.latest_animals().await,
            }
        });
    }

    fn on_roster(&mut self, generation: u64, response: &ApiResponse) {
        match self.coordinator.finish_poll(generation, response) {
            PollOutcome::InitialSync(records) => {
                for record in records {
                    self.materialize(record);
                }
                self.status("Initial forest sync complete");
            }
            PollOutcome::Arrivals(_) => self.drain(),
            PollOutcome::Disconnected => {
                warn!(status = response.status, "roster poll failed");
                self.status("Spawn listener disconnected");
            }
            PollOutcome::Stale => {}
        }
    }

    fn drain(&mut self) {
        let Some(record) = self.coordinator.begin_drain() else {
            return;
        };
        info!(filename = %record.filename, kind = record.kind.as_str(), "spawn cinematic started");
        self.observer.on_spawn_start(&record);
        self.presentation.start(record.clone());
        self.current_spawn = Some(record.clone());

        let wait = self.config.cinematic.total();
        let handle = self.tasks.spawn(async move {
            tokio::time::sleep(wait).await;
            TaskEvent::CinematicElapsed(record)
        });
        self.cinematic = Some(handle);
    }

    fn on_cinematic_elapsed(&mut self, record: CreatureRecord) {
        let current = self.current_spawn.as_ref().map(CreatureRecord::key);
        if current != Some(record.key()) {
            // Abandoned by a clear before the wait finished.
            return;
        }
        self.current_spawn = None;
        self.cinematic = None;

        self.presentation.end();
        self.observer.on_spawn_end(&record);
        let filename = record.filename.clone();
        self.materialize(record);
        self.status(&format!("Spawned: {filename}"));
        self.focus(&filename, self.config.spawn_focus_hold());

        self.coordinator.finish_spawn();
        self.drain();
    }

    fn materialize(&mut self, record: CreatureRecord) {
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.materialize_timeout();
        let path = if record.url.trim().is_empty() {
            format!("/static/animations/{}", record.key())
        } else {
            record.url.clone()
        };
        self.tasks.spawn(async move {
            let filename = record.key();
            let result = match tokio::time::timeout(timeout, backend.fetch_asset(&path)).await {
                Ok(Ok(_bytes)) => Ok(()),
                Ok(Err(source)) => Err(SceneError::Asset { filename, source }),
                Err(_elapsed) => Err(SceneError::AssetTimeout {
                    filename,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            TaskEvent::Materialized { record, result }
        });
    }

    fn on_materialized(&mut self, record: CreatureRecord, result: Result<(), SceneError>) {
        if let Err(e) = result {
            warn!(error = %e, "creature never became visible");
            return;
        }
        let position = entity::place(record.kind, &mut self.rng);
        let entity = Entity::new(record, position, &mut self.rng);
        let key = entity.key.clone();
        if !self.coordinator.store_mut().insert_entity(entity) {
            debug!(key = %key, "late image load dropped");
            return;
        }
        debug!(key = %key, x = position.x, y = position.y, z = position.z, "creature materialized");
        self.observer
            .on_count_change(self.coordinator.store().live_count());
        self.report();

        if let Some(pending) = self.camera.take_pending_for(&key) {
            self.focus(&key, pending.hold);
        }
    }

    fn report(&mut self) {
        let rendered = self.coordinator.store().rendered();
        let reporter = self.reporter.clone();
        self.tasks.spawn(async move {
            reporter.report(rendered).await;
            TaskEvent::Reported
        });
    }

    fn on_cleared(
        &mut self,
        response: &ApiResponse,
        reply: oneshot::Sender<Result<u64, SceneError>>,
    ) {
        if !response.ok {
            warn!(status = response.status, "clear forest rejected");
            let _ = reply.send(Err(SceneError::Rejected {
                action: "clear_forest",
                status: response.status,
            }));
            return;
        }
        let removed = response
            .decode::<ClearReply>()
            .map(|body| body.removed)
            .unwrap_or_default();

        if let Some(handle) = self.cinematic.take() {
            handle.abort();
        }
        if let Some(record) = self.current_spawn.take() {
            self.presentation.end();
            self.observer.on_spawn_end(&record);
        }
        self.coordinator.clear();
        let was_focused = self.camera.is_focused();
        self.camera.forget();
        if was_focused {
            self.observer.on_focus_mode_change(false);
        }
        self.observer.on_count_change(0);
        self.report();
        info!(removed, "forest cleared");
        let _ = reply.send(Ok(removed));
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    fn focus(&mut self, filename: &str, hold: Duration) -> FocusOutcome {
        let outcome = self.camera.focus(
            filename,
            hold,
            self.coordinator.store(),
            Instant::now(),
        );
        if let FocusOutcome::Focused(key) = &outcome {
            self.observer.on_focus_mode_change(true);
            self.status(&format!("Focused on: {key}"));
        }
        outcome
    }

    fn release(&mut self, to_initial: bool) {
        self.camera.release(to_initial);
        self.observer.on_focus_mode_change(false);
        self.status("Free camera mode");
        if to_initial {
            self.status("Initial camera view");
        }
    }

    // -----------------------------------------------------------------------
    // Render loop
    // -----------------------------------------------------------------------

    fn frame(&mut self, now: Instant, since_mount: Duration, dt: Duration) {
        if self.camera.tick(now, dt) {
            self.observer.on_focus_mode_change(false);
            self.status("Free camera mode");
        }
        let t = since_mount.as_secs_f32();
        for entity in self.coordinator.store_mut().entities_mut() {
            entity.animate(t);
        }
    }

    fn status(&mut self, text: &str) {
        info!(status = text, "scene status");
        self.observer.on_status_change(text);
    }

    fn snapshot(&self) -> SceneSnapshot {
        let store = self.coordinator.store();
        SceneSnapshot {
            live: store.rendered(),
            queued: store.queued_keys(),
            spawned: store.spawned_len(),
            current_spawn: self.current_spawn.as_ref().map(CreatureRecord::key),
            initial_sync_done: store.initial_sync_done(),
            camera: self.camera.pose(),
            auto_rotate: self.camera.auto_rotate(),
            focused: self.camera.focused_key().map(ToOwned::to_owned),
            pending_focus: self.camera.pending().map(|pending| pending.key.clone()),
            environment: self.environment,
        }
    }
}
