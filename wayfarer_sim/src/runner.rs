//! Scenario runner for headless tour playback.
//!
//! A [`TourDriver`] plays a `TourSession` on a jittered 60Hz clock and
//! checks the playback properties after every host frame. The
//! [`ScenarioRunner`] builds the itinerary and command script for each
//! [`ScenarioId`] and reports a [`ScenarioResult`].

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use wayfarer_core::follower::VehicleKind;
use wayfarer_core::itinerary::{Itinerary, Preferences, TravelMode};
use wayfarer_core::persistence::TripStore;
use wayfarer_core::planner::{PlanningBackend, TripPlanner};
use wayfarer_core::route::FALLBACK_NAME;
use wayfarer_core::sequencer::{PlaybackPhase, PlaybackSnapshot, TransportCommand};
use wayfarer_core::session::{PlaybackObserver, TourFrame, TourSession};
use wayfarer_core::{PlannerError, PlaybackConfig, TripRequest};
use wayfarer_env::{MemoryStore, WayfarerContext};

use crate::context::SimContext;
use crate::exporter::{TourExport, TourFrameRecord};
use crate::fixtures;
use crate::scenarios::ScenarioId;

/// Default relative jitter applied to each host frame.
pub const DEFAULT_JITTER: f64 = 0.25;

/// Result of running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Host frames executed
    pub total_frames: u64,

    /// Final host time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Distinct waypoints dwelt at while playing
    pub stops_visited: usize,

    /// Observer state notifications
    pub state_changes: usize,

    /// Observer banner notifications
    pub banner_changes: usize,

    /// Frames with a visible vehicle
    pub traveling_frames: u64,

    /// Longest host frame in seconds
    pub max_frame_dt: f64,
}

/// Totals of one driven tour.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub frames: u64,
    pub time_secs: f64,
    pub metrics: ScenarioMetrics,
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(msg())
    }
}

#[derive(Debug, Default)]
struct ObserverLog {
    states: Vec<PlaybackSnapshot>,
    banners: Vec<Option<String>>,
}

/// Observer that records every notification for later assertions.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<ObserverLog>>);

impl Recorder {
    pub fn states(&self) -> Vec<PlaybackSnapshot> {
        self.0.lock().map(|log| log.states.clone()).unwrap_or_default()
    }

    pub fn banners(&self) -> Vec<Option<String>> {
        self.0.lock().map(|log| log.banners.clone()).unwrap_or_default()
    }
}

impl PlaybackObserver for Recorder {
    fn on_state_change(&mut self, snapshot: PlaybackSnapshot) {
        if let Ok(mut log) = self.0.lock() {
            log.states.push(snapshot);
        }
    }

    fn on_banner(&mut self, text: Option<&str>) {
        if let Ok(mut log) = self.0.lock() {
            log.banners.push(text.map(String::from));
        }
    }
}

/// Plays one session headlessly and checks every frame.
pub struct TourDriver {
    session: TourSession<Arc<MemoryStore>>,
    rng: ChaCha8Rng,
    base_dt: f64,
    jitter: f64,
    time_secs: f64,
    frames: u64,
    recorder: Recorder,
    export: Option<TourExport>,
    last_snapshot: PlaybackSnapshot,
    visited: BTreeSet<usize>,
    kinds: HashSet<VehicleKind>,
    metrics: ScenarioMetrics,
}

impl TourDriver {
    pub fn new(
        itinerary: Arc<Itinerary>,
        config: &PlaybackConfig,
        store: Arc<MemoryStore>,
        rng: ChaCha8Rng,
        jitter: f64,
    ) -> Self {
        let mut session = TourSession::new(itinerary, config, store);
        let recorder = Recorder::default();
        session.add_observer(Box::new(recorder.clone()));

        Self {
            session,
            rng,
            base_dt: config.frame_dt(),
            jitter: jitter.clamp(0.0, 0.9),
            time_secs: 0.0,
            frames: 0,
            recorder,
            export: None,
            last_snapshot: PlaybackSnapshot::default(),
            visited: BTreeSet::new(),
            kinds: HashSet::new(),
            metrics: ScenarioMetrics::default(),
        }
    }

    /// Records every frame into a [`TourExport`].
    pub fn with_export(mut self, title: &str, seed: u64) -> Self {
        self.export = Some(TourExport::new(title, seed, self.session.route()));
        self
    }

    pub fn session(&self) -> &TourSession<Arc<MemoryStore>> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TourSession<Arc<MemoryStore>> {
        &mut self.session
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Waypoints dwelt at while playing.
    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    /// Vehicle kinds shown so far.
    pub fn kinds(&self) -> &HashSet<VehicleKind> {
        &self.kinds
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn submit(&mut self, command: TransportCommand) {
        if let Some(export) = &mut self.export {
            export.add_event(self.time_secs, format!("command {:?}", command));
        }
        self.session.submit(command);
    }

    /// Runs one host frame of jittered length.
    pub fn frame(&mut self) -> Result<TourFrame, String> {
        let factor = if self.jitter > 0.0 {
            1.0 + self.rng.gen_range(-self.jitter..self.jitter)
        } else {
            1.0
        };
        self.frame_with(self.base_dt * factor)
    }

    /// Runs one host frame of exactly `dt` seconds.
    pub fn frame_with(&mut self, dt: f64) -> Result<TourFrame, String> {
        let frame = self.session.advance(dt);
        self.time_secs += dt;
        self.frames += 1;
        self.metrics.max_frame_dt = self.metrics.max_frame_dt.max(dt);

        self.check(&frame)?;

        let snapshot = frame.state.snapshot();
        if snapshot.playing && snapshot.dwelling {
            self.visited.insert(snapshot.index);
        }
        if let Some(vehicle) = &frame.vehicle {
            self.metrics.traveling_frames += 1;
            self.kinds.insert(vehicle.kind);
        }

        if let Some(export) = &mut self.export {
            if snapshot != self.last_snapshot {
                export.add_event(
                    self.time_secs,
                    format!(
                        "playing={} dwelling={} index={}",
                        snapshot.playing, snapshot.dwelling, snapshot.index
                    ),
                );
            }
            export.add_frame(TourFrameRecord::from_frame(self.time_secs, &frame));
        }
        self.last_snapshot = snapshot;

        Ok(frame)
    }

    /// Runs jittered frames until `done` holds or `max_secs` of host time
    /// pass.
    pub fn run_until(
        &mut self,
        max_secs: f64,
        mut done: impl FnMut(&TourFrame) -> bool,
    ) -> Result<TourFrame, String> {
        let deadline = self.time_secs + max_secs;
        while self.time_secs < deadline {
            let frame = self.frame()?;
            if done(&frame) {
                return Ok(frame);
            }
        }
        Err(format!(
            "condition not reached within {:.1}s (at {:?})",
            max_secs,
            self.session.state()
        ))
    }

    /// Runs jittered frames for `secs` of host time.
    pub fn run_for(&mut self, secs: f64) -> Result<(), String> {
        let deadline = self.time_secs + secs;
        while self.time_secs < deadline {
            self.frame()?;
        }
        Ok(())
    }

    /// Per-frame playback properties.
    fn check(&self, frame: &TourFrame) -> Result<(), String> {
        let route = self.session.route();
        let state = &frame.state;

        ensure(state.index < route.len(), || {
            format!("index {} out of range ({} stops)", state.index, route.len())
        })?;
        ensure((0.0..1.0).contains(&state.progress), || {
            format!("progress {} outside [0, 1)", state.progress)
        })?;

        let hop = route
            .segment(state.index)
            .filter(|segment| !segment.is_degenerate());
        let moving = state.playing && state.is_traveling() && hop.is_some();
        ensure(frame.vehicle.is_some() == moving, || {
            format!(
                "vehicle visible={} in {:?} (playing={})",
                frame.vehicle.is_some(),
                state.phase,
                state.playing
            )
        })?;
        let described = moving && hop.is_some_and(|segment| segment.has_travels());
        ensure(frame.banner.is_some() == described, || {
            format!("banner {:?} in {:?}", frame.banner, state.phase)
        })?;

        if let (Some(vehicle), Some(segment)) = (&frame.vehicle, hop.filter(|s| s.has_travels())) {
            let expected = VehicleKind::classify(&segment.travels);
            ensure(vehicle.kind == expected, || {
                format!(
                    "segment {} shows {} instead of {}",
                    state.index, vehicle.kind, expected
                )
            })?;
        }
        if let Some(sample) = &frame.sample {
            ensure(sample.segment == state.index, || {
                format!("sample from segment {} at index {}", sample.segment, state.index)
            })?;
        }
        Ok(())
    }

    /// Checks the observer log: no repeated snapshot, no repeated banner.
    pub fn check_notifications(&self) -> Result<(), String> {
        let states = self.recorder.states();
        ensure(states.windows(2).all(|w| w[0] != w[1]), || {
            "observer notified twice with the same state".to_string()
        })?;
        let banners = self.recorder.banners();
        ensure(banners.windows(2).all(|w| w[0] != w[1]), || {
            "observer notified twice with the same banner".to_string()
        })
    }

    /// Closes the run and hands back totals and the recording.
    pub fn finish(mut self, passed: bool) -> (RunStats, Option<TourExport>) {
        self.metrics.stops_visited = self.visited.len();
        self.metrics.state_changes = self.recorder.states().len();
        self.metrics.banner_changes = self.recorder.banners().len();

        if let Some(export) = &mut self.export {
            export.finalize(passed);
        }

        (
            RunStats {
                frames: self.frames,
                time_secs: self.time_secs,
                metrics: self.metrics,
            },
            self.export,
        )
    }
}

/// Backend that always fails with a server error.
struct OverloadedBackend;

#[async_trait]
impl PlanningBackend for OverloadedBackend {
    fn name(&self) -> &'static str {
        "overloaded"
    }

    async fn plan(&self, _request: &TripRequest) -> Result<Itinerary, PlannerError> {
        // Yield once so a second submission can race this one
        tokio::task::yield_now().await;
        Err(PlannerError::Status {
            code: 503,
            body: "model overloaded".to_string(),
        })
    }
}

/// Backend that answers with a document missing its day plans.
struct EmptyDocumentBackend;

#[async_trait]
impl PlanningBackend for EmptyDocumentBackend {
    fn name(&self) -> &'static str {
        "empty"
    }

    async fn plan(&self, request: &TripRequest) -> Result<Itinerary, PlannerError> {
        Ok(Itinerary {
            title: Some(format!("Trip to {}", request.destination)),
            ..Default::default()
        })
    }
}

/// Runs headless scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Playback tuning
    config: PlaybackConfig,

    /// Relative host frame jitter
    jitter: f64,

    /// Maximum host time per scenario in seconds
    max_duration_secs: f64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: PlaybackConfig::default(),
            jitter: DEFAULT_JITTER,
            max_duration_secs: 120.0,
        }
    }

    /// Sets the playback tuning.
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the host frame jitter.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    fn driver(&self, itinerary: Itinerary, stream: u64) -> TourDriver {
        TourDriver::new(
            Arc::new(itinerary),
            &self.config,
            Arc::new(MemoryStore::new()),
            SimContext::new(self.seed).rng(stream),
            self.jitter,
        )
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let outcome = match scenario {
            ScenarioId::FullTour => self.run_full_tour(),
            ScenarioId::StepThrough => self.run_step_through(),
            ScenarioId::PauseResume => self.run_pause_resume(),
            ScenarioId::SingleStop => self.run_single_stop(),
            ScenarioId::DuplicateStop => self.run_duplicate_stop(),
            ScenarioId::RestartAtEnd => self.run_restart_at_end(),
            ScenarioId::FrameStall => self.run_frame_stall(),
            ScenarioId::OfflinePlan => self.run_offline_plan(),
            ScenarioId::BackendFailure => self.run_backend_failure(),
        };

        match outcome {
            Ok(stats) => {
                info!(
                    "Scenario {} passed: {} frames, {:.1}s, {} stops visited",
                    scenario.name(),
                    stats.frames,
                    stats.time_secs,
                    stats.metrics.stops_visited
                );
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: true,
                    total_frames: stats.frames,
                    final_time_secs: stats.time_secs,
                    failure_reason: None,
                    metrics: stats.metrics,
                }
            }
            Err(reason) => {
                warn!("Scenario {} failed: {}", scenario.name(), reason);
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_frames: 0,
                    final_time_secs: 0.0,
                    failure_reason: Some(reason),
                    metrics: ScenarioMetrics::default(),
                }
            }
        }
    }

    /// Plays `itinerary` from the first stop until the tour ends.
    pub fn play_through(&self, driver: &mut TourDriver) -> Result<TourFrame, String> {
        driver.submit(TransportCommand::Play);
        driver.run_until(self.max_duration_secs, |frame| !frame.state.playing)
    }

    /// TOUR-001: the demo trip end to end.
    fn run_full_tour(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::demo_itinerary(), 1);
        let stops = driver.session().route().len();

        let last = self.play_through(&mut driver)?;
        ensure(last.state.index == 0 && last.state.phase == PlaybackPhase::Idle, || {
            format!("tour ended at {:?}", last.state)
        })?;

        let expected: BTreeSet<usize> = (0..stops).collect();
        ensure(driver.visited() == &expected, || {
            format!("visited {:?} of {} stops", driver.visited(), stops)
        })?;
        for kind in [VehicleKind::Air, VehicleKind::Rail, VehicleKind::Bus] {
            ensure(driver.kinds().contains(&kind), || format!("{} never shown", kind))?;
        }
        ensure(
            driver
                .recorder()
                .banners()
                .iter()
                .any(|b| b.as_deref() == Some("Traveling: Amtrak train to Boston South Station")),
            || "rail banner never shown".to_string(),
        )?;

        let states = driver.recorder().states();
        ensure(
            states.first()
                == Some(&PlaybackSnapshot {
                    playing: true,
                    dwelling: true,
                    index: 0,
                }),
            || format!("first notification {:?}", states.first()),
        )?;
        ensure(states.last() == Some(&PlaybackSnapshot::default()), || {
            format!("last notification {:?}", states.last())
        })?;
        driver.check_notifications()?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-002: manual stepping.
    fn run_step_through(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::demo_itinerary(), 2);
        let last = driver.session().route().last_index();

        for expected in 1..=last + 2 {
            driver.submit(TransportCommand::Next);
            let frame = driver.frame()?;
            let index = expected.min(last);
            ensure(frame.state.index == index, || {
                format!("next #{} landed on {}", expected, frame.state.index)
            })?;
            ensure(
                frame.state.is_paused_at_stop() && !frame.state.playing && frame.state.progress == 0.0,
                || format!("next left {:?}", frame.state),
            )?;
            ensure(driver.session().visible_markers().is_empty(), || {
                "panel shown while paused".to_string()
            })?;
        }

        driver.session_mut().set_hovered(Some(last));
        ensure(driver.session().visible_markers() == vec![last], || {
            format!("hover showed {:?}", driver.session().visible_markers())
        })?;
        let panels = driver.session().visible_panels();
        ensure(panels.len() == 1 && panels[0].badge == "END", || {
            format!("hover panels {:?}", panels.iter().map(|p| &p.badge).collect::<Vec<_>>())
        })?;

        for _ in 0..=last + 1 {
            driver.submit(TransportCommand::Prev);
        }
        let frame = driver.frame()?;
        ensure(frame.state.index == 0, || format!("prev stopped at {}", frame.state.index))?;

        driver.submit(TransportCommand::Play);
        driver.frame()?;
        ensure(driver.session().visible_markers() == vec![0, last], || {
            format!("dwell panels {:?}", driver.session().visible_markers())
        })?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-003: pause mid-segment, hold, resume.
    fn run_pause_resume(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::demo_itinerary(), 3);
        driver.submit(TransportCommand::Play);
        let moving = driver.run_until(self.max_duration_secs, |frame| {
            frame.state.is_traveling() && frame.state.progress > 0.3
        })?;

        driver.submit(TransportCommand::Pause);
        let paused = driver.frame()?.state;
        ensure(
            !paused.playing && paused.index == moving.state.index && paused.is_traveling(),
            || format!("pause left {:?}", paused),
        )?;

        let hold_until = driver.time_secs() + 5.0;
        while driver.time_secs() < hold_until {
            let frame = driver.frame()?;
            ensure(frame.state == paused, || {
                format!("state moved while paused: {:?}", frame.state)
            })?;
        }

        driver.submit(TransportCommand::Play);
        let resumed = driver.frame()?.state;
        ensure(
            resumed.playing && resumed.is_paused_at_stop() && resumed.index == paused.index,
            || format!("resume gave {:?}", resumed),
        )?;

        let travel = driver.run_until(self.max_duration_secs, |frame| frame.state.is_traveling())?;
        ensure(
            travel.state.index == paused.index && travel.state.progress >= paused.progress,
            || format!("resumed travel at {:?}", travel.state),
        )?;
        driver.check_notifications()?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-004: placeholder route of one stop.
    fn run_single_stop(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::no_coordinates_itinerary(), 4);
        let route = driver.session().route().clone();
        ensure(route.len() == 1, || format!("{} waypoints", route.len()))?;
        ensure(route.waypoints()[0].name == FALLBACK_NAME, || {
            format!("placeholder named {}", route.waypoints()[0].name)
        })?;

        driver.submit(TransportCommand::Play);
        driver.submit(TransportCommand::Next);
        driver.run_for(10.0)?;

        let state = *driver.session().state();
        ensure(
            state.playing && state.is_paused_at_stop() && state.index == 0 && state.dwell_timer == 0,
            || format!("single stop state {:?}", state),
        )?;
        ensure(driver.session().visible_markers() == vec![0], || {
            "placeholder panel hidden".to_string()
        })?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-005: duplicate consecutive coordinates.
    fn run_duplicate_stop(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::duplicate_stop_itinerary(), 5);
        let degenerate = driver
            .session()
            .route()
            .segment(0)
            .is_some_and(|segment| segment.is_degenerate());
        ensure(degenerate, || "first hop is not zero-length".to_string())?;

        let last = self.play_through(&mut driver)?;
        ensure(last.state.index == 0 && !last.state.playing, || {
            format!("tour ended at {:?}", last.state)
        })?;
        ensure(driver.visited().len() == 3, || {
            format!("visited {:?}", driver.visited())
        })?;
        ensure(driver.kinds().len() == 1 && driver.kinds().contains(&VehicleKind::Bus), || {
            format!("vehicles shown {:?}", driver.kinds())
        })?;
        driver.check_notifications()?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-006: play at the final stop.
    fn run_restart_at_end(&self) -> Result<RunStats, String> {
        let mut driver = self.driver(fixtures::demo_itinerary(), 6);
        let last = driver.session().route().last_index();

        for _ in 0..last {
            driver.submit(TransportCommand::Next);
        }
        let frame = driver.frame()?;
        ensure(frame.state.index == last, || format!("at {}", frame.state.index))?;

        driver.submit(TransportCommand::Play);
        let frame = driver.frame()?;
        ensure(
            frame.state.playing && frame.state.is_paused_at_stop() && frame.state.index == 0,
            || format!("play at end gave {:?}", frame.state),
        )?;

        driver.submit(TransportCommand::Stop);
        let frame = driver.frame()?;
        let start = driver
            .session()
            .route()
            .waypoint(0)
            .map(|w| w.position.normalize() * self.config.recenter_distance)
            .ok_or("route has no start")?;
        ensure((frame.camera_position - start).norm() < 1e-9, || {
            format!("camera not recentred: {:?}", frame.camera_position)
        })?;

        Ok(driver.finish(true).0)
    }

    /// TOUR-007: a 10 second host frame.
    fn run_frame_stall(&self) -> Result<RunStats, String> {
        let config = PlaybackConfig {
            dwell_frames: 180,
            ..self.config.clone()
        };
        let mut driver = TourDriver::new(
            Arc::new(fixtures::demo_itinerary()),
            &config,
            Arc::new(MemoryStore::new()),
            SimContext::new(self.seed).rng(7),
            0.0,
        );

        driver.submit(TransportCommand::Play);
        let frame = driver.frame_with(10.0)?;
        ensure(
            frame.state.is_paused_at_stop() && frame.state.dwell_timer == 120,
            || format!("stall ran {:?}", frame.state),
        )?;

        // The dropped remainder must not leak into the next frame
        let frame = driver.frame_with(1.0)?;
        ensure(
            frame.state.is_traveling() && frame.state.index == 0 && frame.state.progress == 0.0,
            || format!("after stall {:?}", frame.state),
        )?;

        Ok(driver.finish(true).0)
    }

    fn runtime() -> Result<tokio::runtime::Runtime, String> {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| format!("runtime: {}", e))
    }

    /// PLAN-001: plan on the virtual clock, persist, reload, tour.
    fn run_offline_plan(&self) -> Result<RunStats, String> {
        let ctx = SimContext::shared(self.seed);
        let planner = TripPlanner::offline(ctx.clone(), Duration::from_millis(800));
        let request = TripRequest::new("Mumbai", "Goa", TravelMode::Train, 3).with_preferences(
            Preferences::parse_free_text("budget: medium; food: local; must visit: Fort Aguada"),
        );

        let outcome = Self::runtime()?
            .block_on(planner.plan(&request))
            .map_err(|e| format!("plan failed: {}", e))?;
        debug!("Planned {:?} in {:?} virtual", outcome.itinerary.id, ctx.now());

        ensure(outcome.backend == "mock" && !outcome.used_fallback(), || {
            format!("planned by {} ({:?})", outcome.backend, outcome.fallback_reason)
        })?;
        ensure(ctx.now() == Duration::from_millis(800), || {
            format!("virtual clock at {:?}", ctx.now())
        })?;
        let expected_id = format!("trip-{}", ctx.unix_millis());
        ensure(outcome.itinerary.id.as_deref() == Some(expected_id.as_str()), || {
            format!("id {:?}", outcome.itinerary.id)
        })?;
        ensure(!planner.is_busy(), || "planner still busy".to_string())?;

        let store = Arc::new(MemoryStore::new());
        let trips = TripStore::new(store.clone());
        trips
            .save_latest(&outcome.itinerary)
            .map_err(|e| format!("save failed: {}", e))?;
        let loaded = trips.load_latest().ok_or("saved itinerary did not load")?;
        ensure(loaded == outcome.itinerary, || "reloaded itinerary differs".to_string())?;

        let mut driver = TourDriver::new(
            Arc::new(loaded),
            &self.config,
            store,
            ctx.rng(8),
            self.jitter,
        );
        ensure(
            driver.session().progress_key() == "travelitinerary:mumbai:goa:train:3",
            || format!("progress key {}", driver.session().progress_key()),
        )?;
        driver
            .session()
            .toggle_day_complete(2)
            .map_err(|e| format!("toggle failed: {}", e))?;
        ensure(
            trips.completed_days(driver.session().progress_key()) == BTreeSet::from([2]),
            || "completed day not persisted".to_string(),
        )?;

        driver.submit(TransportCommand::Play);
        driver.run_for(3.0)?;
        ensure(driver.session().state().is_paused_at_stop(), || {
            format!("mock trip tour {:?}", driver.session().state())
        })?;

        Ok(driver.finish(true).0)
    }

    /// PLAN-002: failing primary backends.
    fn run_backend_failure(&self) -> Result<RunStats, String> {
        let ctx = SimContext::shared(self.seed);
        let runtime = Self::runtime()?;
        let request = TripRequest::new("Paris", "Rome", TravelMode::Car, 2);

        let planner = TripPlanner::with_backend(
            ctx.clone(),
            Box::new(OverloadedBackend),
            Duration::from_millis(800),
        );
        let (first, second) =
            runtime.block_on(async { tokio::join!(planner.plan(&request), planner.plan(&request)) });

        ensure(matches!(second, Err(PlannerError::Busy)), || {
            format!("second submission gave {:?}", second.map(|o| o.backend))
        })?;
        let first = first.map_err(|e| format!("plan failed: {}", e))?;
        ensure(first.backend == "mock", || format!("planned by {}", first.backend))?;
        ensure(
            first
                .fallback_reason
                .as_deref()
                .is_some_and(|reason| reason.contains("503")),
            || format!("fallback reason {:?}", first.fallback_reason),
        )?;
        ensure(first.itinerary.day_plans.len() == 2, || {
            format!("{} day plans", first.itinerary.day_plans.len())
        })?;
        ensure(!planner.is_busy(), || "planner still busy".to_string())?;

        let planner = TripPlanner::with_backend(
            ctx.clone(),
            Box::new(EmptyDocumentBackend),
            Duration::from_millis(800),
        );
        let outcome = runtime
            .block_on(planner.plan(&request))
            .map_err(|e| format!("plan failed: {}", e))?;
        ensure(outcome.used_fallback() && outcome.itinerary.from == "Paris", || {
            format!("empty document gave {:?}", outcome.fallback_reason)
        })?;

        let invalid = TripRequest::new("", "Rome", TravelMode::Car, 2);
        let rejected = runtime.block_on(planner.plan(&invalid));
        ensure(matches!(rejected, Err(PlannerError::Form(_))), || {
            "blank origin was planned".to_string()
        })?;

        Ok(RunStats {
            frames: 0,
            time_secs: ctx.time_secs(),
            metrics: ScenarioMetrics::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_tour_passes() {
        let result = ScenarioRunner::new(42).run(ScenarioId::FullTour);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.stops_visited, 5);
        assert!(result.metrics.traveling_frames > 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = ScenarioRunner::new(9).run(ScenarioId::PauseResume);
        let b = ScenarioRunner::new(9).run(ScenarioId::PauseResume);
        assert!(a.passed, "{:?}", a.failure_reason);
        assert_eq!(a.total_frames, b.total_frames);
        assert_eq!(a.final_time_secs, b.final_time_secs);
    }

    #[test]
    fn test_unjittered_run() {
        let result = ScenarioRunner::new(1)
            .with_jitter(0.0)
            .run(ScenarioId::DuplicateStop);
        assert!(result.passed, "{:?}", result.failure_reason);
    }

    #[test]
    fn test_export_records_frames() {
        let runner = ScenarioRunner::new(5);
        let mut driver = TourDriver::new(
            Arc::new(fixtures::duplicate_stop_itinerary()),
            &PlaybackConfig::default(),
            Arc::new(MemoryStore::new()),
            SimContext::new(5).rng(0),
            DEFAULT_JITTER,
        )
        .with_export("duplicate", 5);
        runner.play_through(&mut driver).unwrap();

        let (stats, export) = driver.finish(true);
        let export = export.unwrap();
        assert!(export.passed);
        assert_eq!(export.frames.len() as u64, stats.frames);
        assert_eq!(export.waypoints.len(), 3);
        assert!(export.events.iter().any(|e| e.message == "command Play"));
    }
}
