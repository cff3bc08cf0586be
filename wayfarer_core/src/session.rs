//! Tour Session - hosts playback of one itinerary.
//!
//! Ties the route, the sequencer, the follower rigs and the overlay
//! together behind one per-frame entry point, and gives the controls
//! surface a command queue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TourSession                           │
//! │                                                              │
//! │  submit(cmd) ──► pending queue                               │
//! │                        │ drained at the start of advance()   │
//! │                        ▼                                     │
//! │  ┌────────────┐  ┌────────────────┐  ┌─────────────────────┐ │
//! │  │   Route    │─►│   Sequencer    │─►│ CameraRig/VehicleRig│ │
//! │  │ (Arc, r/o) │  │ index/progress │  │  follow the sample  │ │
//! │  └────────────┘  └────────────────┘  └─────────────────────┘ │
//! │                        │                                     │
//! │                        ▼                                     │
//! │           StateReporter / TravelBanner ──► observers         │
//! │                                                              │
//! │  TripStore<S>: completed days, onboarding flag               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are applied between frames, never in the middle of one.

use nalgebra::{UnitQuaternion, Vector3};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

use wayfarer_env::{KeyValueStore, StoreError};

use crate::config::PlaybackConfig;
use crate::follower::{CameraRig, VehicleKind, VehicleRig};
use crate::itinerary::Itinerary;
use crate::overlay::{marker_visible, MarkerPanel, StateReporter, TravelBanner};
use crate::persistence::TripStore;
use crate::route::Route;
use crate::sequencer::{
    PlaybackSequencer, PlaybackSnapshot, PlaybackState, TransportCommand, Transport, TravelSample,
};

/// Receives playback notifications from a session.
pub trait PlaybackObserver: Send {
    /// Called when `(playing, dwelling, index)` changes.
    fn on_state_change(&mut self, snapshot: PlaybackSnapshot);

    /// Called when the travel banner appears, changes or hides.
    fn on_banner(&mut self, _text: Option<&str>) {}
}

/// Vehicle pose for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePose {
    pub kind: VehicleKind,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub scale: f64,
}

/// Everything a renderer needs after one `advance`.
#[derive(Debug, Clone, PartialEq)]
pub struct TourFrame {
    pub state: PlaybackState,
    pub sample: Option<TravelSample>,
    pub camera_position: Vector3<f64>,
    pub camera_look_at: Vector3<f64>,
    /// None while the vehicle is hidden
    pub vehicle: Option<VehiclePose>,
    pub banner: Option<String>,
}

/// Playback host for a single itinerary.
pub struct TourSession<S: KeyValueStore> {
    itinerary: Arc<Itinerary>,
    route: Arc<Route>,
    sequencer: PlaybackSequencer,
    camera: CameraRig,
    vehicle: VehicleRig,
    reporter: StateReporter,
    banner: TravelBanner,
    hovered: Option<usize>,
    pending: VecDeque<TransportCommand>,
    observers: Vec<Box<dyn PlaybackObserver>>,
    trips: TripStore<S>,
    progress_key: String,
}

impl<S: KeyValueStore> TourSession<S> {
    /// Creates a stopped session over `itinerary`.
    pub fn new(itinerary: Arc<Itinerary>, config: &PlaybackConfig, store: S) -> Self {
        let route = Arc::new(Route::from_itinerary(&itinerary, config.globe_radius));
        let progress_key = TripStore::<S>::progress_key_for(&itinerary);

        let mut camera = CameraRig::new(config);
        if let Some(start) = route.waypoint(0) {
            camera.recenter(&start.position);
        }

        Self {
            sequencer: PlaybackSequencer::new(route.clone(), config),
            itinerary,
            route,
            camera,
            vehicle: VehicleRig::new(config),
            reporter: StateReporter::new(),
            banner: TravelBanner::new(),
            hovered: None,
            pending: VecDeque::new(),
            observers: Vec::new(),
            trips: TripStore::new(store),
            progress_key,
        }
    }

    pub fn itinerary(&self) -> &Arc<Itinerary> {
        &self.itinerary
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn state(&self) -> &PlaybackState {
        self.sequencer.state()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn vehicle(&self) -> &VehicleRig {
        &self.vehicle
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.text()
    }

    pub fn progress_key(&self) -> &str {
        &self.progress_key
    }

    pub fn add_observer(&mut self, observer: Box<dyn PlaybackObserver>) {
        self.observers.push(observer);
    }

    /// Queues a transport command for the next frame.
    pub fn submit(&mut self, command: TransportCommand) {
        self.pending.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Sets the hovered marker. Out-of-range indices clear the hover.
    pub fn set_hovered(&mut self, marker: Option<usize>) {
        self.hovered = marker.filter(|&i| i < self.route.len());
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Markers whose info panel is currently shown.
    pub fn visible_markers(&self) -> Vec<usize> {
        let snapshot = self.sequencer.snapshot();
        (0..self.route.len())
            .filter(|&i| marker_visible(i, self.hovered, &snapshot))
            .collect()
    }

    /// Panel content of every visible marker.
    pub fn visible_panels(&self) -> Vec<MarkerPanel> {
        let total = self.route.len();
        self.visible_markers()
            .into_iter()
            .filter_map(|i| {
                self.route
                    .waypoint(i)
                    .map(|waypoint| MarkerPanel::build(waypoint, i, total))
            })
            .collect()
    }

    /// Runs one host frame of `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> TourFrame {
        while let Some(command) = self.pending.pop_front() {
            self.sequencer.apply(command);
            if command == TransportCommand::Stop {
                if let Some(start) = self.route.waypoint(0) {
                    self.camera.recenter(&start.position);
                }
            }
        }

        let sample = self.sequencer.advance(dt);
        let state = *self.sequencer.state();
        let route = self.route.clone();

        if state.playing && state.is_traveling() {
            // The frame that ends a dwell has no sample yet; use the segment start
            let travel = sample.or_else(|| {
                route
                    .segment(state.index)
                    .filter(|segment| !segment.is_degenerate())
                    .map(|segment| TravelSample {
                        segment: state.index,
                        progress: state.progress,
                        sample: segment.sample(state.progress),
                    })
            });
            match travel.and_then(|t| route.segment(t.segment).map(|segment| (t, segment))) {
                Some((travel, segment)) => {
                    // A hop with no travel notes keeps whatever vehicle was last shown
                    let (kind, label) = if segment.has_travels() {
                        (VehicleKind::classify(&segment.travels), Some(segment.travel_label()))
                    } else {
                        (self.vehicle.kind(), None)
                    };
                    self.camera
                        .follow(&travel.sample.point, kind, segment.points.len());
                    self.vehicle.update(&travel.sample, kind);
                    self.update_banner(label.as_deref());
                }
                None => {
                    // Zero-length hop: nothing to show before arrival
                    self.vehicle.hide();
                    self.update_banner(None);
                }
            }
        } else {
            self.vehicle.hide();
            self.update_banner(None);
            if state.playing && state.is_paused_at_stop() {
                if let Some(marker) = route.waypoint(state.index) {
                    self.camera.focus(&marker.position);
                }
            }
        }

        if let Some(snapshot) = self.reporter.observe(state.snapshot()) {
            debug!(
                "Playback changed: playing={} dwelling={} index={}",
                snapshot.playing, snapshot.dwelling, snapshot.index
            );
            for observer in &mut self.observers {
                observer.on_state_change(snapshot);
            }
        }

        TourFrame {
            state,
            sample,
            camera_position: self.camera.position(),
            camera_look_at: self.camera.look_at(),
            vehicle: self.vehicle.is_visible().then(|| VehiclePose {
                kind: self.vehicle.kind(),
                position: self.vehicle.position(),
                orientation: self.vehicle.orientation(),
                scale: self.vehicle.scale(),
            }),
            banner: self.banner.text().map(String::from),
        }
    }

    fn update_banner(&mut self, modes: Option<&str>) {
        if self.banner.update(modes) {
            let text = self.banner.text();
            for observer in &mut self.observers {
                observer.on_banner(text);
            }
        }
    }

    /// Days marked complete for this trip.
    pub fn completed_days(&self) -> BTreeSet<u32> {
        self.trips.completed_days(&self.progress_key)
    }

    /// Flips the completion of `day`; returns its new state.
    pub fn toggle_day_complete(&self, day: u32) -> Result<bool, StoreError> {
        self.trips.toggle_day(&self.progress_key, day)
    }

    pub fn is_onboarded(&self) -> bool {
        self.trips.is_onboarded(&self.progress_key)
    }

    pub fn mark_onboarded(&self) -> Result<(), StoreError> {
        self.trips.mark_onboarded(&self.progress_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{DayPlan, GeoPoint, RouteEndpoints, TravelMode};
    use std::sync::Mutex;
    use wayfarer_env::MemoryStore;

    const DT: f64 = 1.0 / 60.0;

    fn itinerary() -> Arc<Itinerary> {
        let day = |day: u32, lat: f64, lng: f64, travel: &str| DayPlan {
            day,
            location: Some(format!("Stop {}, Somewhere", day)),
            coordinates: Some(GeoPoint::new(lat, lng)),
            travels: vec![travel.to_string()],
            ..Default::default()
        };

        Arc::new(Itinerary {
            from: "Mumbai".into(),
            to: "Washington".into(),
            travel_mode: TravelMode::Flight,
            days: 2,
            coordinates: Some(RouteEndpoints {
                start: Some(GeoPoint::new(19.07, 72.87)),
                end: None,
            }),
            day_plans: vec![
                day(1, 40.71, -74.0, "Flight AI-191 to JFK"),
                day(2, 42.36, -71.05, "Amtrak train to Boston"),
            ],
            ..Default::default()
        })
    }

    fn session() -> TourSession<MemoryStore> {
        TourSession::new(itinerary(), &PlaybackConfig::default(), MemoryStore::new())
    }

    #[derive(Default)]
    struct Recorder {
        states: Arc<Mutex<Vec<PlaybackSnapshot>>>,
        banners: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl PlaybackObserver for Recorder {
        fn on_state_change(&mut self, snapshot: PlaybackSnapshot) {
            self.states.lock().unwrap().push(snapshot);
        }

        fn on_banner(&mut self, text: Option<&str>) {
            self.banners.lock().unwrap().push(text.map(String::from));
        }
    }

    #[test]
    fn test_commands_apply_at_next_frame() {
        let mut s = session();
        s.submit(TransportCommand::Play);
        assert!(!s.state().playing);
        assert_eq!(s.pending_commands(), 1);

        let frame = s.advance(0.0);
        assert!(frame.state.playing);
        assert!(frame.state.is_paused_at_stop());
        assert_eq!(s.pending_commands(), 0);
    }

    #[test]
    fn test_observers_see_each_change_once() {
        let mut s = session();
        let recorder = Recorder::default();
        let states = recorder.states.clone();
        let banners = recorder.banners.clone();
        s.add_observer(Box::new(recorder));

        s.advance(DT);
        assert!(states.lock().unwrap().is_empty());

        s.submit(TransportCommand::Play);
        for _ in 0..400 {
            s.advance(DT);
        }

        let states = states.lock().unwrap().clone();
        assert_eq!(
            states[0],
            PlaybackSnapshot {
                playing: true,
                dwelling: true,
                index: 0
            }
        );
        assert_eq!(
            states[1],
            PlaybackSnapshot {
                playing: true,
                dwelling: false,
                index: 0
            }
        );
        assert!(states.windows(2).all(|w| w[0] != w[1]));

        let banners = banners.lock().unwrap().clone();
        assert_eq!(banners[0].as_deref(), Some("Traveling: Flight AI-191 to JFK"));
    }

    #[test]
    fn test_vehicle_and_banner_only_while_traveling() {
        let mut s = session();
        s.submit(TransportCommand::Play);

        let frame = s.advance(DT);
        assert!(frame.vehicle.is_none());
        assert!(frame.banner.is_none());

        let mut traveling = None;
        for _ in 0..300 {
            let frame = s.advance(DT);
            if frame.state.is_traveling() {
                traveling = Some(frame);
                break;
            }
        }
        let frame = traveling.expect("tour reaches a traveling frame");
        let vehicle = frame.vehicle.expect("vehicle visible while traveling");
        assert_eq!(vehicle.kind, VehicleKind::Air);
        assert_eq!(vehicle.scale, 0.4);

        s.submit(TransportCommand::Pause);
        let frame = s.advance(DT);
        assert!(frame.vehicle.is_none());
        assert!(frame.banner.is_none());
    }

    #[test]
    fn test_stop_recenters_camera() {
        let mut s = session();
        let start = s.route().waypoint(0).unwrap().position;
        s.submit(TransportCommand::Play);
        for _ in 0..250 {
            s.advance(DT);
        }
        assert!(s.state().is_traveling());

        s.submit(TransportCommand::Stop);
        let frame = s.advance(DT);
        assert_eq!(frame.state.index, 0);
        assert!(!frame.state.playing);
        let expected = start.normalize() * PlaybackConfig::default().recenter_distance;
        assert!((frame.camera_position - expected).norm() < 1e-9);
    }

    #[test]
    fn test_hover_and_dwell_panels() {
        let mut s = session();
        s.set_hovered(Some(2));
        let panels = s.visible_panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label, "Stop 2");
        assert_eq!(panels[0].badge, "END");

        s.set_hovered(Some(99));
        assert_eq!(s.hovered(), None);

        s.submit(TransportCommand::Next);
        s.submit(TransportCommand::Play);
        s.advance(0.0);
        assert_eq!(s.visible_markers(), vec![1]);
        assert_eq!(s.visible_panels()[0].badge, "DAY 1");
    }

    #[test]
    fn test_zero_length_hop_shows_no_vehicle() {
        let spot = GeoPoint::new(15.3, 74.1);
        let itinerary = Arc::new(Itinerary {
            day_plans: vec![
                DayPlan {
                    day: 1,
                    coordinates: Some(spot),
                    ..Default::default()
                },
                DayPlan {
                    day: 2,
                    coordinates: Some(spot),
                    travels: vec!["Stay put".into()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let config = PlaybackConfig {
            dwell_frames: 3,
            ..PlaybackConfig::default()
        };
        let mut s = TourSession::new(itinerary, &config, MemoryStore::new());
        s.submit(TransportCommand::Play);

        let mut reached = false;
        for _ in 0..20 {
            let frame = s.advance(DT);
            assert!(frame.vehicle.is_none());
            assert!(frame.banner.is_none());
            reached |= frame.state.index == 1;
        }
        assert!(reached);
    }

    #[test]
    fn test_hop_without_travels_keeps_vehicle_and_hides_banner() {
        let itinerary = Arc::new(Itinerary {
            coordinates: Some(RouteEndpoints {
                start: Some(GeoPoint::new(19.07, 72.87)),
                end: None,
            }),
            day_plans: vec![
                DayPlan {
                    day: 1,
                    coordinates: Some(GeoPoint::new(40.71, -74.0)),
                    travels: vec!["Flight AI-191 to JFK".into()],
                    ..Default::default()
                },
                DayPlan {
                    day: 2,
                    coordinates: Some(GeoPoint::new(42.36, -71.05)),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let config = PlaybackConfig {
            dwell_frames: 2,
            progress_per_frame: 0.1,
            ..PlaybackConfig::default()
        };
        let mut s = TourSession::new(itinerary, &config, MemoryStore::new());
        s.submit(TransportCommand::Play);

        let mut second_hop = Vec::new();
        for _ in 0..100 {
            let frame = s.advance(DT);
            if frame.state.is_traveling() && frame.state.index == 1 {
                second_hop.push(frame.clone());
            }
            if !frame.state.playing {
                break;
            }
        }

        assert!(!second_hop.is_empty());
        for frame in second_hop {
            assert!(frame.banner.is_none());
            assert_eq!(frame.vehicle.map(|v| v.kind), Some(VehicleKind::Air));
        }
    }

    #[test]
    fn test_progress_through_store() {
        let s = session();
        assert!(s.completed_days().is_empty());
        assert!(s.toggle_day_complete(1).unwrap());
        assert_eq!(s.completed_days(), BTreeSet::from([1]));
        assert_eq!(s.progress_key(), "travelitinerary:mumbai:washington:flight:2");

        assert!(!s.is_onboarded());
        s.mark_onboarded().unwrap();
        assert!(s.is_onboarded());
    }
}
