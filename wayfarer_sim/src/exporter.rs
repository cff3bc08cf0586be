//! JSON exporter for recorded tours.
//!
//! Exports headless playback frames as JSON so a tour can be replayed or
//! plotted outside the simulator.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

use wayfarer_core::route::Route;
use wayfarer_core::sequencer::PlaybackPhase;
use wayfarer_core::session::TourFrame;

/// A point in globe space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vector3<f64>> for Position {
    fn from(v: Vector3<f64>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// A waypoint marker as placed on the globe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub lat: f64,
    pub lng: f64,
    pub position: Position,
}

/// Vehicle pose in a recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub kind: String,
    pub position: Position,
    pub scale: f64,
}

/// A single recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourFrameRecord {
    /// Host time in seconds
    pub time_sec: f64,
    pub index: usize,
    pub phase: String,
    pub progress: f64,
    pub playing: bool,
    pub camera: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl TourFrameRecord {
    pub fn from_frame(time_sec: f64, frame: &TourFrame) -> Self {
        let phase = match frame.state.phase {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Dwelling => "dwelling",
            PlaybackPhase::Traveling => "traveling",
        };
        Self {
            time_sec,
            index: frame.state.index,
            phase: phase.to_string(),
            progress: frame.state.progress,
            playing: frame.state.playing,
            camera: frame.camera_position.into(),
            vehicle: frame.vehicle.map(|v| VehicleRecord {
                kind: v.kind.as_str().to_string(),
                position: v.position.into(),
                scale: v.scale,
            }),
            banner: frame.banner.clone(),
        }
    }
}

/// Notable event (state change, banner change, command).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourEvent {
    pub time_sec: f64,
    pub message: String,
}

/// Complete tour export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourExport {
    /// Scenario or itinerary title
    pub title: String,

    /// Seed used for frame jitter
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    pub waypoints: Vec<WaypointRecord>,

    /// All frames
    pub frames: Vec<TourFrameRecord>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TourEvent>,

    /// Final results
    pub passed: bool,
}

impl TourExport {
    /// Creates a new export container with the route's markers.
    pub fn new(title: &str, seed: u64, route: &Route) -> Self {
        let waypoints = route
            .waypoints()
            .iter()
            .map(|w| WaypointRecord {
                name: w.name.clone(),
                day: w.day,
                lat: w.geo.lat,
                lng: w.geo.lng,
                position: w.position.into(),
            })
            .collect();

        Self {
            title: title.to_string(),
            seed,
            duration_sec: 0.0,
            waypoints,
            frames: Vec::new(),
            events: Vec::new(),
            passed: false,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: TourFrameRecord) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    pub fn add_event(&mut self, time_sec: f64, message: impl Into<String>) {
        self.events.push(TourEvent {
            time_sec,
            message: message.into(),
        });
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
