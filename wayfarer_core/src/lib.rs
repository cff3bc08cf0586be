//! Wayfarer Core - trip itinerary planning and engine-agnostic tour playback
//!
//! This library covers the whole path from a trip request to an animated
//! tour of the resulting itinerary:
//! 1. **Planning**: a completion backend with a deterministic mock fallback
//! 2. **Projection**: day plans placed on a globe and joined by arced segments
//! 3. **Playback**: a dwell/travel sequencer driven by any render loop, with a
//!    chase camera, a vehicle and an info overlay following it
//!
//! Persistence and time go through `wayfarer_env`, so the same code runs
//! against sled and tokio in production or a virtual clock in simulation.

pub mod config;
pub mod error;
pub mod follower;
pub mod island;
pub mod itinerary;
pub mod overlay;
pub mod persistence;
pub mod planner;
pub mod request;
pub mod route;
pub mod sequencer;
pub mod session;
pub mod view;

// Re-export key types for convenience
pub use config::{PlannerConfig, PlaybackConfig, WayfarerConfig};
pub use error::{ConfigError, FormError, PlannerError};
pub use follower::{CameraRig, VehicleKind, VehicleRig};
pub use island::{IslandCamera, IslandPath};
pub use itinerary::{DayPlan, GeoPoint, Itinerary, Preferences, TravelMode};
pub use overlay::{marker_visible, MarkerPanel, StateReporter, TravelBanner};
pub use persistence::TripStore;
pub use planner::{MockPlanner, PlanOutcome, PlanningBackend, TripPlanner};
pub use request::TripRequest;
pub use route::{Route, Segment, Waypoint};
pub use sequencer::{
    PlaybackPhase, PlaybackSequencer, PlaybackSnapshot, PlaybackState, Transport,
    TransportCommand, TravelSample,
};
pub use session::{PlaybackObserver, TourFrame, TourSession};
pub use view::{DayCard, Screen, TimelineDot, TripSummary, ViewMode};
