//! Wayfarer Headless Simulator
//!
//! Runs tour playback and trip planning without a renderer or a network,
//! so every property of the playback state machine can be checked frame by
//! frame and replayed from a seed.
//!
//! # Core Principle: Nothing Real
//!
//! - **Time**: a virtual clock (`SimContext`) that moves only when the
//!   harness advances it or the planner "sleeps"
//! - **Frames**: host frame lengths jittered around 60Hz from a seeded RNG
//! - **Storage**: `MemoryStore` in place of sled
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ScenarioRunner                        │
//! │                                                             │
//! │  ┌──────────────┐   Itinerary    ┌──────────────────────┐   │
//! │  │ TripPlanner  │──────────────► │      TripStore       │   │
//! │  │ (SimContext) │                │    (MemoryStore)     │   │
//! │  └──────────────┘                └──────────┬───────────┘   │
//! │                                             │               │
//! │  ┌──────────────────────────────────────────▼────────────┐  │
//! │  │ TourDriver: jittered dt ──► TourSession::advance()    │  │
//! │  │             per-frame property checks, Recorder       │  │
//! │  └──────────────────────────────────────────┬────────────┘  │
//! │                                             ▼               │
//! │                                      TourExport (JSON)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use wayfarer_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::FullTour);
//! assert!(result.passed);
//! ```

mod context;
pub mod exporter;
pub mod fixtures;
pub mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{TourExport, TourFrameRecord};
pub use runner::{RunStats, ScenarioMetrics, ScenarioResult, ScenarioRunner, TourDriver};
pub use scenarios::ScenarioId;
