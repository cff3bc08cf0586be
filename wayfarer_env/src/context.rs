//! Core environment context trait for Wayfarer hosts.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The interface to the clock of the "real world".
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and the system clock
/// - **Simulation**: `SimContext` (in `wayfarer_sim`) - a virtual clock that
///   only moves when the harness advances it
///
/// # Determinism
///
/// The planner's simulated latency and the itinerary ids it stamps both go
/// through this trait, so a simulated run never waits on a real timer and
/// always produces the same documents.
#[async_trait]
pub trait WayfarerContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time (used for itinerary ids).
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock and returns immediately
    async fn sleep(&self, duration: Duration);

    /// Milliseconds since the Unix epoch according to `system_time()`.
    fn unix_millis(&self) -> u64 {
        self.system_time()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
