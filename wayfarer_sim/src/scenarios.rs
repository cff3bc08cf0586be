//! Headless playback and planning scenarios.

use std::fmt;
use std::str::FromStr;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// TOUR-001: Play the demo trip start to finish under frame jitter
    FullTour,

    /// TOUR-002: Next/prev stepping, clamped at both ends
    StepThrough,

    /// TOUR-003: Pause mid-segment, then resume
    PauseResume,

    /// TOUR-004: Itinerary without coordinates (placeholder stop)
    SingleStop,

    /// TOUR-005: Two consecutive days at the same coordinates
    DuplicateStop,

    /// TOUR-006: Play pressed at the last waypoint restarts the tour
    RestartAtEnd,

    /// TOUR-007: One huge host frame after a stall
    FrameStall,

    /// PLAN-001: Offline planning on the virtual clock, persisted and toured
    OfflinePlan,

    /// PLAN-002: Primary backend fails, mock itinerary takes over
    BackendFailure,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FullTour,
            ScenarioId::StepThrough,
            ScenarioId::PauseResume,
            ScenarioId::SingleStop,
            ScenarioId::DuplicateStop,
            ScenarioId::RestartAtEnd,
            ScenarioId::FrameStall,
            ScenarioId::OfflinePlan,
            ScenarioId::BackendFailure,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FullTour => "full_tour",
            ScenarioId::StepThrough => "step_through",
            ScenarioId::PauseResume => "pause_resume",
            ScenarioId::SingleStop => "single_stop",
            ScenarioId::DuplicateStop => "duplicate_stop",
            ScenarioId::RestartAtEnd => "restart_at_end",
            ScenarioId::FrameStall => "frame_stall",
            ScenarioId::OfflinePlan => "offline_plan",
            ScenarioId::BackendFailure => "backend_failure",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FullTour => "Mumbai to Washington demo trip, jittered 60Hz frames",
            ScenarioId::StepThrough => "Manual next/prev across every stop and past both ends",
            ScenarioId::PauseResume => "Pause while traveling, hold 5s, resume with a fresh dwell",
            ScenarioId::SingleStop => "No coordinates: one placeholder stop that dwells forever",
            ScenarioId::DuplicateStop => "Zero-length segment is skipped without interpolation",
            ScenarioId::RestartAtEnd => "Play at the final stop starts over from the first",
            ScenarioId::FrameStall => "10s host frame is capped instead of replayed",
            ScenarioId::OfflinePlan => "Mock plan on the virtual clock, saved, reloaded and toured",
            ScenarioId::BackendFailure => "Failing primary backend falls back to the mock itinerary",
        }
    }

    /// Returns true for scenarios that go through the planner.
    pub fn is_planning(&self) -> bool {
        matches!(self, ScenarioId::OfflinePlan | ScenarioId::BackendFailure)
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::all()
            .into_iter()
            .find(|id| id.name() == s.to_lowercase().replace('-', "_"))
            .ok_or_else(|| format!("Unknown scenario: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
        }
        assert_eq!("Full-Tour".parse::<ScenarioId>(), Ok(ScenarioId::FullTour));
        assert!("chaos".parse::<ScenarioId>().is_err());
    }
}
