//! Configuration for playback and planning.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default Gemini completion endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Environment variable holding the planning API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Playback tuning shared by the sequencer and the follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Fixed step rate used by `advance(dt)` (default: 60)
    pub frame_rate_hz: u32,

    /// Segment progress added per frame while traveling (default: 0.005)
    pub progress_per_frame: f64,

    /// Frames spent dwelling at each waypoint (default: 180, ~3s at 60Hz)
    pub dwell_frames: u32,

    /// Globe radius waypoints are projected onto (default: 5.0)
    pub globe_radius: f64,

    /// Per-frame exponential smoothing factor for the camera (default: 0.06)
    pub camera_smoothing: f64,

    /// Per-frame slerp factor for vehicle orientation (default: 0.2)
    pub vehicle_slerp: f64,

    /// Camera distance from the globe centre after `stop()` (default: 14.0)
    pub recenter_distance: f64,

    /// Segments sampled with fewer points than this count as short (default: 50)
    pub short_segment_points: usize,

    /// Camera distance multiplier on short segments (default: 0.88)
    pub short_segment_zoom: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            progress_per_frame: 0.005,
            dwell_frames: 180,
            globe_radius: 5.0,
            camera_smoothing: 0.06,
            vehicle_slerp: 0.2,
            recenter_distance: 14.0,
            short_segment_points: 50,
            short_segment_zoom: 0.88,
        }
    }
}

impl PlaybackConfig {
    /// Length of one fixed step in seconds.
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.frame_rate_hz.max(1) as f64
    }
}

/// Planning backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// API key; without one only the mock generator is used
    pub api_key: Option<String>,

    /// Completion endpoint URL
    pub endpoint: String,

    /// Optional request timeout. None leaves the bound to the HTTP stack.
    pub request_timeout_secs: Option<u64>,

    /// Simulated latency of the mock generator in milliseconds (default: 800)
    pub mock_latency_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            mock_latency_ms: 800,
        }
    }
}

impl PlannerConfig {
    /// Overlays the API key from `GEMINI_API_KEY` when set and non-empty.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
        self
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WayfarerConfig {
    pub playback: PlaybackConfig,
    pub planner: PlannerConfig,
}

impl WayfarerConfig {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_config_default() {
        let config = PlaybackConfig::default();
        assert_eq!(config.frame_rate_hz, 60);
        assert_eq!(config.dwell_frames, 180);
        assert!((config.frame_dt() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config =
            WayfarerConfig::from_json(r#"{"playback": {"dwell_frames": 30}}"#).unwrap();
        assert_eq!(config.playback.dwell_frames, 30);
        assert_eq!(config.playback.progress_per_frame, 0.005);
        assert_eq!(config.planner.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.planner.has_api_key());
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        assert!(matches!(
            WayfarerConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        assert!(matches!(
            WayfarerConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Read { .. })
        ));
    }
}
