//! Error types for planning, form validation and configuration.

use thiserror::Error;

/// Form validation errors, raised before any planning call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Day count {days} is outside {min}..={max}")]
    DaysOutOfRange { days: u32, min: u32, max: u32 },
}

/// Planning errors.
///
/// Backend failures (`Http` through `InvalidItinerary`) never reach the
/// caller of `TripPlanner::plan`: they are logged and masked by the mock
/// generator. `Busy` and `Form` are the only errors a caller sees.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Backend returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("No content generated")]
    EmptyResponse,

    #[error("Malformed itinerary JSON: {0}")]
    MalformedJson(String),

    #[error("Invalid itinerary: {0}")]
    InvalidItinerary(String),

    #[error("A plan request is already in flight")]
    Busy,

    #[error(transparent)]
    Form(#[from] FormError),
}

impl PlannerError {
    /// Creates an invalid-itinerary error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidItinerary(msg.into())
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedJson(e.to_string())
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
