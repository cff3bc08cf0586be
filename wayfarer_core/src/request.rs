//! Trip request - what the entry form submits.

use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::itinerary::{Preferences, TravelMode};

/// Smallest day count the form accepts.
pub const MIN_DAYS: u32 = 1;
/// Largest day count the form accepts.
pub const MAX_DAYS: u32 = 30;

/// Parameters of a planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
    pub days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl TripRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        mode: TravelMode,
        days: u32,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode,
            days,
            preferences: None,
        }
    }

    /// Attaches a preference bundle (empty bundles are dropped).
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = (!preferences.is_empty()).then_some(preferences);
        self
    }

    /// Rejects incomplete submissions. Nothing is sent anywhere unless
    /// this passes.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.origin.trim().is_empty() {
            return Err(FormError::MissingField("origin"));
        }
        if self.destination.trim().is_empty() {
            return Err(FormError::MissingField("destination"));
        }
        if !(MIN_DAYS..=MAX_DAYS).contains(&self.days) {
            return Err(FormError::DaysOutOfRange {
                days: self.days,
                min: MIN_DAYS,
                max: MAX_DAYS,
            });
        }
        Ok(())
    }

    /// Must-visit list from the preferences, if any.
    pub fn must_visit(&self) -> &[String] {
        self.preferences
            .as_ref()
            .map(|p| p.must_visit.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_complete_request() {
        let req = TripRequest::new("Mumbai", "Goa", TravelMode::Train, 3);
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_validate_missing_fields() {
        let req = TripRequest::new("  ", "Goa", TravelMode::Train, 3);
        assert_eq!(req.validate(), Err(FormError::MissingField("origin")));

        let req = TripRequest::new("Mumbai", "", TravelMode::Train, 3);
        assert_eq!(req.validate(), Err(FormError::MissingField("destination")));
    }

    #[test]
    fn test_validate_day_range() {
        let req = TripRequest::new("Mumbai", "Goa", TravelMode::Bus, 0);
        assert!(matches!(
            req.validate(),
            Err(FormError::DaysOutOfRange { days: 0, .. })
        ));

        let req = TripRequest::new("Mumbai", "Goa", TravelMode::Bus, 31);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_preferences_are_dropped() {
        let req = TripRequest::new("A", "B", TravelMode::Car, 2)
            .with_preferences(Preferences::default());
        assert!(req.preferences.is_none());
        assert!(req.must_visit().is_empty());
    }
}
