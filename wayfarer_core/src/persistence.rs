//! Trip persistence on top of a [`KeyValueStore`].
//!
//! Three kinds of records, all JSON strings:
//! - the most recently planned itinerary, under [`LATEST_ITINERARY_KEY`]
//! - per-trip completed days, under [`progress_key`]
//! - a per-trip "onboarding seen" flag, under `seen:{progress key}`
//!
//! Unreadable records are treated as absent; write failures propagate.

use std::collections::BTreeSet;
use tracing::debug;

use wayfarer_env::{KeyValueStore, StoreError};

use crate::itinerary::{Itinerary, TravelMode};

/// Fixed key of the last planned itinerary.
pub const LATEST_ITINERARY_KEY: &str = "latestItinerary";

const PROGRESS_PREFIX: &str = "travelitinerary";
const SEEN_PREFIX: &str = "seen";

/// Progress key for a trip: `travelitinerary:{from}:{to}:{mode}:{days}`,
/// lowercased.
pub fn progress_key(from: &str, to: &str, mode: TravelMode, days: u32) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        PROGRESS_PREFIX,
        from.trim(),
        to.trim(),
        mode,
        days
    )
    .to_lowercase()
}

/// Typed access to the trip records of a store.
#[derive(Debug, Clone)]
pub struct TripStore<S> {
    store: S,
}

impl<S: KeyValueStore> TripStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Progress key of an itinerary (falls back to its day-plan count when
    /// the requested day count is missing).
    pub fn progress_key_for(itinerary: &Itinerary) -> String {
        let days = if itinerary.days > 0 {
            itinerary.days
        } else {
            itinerary.day_plans.len() as u32
        };
        progress_key(&itinerary.from, &itinerary.to, itinerary.travel_mode, days)
    }

    /// Overwrites the latest itinerary.
    pub fn save_latest(&self, itinerary: &Itinerary) -> Result<(), StoreError> {
        let json = serde_json::to_string(itinerary).map_err(StoreError::serialization)?;
        self.store.set(LATEST_ITINERARY_KEY, &json)
    }

    /// The latest itinerary, or None when missing or unreadable.
    pub fn load_latest(&self) -> Option<Itinerary> {
        let raw = self.read(LATEST_ITINERARY_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(itinerary) => Some(itinerary),
            Err(e) => {
                debug!("Ignoring unreadable {}: {}", LATEST_ITINERARY_KEY, e);
                None
            }
        }
    }

    pub fn clear_latest(&self) -> Result<(), StoreError> {
        self.store.remove(LATEST_ITINERARY_KEY)
    }

    /// Days marked complete for a trip; empty when missing or unreadable.
    pub fn completed_days(&self, key: &str) -> BTreeSet<u32> {
        let Some(raw) = self.read(key) else {
            return BTreeSet::new();
        };
        serde_json::from_str::<Vec<u32>>(&raw)
            .map(|days| days.into_iter().collect())
            .unwrap_or_else(|e| {
                debug!("Ignoring unreadable progress {}: {}", key, e);
                BTreeSet::new()
            })
    }

    /// Flips the completion of `day` and persists the result. Returns the
    /// new completion state of that day.
    pub fn toggle_day(&self, key: &str, day: u32) -> Result<bool, StoreError> {
        let mut days = self.completed_days(key);
        let done = if days.remove(&day) {
            false
        } else {
            days.insert(day);
            true
        };

        let list: Vec<u32> = days.into_iter().collect();
        let json = serde_json::to_string(&list).map_err(StoreError::serialization)?;
        self.store.set(key, &json)?;
        Ok(done)
    }

    pub fn is_onboarded(&self, key: &str) -> bool {
        self.read(&seen_key(key)).is_some()
    }

    pub fn mark_onboarded(&self, key: &str) -> Result<(), StoreError> {
        self.store.set(&seen_key(key), "1")
    }

    /// Reads a raw value, treating backend errors as absence.
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("Store read of {} failed: {}", key, e);
                None
            }
        }
    }
}

fn seen_key(key: &str) -> String {
    format!("{}:{}", SEEN_PREFIX, key)
}
