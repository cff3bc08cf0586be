//! Itinerary document - the data contract produced by the planning step.
//!
//! An [`Itinerary`] is created once (by the Gemini backend or the mock
//! generator) and shared read-only behind an `Arc` by every consumer. Field
//! names follow the backend's camelCase JSON so a response body parses
//! directly into these types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// Primary mode of transport chosen on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Flight,
    Train,
    Bus,
    Car,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Flight => "flight",
            TravelMode::Train => "train",
            TravelMode::Bus => "bus",
            TravelMode::Car => "car",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flight" | "plane" | "air" => Ok(TravelMode::Flight),
            "train" | "rail" => Ok(TravelMode::Train),
            "bus" => Ok(TravelMode::Bus),
            "car" | "road" => Ok(TravelMode::Car),
            _ => Err(format!("Unknown travel mode: {}", s)),
        }
    }
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Optional geographic endpoints of the whole route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<GeoPoint>,
}

/// Landscape category of a day, used to pick island scenery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    City,
    Beach,
    Mountain,
    Forest,
    Countryside,
    #[serde(other)]
    Other,
}

impl Biome {
    /// Order in which generated days cycle through biomes.
    pub const CYCLE: [Biome; 5] = [
        Biome::City,
        Biome::Beach,
        Biome::Mountain,
        Biome::Forest,
        Biome::Countryside,
    ];

    /// Biome assigned to the 1-based `day` by the cyclic rule.
    pub fn cyclic(day: u32) -> Biome {
        let idx = (day.saturating_sub(1) as usize) % Self::CYCLE.len();
        Self::CYCLE[idx]
    }

    /// Biomes that get a hotel building rather than only nature props.
    pub fn has_hotel(&self) -> bool {
        matches!(self, Biome::City | Biome::Beach)
    }
}

/// Weather tag of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Cloudy,
    #[serde(rename = "partly cloudy")]
    PartlyCloudy,
    Rainy,
    #[serde(other)]
    Other,
}

impl Weather {
    pub fn icon(&self) -> &'static str {
        match self {
            Weather::Sunny => "☀️",
            Weather::Cloudy => "☁️",
            Weather::PartlyCloudy => "⛅",
            Weather::Rainy => "🌧️",
            Weather::Other => "🌤️",
        }
    }
}

/// Points of interest grouped by named category.
///
/// The four categories the backend is asked for have their own fields;
/// anything else it returns lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoiGroups {
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_list")]
    pub tourism: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_list")]
    pub food: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_list")]
    pub cafes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_list")]
    pub nature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_list")]
    pub history: Vec<String>,
    /// Other groups; entries that are not lists of strings are dropped
    #[serde(flatten, deserialize_with = "string_groups")]
    pub extra: BTreeMap<String, Vec<String>>,
}

impl PoiGroups {
    /// Non-empty groups in display order, named groups first.
    pub fn groups(&self) -> Vec<(&str, &[String])> {
        let mut out: Vec<(&str, &[String])> = vec![
            ("tourism", self.tourism.as_slice()),
            ("food", self.food.as_slice()),
            ("cafes", self.cafes.as_slice()),
            ("nature", self.nature.as_slice()),
            ("history", self.history.as_slice()),
        ];
        out.extend(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_slice())));
        out.retain(|(_, items)| !items.is_empty());
        out
    }

    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }
}

/// One day of the trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based, unique, sequential
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Accommodation label
    #[serde(default)]
    pub stay: String,
    #[serde(default)]
    pub activities: Vec<String>,
    /// Transport descriptions, in order
    #[serde(default)]
    pub travels: Vec<String>,
    #[serde(default)]
    pub food: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_amount")]
    pub approximate_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biome: Option<Biome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pois: Option<PoiGroups>,
}

impl DayPlan {
    /// Display name: the location if known, otherwise "Day N".
    pub fn display_name(&self) -> String {
        match &self.location {
            Some(loc) if !loc.trim().is_empty() => loc.clone(),
            _ => format!("Day {}", self.day),
        }
    }

    /// All travel descriptions joined, lowercased (keyword matching input).
    pub fn travel_text(&self) -> String {
        self.travels.join(" ").to_lowercase()
    }
}

/// Budget tier preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

/// Comfort tier preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComfortTier {
    Basic,
    Standard,
    Premium,
}

/// Optional preference bundle sent with a planning request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_visit: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comfort: Option<ComfortTier>,
}

impl Preferences {
    /// Parses the form's free-text box, e.g.
    /// `"budget: medium; food: local; must visit: Louvre, Orsay"`.
    ///
    /// Unknown keys and unparseable tiers are ignored.
    pub fn parse_free_text(text: &str) -> Self {
        let mut prefs = Preferences::default();

        for clause in text.split(';') {
            let Some((key, value)) = clause.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase().replace(['-', '_'], " ");
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "budget" => {
                    prefs.budget = match value.to_lowercase().as_str() {
                        "low" | "cheap" => Some(BudgetTier::Low),
                        "medium" | "mid" => Some(BudgetTier::Medium),
                        "high" | "luxury" => Some(BudgetTier::High),
                        _ => prefs.budget,
                    }
                }
                "food" => prefs.food = Some(value.to_string()),
                "must visit" | "mustvisit" | "visit" => {
                    prefs.must_visit.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from),
                    );
                }
                "comfort" => {
                    prefs.comfort = match value.to_lowercase().as_str() {
                        "basic" => Some(ComfortTier::Basic),
                        "standard" => Some(ComfortTier::Standard),
                        "premium" => Some(ComfortTier::Premium),
                        _ => prefs.comfort,
                    }
                }
                _ => {}
            }
        }

        prefs
    }

    pub fn is_empty(&self) -> bool {
        *self == Preferences::default()
    }
}

/// The complete itinerary document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Case-insensitive; unknown modes read as the default
    #[serde(default, deserialize_with = "lenient_mode")]
    pub travel_mode: TravelMode,
    /// Requested day count
    #[serde(default)]
    pub days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    /// Chronological order; immutable once produced
    #[serde(default)]
    pub day_plans: Vec<DayPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_amount")]
    pub total_estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<RouteEndpoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Itinerary {
    /// Checks the day-plan invariants: at least one day, and `day` fields
    /// running 1, 2, 3, ... in order.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.day_plans.is_empty() {
            return Err(PlannerError::invalid("itinerary has no day plans"));
        }

        for (idx, plan) in self.day_plans.iter().enumerate() {
            let expected = idx as u32 + 1;
            if plan.day != expected {
                return Err(PlannerError::invalid(format!(
                    "day plan #{} has day {} (expected {})",
                    idx, plan.day, expected
                )));
            }
        }

        Ok(())
    }

    /// Sum of the per-day cost estimates.
    pub fn estimated_total(&self) -> f64 {
        self.day_plans
            .iter()
            .filter_map(|d| d.approximate_cost)
            .sum()
    }

    /// Destination label for display (explicit destination or `to`).
    pub fn destination_label(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.to)
    }

    /// Looks up a day plan by its 1-based day index.
    pub fn day(&self, day: u32) -> Option<&DayPlan> {
        self.day_plans.iter().find(|d| d.day == day)
    }
}

// Backend documents are model output: a stray type in a field the tour only
// displays must not sink the whole itinerary.

fn lenient_mode<'de, D: Deserializer<'de>>(d: D) -> Result<TravelMode, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(text) => text.parse().unwrap_or_default(),
        _ => TravelMode::default(),
    })
}

/// Numbers, or strings such as `"5000"` / `"₹12,500"`; anything else is None.
fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => {
            let digits: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

fn strings(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s]),
        _ => None,
    }
}

fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(strings(Value::deserialize(d)?).unwrap_or_default())
}

fn string_groups<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
    let raw = BTreeMap::<String, Value>::deserialize(d)?;
    Ok(raw
        .into_iter()
        .filter(|(_, value)| value.is_array())
        .filter_map(|(key, value)| strings(value).map(|list| (key, list)))
        .collect())
}
