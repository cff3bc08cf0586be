//! Info overlay - which marker panels are visible and what they show.

use crate::route::{Waypoint, WaypointRole};
use crate::sequencer::PlaybackSnapshot;

/// Activities shown on a marker panel.
pub const PANEL_ACTIVITY_LIMIT: usize = 3;

/// Whether the info panel of `marker` is shown.
///
/// Visible when the pointer hovers it, or when playback is running and
/// currently dwelling at it.
pub fn marker_visible(marker: usize, hovered: Option<usize>, snapshot: &PlaybackSnapshot) -> bool {
    hovered == Some(marker) || (snapshot.playing && snapshot.dwelling && snapshot.index == marker)
}

/// Change-only playback state notifier.
///
/// Starts from `(playing: false, dwelling: false, index: 0)`, so the very
/// first observation of an idle sequencer is not reported.
#[derive(Debug, Clone, Default)]
pub struct StateReporter {
    last: PlaybackSnapshot,
}

impl StateReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot if it differs by value from the last one
    /// reported.
    pub fn observe(&mut self, snapshot: PlaybackSnapshot) -> Option<PlaybackSnapshot> {
        if snapshot == self.last {
            return None;
        }
        self.last = snapshot;
        Some(snapshot)
    }

    pub fn last(&self) -> PlaybackSnapshot {
        self.last
    }
}

/// "Traveling: ..." banner shown while a segment is being traveled.
#[derive(Debug, Clone, Default)]
pub struct TravelBanner {
    text: Option<String>,
}

impl TravelBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current banner text; None while hidden.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Shows the banner for `modes`; None or blank modes hide it. Returns
    /// true when the visible text changed.
    pub fn update(&mut self, modes: Option<&str>) -> bool {
        let next = modes
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| format!("Traveling: {}", m));

        if next == self.text {
            return false;
        }
        self.text = next;
        true
    }
}

/// Marker accent colour by role.
pub fn marker_color(role: WaypointRole) -> &'static str {
    match role {
        WaypointRole::Start => "#4ade80",
        WaypointRole::End => "#f87171",
        WaypointRole::Stop => "#fbbf24",
    }
}

/// Rendered content of a marker's info panel.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPanel {
    pub badge: String,
    pub label: String,
    pub color: &'static str,
    pub weather_icon: Option<&'static str>,
    pub stay: Option<String>,
    pub activities: Vec<String>,
    /// First entry of every non-empty POI group, as `(group, entry)`
    pub highlights: Vec<(String, String)>,
    pub cost: Option<String>,
}

impl MarkerPanel {
    /// Builds the panel for waypoint `index` of a route of `total` stops.
    pub fn build(waypoint: &Waypoint, index: usize, total: usize) -> Self {
        let badge = if index == 0 {
            "START".to_string()
        } else if index + 1 == total {
            "END".to_string()
        } else {
            format!("DAY {}", waypoint.day.unwrap_or(index as u32))
        };

        let details = &waypoint.details;
        let highlights = details
            .pois
            .as_ref()
            .map(|pois| {
                pois.groups()
                    .into_iter()
                    .filter_map(|(group, items)| {
                        items.first().map(|first| (group.to_string(), first.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            badge,
            label: short_label(&waypoint.name).to_string(),
            color: marker_color(waypoint.role),
            weather_icon: details.weather.map(|w| w.icon()),
            stay: details.stay.clone(),
            activities: details
                .activities
                .iter()
                .take(PANEL_ACTIVITY_LIMIT)
                .cloned()
                .collect(),
            highlights,
            cost: details.approximate_cost.map(format_cost),
        }
    }
}

/// Text before the first comma, trimmed.
pub fn short_label(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// Formats a cost in rupees with thousands separators.
pub fn format_cost(cost: f64) -> String {
    let rounded = cost.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("₹{}", out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{GeoPoint, PoiGroups, Weather};
    use crate::route::WaypointDetails;
    use nalgebra::Vector3;

    fn snapshot(playing: bool, dwelling: bool, index: usize) -> PlaybackSnapshot {
        PlaybackSnapshot {
            playing,
            dwelling,
            index,
        }
    }

    #[test]
    fn test_marker_visibility_rule() {
        // Hover always wins
        assert!(marker_visible(2, Some(2), &snapshot(false, false, 0)));
        // Playing and dwelling here
        assert!(marker_visible(1, None, &snapshot(true, true, 1)));
        // Dwelling elsewhere, traveling, or paused
        assert!(!marker_visible(1, None, &snapshot(true, true, 2)));
        assert!(!marker_visible(1, None, &snapshot(true, false, 1)));
        assert!(!marker_visible(1, None, &snapshot(false, true, 1)));
        assert!(!marker_visible(1, Some(0), &snapshot(false, false, 1)));
    }

    #[test]
    fn test_reporter_emits_only_on_change() {
        let mut reporter = StateReporter::new();
        assert_eq!(reporter.observe(snapshot(false, false, 0)), None);

        let playing = snapshot(true, true, 0);
        assert_eq!(reporter.observe(playing), Some(playing));
        assert_eq!(reporter.observe(playing), None);

        let traveling = snapshot(true, false, 0);
        assert_eq!(reporter.observe(traveling), Some(traveling));
        assert_eq!(reporter.last(), traveling);
    }

    #[test]
    fn test_travel_banner() {
        let mut banner = TravelBanner::new();
        assert!(!banner.update(None));
        assert!(banner.update(Some("Flight AI-191, Taxi")));
        assert_eq!(banner.text(), Some("Traveling: Flight AI-191, Taxi"));
        assert!(!banner.update(Some("Flight AI-191, Taxi")));
        // Blank modes hide the banner
        assert!(banner.update(Some("  ")));
        assert_eq!(banner.text(), None);
        assert!(!banner.update(None));
    }

    #[test]
    fn test_marker_panel_content() {
        let waypoint = Waypoint {
            position: Vector3::new(0.0, 5.0, 0.0),
            geo: GeoPoint::new(40.7, -74.0),
            name: "New York, USA".into(),
            day: Some(2),
            role: WaypointRole::Stop,
            details: WaypointDetails {
                stay: Some("Midtown Hotel".into()),
                activities: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                travels: vec![],
                weather: Some(Weather::Rainy),
                approximate_cost: Some(12500.4),
                pois: Some(PoiGroups {
                    tourism: vec!["Central Park".into(), "MoMA".into()],
                    cafes: vec!["Blue Bottle".into()],
                    ..Default::default()
                }),
            },
        };

        let panel = MarkerPanel::build(&waypoint, 2, 4);
        assert_eq!(panel.badge, "DAY 2");
        assert_eq!(panel.label, "New York");
        assert_eq!(panel.color, "#fbbf24");
        assert_eq!(panel.weather_icon, Some("🌧️"));
        assert_eq!(panel.activities, vec!["a", "b", "c"]);
        assert_eq!(
            panel.highlights,
            vec![
                ("tourism".to_string(), "Central Park".to_string()),
                ("cafes".to_string(), "Blue Bottle".to_string()),
            ]
        );
        assert_eq!(panel.cost.as_deref(), Some("₹12,500"));

        assert_eq!(MarkerPanel::build(&waypoint, 0, 4).badge, "START");
        assert_eq!(MarkerPanel::build(&waypoint, 3, 4).badge, "END");
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0), "₹0");
        assert_eq!(format_cost(999.0), "₹999");
        assert_eq!(format_cost(1000.0), "₹1,000");
        assert_eq!(format_cost(1234567.0), "₹1,234,567");
    }
}
