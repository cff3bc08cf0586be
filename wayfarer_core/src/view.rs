//! Presentation helpers for the itinerary screens.
//!
//! Everything here is derived data: screen routing, the trip summary, list
//! view day cards and the progress rail.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::itinerary::{Biome, Itinerary, TravelMode, Weather};
use crate::overlay::format_cost;

/// Which itinerary view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Map,
    List,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Map => ViewMode::List,
            ViewMode::List => ViewMode::Map,
        }
    }
}

/// Top-level screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Trip entry form
    Form,
    /// Itinerary tour
    Tour(Arc<Itinerary>),
}

impl Screen {
    /// The itinerary screen without an itinerary redirects to the form.
    pub fn resolve(itinerary: Option<Arc<Itinerary>>) -> Self {
        match itinerary {
            Some(itinerary) => Screen::Tour(itinerary),
            None => Screen::Form,
        }
    }
}

/// Header figures for an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub title: String,
    pub destination: String,
    pub days: usize,
    pub mode: TravelMode,
    pub estimated_total: f64,
    pub estimated_total_label: String,
    pub completed: usize,
}

impl TripSummary {
    pub fn new(itinerary: &Itinerary, completed: &BTreeSet<u32>) -> Self {
        let estimated_total = itinerary
            .total_estimated_cost
            .unwrap_or_else(|| itinerary.estimated_total());
        let days = itinerary.day_plans.len();

        Self {
            title: itinerary.title.clone().unwrap_or_else(|| {
                format!("{} to {}", itinerary.from, itinerary.destination_label())
            }),
            destination: itinerary.destination_label().to_string(),
            days,
            mode: itinerary.travel_mode,
            estimated_total,
            estimated_total_label: format_cost(estimated_total),
            completed: itinerary
                .day_plans
                .iter()
                .filter(|d| completed.contains(&d.day))
                .count(),
        }
    }

    /// Fraction of days marked complete, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.days == 0 {
            0.0
        } else {
            self.completed as f64 / self.days as f64
        }
    }
}

/// State of a day on the progress rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineDot {
    Done,
    Current,
    Upcoming,
}

impl TimelineDot {
    pub fn for_day(day: u32, current: Option<u32>, completed: &BTreeSet<u32>) -> Self {
        if completed.contains(&day) {
            TimelineDot::Done
        } else if current == Some(day) {
            TimelineDot::Current
        } else {
            TimelineDot::Upcoming
        }
    }
}

/// One day in the list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub day: u32,
    pub heading: String,
    pub date: Option<String>,
    pub stay: String,
    pub activities: Vec<String>,
    pub travels: Vec<String>,
    pub food: Vec<String>,
    pub cost: Option<String>,
    pub weather_icon: Option<&'static str>,
    pub biome: Option<Biome>,
    pub dot: TimelineDot,
    pub completed: bool,
}

impl DayCard {
    /// Cards for every day, in order.
    pub fn build_all(
        itinerary: &Itinerary,
        current: Option<u32>,
        completed: &BTreeSet<u32>,
    ) -> Vec<DayCard> {
        itinerary
            .day_plans
            .iter()
            .map(|plan| DayCard {
                day: plan.day,
                heading: format!("Day {}: {}", plan.day, plan.display_name()),
                date: plan.date.clone(),
                stay: plan.stay.clone(),
                activities: plan.activities.clone(),
                travels: plan.travels.clone(),
                food: plan.food.clone(),
                cost: plan.approximate_cost.map(format_cost),
                weather_icon: plan.weather.map(|w: Weather| w.icon()),
                biome: plan.biome,
                dot: TimelineDot::for_day(plan.day, current, completed),
                completed: completed.contains(&plan.day),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::DayPlan;

    fn itinerary() -> Itinerary {
        Itinerary {
            from: "Delhi".into(),
            to: "Jaipur".into(),
            travel_mode: TravelMode::Car,
            days: 3,
            day_plans: (1..=3)
                .map(|day| DayPlan {
                    day,
                    stay: format!("Haveli {}", day),
                    approximate_cost: Some(1500.0),
                    weather: Some(Weather::Sunny),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_view_mode_toggle() {
        assert_eq!(ViewMode::default().toggle(), ViewMode::List);
        assert_eq!(ViewMode::List.toggle(), ViewMode::Map);
    }

    #[test]
    fn test_screen_redirects_without_itinerary() {
        assert_eq!(Screen::resolve(None), Screen::Form);
        assert!(matches!(
            Screen::resolve(Some(Arc::new(itinerary()))),
            Screen::Tour(_)
        ));
    }

    #[test]
    fn test_summary() {
        let completed = BTreeSet::from([1, 3, 9]);
        let summary = TripSummary::new(&itinerary(), &completed);
        assert_eq!(summary.title, "Delhi to Jaipur");
        assert_eq!(summary.days, 3);
        assert_eq!(summary.estimated_total, 4500.0);
        assert_eq!(summary.estimated_total_label, "₹4,500");
        assert_eq!(summary.completed, 2);
        assert!((summary.progress() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_day_cards_and_dots() {
        let completed = BTreeSet::from([1]);
        let cards = DayCard::build_all(&itinerary(), Some(2), &completed);

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].heading, "Day 1: Day 1");
        assert_eq!(cards[0].dot, TimelineDot::Done);
        assert!(cards[0].completed);
        assert_eq!(cards[1].dot, TimelineDot::Current);
        assert_eq!(cards[2].dot, TimelineDot::Upcoming);
        assert_eq!(cards[2].cost.as_deref(), Some("₹1,500"));
        assert_eq!(cards[2].weather_icon, Some("☀️"));
    }
}
