//! Prompt construction and response clean-up for the completion backend.

use crate::itinerary::{BudgetTier, ComfortTier};
use crate::request::TripRequest;

/// Builds the instruction text sent to the completion model.
///
/// The model is asked for a bare JSON document shaped like
/// [`Itinerary`](crate::itinerary::Itinerary), including per-day
/// coordinates so the tour has something to draw.
pub fn build_prompt(request: &TripRequest) -> String {
    let days = request.days;
    let origin = request.origin.trim();
    let destination = request.destination.trim();
    let mode = request.mode;

    let prefs = request.preferences.clone().unwrap_or_default();
    let budget = match prefs.budget {
        Some(BudgetTier::Low) => "low",
        Some(BudgetTier::High) => "high",
        Some(BudgetTier::Medium) | None => "medium",
    };
    let comfort = match prefs.comfort {
        Some(ComfortTier::Basic) => "basic",
        Some(ComfortTier::Premium) => "premium",
        Some(ComfortTier::Standard) | None => "standard",
    };
    let food = prefs.food.as_deref().unwrap_or("local");
    let must_visit = if prefs.must_visit.is_empty() {
        "none".to_string()
    } else {
        prefs.must_visit.join(", ")
    };

    format!(
        r#"Plan a realistic {days}-day trip from {origin} to {destination} travelling by {mode}.

Rules:
- Day 1 is the journey itself. For a flight: depart {origin}, land near {destination}, transfer to the hotel. For bus, train or car: show the journey or a stopover on the way.
- Trips longer than 5 days visit at least 2 different towns, each with its own stay.
- Days progress geographically; every move between towns appears in "travels".
- Each day lists 3-5 specific activities and concrete transport (e.g. "Flight AI-191 to JFK", "Taxi to hotel").
- "pois" names real places under "tourism", "food", "cafes" and "nature".
- "weather" is one of: sunny, cloudy, partly cloudy, rainy.
- "biome" is one of: city, beach, mountain, forest, countryside.
- "coordinates" is the day's location as {{"lat": number, "lng": number}}.
- Costs are realistic amounts in INR.

Budget: {budget}
Comfort: {comfort}
Food: {food}
Must visit: {must_visit}

Reply with JSON only, no markdown, in exactly this shape:
{{
  "title": "{days}-Day {origin} to {destination} Adventure",
  "destination": "{destination}",
  "startDate": "YYYY-MM-DD",
  "endDate": "YYYY-MM-DD",
  "coordinates": {{ "start": {{"lat": 0, "lng": 0}}, "end": {{"lat": 0, "lng": 0}} }},
  "dayPlans": [
    {{
      "day": 1,
      "date": "YYYY-MM-DD",
      "location": "City, Country",
      "stay": "Hotel name",
      "activities": ["..."],
      "travels": ["..."],
      "food": ["..."],
      "approximateCost": 0,
      "biome": "city",
      "weather": "sunny",
      "coordinates": {{"lat": 0, "lng": 0}},
      "pois": {{ "tourism": [], "food": [], "cafes": [], "nature": [] }}
    }}
  ]
}}

Generate exactly {days} days numbered 1 to {days}."#
    )
}

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) and
/// surrounding whitespace from a model reply.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{Preferences, TravelMode};

    #[test]
    fn test_prompt_mentions_request() {
        let req = TripRequest::new("Mumbai", "New York", TravelMode::Flight, 4).with_preferences(
            Preferences {
                budget: Some(BudgetTier::High),
                must_visit: vec!["MoMA".into()],
                ..Default::default()
            },
        );
        let prompt = build_prompt(&req);

        assert!(prompt.contains("4-day trip from Mumbai to New York travelling by flight"));
        assert!(prompt.contains("Budget: high"));
        assert!(prompt.contains("Must visit: MoMA"));
        assert!(prompt.contains("\"dayPlans\""));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
