//! Demo itineraries for headless runs.

use wayfarer_core::itinerary::{
    Biome, DayPlan, GeoPoint, Itinerary, PoiGroups, RouteEndpoints, TravelMode, Weather,
};

fn day(
    day: u32,
    location: &str,
    stay: &str,
    coordinates: GeoPoint,
    travels: &[&str],
    activities: &[&str],
    cost: f64,
    weather: Weather,
) -> DayPlan {
    DayPlan {
        day,
        date: Some(format!("2024-06-{:02}", day)),
        location: Some(location.to_string()),
        stay: stay.to_string(),
        activities: activities.iter().map(|s| s.to_string()).collect(),
        travels: travels.iter().map(|s| s.to_string()).collect(),
        food: Vec::new(),
        approximate_cost: Some(cost),
        biome: Some(Biome::City),
        coordinates: Some(coordinates),
        weather: Some(weather),
        pois: None,
    }
}

/// Mumbai to Washington by way of New York and Boston.
pub fn demo_itinerary() -> Itinerary {
    let mut nyc = day(
        2,
        "New York City, USA",
        "The Jane Hotel, Manhattan",
        GeoPoint::new(40.7128, -74.006),
        &["Land at JFK Airport", "Taxi to Manhattan hotel"],
        &[
            "Check-in to hotel",
            "Evening walk in Times Square",
            "Dinner at local diner",
            "Top of the Rock at night",
        ],
        15000.0,
        Weather::PartlyCloudy,
    );
    nyc.pois = Some(PoiGroups {
        tourism: vec!["Times Square".into(), "Empire State Building".into()],
        food: vec!["Joe's Pizza".into()],
        cafes: vec!["Blue Bottle Coffee".into()],
        nature: vec!["Central Park".into()],
        ..Default::default()
    });

    let day_plans = vec![
        day(
            1,
            "Mumbai Airport / In Transit",
            "Flight to New York",
            GeoPoint::new(19.0896, 72.8656),
            &["Taxi to Mumbai Airport", "Flight AI-191 to JFK New York"],
            &["Check-in at Mumbai Airport", "Board flight to JFK"],
            50000.0,
            Weather::Sunny,
        ),
        nyc,
        day(
            3,
            "Boston, USA",
            "Harborside Inn",
            GeoPoint::new(42.3601, -71.0589),
            &["Amtrak train to Boston South Station"],
            &["Freedom Trail walk", "Harvard Yard"],
            12000.0,
            Weather::Cloudy,
        ),
        day(
            4,
            "Washington, D.C., USA",
            "Hotel Harrington",
            GeoPoint::new(38.9072, -77.0369),
            &["Greyhound bus to Washington"],
            &["National Mall", "Smithsonian Air and Space Museum"],
            14000.0,
            Weather::Rainy,
        ),
    ];

    let total = day_plans.iter().filter_map(|d| d.approximate_cost).sum();

    Itinerary {
        id: Some("trip-demo".into()),
        title: Some("4-Day Mumbai to Washington Adventure".into()),
        from: "Mumbai".into(),
        to: "Washington".into(),
        travel_mode: TravelMode::Flight,
        days: 4,
        day_plans,
        total_estimated_cost: Some(total),
        coordinates: Some(RouteEndpoints {
            start: Some(GeoPoint::new(19.076, 72.8777)),
            end: Some(GeoPoint::new(38.9072, -77.0369)),
        }),
        destination: Some("Washington".into()),
        start_date: Some("2024-06-01".into()),
        end_date: Some("2024-06-04".into()),
        ..Default::default()
    }
}

/// Three stops where the middle day repeats the first day's coordinates.
pub fn duplicate_stop_itinerary() -> Itinerary {
    let spot = GeoPoint::new(15.2993, 74.124);
    let plan = |d: u32, geo: GeoPoint, travel: &str| DayPlan {
        day: d,
        location: Some(format!("Goa day {}", d)),
        coordinates: Some(geo),
        travels: vec![travel.to_string()],
        ..Default::default()
    };

    Itinerary {
        from: "Goa".into(),
        to: "Hampi".into(),
        travel_mode: TravelMode::Car,
        days: 3,
        day_plans: vec![
            plan(1, spot, "Scooter around Panjim"),
            plan(2, spot, "Stay put"),
            plan(3, GeoPoint::new(15.335, 76.46), "Bus to Hampi"),
        ],
        ..Default::default()
    }
}

/// An itinerary without any coordinates (placeholder route).
pub fn no_coordinates_itinerary() -> Itinerary {
    Itinerary {
        from: "Nowhere".into(),
        to: "Somewhere".into(),
        travel_mode: TravelMode::Train,
        days: 1,
        day_plans: vec![DayPlan {
            day: 1,
            stay: "Somewhere Cozy Stay (night 1)".into(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid() {
        assert!(demo_itinerary().validate().is_ok());
        assert!(duplicate_stop_itinerary().validate().is_ok());
        assert!(no_coordinates_itinerary().validate().is_ok());
        assert_eq!(demo_itinerary().total_estimated_cost, Some(91000.0));
    }
}
