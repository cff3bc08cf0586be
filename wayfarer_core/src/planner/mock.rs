//! Deterministic offline itinerary generator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use wayfarer_env::WayfarerContext;

use super::PlanningBackend;
use crate::error::PlannerError;
use crate::itinerary::{Biome, DayPlan, Itinerary};
use crate::request::TripRequest;

/// Builds the template itinerary for a request.
///
/// Same request, same document: the only varying field is `id`, which
/// the caller supplies.
pub fn mock_itinerary(request: &TripRequest, id: Option<String>) -> Itinerary {
    let from = request.origin.trim();
    let to = request.destination.trim();
    let must_visit = request.must_visit();

    let day_plans: Vec<DayPlan> = (1..=request.days)
        .map(|i| {
            let mut activities = vec![
                format!("Visit main attraction {}", i),
                format!("Short hidden-gem walk {}", i),
            ];
            if !must_visit.is_empty() {
                let pick = (i as usize - 1) % must_visit.len();
                activities.push(must_visit[pick].clone());
            }

            let travels = if i == 1 {
                vec![format!("Depart {} -> {} by {}", from, to, request.mode)]
            } else {
                vec![format!("Local travel in {}", to)]
            };

            DayPlan {
                day: i,
                stay: format!("{} Cozy Stay (night {})", to, i),
                activities,
                travels,
                food: vec![
                    format!("Breakfast at popular café {}", i),
                    format!("Dinner with local flavour {}", i),
                ],
                approximate_cost: Some(50.0 + 20.0 * i as f64),
                biome: Some(Biome::cyclic(i)),
                ..Default::default()
            }
        })
        .collect();

    let total: f64 = day_plans.iter().filter_map(|d| d.approximate_cost).sum();

    Itinerary {
        id,
        from: from.to_string(),
        to: to.to_string(),
        travel_mode: request.mode,
        days: request.days,
        preferences: request.preferences.clone(),
        day_plans,
        total_estimated_cost: Some(total),
        ..Default::default()
    }
}

/// Offline backend: sleeps for the configured latency on the injected
/// clock, then returns [`mock_itinerary`].
pub struct MockPlanner<C: WayfarerContext> {
    ctx: Arc<C>,
    latency: Duration,
}

impl<C: WayfarerContext> MockPlanner<C> {
    /// Creates a mock backend with the given simulated latency.
    pub fn new(ctx: Arc<C>, latency: Duration) -> Self {
        Self { ctx, latency }
    }
}

#[async_trait]
impl<C: WayfarerContext> PlanningBackend for MockPlanner<C> {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn plan(&self, request: &TripRequest) -> Result<Itinerary, PlannerError> {
        self.ctx.sleep(self.latency).await;
        let id = format!("trip-{}", self.ctx.unix_millis());
        Ok(mock_itinerary(request, Some(id)))
    }
}
