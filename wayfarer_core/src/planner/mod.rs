//! Planning - turning a [`TripRequest`] into an [`Itinerary`].
//!
//! [`TripPlanner`] is the only entry point the rest of the system uses. It
//! validates the request, tries the configured backend (Gemini when an API
//! key is present) and masks every backend failure with the deterministic
//! [`MockPlanner`], so a valid request always yields an itinerary.

mod gemini;
mod mock;
pub mod prompt;

pub use gemini::{extract_text, parse_response, request_body, GeminiBackend};
pub use mock::{mock_itinerary, MockPlanner};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use wayfarer_env::WayfarerContext;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::itinerary::Itinerary;
use crate::request::TripRequest;

/// A source of itineraries.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produces an itinerary for a validated request.
    async fn plan(&self, request: &TripRequest) -> Result<Itinerary, PlannerError>;
}

/// Result of a successful [`TripPlanner::plan`].
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub itinerary: Itinerary,
    /// Name of the backend that produced the itinerary
    pub backend: &'static str,
    /// Why the primary backend was bypassed, if it was
    pub fallback_reason: Option<String>,
}

impl PlanOutcome {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Pins the request's identity onto a backend document and checks it.
///
/// Origin, destination, mode and day count always come from the request;
/// id, preferences and total cost are filled in only when missing.
pub fn normalize(
    mut itinerary: Itinerary,
    request: &TripRequest,
    id: String,
) -> Result<Itinerary, PlannerError> {
    itinerary.from = request.origin.trim().to_string();
    itinerary.to = request.destination.trim().to_string();
    itinerary.travel_mode = request.mode;
    itinerary.days = request.days;

    if itinerary.id.as_deref().map_or(true, str::is_empty) {
        itinerary.id = Some(id);
    }
    if itinerary.preferences.is_none() {
        itinerary.preferences = request.preferences.clone();
    }
    if itinerary.total_estimated_cost.is_none() {
        itinerary.total_estimated_cost = Some(itinerary.estimated_total());
    }

    itinerary.validate()?;
    Ok(itinerary)
}

/// Clears the in-flight flag when a plan call finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Caller-facing planner with mock fallback and a single-submission gate.
pub struct TripPlanner<C: WayfarerContext> {
    ctx: Arc<C>,
    primary: Option<Box<dyn PlanningBackend>>,
    fallback: MockPlanner<C>,
    in_flight: AtomicBool,
}

impl<C: WayfarerContext> TripPlanner<C> {
    /// Creates a planner from config: Gemini when an API key is set,
    /// otherwise mock only.
    pub fn new(ctx: Arc<C>, config: &PlannerConfig) -> Result<Self, PlannerError> {
        let primary = GeminiBackend::from_config(config)?
            .map(|backend| Box::new(backend) as Box<dyn PlanningBackend>);
        Ok(Self::build(ctx, primary, config.mock_latency()))
    }

    /// Creates a mock-only planner.
    pub fn offline(ctx: Arc<C>, latency: Duration) -> Self {
        Self::build(ctx, None, latency)
    }

    /// Creates a planner over a custom primary backend.
    pub fn with_backend(ctx: Arc<C>, backend: Box<dyn PlanningBackend>, latency: Duration) -> Self {
        Self::build(ctx, Some(backend), latency)
    }

    fn build(ctx: Arc<C>, primary: Option<Box<dyn PlanningBackend>>, latency: Duration) -> Self {
        Self {
            fallback: MockPlanner::new(ctx.clone(), latency),
            ctx,
            primary,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Name of the backend tried first.
    pub fn primary_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or(self.fallback.name(), |backend| backend.name())
    }

    /// True while a `plan` call is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Plans a trip.
    ///
    /// Fails only on an invalid request (`Form`) or when another plan is
    /// already running (`Busy`). Backend failures are logged and replaced
    /// by the mock itinerary.
    pub async fn plan(&self, request: &TripRequest) -> Result<PlanOutcome, PlannerError> {
        request.validate()?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PlannerError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let id = format!("trip-{}", self.ctx.unix_millis());

        let fallback_reason = match &self.primary {
            Some(backend) => {
                let result = backend
                    .plan(request)
                    .await
                    .and_then(|doc| normalize(doc, request, id.clone()));
                match result {
                    Ok(itinerary) => {
                        info!(
                            "Planned {} days {} -> {} via {}",
                            itinerary.day_plans.len(),
                            request.origin,
                            request.destination,
                            backend.name()
                        );
                        return Ok(PlanOutcome {
                            itinerary,
                            backend: backend.name(),
                            fallback_reason: None,
                        });
                    }
                    Err(e) => {
                        warn!("{} planning failed, using mock itinerary: {}", backend.name(), e);
                        Some(e.to_string())
                    }
                }
            }
            None => None,
        };

        let itinerary = self.fallback.plan(request).await?;
        let itinerary = normalize(itinerary, request, id)?;
        info!(
            "Planned {} days {} -> {} via {}",
            itinerary.day_plans.len(),
            request.origin,
            request.destination,
            self.fallback.name()
        );

        Ok(PlanOutcome {
            itinerary,
            backend: self.fallback.name(),
            fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::itinerary::{DayPlan, TravelMode};
    use wayfarer_env::TokioContext;

    /// Backend with a scripted outcome.
    enum Scripted {
        Reject,
        Malformed,
        TrailingComma,
        GapInDays,
        Good,
        Slow,
    }

    #[async_trait]
    impl PlanningBackend for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn plan(&self, request: &TripRequest) -> Result<Itinerary, PlannerError> {
            match self {
                Scripted::Reject => Err(PlannerError::Status {
                    code: 403,
                    body: "API key not valid".into(),
                }),
                Scripted::Malformed => Err(serde_json::from_str::<Itinerary>("{").unwrap_err().into()),
                Scripted::TrailingComma => parse_response(&serde_json::json!({
                    "candidates": [{ "content": { "parts": [{
                        "text": "```json\n{\"dayPlans\":[{\"day\":1,},]}\n```"
                    }] } }]
                })),
                Scripted::GapInDays => Ok(Itinerary {
                    day_plans: vec![
                        DayPlan {
                            day: 1,
                            ..Default::default()
                        },
                        DayPlan {
                            day: 3,
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }),
                Scripted::Good => Ok(Itinerary {
                    from: "ignored".into(),
                    title: Some("Coastal run".into()),
                    day_plans: vec![DayPlan {
                        day: 1,
                        stay: "Beach hut".into(),
                        approximate_cost: Some(1200.0),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                Scripted::Slow => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(mock_itinerary(request, None))
                }
            }
        }
    }

    fn request() -> TripRequest {
        TripRequest::new("Mumbai", "Goa", TravelMode::Car, 2)
    }

    fn planner(script: Scripted) -> TripPlanner<TokioContext> {
        TripPlanner::with_backend(TokioContext::shared(), Box::new(script), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_rejected_backend_falls_back_to_mock() {
        let outcome = planner(Scripted::Reject).plan(&request()).await.unwrap();
        assert_eq!(outcome.backend, "mock");
        assert!(outcome.fallback_reason.unwrap().contains("403"));
        let expected = mock_itinerary(&request(), outcome.itinerary.id.clone());
        assert_eq!(outcome.itinerary, expected);
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back_to_mock() {
        let outcome = planner(Scripted::Malformed).plan(&request()).await.unwrap();
        assert!(outcome.used_fallback());
        assert_eq!(outcome.itinerary.day_plans.len(), 2);
    }

    #[tokio::test]
    async fn test_trailing_comma_reply_falls_back_to_mock() {
        let req = request();
        let outcome = planner(Scripted::TrailingComma).plan(&req).await.unwrap();

        assert!(outcome.used_fallback());
        assert!(outcome.fallback_reason.unwrap().starts_with("Malformed itinerary JSON"));
        let expected = mock_itinerary(&req, outcome.itinerary.id.clone());
        assert_eq!(outcome.itinerary, expected);
        let days: Vec<u32> = outcome.itinerary.day_plans.iter().map(|d| d.day).collect();
        assert_eq!(days, (1..=req.days).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_invalid_document_falls_back_to_mock() {
        let outcome = planner(Scripted::GapInDays).plan(&request()).await.unwrap();
        assert!(outcome.used_fallback());
        assert!(outcome.itinerary.validate().is_ok());
    }

    #[tokio::test]
    async fn test_good_document_is_normalized() {
        let outcome = planner(Scripted::Good).plan(&request()).await.unwrap();
        assert_eq!(outcome.backend, "scripted");
        assert!(!outcome.used_fallback());

        let itinerary = outcome.itinerary;
        assert_eq!(itinerary.from, "Mumbai");
        assert_eq!(itinerary.to, "Goa");
        assert_eq!(itinerary.travel_mode, TravelMode::Car);
        assert_eq!(itinerary.days, 2);
        assert_eq!(itinerary.title.as_deref(), Some("Coastal run"));
        assert_eq!(itinerary.total_estimated_cost, Some(1200.0));
        assert!(itinerary.id.unwrap().starts_with("trip-"));
    }

    #[tokio::test]
    async fn test_invalid_request_is_refused() {
        let planner = planner(Scripted::Good);
        let bad = TripRequest::new("", "Goa", TravelMode::Car, 2);
        assert!(matches!(
            planner.plan(&bad).await,
            Err(PlannerError::Form(FormError::MissingField("origin")))
        ));
        assert!(!planner.is_busy());
    }

    #[tokio::test]
    async fn test_second_submission_while_busy() {
        let planner = planner(Scripted::Slow);
        let req = request();

        let (first, second) = tokio::join!(planner.plan(&req), async {
            tokio::task::yield_now().await;
            planner.plan(&req).await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(PlannerError::Busy)));
        assert!(!planner.is_busy());
        assert!(planner.plan(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_offline_planner_uses_mock() {
        let planner = TripPlanner::offline(TokioContext::shared(), Duration::from_millis(1));
        assert_eq!(planner.primary_name(), "mock");
        let outcome = planner.plan(&request()).await.unwrap();
        assert_eq!(outcome.backend, "mock");
        assert!(!outcome.used_fallback());
    }

    #[test]
    fn test_planner_from_config_without_key() {
        let planner = TripPlanner::new(TokioContext::shared(), &PlannerConfig::default()).unwrap();
        assert_eq!(planner.primary_name(), "mock");
    }
}
