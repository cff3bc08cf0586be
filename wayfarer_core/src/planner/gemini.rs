//! Gemini `generateContent` backend.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::prompt::{build_prompt, strip_code_fences};
use super::PlanningBackend;
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::itinerary::Itinerary;
use crate::request::TripRequest;

/// HTTP backend posting one prompt per plan request.
///
/// No retries, no cancellation. A timeout applies only when
/// `request_timeout_secs` is configured.
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    /// Creates a backend from the planner config. Returns None when no API
    /// key is configured.
    pub fn from_config(config: &PlannerConfig) -> Result<Option<Self>, PlannerError> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Some(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
            api_key,
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request body for a single-turn prompt.
pub fn request_body(prompt: &str) -> Value {
    json!({ "contents": [{ "parts": [{ "text": prompt }] }] })
}

/// Pulls the generated text out of a `generateContent` response.
pub fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Parses a `generateContent` response into an itinerary (not yet
/// normalised against the request).
pub fn parse_response(response: &Value) -> Result<Itinerary, PlannerError> {
    let text = extract_text(response)
        .filter(|t| !t.trim().is_empty())
        .ok_or(PlannerError::EmptyResponse)?;
    let cleaned = strip_code_fences(text);
    Ok(serde_json::from_str(&cleaned)?)
}

#[async_trait]
impl PlanningBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn plan(&self, request: &TripRequest) -> Result<Itinerary, PlannerError> {
        let prompt = build_prompt(request);
        debug!("Posting {}-char prompt to {}", prompt.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let value: Value = response.json().await?;
        parse_response(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = wrap("```json\n{\"dayPlans\": [{\"day\": 1, \"stay\": \"Inn\"}]}\n```");
        let itinerary = parse_response(&response).unwrap();
        assert_eq!(itinerary.day_plans[0].stay, "Inn");
    }

    #[test]
    fn test_missing_text_is_empty_response() {
        assert!(matches!(
            parse_response(&json!({ "candidates": [] })),
            Err(PlannerError::EmptyResponse)
        ));
        assert!(matches!(
            parse_response(&wrap("   ")),
            Err(PlannerError::EmptyResponse)
        ));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        assert!(matches!(
            parse_response(&wrap("Sure! Here is your trip: {")),
            Err(PlannerError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_loose_document_still_parses() {
        let response = wrap(
            r#"{"travelMode": "Flight", "dayPlans": [{"day": 1, "stay": "Inn", "approximateCost": "5000", "pois": {"transport": "Metro"}}]}"#,
        );
        let itinerary = parse_response(&response).unwrap();
        assert_eq!(itinerary.day_plans[0].stay, "Inn");
        assert_eq!(itinerary.day_plans[0].approximate_cost, Some(5000.0));
        assert!(itinerary.day_plans[0].pois.as_ref().unwrap().is_empty());
        assert!(itinerary.validate().is_ok());
    }

    #[test]
    fn test_no_key_means_no_backend() {
        let config = PlannerConfig::default();
        assert!(GeminiBackend::from_config(&config).unwrap().is_none());

        let config = PlannerConfig {
            api_key: Some("k".into()),
            request_timeout_secs: Some(5),
            ..Default::default()
        };
        let backend = GeminiBackend::from_config(&config).unwrap().unwrap();
        assert_eq!(backend.name(), "gemini");
    }
}
