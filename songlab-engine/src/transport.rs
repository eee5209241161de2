//! Provider transport
//!
//! [`ProviderApi`] is the seam between the polling state machine and the
//! wire: the production implementation ([`ReplicateApi`]) speaks HTTP with
//! the provider credential, test doubles live in [`crate::mock`]. Both
//! deployment topologies (client-embedded and relay) use this same
//! transport; only where the process runs differs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use songlab_common::error::{GenerationError, Result};

use crate::provider::{self, ProviderInput};

const USER_AGENT: &str = concat!("songlab/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle for one submitted prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionHandle {
    /// Provider-assigned job identifier
    pub id: String,
    /// Status-polling URL returned at submission, when the provider sent
    /// one; otherwise polls go to the id-constructed URL
    pub poll_url: Option<String>,
}

impl PredictionHandle {
    /// URL to poll for this prediction's status.
    pub fn status_url(&self) -> String {
        self.poll_url
            .clone()
            .unwrap_or_else(|| provider::poll_url(&self.id))
    }
}

/// One poll's view of a prediction.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionPoll {
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl PredictionPoll {
    /// Provider error message, or a placeholder when none was supplied.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Authenticated channel to the prediction provider.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Submit one job-creation request.
    async fn create_prediction(&self, input: &ProviderInput) -> Result<PredictionHandle>;

    /// Fetch the current status of a prediction.
    async fn poll_prediction(&self, handle: &PredictionHandle) -> Result<PredictionPoll>;

    /// Ask the provider to stop a running prediction. Best-effort; callers
    /// log failures and move on.
    async fn cancel_prediction(&self, handle: &PredictionHandle) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

/// Replicate HTTP transport.
///
/// The credential is injected at construction and attached as a bearer
/// header on every request; it is never read from ambient global state.
pub struct ReplicateApi {
    http_client: reqwest::Client,
    token: String,
}

impl ReplicateApi {
    pub fn new(token: String) -> Result<Self> {
        if token.is_empty() {
            return Err(GenerationError::Config(
                "Provider API token must not be empty".to_string(),
            ));
        }
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self { http_client, token })
    }

    /// Read a response body, requiring a success status and a JSON body.
    /// Anything else is a `ProviderRequest` error carrying the raw status
    /// and a truncated body excerpt; a non-JSON body is never coerced.
    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(GenerationError::provider_request(status, &body));
        }

        serde_json::from_str(&body).map_err(|_| GenerationError::provider_request(status, &body))
    }
}

#[async_trait]
impl ProviderApi for ReplicateApi {
    async fn create_prediction(&self, input: &ProviderInput) -> Result<PredictionHandle> {
        let url = input.create_url();
        tracing::debug!(model = input.model().label(), url = %url, "Submitting prediction");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input.body())
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let value = Self::read_json(response).await?;
        let parsed: CreateResponse = serde_json::from_value(value.clone())
            .map_err(|_| GenerationError::provider_request(200, &value.to_string()))?;

        if let Some(error) = parsed.error.filter(|e| !e.is_null()) {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(GenerationError::provider_request(200, &message));
        }

        let id = parsed.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            GenerationError::provider_request(200, "submission response carried no prediction id")
        })?;

        tracing::info!(model = input.model().label(), prediction_id = %id, "Prediction submitted");

        Ok(PredictionHandle {
            id,
            poll_url: parsed.urls.and_then(|u| u.get),
        })
    }

    async fn poll_prediction(&self, handle: &PredictionHandle) -> Result<PredictionPoll> {
        let response = self
            .http_client
            .get(handle.status_url())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let value = Self::read_json(response).await?;
        serde_json::from_value(value.clone())
            .map_err(|_| GenerationError::provider_request(200, &value.to_string()))
    }

    async fn cancel_prediction(&self, handle: &PredictionHandle) -> Result<()> {
        let response = self
            .http_client
            .post(provider::cancel_url(&handle.id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::provider_request(status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use songlab_common::error::BODY_EXCERPT_LIMIT;

    /// Serve a router on an ephemeral local port; returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn rejected_status_becomes_provider_request_with_body() {
        let base = serve(Router::new().route(
            "/predictions/p1",
            get(|| async { (StatusCode::PAYMENT_REQUIRED, "Insufficient credit") }),
        ))
        .await;

        let response = reqwest::get(format!("{base}/predictions/p1")).await.unwrap();
        let err = ReplicateApi::read_json(response).await.unwrap_err();

        match err {
            GenerationError::ProviderRequest {
                status,
                body_excerpt,
            } => {
                assert_eq!(status, 402);
                assert_eq!(body_excerpt, "Insufficient credit");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body_becomes_provider_request_with_excerpt() {
        // A proxy or outage page: 200 with HTML, longer than the excerpt cap.
        let page = format!("<html><body>{}</body></html>", "maintenance ".repeat(100));
        let base = serve(Router::new().route(
            "/predictions/p1",
            get(move || async move { (StatusCode::OK, page) }),
        ))
        .await;

        let response = reqwest::get(format!("{base}/predictions/p1")).await.unwrap();
        let err = ReplicateApi::read_json(response).await.unwrap_err();

        match err {
            GenerationError::ProviderRequest {
                status,
                body_excerpt,
            } => {
                assert_eq!(status, 200);
                assert!(body_excerpt.starts_with("<html>"));
                assert_eq!(body_excerpt.chars().count(), BODY_EXCERPT_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn json_success_body_passes_through() {
        let base = serve(Router::new().route(
            "/predictions/p1",
            get(|| async { axum::Json(json!({"status": "processing"})) }),
        ))
        .await;

        let response = reqwest::get(format!("{base}/predictions/p1")).await.unwrap();
        let value = ReplicateApi::read_json(response).await.unwrap();
        assert_eq!(value["status"], "processing");
    }

    #[test]
    fn client_requires_a_token() {
        assert!(matches!(
            ReplicateApi::new(String::new()),
            Err(GenerationError::Config(_))
        ));
        assert!(ReplicateApi::new("r8_test".into()).is_ok());
    }

    #[test]
    fn handle_prefers_returned_poll_url() {
        let with_url = PredictionHandle {
            id: "p1".into(),
            poll_url: Some("https://api.replicate.com/v1/predictions/p1".into()),
        };
        assert_eq!(
            with_url.status_url(),
            "https://api.replicate.com/v1/predictions/p1"
        );

        let without_url = PredictionHandle {
            id: "p2".into(),
            poll_url: None,
        };
        assert_eq!(without_url.status_url(), provider::poll_url("p2"));
    }

    #[test]
    fn create_response_parses_urls_block() {
        let parsed: CreateResponse = serde_json::from_value(json!({
            "id": "p1",
            "status": "starting",
            "urls": { "get": "https://api.replicate.com/v1/predictions/p1" }
        }))
        .unwrap();
        assert_eq!(parsed.id.as_deref(), Some("p1"));
        assert_eq!(
            parsed.urls.unwrap().get.as_deref(),
            Some("https://api.replicate.com/v1/predictions/p1")
        );
    }

    #[test]
    fn poll_error_message_shapes() {
        let string_error: PredictionPoll =
            serde_json::from_value(json!({"status": "failed", "error": "out of credit"})).unwrap();
        assert_eq!(string_error.error_message(), "out of credit");

        let null_error: PredictionPoll =
            serde_json::from_value(json!({"status": "failed", "error": null})).unwrap();
        assert_eq!(null_error.error_message(), "Unknown error");

        let object_error: PredictionPoll =
            serde_json::from_value(json!({"status": "canceled", "error": {"detail": "quota"}}))
                .unwrap();
        assert!(object_error.error_message().contains("quota"));
    }
}
