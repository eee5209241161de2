//! Common error types for songlab

use thiserror::Error;

/// Longest body excerpt carried inside a [`GenerationError::ProviderRequest`].
pub const BODY_EXCERPT_LIMIT: usize = 300;

/// Common result type for songlab operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors surfaced by the generation subsystem.
///
/// None of these are recovered locally: the first failure anywhere in a
/// fan-out aborts the whole generation and the single causal error reaches
/// the caller. A caller retries by restarting the generation, never by
/// resuming it.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Submission rejected by the provider, or a provider response that was
    /// not parseable as JSON. Carries the raw HTTP status and a truncated
    /// body excerpt.
    #[error("Provider request failed (HTTP {status}): {body_excerpt}")]
    ProviderRequest { status: u16, body_excerpt: String },

    /// The remote job reached `failed` or `canceled`. Carries the
    /// provider-supplied error message when one was present.
    #[error("Prediction {status}: {message}")]
    ProviderJob { status: String, message: String },

    /// The remote job never reached a terminal status within the poll
    /// attempt ceiling.
    #[error("Prediction timed out after {attempts} polls")]
    ProviderTimeout { attempts: u32 },

    /// Missing or invalid configuration (e.g. the provider credential).
    /// Raised before any network call is made.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection-level failure with no HTTP status to report.
    #[error("Network error: {0}")]
    Network(String),
}

impl GenerationError {
    /// Build a [`GenerationError::ProviderRequest`] with the body excerpt
    /// truncated to [`BODY_EXCERPT_LIMIT`] (on a char boundary).
    pub fn provider_request(status: u16, body: &str) -> Self {
        let excerpt: String = body.chars().take(BODY_EXCERPT_LIMIT).collect();
        GenerationError::ProviderRequest {
            status,
            body_excerpt: excerpt,
        }
    }

    /// Short machine-readable kind, used in logs and relay responses.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::ProviderRequest { .. } => "provider_request",
            GenerationError::ProviderJob { .. } => "provider_job",
            GenerationError::ProviderTimeout { .. } => "provider_timeout",
            GenerationError::Config(_) => "config",
            GenerationError::Network(_) => "network",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_truncates_long_bodies() {
        let body = "x".repeat(2000);
        let err = GenerationError::provider_request(502, &body);
        match err {
            GenerationError::ProviderRequest {
                status,
                body_excerpt,
            } => {
                assert_eq!(status, 502);
                assert_eq!(body_excerpt.len(), BODY_EXCERPT_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn provider_request_keeps_short_bodies_whole() {
        let err = GenerationError::provider_request(404, "not found");
        assert_eq!(
            err.to_string(),
            "Provider request failed (HTTP 404): not found"
        );
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(
            GenerationError::ProviderTimeout { attempts: 120 }.kind(),
            "provider_timeout"
        );
        assert_eq!(GenerationError::Config("missing".into()).kind(), "config");
    }
}
