//! Error types for songlab-relay
//!
//! Maps the generation error taxonomy onto HTTP statuses while keeping the
//! `{ "success": false, "error": ... }` envelope clients expect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use songlab_common::error::GenerationError;
use songlab_common::relay::RelayResponse;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or unknown request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A generation failed; status depends on the failure kind
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Anything else (500)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(err) => match err {
                GenerationError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                GenerationError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                GenerationError::ProviderRequest { .. }
                | GenerationError::ProviderJob { .. }
                | GenerationError::Network(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(RelayResponse::<()>::err(self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (
                ApiError::BadRequest("nope".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Generation(GenerationError::ProviderTimeout { attempts: 120 }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApiError::Generation(GenerationError::provider_request(503, "oops")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Generation(GenerationError::Config("no token".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
