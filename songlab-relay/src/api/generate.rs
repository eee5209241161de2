//! Generation entrypoint
//!
//! One `POST /generate` route carrying an action discriminator, mirroring
//! the single-function surface the mobile clients already speak. Every
//! action runs the same engine the client-embedded mode uses; only the
//! credential's location differs.

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;

use songlab_common::builder::{normalize_lyrics, DEFAULT_DURATION_SECS, DEFAULT_TITLE};
use songlab_common::relay::{RelayAction, RelayRequest, RelayResponse};
use songlab_common::types::GenerationRequest;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> ApiResult<Json<RelayResponse<Value>>> {
    let action: RelayAction = request
        .action
        .parse()
        .map_err(|()| ApiError::BadRequest(format!("Unknown action: {}", request.action)))?;

    tracing::info!(action = %action, "Relay generation request");

    let orchestrator = &state.orchestrator;
    let lyrics = normalize_lyrics(request.lyrics.as_deref().unwrap_or(""));
    let duration = request.duration.unwrap_or(DEFAULT_DURATION_SECS);

    let data = match action {
        RelayAction::GenerateMusicAce => {
            let url = orchestrator
                .generate_music_ace(request.tags.as_deref().unwrap_or(""), &lyrics, duration)
                .await?;
            Value::String(url)
        }
        RelayAction::GenerateMusicMinimax => {
            let url = orchestrator
                .generate_music_minimax(request.prompt.as_deref().unwrap_or(""), &lyrics)
                .await?;
            Value::String(url)
        }
        RelayAction::GenerateCoverArt => {
            let prompt = match request.genre.as_deref().filter(|g| !g.is_empty()) {
                Some(genre) => format!(
                    "{genre} music album cover for a song called \"{}\". \
                     Abstract, artistic, modern design.",
                    request.title.as_deref().unwrap_or("Untitled")
                ),
                None => request
                    .prompt
                    .clone()
                    .unwrap_or_else(|| "Abstract music album cover".to_string()),
            };
            let url = orchestrator.generate_cover_art(&prompt).await?;
            Value::String(url)
        }
        RelayAction::GenerateComplete => {
            let generation_request = GenerationRequest {
                title: request
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                tags: request.tags.clone().unwrap_or_default(),
                prompt: request.prompt.clone().unwrap_or_default(),
                lyrics,
                genre: request.genre.clone().unwrap_or_default(),
                duration,
                create_video: request.create_video.unwrap_or(false),
                video_description: request
                    .video_description
                    .clone()
                    .filter(|d| !d.trim().is_empty()),
            };
            let result = orchestrator.generate_complete(&generation_request).await?;
            serde_json::to_value(result).map_err(|e| ApiError::Other(e.into()))?
        }
    };

    Ok(Json(RelayResponse::ok(data)))
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/generate", post(handle_generate))
}
