//! Provider endpoints and payload variants
//!
//! The two music providers take differently-shaped inputs; cover art and
//! video each have their own shape again. Rather than duplicating the
//! submit/poll logic per provider, every payload is a [`ProviderInput`]
//! variant feeding one generic routine in [`crate::client`].

use serde_json::{json, Value};

/// Base URL of the provider's prediction API.
pub const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

/// Pinned version hash of the ACE-Step music model.
const ACE_STEP_VERSION: &str = "280fc4f9ee507577f880a167f639c02622421d8fecf492454320311217b688f1";
/// Pinned version hash of the Veo video model.
const VEO_VERSION: &str = "5e80c73750ffc5dfbe5cee2d694c6ed3da7706660d9132613e6736443b365464";

/// The remote models this subsystem drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderModel {
    AceStep,
    MiniMaxMusic,
    Seedream,
    Veo,
}

impl ProviderModel {
    /// Short identifier used in results and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderModel::AceStep => "ace-step",
            ProviderModel::MiniMaxMusic => "minimax",
            ProviderModel::Seedream => "seedream",
            ProviderModel::Veo => "veo",
        }
    }
}

/// One provider-specific request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderInput {
    /// ACE-Step music generation: tag list + structured lyrics + duration
    AceStep {
        tags: String,
        lyrics: String,
        duration: u32,
    },
    /// MiniMax music generation: descriptive phrase + structured lyrics
    MiniMaxMusic { prompt: String, lyrics: String },
    /// Seedream cover-art generation
    Seedream { prompt: String },
    /// Veo short looping video generation
    Veo { prompt: String },
}

impl ProviderInput {
    pub fn model(&self) -> ProviderModel {
        match self {
            ProviderInput::AceStep { .. } => ProviderModel::AceStep,
            ProviderInput::MiniMaxMusic { .. } => ProviderModel::MiniMaxMusic,
            ProviderInput::Seedream { .. } => ProviderModel::Seedream,
            ProviderInput::Veo { .. } => ProviderModel::Veo,
        }
    }

    /// Job-creation endpoint. Version-pinned models go through the generic
    /// predictions endpoint; the others are model-scoped.
    pub fn create_url(&self) -> String {
        match self.model() {
            ProviderModel::AceStep | ProviderModel::Veo => {
                format!("{REPLICATE_API_BASE}/predictions")
            }
            ProviderModel::MiniMaxMusic => {
                format!("{REPLICATE_API_BASE}/models/minimax/music-1.5/predictions")
            }
            ProviderModel::Seedream => {
                format!("{REPLICATE_API_BASE}/models/bytedance/seedream-4/predictions")
            }
        }
    }

    /// Full JSON body for the job-creation request, including the tuning
    /// parameters each model expects.
    pub fn body(&self) -> Value {
        match self {
            ProviderInput::AceStep {
                tags,
                lyrics,
                duration,
            } => json!({
                "version": ACE_STEP_VERSION,
                "input": {
                    "seed": -1,
                    "tags": tags,
                    "lyrics": lyrics,
                    "duration": duration,
                    "scheduler": "euler",
                    "guidance_type": "apg",
                    "guidance_scale": 15,
                    "number_of_steps": 60,
                    "granularity_scale": 10,
                    "guidance_interval": 0.5,
                    "min_guidance_scale": 3,
                    "tag_guidance_scale": 0,
                    "lyric_guidance_scale": 0,
                    "guidance_interval_decay": 0,
                }
            }),
            ProviderInput::MiniMaxMusic { prompt, lyrics } => json!({
                "input": {
                    "lyrics": lyrics,
                    "prompt": prompt,
                    "bitrate": 256000,
                    "sample_rate": 44100,
                    "audio_format": "mp3",
                }
            }),
            ProviderInput::Seedream { prompt } => json!({
                "input": {
                    "size": "1K",
                    "width": 1024,
                    "height": 1024,
                    "prompt": prompt,
                    "max_images": 1,
                    "image_input": [],
                    "aspect_ratio": "1:1",
                    "enhance_prompt": true,
                    "sequential_image_generation": "disabled",
                }
            }),
            ProviderInput::Veo { prompt } => json!({
                "version": VEO_VERSION,
                "input": {
                    "prompt": prompt,
                    "duration": 4,
                    "resolution": "1080p",
                    "aspect_ratio": "16:9",
                    "generate_audio": false,
                }
            }),
        }
    }
}

/// Status-polling endpoint for a prediction id.
pub fn poll_url(id: &str) -> String {
    format!("{REPLICATE_API_BASE}/predictions/{id}")
}

/// Cancellation endpoint for a prediction id.
pub fn cancel_url(id: &str) -> String {
    format!("{REPLICATE_API_BASE}/predictions/{id}/cancel")
}

/// Normalize a provider `output` field to a single URL.
///
/// The provider returns a bare string for audio/video, an array of strings
/// or `{url}` objects for images, and occasionally a single `{url}` object.
pub fn first_output_url(output: &Value) -> Option<String> {
    match output {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.first().and_then(first_output_url),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
