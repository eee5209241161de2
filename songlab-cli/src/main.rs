//! songlab - command-line song generation
//!
//! Collects the creative input as flags, builds a generation request, and
//! runs it either directly against the provider (credential from the local
//! environment) or through a relay instance (`--relay-url`), printing the
//! aggregated result as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use songlab_common::builder::{build_request, CreativeInput};
use songlab_common::config::{self, TomlConfig};
use songlab_common::relay::{RelayAction, RelayRequest, RelayResponse};
use songlab_common::types::{GenerationRequest, GenerationResult};
use songlab_engine::{GenerationOrchestrator, ReplicateApi};

/// Command-line arguments for songlab
#[derive(Parser, Debug)]
#[command(name = "songlab")]
#[command(about = "Generate a song (two music takes, cover art, optional video)")]
#[command(version)]
struct Args {
    /// Song title
    #[arg(short, long)]
    title: Option<String>,

    /// Genre of the song
    #[arg(short, long, default_value = "Pop")]
    genre: String,

    /// Lyrics text (section markers like [verse] are optional)
    #[arg(short, long, conflicts_with = "lyrics_file")]
    lyrics: Option<String>,

    /// Read lyrics from a file instead
    #[arg(long, value_name = "FILE")]
    lyrics_file: Option<PathBuf>,

    /// Vocal style tag, repeatable (e.g. --vocal-style Female --vocal-style Raspy)
    #[arg(long = "vocal-style")]
    vocal_styles: Vec<String>,

    /// Free-text vocal details
    #[arg(long, default_value = "")]
    vocal_details: String,

    /// Target duration in seconds
    #[arg(short, long)]
    duration: Option<u32>,

    /// Also generate a music video
    #[arg(long)]
    video: bool,

    /// Scene description for the video
    #[arg(long, default_value = "")]
    video_description: String,

    /// Send the request through a relay instance instead of calling the
    /// provider directly
    #[arg(long, env = "SONGLAB_RELAY_URL")]
    relay_url: Option<String>,
}

impl Args {
    fn lyrics_text(&self) -> Result<String> {
        if let Some(path) = &self.lyrics_file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read lyrics file {}", path.display()));
        }
        Ok(self.lyrics.clone().unwrap_or_default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    let input = CreativeInput {
        title: args.title.clone(),
        lyrics: args.lyrics_text()?,
        genre: args.genre.clone(),
        vocal_styles: args.vocal_styles.clone(),
        vocal_details: args.vocal_details.clone(),
        duration: args.duration,
        create_video: args.video,
        video_description: args.video_description.clone(),
    };
    let request = build_request(&input);

    let result = match &args.relay_url {
        Some(url) => generate_via_relay(url, &request).await?,
        None => generate_directly(&request).await?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Run the engine in-process with a locally resolved credential.
async fn generate_directly(request: &GenerationRequest) -> Result<GenerationResult> {
    let toml_config = TomlConfig::load_default()?;
    let token = config::resolve_api_token(&toml_config)?;
    let provider = Arc::new(ReplicateApi::new(token)?);
    let orchestrator = GenerationOrchestrator::new(provider);

    info!(title = %request.title, "Generating song directly against the provider");
    Ok(orchestrator.generate_complete(request).await?)
}

/// Post a `generate_complete` action to a relay instance.
async fn generate_via_relay(relay_url: &str, request: &GenerationRequest) -> Result<GenerationResult> {
    let mut body = RelayRequest::new(RelayAction::GenerateComplete);
    body.title = Some(request.title.clone());
    body.tags = Some(request.tags.clone());
    body.prompt = Some(request.prompt.clone());
    body.lyrics = Some(request.lyrics.clone());
    body.genre = Some(request.genre.clone());
    body.duration = Some(request.duration);
    body.create_video = Some(request.create_video);
    body.video_description = request.video_description.clone();

    let endpoint = format!("{}/generate", relay_url.trim_end_matches('/'));
    info!(endpoint = %endpoint, "Generating song through relay");

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach relay at {endpoint}"))?;

    let envelope: RelayResponse<GenerationResult> = response
        .json()
        .await
        .context("Relay returned a malformed response")?;

    match envelope.data {
        Some(result) if envelope.success => Ok(result),
        _ => bail!(
            "Relay generation failed: {}",
            envelope.error.unwrap_or_else(|| "unknown error".to_string())
        ),
    }
}
