//! Generation request builder
//!
//! Pure, synchronous, deterministic transform from raw user creative input
//! to the [`GenerationRequest`] the orchestrator consumes. The two music
//! providers want the same creative intent in two encodings: a tag list and
//! a descriptive phrase. Lyrics are normalized to always carry at least one
//! structural section marker.

use crate::types::GenerationRequest;

/// Default title when the user supplied none.
pub const DEFAULT_TITLE: &str = "Untitled Track";
/// Default target duration in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 60;
/// Placeholder lyrics used when the user supplied no text at all.
pub const PLACEHOLDER_LYRICS: &str =
    "[verse]\nAI generated lyrics will appear here\n\n[chorus]\nWith melodies divine";

/// Raw user creative input, exactly as collected by the UI flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreativeInput {
    pub title: Option<String>,
    /// Free-text lyrics, possibly empty or without section markers
    pub lyrics: String,
    /// Chosen or custom genre
    pub genre: String,
    /// Zero or more vocal-style tags (e.g. "Female", "Raspy")
    pub vocal_styles: Vec<String>,
    /// Free-text vocal details
    pub vocal_details: String,
    pub duration: Option<u32>,
    pub create_video: bool,
    /// Free-text description for the optional video
    pub video_description: String,
}

/// Build a [`GenerationRequest`] from raw creative input.
///
/// Identical input always yields a byte-identical request.
pub fn build_request(input: &CreativeInput) -> GenerationRequest {
    let video_description = match input.video_description.trim() {
        "" => None,
        trimmed => Some(trimmed.to_string()),
    };

    GenerationRequest {
        title: input
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        tags: build_tags(&input.genre, &input.vocal_styles, &input.vocal_details),
        prompt: build_prompt(&input.genre, &input.vocal_styles, &input.vocal_details),
        lyrics: normalize_lyrics(&input.lyrics),
        genre: input.genre.clone(),
        duration: input.duration.unwrap_or(DEFAULT_DURATION_SECS),
        create_video: input.create_video,
        video_description,
    }
}

/// Tag encoding for ACE-Step: genre, lowercased vocal styles, then free-text
/// details, comma-joined.
pub fn build_tags(genre: &str, vocal_styles: &[String], vocal_details: &str) -> String {
    let mut parts = vec![genre.to_string()];
    parts.extend(vocal_styles.iter().map(|s| s.to_lowercase()));
    if !vocal_details.is_empty() {
        parts.push(vocal_details.to_string());
    }
    parts.join(", ")
}

/// Descriptive encoding for MiniMax: genre, the vocal styles joined as one
/// phrase, then free-text details, comma-joined.
pub fn build_prompt(genre: &str, vocal_styles: &[String], vocal_details: &str) -> String {
    let mut parts = vec![genre.to_string()];
    if !vocal_styles.is_empty() {
        parts.push(vocal_styles.join(", "));
    }
    if !vocal_details.is_empty() {
        parts.push(vocal_details.to_string());
    }
    parts.join(", ")
}

/// Normalize lyrics so downstream providers always see structured text:
/// - empty input → the two-section placeholder
/// - input without any `[`/`]` markers → prefixed with one `[verse]` marker
/// - input already carrying markers → unchanged
pub fn normalize_lyrics(lyrics: &str) -> String {
    if lyrics.is_empty() {
        return PLACEHOLDER_LYRICS.to_string();
    }
    if !lyrics.contains('[') && !lyrics.contains(']') {
        return format!("[verse]\n{lyrics}");
    }
    lyrics.to_string()
}
