//! Generation request and result types
//!
//! Wire shapes are camelCase to stay compatible with the JSON the mobile
//! clients already persist (`musicOptions.option1.url`, `coverArtUrl`,
//! `videoUrl`).

use serde::{Deserialize, Serialize};

/// Immutable description of one generation, produced once per user
/// submission by [`crate::builder::build_request`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Track title shown on later screens
    pub title: String,
    /// Comma-joined tag list consumed by the ACE-Step provider
    pub tags: String,
    /// Comma-joined descriptive phrase consumed by the MiniMax provider
    pub prompt: String,
    /// Lyrics, always carrying at least one structural section marker
    pub lyrics: String,
    /// Genre, kept for cover-art prompting and later screens
    pub genre: String,
    /// Target duration in seconds (ACE-Step only)
    pub duration: u32,
    /// Whether a looping music video should be generated as well
    pub create_video: bool,
    /// Free-text description for the video job; `None` when no video is
    /// wanted or the user supplied no description
    pub video_description: Option<String>,
}

/// One of the two competing music renditions offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicOption {
    /// URL of the generated audio file
    pub url: String,
    /// Provider model identifier (`ace-step` or `minimax`)
    pub model: String,
    /// Human-readable style label distinguishing the two renditions
    pub description: String,
}

/// Both music renditions for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicOptions {
    pub option1: MusicOption,
    pub option2: MusicOption,
}

/// The complete output of one generation.
///
/// Only created when every required job succeeded; a generation either
/// yields one of these or fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub title: String,
    pub genre: String,
    pub lyrics: String,
    pub duration: u32,
    /// URL of the generated cover-art image
    pub cover_art_url: String,
    pub music_options: MusicOptions,
    /// URL of the generated video; `null` when no video job was run
    pub video_url: Option<String>,
}
