//! Job orchestrator
//!
//! Fans one [`GenerationRequest`] out into independent provider jobs (two
//! competing music renditions, cover art, optional video), awaits them
//! concurrently, and assembles the complete [`GenerationResult`]. Fan-in is
//! all-or-nothing: the first failure aborts the aggregate with that single
//! error and no partial result. Unlike the sources this was modeled on,
//! still-running sibling jobs receive a best-effort provider-side cancel on
//! first failure instead of burning quota to completion unobserved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use uuid::Uuid;

use songlab_common::error::{GenerationError, Result};
use songlab_common::types::{GenerationRequest, GenerationResult, MusicOption, MusicOptions};

use crate::client::PredictionClient;
use crate::provider::{self, ProviderInput, ProviderModel};
use crate::transport::{PredictionHandle, ProviderApi};

/// Style label shown for the ACE-Step rendition.
pub const ACE_STYLE_LABEL: &str = "Electronic/Synth Style";
/// Style label shown for the MiniMax rendition.
pub const MINIMAX_STYLE_LABEL: &str = "Polished/Smooth Style";

/// Lyric excerpt budget for cover-art prompting.
const COVER_EXCERPT_LINES: usize = 8;
const COVER_EXCERPT_CHARS: usize = 500;
/// Lyric excerpt budget for video prompting.
const VIDEO_EXCERPT_LINES: usize = 4;
const VIDEO_EXCERPT_CHARS: usize = 200;

/// Structural markers recognized (and stripped) in lyric excerpts.
const SECTION_MARKERS: [&str; 5] = ["verse", "chorus", "bridge", "outro", "intro"];

type JobRegistry = Mutex<HashMap<String, PredictionHandle>>;

/// Orchestrates the concurrent jobs of one generation.
///
/// Owns every [`crate::client::PredictionJob`] for the duration of a
/// generation; the caller only ever sees a complete result or one error.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    client: PredictionClient,
    api: Arc<dyn ProviderApi>,
}

impl GenerationOrchestrator {
    /// Orchestrator with the contractual polling parameters.
    pub fn new(api: Arc<dyn ProviderApi>) -> Self {
        Self {
            client: PredictionClient::new(api.clone()),
            api,
        }
    }

    /// Orchestrator with explicit polling parameters (tests, tuning).
    pub fn with_polling(
        api: Arc<dyn ProviderApi>,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            client: PredictionClient::with_polling(api.clone(), poll_interval, max_attempts),
            api,
        }
    }

    /// Generate one ACE-Step music rendition; returns the audio URL.
    pub async fn generate_music_ace(
        &self,
        tags: &str,
        lyrics: &str,
        duration: u32,
    ) -> Result<String> {
        self.run_for_url(ProviderInput::AceStep {
            tags: tags.to_string(),
            lyrics: lyrics.to_string(),
            duration,
        })
        .await
    }

    /// Generate one MiniMax music rendition; returns the audio URL.
    pub async fn generate_music_minimax(&self, prompt: &str, lyrics: &str) -> Result<String> {
        self.run_for_url(ProviderInput::MiniMaxMusic {
            prompt: prompt.to_string(),
            lyrics: lyrics.to_string(),
        })
        .await
    }

    /// Generate cover art from a free-form description; returns the image URL.
    pub async fn generate_cover_art(&self, prompt: &str) -> Result<String> {
        self.run_for_url(ProviderInput::Seedream {
            prompt: album_art_prompt(prompt),
        })
        .await
    }

    /// Generate cover art themed on a song's title, genre and lyrics.
    pub async fn generate_cover_art_for_song(
        &self,
        title: &str,
        genre: &str,
        lyrics: &str,
    ) -> Result<String> {
        self.generate_cover_art(&cover_art_prompt(title, genre, lyrics))
            .await
    }

    /// Generate a short looping music video; returns the video URL.
    pub async fn generate_video(
        &self,
        description: &str,
        genre: &str,
        lyrics: &str,
    ) -> Result<String> {
        self.run_for_url(ProviderInput::Veo {
            prompt: video_prompt(description, genre, lyrics),
        })
        .await
    }

    /// Run the full fan-out for one request and assemble the result.
    ///
    /// All jobs are submitted and awaited concurrently, so wall-clock time
    /// for the group is bounded by the slowest job, not the sum. The video
    /// job only runs when the request asks for one and carries a
    /// description.
    pub async fn generate_complete(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let generation_id = Uuid::new_v4();
        let video_input = request
            .video_description
            .as_deref()
            .filter(|_| request.create_video)
            .map(|description| ProviderInput::Veo {
                prompt: video_prompt(description, &request.genre, &request.lyrics),
            });

        tracing::info!(
            generation_id = %generation_id,
            title = %request.title,
            genre = %request.genre,
            jobs = 3 + usize::from(video_input.is_some()),
            "Starting generation fan-out"
        );

        let registry: JobRegistry = Mutex::new(HashMap::new());

        let ace = self.run_tracked(
            &registry,
            ProviderInput::AceStep {
                tags: request.tags.clone(),
                lyrics: request.lyrics.clone(),
                duration: request.duration,
            },
        );
        let minimax = self.run_tracked(
            &registry,
            ProviderInput::MiniMaxMusic {
                prompt: request.prompt.clone(),
                lyrics: request.lyrics.clone(),
            },
        );
        let cover = self.run_tracked(
            &registry,
            ProviderInput::Seedream {
                prompt: album_art_prompt(&cover_art_prompt(
                    &request.title,
                    &request.genre,
                    &request.lyrics,
                )),
            },
        );
        let video = async {
            match video_input {
                Some(input) => self.run_tracked(&registry, input).await.map(Some),
                None => Ok(None),
            }
        };

        match tokio::try_join!(ace, minimax, cover, video) {
            Ok((ace_url, minimax_url, cover_art_url, video_url)) => {
                tracing::info!(
                    generation_id = %generation_id,
                    video = video_url.is_some(),
                    "Generation complete"
                );
                Ok(GenerationResult {
                    title: request.title.clone(),
                    genre: request.genre.clone(),
                    lyrics: request.lyrics.clone(),
                    duration: request.duration,
                    cover_art_url,
                    music_options: MusicOptions {
                        option1: MusicOption {
                            url: ace_url,
                            model: ProviderModel::AceStep.label().to_string(),
                            description: ACE_STYLE_LABEL.to_string(),
                        },
                        option2: MusicOption {
                            url: minimax_url,
                            model: ProviderModel::MiniMaxMusic.label().to_string(),
                            description: MINIMAX_STYLE_LABEL.to_string(),
                        },
                    },
                    video_url,
                })
            }
            Err(err) => {
                tracing::warn!(
                    generation_id = %generation_id,
                    kind = err.kind(),
                    error = %err,
                    "Generation failed; canceling remaining sibling jobs"
                );
                self.cancel_remaining(&registry).await;
                Err(err)
            }
        }
    }

    /// Submit one job, run it to completion, and normalize its output URL.
    async fn run_for_url(&self, input: ProviderInput) -> Result<String> {
        let mut job = self.client.submit(input).await?;
        let output = self.client.await_completion(&mut job).await?;
        provider::first_output_url(&output).ok_or_else(|| {
            GenerationError::provider_request(200, "prediction succeeded without an output URL")
        })
    }

    /// Like [`Self::run_for_url`], registering the job's handle for the
    /// duration of its run so siblings can be canceled if this group fails.
    async fn run_tracked(&self, registry: &JobRegistry, input: ProviderInput) -> Result<String> {
        let mut job = self.client.submit(input).await?;
        registry
            .lock()
            .unwrap()
            .insert(job.handle.id.clone(), job.handle.clone());

        let result = self.client.await_completion(&mut job).await;
        // Terminal either way; only still-running siblings stay registered.
        registry.lock().unwrap().remove(&job.handle.id);

        let output = result?;
        provider::first_output_url(&output).ok_or_else(|| {
            GenerationError::provider_request(200, "prediction succeeded without an output URL")
        })
    }

    /// Best-effort provider-side cancel of every still-registered job.
    /// Failures are logged, never propagated.
    async fn cancel_remaining(&self, registry: &JobRegistry) {
        let handles: Vec<PredictionHandle> = registry
            .lock()
            .unwrap()
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        if handles.is_empty() {
            return;
        }

        let cancels = handles.iter().map(|handle| async move {
            match self.api.cancel_prediction(handle).await {
                Ok(()) => {
                    tracing::info!(prediction_id = %handle.id, "Canceled sibling prediction")
                }
                Err(err) => {
                    tracing::warn!(
                        prediction_id = %handle.id,
                        error = %err,
                        "Best-effort cancel failed"
                    )
                }
            }
        });
        join_all(cancels).await;
    }
}

/// The provider-facing wrapper applied to every cover-art description.
fn album_art_prompt(prompt: &str) -> String {
    format!(
        "Album cover art: {prompt}. Professional music album artwork, \
         high quality, artistic, visually striking."
    )
}

/// Cover-art description themed on the song's metadata and lyrics.
fn cover_art_prompt(title: &str, genre: &str, lyrics: &str) -> String {
    let genre = if genre.is_empty() { "music" } else { genre };
    let title = if title.is_empty() { "Untitled" } else { title };
    let snippet = lyric_excerpt(lyrics, COVER_EXCERPT_LINES, COVER_EXCERPT_CHARS);
    format!(
        "Create a unique, artistic album cover for a {genre} song titled \"{title}\". \
         The artwork should visually capture the essence and emotions of these lyrics: \
         \"{snippet}\". Style: Modern, abstract, emotionally evocative. Use colors and \
         imagery that reflect the mood of the lyrics. Professional music album artwork, \
         high quality, visually striking, no text or words on the image."
    )
}

/// Video description enhanced with genre and a short lyric excerpt.
fn video_prompt(description: &str, genre: &str, lyrics: &str) -> String {
    let genre = if genre.is_empty() { "music" } else { genre };
    let context = lyric_excerpt(lyrics, VIDEO_EXCERPT_LINES, VIDEO_EXCERPT_CHARS);
    let mood = if context.is_empty() {
        String::new()
    } else {
        format!("The mood and theme should reflect: \"{context}\". ")
    };
    format!(
        "Music video for a {genre} song. {description}. {mood}Cinematic, visually \
         stunning, seamless loop, high quality music video aesthetic."
    )
}

/// First `max_lines` non-empty lyric lines with section markers stripped,
/// joined with spaces and truncated to `max_chars`.
fn lyric_excerpt(lyrics: &str, max_lines: usize, max_chars: usize) -> String {
    let joined = lyrics
        .lines()
        .map(strip_section_markers)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(max_chars).collect()
}

/// Remove `[verse]`-style structural markers (case-insensitive), leaving
/// any other bracketed text alone.
fn strip_section_markers(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        match rest[open..].find(']') {
            Some(offset) => {
                let close = open + offset;
                let inner = rest[open + 1..close].to_ascii_lowercase();
                if !SECTION_MARKERS.contains(&inner.as_str()) {
                    out.push_str(&rest[open..=close]);
                }
                rest = &rest[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::POLL_INTERVAL;
    use crate::mock::{MockOutcome, MockProviderApi};
    use serde_json::json;
    use songlab_common::builder::{build_request, CreativeInput, PLACEHOLDER_LYRICS};
    use tokio::time::Instant;

    fn request(create_video: bool, video_description: &str) -> GenerationRequest {
        build_request(&CreativeInput {
            lyrics: "city lights are calling\nwe dance until the dawn".into(),
            genre: "Pop".into(),
            create_video,
            video_description: video_description.into(),
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn complete_without_video_runs_three_jobs() {
        let api = Arc::new(MockProviderApi::new());
        let orchestrator = GenerationOrchestrator::new(api.clone());

        let result = orchestrator
            .generate_complete(&request(false, ""))
            .await
            .unwrap();

        assert_eq!(api.submitted_ids().len(), 3);
        assert_eq!(result.music_options.option1.model, "ace-step");
        assert_eq!(result.music_options.option1.description, ACE_STYLE_LABEL);
        assert_eq!(result.music_options.option2.model, "minimax");
        assert_eq!(result.music_options.option2.description, MINIMAX_STYLE_LABEL);
        assert_eq!(result.cover_art_url, "https://mock.example/seedream/output");
        assert!(result.video_url.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn complete_with_video_runs_four_jobs() {
        let api = Arc::new(MockProviderApi::new());
        let orchestrator = GenerationOrchestrator::new(api.clone());

        let result = orchestrator
            .generate_complete(&request(true, "neon skyline at night"))
            .await
            .unwrap();

        assert_eq!(api.submitted_ids().len(), 4);
        assert_eq!(
            result.video_url.as_deref(),
            Some("https://mock.example/veo/output")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn video_flag_without_description_runs_no_video_job() {
        let api = Arc::new(MockProviderApi::new());
        let orchestrator = GenerationOrchestrator::new(api.clone());

        let result = orchestrator
            .generate_complete(&request(true, "   "))
            .await
            .unwrap();

        assert_eq!(api.submitted_ids().len(), 3);
        assert!(result.video_url.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn group_time_is_bounded_by_slowest_job() {
        let api = Arc::new(MockProviderApi::new());
        api.plan(
            ProviderModel::AceStep,
            3,
            MockOutcome::Succeed(json!("https://cdn.example/a.mp3")),
        );
        api.plan(
            ProviderModel::MiniMaxMusic,
            10,
            MockOutcome::Succeed(json!("https://cdn.example/b.mp3")),
        );
        api.plan(
            ProviderModel::Seedream,
            6,
            MockOutcome::Succeed(json!(["https://cdn.example/c.png"])),
        );

        let orchestrator = GenerationOrchestrator::new(api);
        let started = Instant::now();
        let result = orchestrator
            .generate_complete(&request(false, ""))
            .await
            .unwrap();

        // max(3, 10, 6) intervals, not the 19-interval sum.
        assert_eq!(started.elapsed(), POLL_INTERVAL * 10);
        assert_eq!(result.music_options.option2.url, "https://cdn.example/b.mp3");
        assert_eq!(result.cover_art_url, "https://cdn.example/c.png");
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_aborts_the_group_and_cancels_siblings() {
        let api = Arc::new(MockProviderApi::new());
        // Cover art fails quickly; one music job is already done, the other
        // is still running when the failure lands.
        api.plan(
            ProviderModel::Seedream,
            1,
            MockOutcome::Fail("NSFW content detected".into()),
        );
        api.plan(
            ProviderModel::MiniMaxMusic,
            100,
            MockOutcome::Succeed(json!("https://cdn.example/b.mp3")),
        );

        let orchestrator = GenerationOrchestrator::new(api.clone());
        let err = orchestrator
            .generate_complete(&request(false, ""))
            .await
            .unwrap_err();

        match err {
            GenerationError::ProviderJob { status, message } => {
                assert_eq!(status, "failed");
                assert_eq!(message, "NSFW content detected");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let canceled = api.canceled_ids();
        assert_eq!(canceled.len(), 1, "only the still-running sibling is canceled");
        assert!(canceled[0].starts_with("minimax"));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_refusal_aborts_the_group() {
        let api = Arc::new(MockProviderApi::new());
        api.refuse_submission(ProviderModel::AceStep, 402, "payment required");
        api.plan(
            ProviderModel::MiniMaxMusic,
            50,
            MockOutcome::Succeed(json!("https://cdn.example/b.mp3")),
        );

        let orchestrator = GenerationOrchestrator::new(api.clone());
        let err = orchestrator
            .generate_complete(&request(false, ""))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ProviderRequest { status: 402, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_lyrics_request_end_to_end() {
        let api = Arc::new(MockProviderApi::new());
        let orchestrator = GenerationOrchestrator::new(api);

        let request = build_request(&CreativeInput {
            lyrics: String::new(),
            genre: "Pop".into(),
            ..Default::default()
        });
        assert_eq!(request.lyrics, PLACEHOLDER_LYRICS);

        let result = orchestrator.generate_complete(&request).await.unwrap();
        assert!(!result.music_options.option1.url.is_empty());
        assert!(!result.music_options.option2.url.is_empty());
        assert!(!result.cover_art_url.is_empty());
        assert!(result.video_url.is_none());
        assert_eq!(result.lyrics, PLACEHOLDER_LYRICS);
    }

    #[tokio::test(start_paused = true)]
    async fn cover_art_failure_discards_successful_music() {
        let api = Arc::new(MockProviderApi::new());
        api.plan(
            ProviderModel::Seedream,
            2,
            MockOutcome::Fail("flagged".into()),
        );

        let orchestrator = GenerationOrchestrator::new(api);
        let request = build_request(&CreativeInput {
            lyrics: String::new(),
            genre: "Pop".into(),
            ..Default::default()
        });

        let err = orchestrator.generate_complete(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::ProviderJob { .. }));
    }

    #[test]
    fn excerpt_strips_markers_and_bounds_length() {
        let lyrics = "[Verse]\ncity lights are calling\n\n[CHORUS]\nwe dance until the dawn\n[bridge] and the night goes on";
        let excerpt = lyric_excerpt(lyrics, 8, 500);
        assert_eq!(
            excerpt,
            "city lights are calling we dance until the dawn and the night goes on"
        );

        let two_lines = lyric_excerpt(lyrics, 2, 500);
        assert_eq!(two_lines, "city lights are calling we dance until the dawn");

        let clipped = lyric_excerpt(lyrics, 8, 10);
        assert_eq!(clipped.chars().count(), 10);
    }

    #[test]
    fn unknown_brackets_survive_marker_stripping() {
        assert_eq!(strip_section_markers("[verse] hello [x2]"), " hello [x2]");
        assert_eq!(strip_section_markers("no markers here"), "no markers here");
        assert_eq!(strip_section_markers("[unclosed"), "[unclosed");
    }

    #[test]
    fn cover_prompt_carries_title_genre_and_snippet() {
        let prompt = cover_art_prompt("Midnight Run", "Synthwave", "[verse]\nneon rain");
        assert!(prompt.contains("Synthwave song titled \"Midnight Run\""));
        assert!(prompt.contains("\"neon rain\""));

        let fallback = cover_art_prompt("", "", "");
        assert!(fallback.contains("music song titled \"Untitled\""));
    }

    #[test]
    fn video_prompt_omits_mood_without_lyrics() {
        let with_mood = video_prompt("neon skyline", "Pop", "[verse]\ncity lights");
        assert!(with_mood.contains("The mood and theme should reflect: \"city lights\""));

        let without = video_prompt("neon skyline", "", "");
        assert!(without.starts_with("Music video for a music song. neon skyline."));
        assert!(!without.contains("mood and theme"));
    }
}
