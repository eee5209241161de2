//! Relay wire types
//!
//! Shared between the relay service and its clients so both sides agree on
//! the single request/response entrypoint. The `action` travels as a plain
//! string so an unknown action is a well-formed request the relay can
//! reject with its own error envelope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operations the relay can perform on behalf of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAction {
    GenerateMusicAce,
    GenerateMusicMinimax,
    GenerateCoverArt,
    GenerateComplete,
}

impl RelayAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayAction::GenerateMusicAce => "generate_music_ace",
            RelayAction::GenerateMusicMinimax => "generate_music_minimax",
            RelayAction::GenerateCoverArt => "generate_cover_art",
            RelayAction::GenerateComplete => "generate_complete",
        }
    }
}

impl FromStr for RelayAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate_music_ace" => Ok(RelayAction::GenerateMusicAce),
            "generate_music_minimax" => Ok(RelayAction::GenerateMusicMinimax),
            "generate_cover_art" => Ok(RelayAction::GenerateCoverArt),
            "generate_complete" => Ok(RelayAction::GenerateComplete),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RelayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub action: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub create_video: Option<bool>,
    #[serde(default)]
    pub video_description: Option<String>,
}

impl RelayRequest {
    /// Empty request for the given action; callers fill in the fields the
    /// action consumes.
    pub fn new(action: RelayAction) -> Self {
        RelayRequest {
            action: action.as_str().to_string(),
            tags: None,
            prompt: None,
            lyrics: None,
            duration: None,
            title: None,
            genre: None,
            create_video: None,
            video_description: None,
        }
    }
}

/// Response envelope: `{ success: true, data }` on 200, or
/// `{ success: false, error }` with a non-200 status on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RelayResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> RelayResponse<T> {
    pub fn ok(data: T) -> Self {
        RelayResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        RelayResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_strings_round_trip() {
        for action in [
            RelayAction::GenerateMusicAce,
            RelayAction::GenerateMusicMinimax,
            RelayAction::GenerateCoverArt,
            RelayAction::GenerateComplete,
        ] {
            assert_eq!(action.as_str().parse::<RelayAction>(), Ok(action));
        }
        assert!("generate_podcast".parse::<RelayAction>().is_err());
    }

    #[test]
    fn request_deserializes_with_missing_optionals() {
        let request: RelayRequest =
            serde_json::from_str(r#"{"action":"generate_complete","genre":"Pop"}"#).unwrap();
        assert_eq!(request.action, "generate_complete");
        assert_eq!(request.genre.as_deref(), Some("Pop"));
        assert!(request.tags.is_none());
        assert!(request.create_video.is_none());
    }

    #[test]
    fn error_envelope_omits_data() {
        let response: RelayResponse<String> = RelayResponse::err("boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert!(value.get("data").is_none());
    }
}
