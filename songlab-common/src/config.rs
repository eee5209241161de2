//! Configuration resolution for songlab
//!
//! Provides two-tier configuration resolution with ENV → TOML priority.
//! The provider credential is resolved once at startup and injected into
//! the HTTP transport; a missing or invalid credential is a fatal
//! [`GenerationError::Config`], never a silent no-op.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{GenerationError, Result};

/// Environment variable naming the TOML config file location.
pub const CONFIG_PATH_ENV: &str = "SONGLAB_CONFIG";
/// Default TOML config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "songlab.toml";
/// Preferred credential environment variable.
pub const API_TOKEN_ENV: &str = "SONGLAB_REPLICATE_API_TOKEN";
/// Fallback credential environment variable (the provider's conventional name).
pub const API_TOKEN_FALLBACK_ENV: &str = "REPLICATE_API_TOKEN";
/// Relay port environment variable.
pub const RELAY_PORT_ENV: &str = "SONGLAB_RELAY_PORT";
/// Default relay listen port.
pub const DEFAULT_RELAY_PORT: u16 = 5780;

/// TOML configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Provider API credential
    pub replicate_api_token: Option<String>,
    /// Relay listen port
    pub relay_port: Option<u16>,
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            GenerationError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load configuration from `$SONGLAB_CONFIG`, falling back to
    /// `songlab.toml`. A missing file yields defaults (the environment can
    /// carry every setting); a present-but-invalid file is an error.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = Path::new(&path);
        if !path.exists() {
            return Ok(TomlConfig::default());
        }
        let config = Self::load(path)?;
        info!(path = %path.display(), "Loaded TOML configuration");
        Ok(config)
    }
}

/// Resolve the provider API credential from two-tier configuration.
///
/// **Priority:** ENV (`SONGLAB_REPLICATE_API_TOKEN`, then
/// `REPLICATE_API_TOKEN`) → TOML
pub fn resolve_api_token(toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_TOKEN_ENV)
        .or_else(|_| std::env::var(API_TOKEN_FALLBACK_ENV))
        .ok();
    let toml_key = toml_config.replicate_api_token.as_ref();

    let mut sources = Vec::new();
    if env_key.as_deref().is_some_and(is_valid_token) {
        sources.push("environment");
    }
    if toml_key.map(String::as_str).is_some_and(is_valid_token) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Provider API token found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_token(&key) {
            info!("Provider API token loaded from environment variable");
            return Ok(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_token(key) {
            info!("Provider API token loaded from TOML config");
            return Ok(key.clone());
        }
    }

    Err(GenerationError::Config(format!(
        "Provider API token not configured. Set {API_TOKEN_ENV} (or {API_TOKEN_FALLBACK_ENV}) \
         in the environment, or replicate_api_token in {DEFAULT_CONFIG_PATH}."
    )))
}

/// Resolve the relay listen port: ENV → TOML → default.
pub fn resolve_relay_port(toml_config: &TomlConfig) -> Result<u16> {
    if let Ok(raw) = std::env::var(RELAY_PORT_ENV) {
        return raw.parse().map_err(|_| {
            GenerationError::Config(format!("{RELAY_PORT_ENV} must be a port number, got {raw:?}"))
        });
    }
    Ok(toml_config.relay_port.unwrap_or(DEFAULT_RELAY_PORT))
}

/// Token validity: non-empty, no whitespace, and not the literal string
/// `"undefined"` (a value unconfigured JS clients have been seen to send).
fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.contains(char::is_whitespace) && token != "undefined"
}
