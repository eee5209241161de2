//! # Songlab Common Library
//!
//! Shared code for the songlab generation subsystem:
//! - Error taxonomy for provider interactions
//! - Configuration resolution (credential, relay settings)
//! - Generation request/result types
//! - The pure generation request builder
//! - Relay wire types shared by the relay service and its clients

pub mod builder;
pub mod config;
pub mod error;
pub mod relay;
pub mod types;

pub use error::{GenerationError, Result};
pub use types::{GenerationRequest, GenerationResult, MusicOption, MusicOptions};
