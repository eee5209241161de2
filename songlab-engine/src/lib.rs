//! # Songlab Generation Engine
//!
//! The reusable orchestration core shared by both deployment topologies:
//! embedded in a client process (credential on the device) or run behind
//! the relay service (credential server-side only). The engine is
//! parameterized by a [`transport::ProviderApi`] so the same submit/poll
//! state machine runs against the real provider or a test double.

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod transport;

pub use client::{JobStatus, PredictionClient, PredictionJob, MAX_POLL_ATTEMPTS, POLL_INTERVAL};
pub use orchestrator::GenerationOrchestrator;
pub use provider::{ProviderInput, ProviderModel};
pub use transport::{PredictionHandle, PredictionPoll, ProviderApi, ReplicateApi};
