//! Prediction client
//!
//! Submits one inference request and polls it to a terminal state. Per job
//! this is a two-state-class machine: non-terminal statuses keep polling,
//! `succeeded` returns the output, `failed`/`canceled` fail with the
//! provider's message, and exhausting the attempt ceiling times out. A
//! failed job is never retried here; failure is terminal and reported
//! upward.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use songlab_common::error::{GenerationError, Result};

use crate::provider::ProviderInput;
use crate::transport::{PredictionHandle, ProviderApi};

/// Contractual fixed delay between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Contractual poll attempt ceiling (120 × 5 s = 10-minute hard ceiling).
pub const MAX_POLL_ATTEMPTS: u32 = 120;

/// Lifecycle of one remote prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    TimedOut,
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled | JobStatus::TimedOut
        )
    }

    /// Map a provider status string onto the lifecycle. Anything the
    /// provider reports besides the three terminal strings (`queued`,
    /// `starting`, `processing`, ...) counts as still processing.
    pub fn from_wire(status: &str) -> JobStatus {
        match status {
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            "canceled" => JobStatus::Canceled,
            _ => JobStatus::Processing,
        }
    }
}

/// One outstanding remote unit of work, owned by the orchestrator for the
/// duration of a generation.
#[derive(Debug, Clone)]
pub struct PredictionJob {
    /// The payload this job was submitted with
    pub input: ProviderInput,
    /// Provider-assigned handle
    pub handle: PredictionHandle,
    pub status: JobStatus,
    /// Raw provider output, set once the job succeeds
    pub output: Option<Value>,
}

/// Submit/poll driver over a [`ProviderApi`] transport.
#[derive(Clone)]
pub struct PredictionClient {
    api: Arc<dyn ProviderApi>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl PredictionClient {
    /// Client with the contractual polling parameters.
    pub fn new(api: Arc<dyn ProviderApi>) -> Self {
        Self::with_polling(api, POLL_INTERVAL, MAX_POLL_ATTEMPTS)
    }

    /// Client with explicit polling parameters (tests, tuning).
    pub fn with_polling(api: Arc<dyn ProviderApi>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            poll_interval,
            max_attempts,
        }
    }

    /// Submit one job. Fails immediately with `ProviderRequest` on a
    /// rejected or unparseable submission; no polling happens here.
    pub async fn submit(&self, input: ProviderInput) -> Result<PredictionJob> {
        let handle = self.api.create_prediction(&input).await?;
        Ok(PredictionJob {
            input,
            handle,
            status: JobStatus::Submitted,
            output: None,
        })
    }

    /// Poll a submitted job to its terminal state and return its output.
    ///
    /// Polls are strictly sequential with a fixed sleep between them, so a
    /// job's timeout budget is exactly `poll_interval × max_attempts`.
    pub async fn await_completion(&self, job: &mut PredictionJob) -> Result<Value> {
        for attempt in 1..=self.max_attempts {
            let poll = self.api.poll_prediction(&job.handle).await?;
            let status = JobStatus::from_wire(&poll.status);

            match status {
                JobStatus::Succeeded => {
                    job.status = JobStatus::Succeeded;
                    job.output = poll.output.clone();
                    tracing::info!(
                        prediction_id = %job.handle.id,
                        model = job.input.model().label(),
                        attempts = attempt,
                        "Prediction succeeded"
                    );
                    return Ok(poll.output.unwrap_or(Value::Null));
                }
                JobStatus::Failed | JobStatus::Canceled => {
                    job.status = status;
                    let message = poll.error_message();
                    tracing::warn!(
                        prediction_id = %job.handle.id,
                        model = job.input.model().label(),
                        status = %poll.status,
                        error = %message,
                        "Prediction reached a failure state"
                    );
                    return Err(GenerationError::ProviderJob {
                        status: poll.status,
                        message,
                    });
                }
                _ => {
                    job.status = JobStatus::Processing;
                    tracing::debug!(
                        prediction_id = %job.handle.id,
                        status = %poll.status,
                        attempt,
                        "Prediction still running"
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        job.status = JobStatus::TimedOut;
        tracing::warn!(
            prediction_id = %job.handle.id,
            model = job.input.model().label(),
            attempts = self.max_attempts,
            "Prediction timed out"
        );
        Err(GenerationError::ProviderTimeout {
            attempts: self.max_attempts,
        })
    }
}
