//! Scripted provider transport for tests
//!
//! Available under the `test-util` feature so dependent crates (the relay's
//! integration tests) can drive the engine without network access, while
//! staying out of release builds.
//! Each model gets a plan: a number of non-terminal polls followed by a
//! terminal outcome. Unplanned models succeed on their first poll with a
//! deterministic mock URL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use songlab_common::error::{GenerationError, Result};

use crate::provider::{ProviderInput, ProviderModel};
use crate::transport::{PredictionHandle, PredictionPoll, ProviderApi};

/// Terminal outcome of a planned mock prediction.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Report `succeeded` with this output value
    Succeed(Value),
    /// Report `failed` with this provider error message
    Fail(String),
    /// Report `canceled`
    Cancel,
}

#[derive(Debug, Clone)]
struct MockPlan {
    non_terminal_polls: u32,
    outcome: MockOutcome,
}

#[derive(Debug, Clone)]
struct Refusal {
    status: u16,
    body: String,
}

/// Scripted [`ProviderApi`] implementation.
#[derive(Default)]
pub struct MockProviderApi {
    plans: Mutex<HashMap<ProviderModel, MockPlan>>,
    refusals: Mutex<HashMap<ProviderModel, Refusal>>,
    job_plans: Mutex<HashMap<String, MockPlan>>,
    poll_counts: Mutex<HashMap<String, u32>>,
    submitted: Mutex<Vec<String>>,
    canceled: Mutex<Vec<String>>,
    next_id: AtomicU32,
}

impl MockProviderApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a model: report `processing` for `non_terminal_polls` polls,
    /// then the terminal `outcome` on the next poll.
    pub fn plan(&self, model: ProviderModel, non_terminal_polls: u32, outcome: MockOutcome) {
        self.plans.lock().unwrap().insert(
            model,
            MockPlan {
                non_terminal_polls,
                outcome,
            },
        );
    }

    /// Script a model's submission to be rejected outright.
    pub fn refuse_submission(&self, model: ProviderModel, status: u16, body: &str) {
        self.refusals.lock().unwrap().insert(
            model,
            Refusal {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Number of polls a prediction id has received.
    pub fn poll_count(&self, id: &str) -> u32 {
        self.poll_counts.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// Prediction ids in submission order.
    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    /// Prediction ids that received a cancel request.
    pub fn canceled_ids(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }

    fn plan_for(&self, model: ProviderModel) -> MockPlan {
        self.plans.lock().unwrap().get(&model).cloned().unwrap_or(MockPlan {
            non_terminal_polls: 0,
            outcome: MockOutcome::Succeed(json!(format!(
                "https://mock.example/{}/output",
                model.label()
            ))),
        })
    }
}

#[async_trait]
impl ProviderApi for MockProviderApi {
    async fn create_prediction(&self, input: &ProviderInput) -> Result<PredictionHandle> {
        let model = input.model();

        if let Some(refusal) = self.refusals.lock().unwrap().get(&model) {
            return Err(GenerationError::provider_request(refusal.status, &refusal.body));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-{}", model.label(), n);
        self.job_plans.lock().unwrap().insert(id.clone(), self.plan_for(model));
        self.submitted.lock().unwrap().push(id.clone());

        Ok(PredictionHandle { id, poll_url: None })
    }

    async fn poll_prediction(&self, handle: &PredictionHandle) -> Result<PredictionPoll> {
        let plan = self
            .job_plans
            .lock()
            .unwrap()
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| GenerationError::provider_request(404, "unknown prediction"))?;

        let count = {
            let mut counts = self.poll_counts.lock().unwrap();
            let entry = counts.entry(handle.id.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if count <= plan.non_terminal_polls {
            return Ok(PredictionPoll {
                status: "processing".to_string(),
                output: None,
                error: None,
            });
        }

        Ok(match plan.outcome {
            MockOutcome::Succeed(output) => PredictionPoll {
                status: "succeeded".to_string(),
                output: Some(output),
                error: None,
            },
            MockOutcome::Fail(message) => PredictionPoll {
                status: "failed".to_string(),
                output: None,
                error: Some(Value::String(message)),
            },
            MockOutcome::Cancel => PredictionPoll {
                status: "canceled".to_string(),
                output: None,
                error: None,
            },
        })
    }

    async fn cancel_prediction(&self, handle: &PredictionHandle) -> Result<()> {
        self.canceled.lock().unwrap().push(handle.id.clone());
        Ok(())
    }
}
