//! Shared test doubles and polling helpers
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use reqflow_common::genome::RequirementGenome;
use reqflow_ra::models::TaskRecord;
use reqflow_ra::services::ai_client::{GatewayError, InferenceGateway};
use reqflow_ra::services::orchestrator::{AnalysisOrchestrator, RetrySettings};
use reqflow_ra::services::registry::TaskRegistry;

/// One scripted gateway response
pub enum Step {
    Succeed(Value),
    Overloaded,
    Fail(u16, String),
}

/// Gateway double replaying a scripted sequence of results.
///
/// The last step repeats if invoked past the end of the script; every
/// invocation is counted.
pub struct ScriptedGateway {
    calls: AtomicUsize,
    steps: Vec<Step>,
}

impl ScriptedGateway {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script must not be empty");
        Self {
            calls: AtomicUsize::new(0),
            steps,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn generate(
        &self,
        _prompt: &str,
        _state: &RequirementGenome,
    ) -> Result<Value, GatewayError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(index)
            .unwrap_or_else(|| self.steps.last().expect("script must not be empty"));
        match step {
            Step::Succeed(value) => Ok(value.clone()),
            Step::Overloaded => Err(GatewayError::Overloaded),
            Step::Fail(code, message) => Err(GatewayError::Api(*code, message.clone())),
        }
    }
}

/// Gateway double that never resolves within a test's lifetime
pub struct StalledGateway;

#[async_trait]
impl InferenceGateway for StalledGateway {
    async fn generate(
        &self,
        _prompt: &str,
        _state: &RequirementGenome,
    ) -> Result<Value, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(GatewayError::MissingContent)
    }
}

/// Gateway double that panics on invocation
pub struct PanickingGateway;

#[async_trait]
impl InferenceGateway for PanickingGateway {
    async fn generate(
        &self,
        _prompt: &str,
        _state: &RequirementGenome,
    ) -> Result<Value, GatewayError> {
        panic!("scripted gateway panic");
    }
}

/// Retry settings with millisecond delays so retry tests run fast
pub fn fast_retry() -> RetrySettings {
    RetrySettings {
        max_retries: 3,
        initial_delay: Duration::from_millis(5),
    }
}

/// Orchestrator plus its registry, wired to the given gateway double
pub fn orchestrator_with<G: InferenceGateway + 'static>(
    gateway: Arc<G>,
) -> (AnalysisOrchestrator, TaskRegistry) {
    let registry = TaskRegistry::new();
    let orchestrator = AnalysisOrchestrator::new(
        registry.clone(),
        gateway,
        fast_retry(),
        Arc::new(RwLock::new(None)),
    );
    (orchestrator, registry)
}

/// Poll the registry until the task settles (or the test times out)
pub async fn poll_until_settled(registry: &TaskRegistry, id: Uuid) -> TaskRecord {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(record) = registry.get(id).await {
                if record.status.is_settled() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("analysis task did not settle in time")
}

/// Scripted clarifying result for the given round
pub fn clarifying_result(round: u32, questions: &[&str]) -> Value {
    json!({
        "status": "clarifying",
        "updated_state": {
            "round": round,
            "requirements_summary": "Understood so far",
            "features": ["Feature 1"],
            "clarifications_needed": questions,
        }
    })
}

/// Scripted completed result with a document for the given project name
pub fn completed_result(round: u32, project_name: &str) -> Value {
    json!({
        "status": "completed",
        "updated_state": {
            "round": round,
            "requirements_summary": "All requirements captured",
            "features": ["Feature 1"],
            "clarifications_needed": [],
        },
        "document": {
            "project": {"name": project_name, "description": "Generated project"},
            "user_stories": [
                {
                    "id": "US-1",
                    "title": "Core flow",
                    "description": "As a user, I want the core flow so that I get value",
                    "acceptance_criteria": ["Works end to end"],
                    "priority": "high"
                }
            ],
            "features": [
                {
                    "id": "F-1",
                    "name": "Feature 1",
                    "description": "The core feature",
                    "related_user_stories": ["US-1"]
                }
            ],
            "constraints": [],
            "technical_requirements": [],
            "non_functional_requirements": []
        }
    })
}
