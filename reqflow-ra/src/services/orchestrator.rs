//! Analysis task orchestration
//!
//! Drives one feedback submission end-to-end: register a task record,
//! spawn the background analysis, call the gateway under retry, merge the
//! result, and write the disposition back to the registry.
//!
//! State progression per task:
//! ANALYZING → CLARIFYING | COMPLETED | FAILED
//!
//! The background unit is fire-and-forget: `submit` returns as soon as the
//! record exists, and the spawned task runs to its disposition whether or
//! not anyone polls. Every failure path, panics included, settles the task
//! as failed; a submitted task never stays analyzing forever.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqflow_common::genome::RequirementGenome;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::TaskRecord;
use crate::services::ai_client::InferenceGateway;
use crate::services::backoff::retry_with_backoff;
use crate::services::merge::{merge_analysis, Disposition, MergeOutcome};
use crate::services::prompt::build_analysis_prompt;
use crate::services::registry::TaskRegistry;

/// Gateway retry settings for one analysis round
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    /// Total gateway attempts, first try included
    pub max_retries: u32,
    /// Delay before the first retry, doubled per retry
    pub initial_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

/// Orchestrates requirement analysis rounds
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    registry: TaskRegistry,
    gateway: Arc<dyn InferenceGateway>,
    retry: RetrySettings,
    last_error: Arc<RwLock<Option<String>>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        registry: TaskRegistry,
        gateway: Arc<dyn InferenceGateway>,
        retry: RetrySettings,
        last_error: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            registry,
            gateway,
            retry,
            last_error,
        }
    }

    /// Register a new analysis round and spawn its background task.
    ///
    /// Returns the task id without waiting on inference; the caller polls
    /// the registry for the disposition. Registry creation strictly
    /// precedes the spawn, so a poll issued right after return always finds
    /// the record in `analyzing`.
    pub async fn submit(&self, feedback: String, state: RequirementGenome) -> Uuid {
        let record = TaskRecord::new(state.clone());
        let task_id = self.registry.create(record).await;

        tracing::info!(
            task_id = %task_id,
            round = state.round,
            "Analysis task registered"
        );

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_analysis(task_id, feedback, state).await;
        });

        task_id
    }

    /// Background unit for one analysis round.
    ///
    /// Performs exactly one registry mutation. Any failure (gateway errors
    /// after retries, malformed results, or a panic below this frame) is
    /// converted into a failed record carrying the stringified cause.
    async fn run_analysis(&self, task_id: Uuid, feedback: String, state: RequirementGenome) {
        let analysis = AssertUnwindSafe(self.analyze(&feedback, &state))
            .catch_unwind()
            .await;

        let settled = match analysis {
            Ok(Ok(outcome)) => self.settle_round(task_id, outcome).await,
            Ok(Err(err)) => self.settle_failure(task_id, err.to_string()).await,
            Err(panic) => {
                self.settle_failure(task_id, panic_message(panic.as_ref()))
                    .await
            }
        };

        // The record was created before the spawn; this only fires if the
        // registry itself misbehaves.
        if let Err(e) = settled {
            tracing::error!(task_id = %task_id, error = %e, "Failed to settle analysis task");
        }
    }

    /// One full round against the gateway: prompt, retried call, merge
    async fn analyze(
        &self,
        feedback: &str,
        state: &RequirementGenome,
    ) -> anyhow::Result<MergeOutcome> {
        let prompt = build_analysis_prompt(state, feedback);

        let raw = retry_with_backoff(
            "requirement analysis",
            self.retry.max_retries,
            self.retry.initial_delay,
            || self.gateway.generate(&prompt, state),
        )
        .await?;

        Ok(merge_analysis(state, raw)?)
    }

    async fn settle_round(
        &self,
        task_id: Uuid,
        outcome: MergeOutcome,
    ) -> reqflow_common::Result<()> {
        tracing::info!(
            task_id = %task_id,
            round = outcome.genome.round,
            disposition = ?outcome.disposition,
            "Analysis round settled"
        );

        self.registry
            .mutate(task_id, |record| match outcome.disposition {
                Disposition::Clarifying => record.mark_clarifying(outcome.genome),
                Disposition::Completed => record.mark_completed(outcome.genome, outcome.document),
            })
            .await
    }

    async fn settle_failure(
        &self,
        task_id: Uuid,
        cause: String,
    ) -> reqflow_common::Result<()> {
        tracing::error!(task_id = %task_id, error = %cause, "Analysis round failed");
        *self.last_error.write().await = Some(cause.clone());

        self.registry
            .mutate(task_id, |record| record.mark_failed(cause))
            .await
    }
}

/// Extract a readable message from a panic payload
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("analysis task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("analysis task panicked: {}", message)
    } else {
        "analysis task panicked".to_string()
    }
}
