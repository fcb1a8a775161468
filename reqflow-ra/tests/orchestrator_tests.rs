//! Integration tests for the analysis orchestration lifecycle
//!
//! Each test wires the orchestrator to a gateway double and observes the
//! task registry the way a polling client would.

mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use helpers::*;
use reqflow_common::genome::RequirementGenome;
use reqflow_ra::models::TaskStatus;
use uuid::Uuid;

#[tokio::test]
async fn submit_returns_before_the_gateway_resolves() {
    let (orchestrator, registry) = orchestrator_with(Arc::new(StalledGateway));

    let started = Instant::now();
    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "submit blocked on the gateway"
    );

    // The record exists in analyzing state before any gateway progress
    let record = registry.get(task_id).await.expect("record must exist");
    assert_eq!(record.status, TaskStatus::Analyzing);
    assert!(record.document.is_none());
    assert!(record.error.is_none());
    assert!(record.clarifications_needed.is_empty());
}

#[tokio::test]
async fn clarifying_round_reaches_clarifying_with_questions() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Succeed(
        clarifying_result(1, &["Which user roles?"]),
    )]));
    let (orchestrator, registry) = orchestrator_with(gateway);

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Clarifying);
    assert_eq!(record.clarifications_needed, vec!["Which user roles?"]);
    assert!(record.document.is_none());
    assert!(record.error.is_none());
    // Round advanced by exactly one
    assert_eq!(record.round, 1);
    assert_eq!(record.updated_state.round, 1);
}

#[tokio::test]
async fn completed_round_attaches_the_document() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Succeed(
        completed_result(2, "X"),
    )]));
    let (orchestrator, registry) = orchestrator_with(gateway);

    let prior = RequirementGenome {
        round: 1,
        requirements_summary: "A todo app".to_string(),
        ..Default::default()
    };
    let task_id = orchestrator.submit("Looks good".to_string(), prior).await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.updated_state.round, 2);
    assert!(record.clarifications_needed.is_empty());
    let document = record.document.expect("completed round carries document");
    assert_eq!(document.project.name, "X");
}

#[tokio::test]
async fn transient_overload_is_retried_to_success() {
    let gateway = Arc::new(ScriptedGateway::new(vec![
        Step::Overloaded,
        Step::Overloaded,
        Step::Succeed(clarifying_result(1, &["Anything else?"])),
    ]));
    let (orchestrator, registry) = orchestrator_with(Arc::clone(&gateway));

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Clarifying);
    // Two overload failures plus the success
    assert_eq!(gateway.calls(), 3);
}

#[tokio::test]
async fn overload_past_the_attempt_cap_fails_the_task() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Overloaded]));
    let (orchestrator, registry) = orchestrator_with(Arc::clone(&gateway));

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(gateway.calls(), 3);
    assert!(record
        .error
        .expect("failed round carries cause")
        .to_lowercase()
        .contains("overloaded"));
}

#[tokio::test]
async fn non_transient_failure_is_not_retried() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Fail(
        500,
        "boom".to_string(),
    )]));
    let (orchestrator, registry) = orchestrator_with(Arc::clone(&gateway));

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(gateway.calls(), 1);
    assert!(record.error.expect("cause captured").contains("boom"));
}

#[tokio::test]
async fn malformed_gateway_result_fails_the_round() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Succeed(
        serde_json::json!({"unexpected": true}),
    )]));
    let (orchestrator, registry) = orchestrator_with(gateway);

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record
        .error
        .expect("cause captured")
        .contains("Malformed analysis response"));
}

#[tokio::test]
async fn gateway_panic_settles_the_task_as_failed() {
    let (orchestrator, registry) = orchestrator_with(Arc::new(PanickingGateway));

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let record = poll_until_settled(&registry, task_id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record
        .error
        .expect("cause captured")
        .contains("panicked"));
}

#[tokio::test]
async fn settled_records_are_stable_across_polls() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Succeed(
        clarifying_result(1, &["Which user roles?"]),
    )]));
    let (orchestrator, registry) = orchestrator_with(gateway);

    let task_id = orchestrator
        .submit("Build a todo app".to_string(), RequirementGenome::default())
        .await;

    let settled = poll_until_settled(&registry, task_id).await;
    for _ in 0..5 {
        assert_eq!(registry.get(task_id).await.unwrap(), settled);
    }
}

#[tokio::test]
async fn unknown_task_id_is_not_found() {
    let (_, registry) = orchestrator_with(Arc::new(StalledGateway));
    assert!(registry.get(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn concurrent_submissions_settle_independently() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Step::Succeed(
        clarifying_result(1, &["Which user roles?"]),
    )]));
    let (orchestrator, registry) = orchestrator_with(Arc::clone(&gateway));

    let mut task_ids = Vec::new();
    for i in 0..5 {
        task_ids.push(
            orchestrator
                .submit(format!("Feedback {}", i), RequirementGenome::default())
                .await,
        );
    }

    for task_id in &task_ids {
        let record = poll_until_settled(&registry, *task_id).await;
        assert_eq!(record.status, TaskStatus::Clarifying);
    }

    // Distinct ids, one gateway call each
    let mut deduped = task_ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), task_ids.len());
    assert_eq!(gateway.calls(), 5);
}
