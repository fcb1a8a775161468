//! Task records for requirement analysis rounds
//!
//! One record tracks one feedback submission from registration to its
//! disposition. A record is written only by its background analysis task
//! until it settles; after that it is read-only.

use chrono::{DateTime, Utc};
use reqflow_common::genome::{RequirementDocument, RequirementGenome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an analysis task
///
/// ```text
/// analyzing --> clarifying   (round needs client input)
/// analyzing --> completed    (document produced)
/// analyzing --> failed       (gateway or merge failure)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Analyzing,
    Clarifying,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether the round has settled and no further mutation will occur
    pub fn is_settled(&self) -> bool {
        !matches!(self, TaskStatus::Analyzing)
    }
}

/// One requirement analysis round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier, never reused
    pub id: Uuid,
    /// Genome round this task is processing or produced
    pub round: u32,
    pub status: TaskStatus,
    /// Submitted genome until the merge settles, then the produced genome
    pub updated_state: RequirementGenome,
    /// Present iff status is completed and the analysis produced a document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<RequirementDocument>,
    /// Open questions; populated iff status is clarifying
    pub clarifications_needed: Vec<String>,
    /// Human-readable cause; present iff status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// New record in `analyzing` state for a submitted genome
    pub fn new(state: RequirementGenome) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            round: state.round,
            status: TaskStatus::Analyzing,
            updated_state: state,
            document: None,
            clarifications_needed: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Settle the round with open questions for the client
    pub fn mark_clarifying(&mut self, genome: RequirementGenome) {
        self.round = genome.round;
        self.clarifications_needed = genome.clarifications_needed.clone();
        self.updated_state = genome;
        self.document = None;
        self.error = None;
        self.status = TaskStatus::Clarifying;
        self.updated_at = Utc::now();
    }

    /// Settle the round as complete, attaching the document when produced
    pub fn mark_completed(
        &mut self,
        genome: RequirementGenome,
        document: Option<RequirementDocument>,
    ) {
        self.round = genome.round;
        self.updated_state = genome;
        self.clarifications_needed = Vec::new();
        self.document = document;
        self.error = None;
        self.status = TaskStatus::Completed;
        self.updated_at = Utc::now();
    }

    /// Settle the round as failed with a diagnostic cause
    pub fn mark_failed(&mut self, cause: String) {
        self.error = Some(cause);
        self.document = None;
        self.clarifications_needed = Vec::new();
        self.status = TaskStatus::Failed;
        self.updated_at = Utc::now();
    }
}
