//! Requirement genome and document models
//!
//! The genome is the cumulative, round-indexed representation of everything
//! understood about the user's requirements so far. It is owned by the client
//! between rounds: each feedback submission carries the full prior genome,
//! and the analysis replaces the summary, feature, story and constraint
//! sequences wholesale from the complete conversation history.

use serde::{Deserialize, Serialize};

/// Cumulative requirement state, advanced by one round per successful merge.
///
/// All fields default so a client may submit any subset (a first-round
/// submission is typically just `{"round": 0}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementGenome {
    /// Merge round counter, starts at 0
    #[serde(default)]
    pub round: u32,
    /// Free-text synopsis, replaced each round
    #[serde(default)]
    pub requirements_summary: String,
    /// Distinct functional features, replaced each round
    #[serde(default)]
    pub features: Vec<String>,
    /// User stories; `id` unique within the sequence
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
    /// Technical, business or other constraints
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Open questions; non-empty only while a round is clarifying
    #[serde(default)]
    pub clarifications_needed: Vec<String>,
}

/// One user story in "As a [role], I want [goal] so that [benefit]" form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// Terminal artifact of a completed refinement. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementDocument {
    pub project: ProjectInfo,
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub technical_requirements: Vec<String>,
    #[serde(default)]
    pub non_functional_requirements: Vec<String>,
}

/// Project descriptor for the requirement document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Feature entry with back-references to the user stories it realizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub related_user_stories: Vec<String>,
}
