//! Genome merge protocol
//!
//! Folds the raw model output for one round into the cumulative requirement
//! genome. Pure data transformation: transport retries happen below this
//! layer, registry writes above it. A malformed result is fatal for the
//! round and is never retried here.

use reqflow_common::genome::{RequirementDocument, RequirementGenome};
use serde_json::Value;
use thiserror::Error;

/// Merge failures
#[derive(Debug, Error)]
pub enum MergeError {
    /// The gateway result is missing required fields or is not well-formed
    /// structured data
    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}

/// Disposition of one merge round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The round produced open questions for the client
    Clarifying,
    /// The round converged on a final requirement set
    Completed,
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The next cumulative state
    pub genome: RequirementGenome,
    pub disposition: Disposition,
    /// Present only on completion, and only when the model produced one
    pub document: Option<RequirementDocument>,
}

/// Merge the raw analysis result into the prior genome.
///
/// Expects an object with a `status` of `"clarifying"` or `"completed"` and
/// an `updated_state` shaped like a genome; a `document` may accompany
/// completion. The reported `round` is accepted as-is: the model is
/// instructed to produce `prior.round + 1`, and a mismatch is logged but not
/// corrected.
pub fn merge_analysis(
    prior: &RequirementGenome,
    raw: Value,
) -> Result<MergeOutcome, MergeError> {
    let object = raw
        .as_object()
        .ok_or_else(|| MergeError::MalformedResponse("expected a JSON object".to_string()))?;

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| MergeError::MalformedResponse("missing required field: status".to_string()))?;

    let updated_state = object.get("updated_state").ok_or_else(|| {
        MergeError::MalformedResponse("missing required field: updated_state".to_string())
    })?;

    let genome: RequirementGenome = serde_json::from_value(updated_state.clone())
        .map_err(|e| MergeError::MalformedResponse(format!("invalid updated_state: {}", e)))?;

    if genome.round != prior.round + 1 {
        tracing::warn!(
            prior_round = prior.round,
            reported_round = genome.round,
            "Reported round does not follow prior round, accepting as reported"
        );
    }

    match status {
        "clarifying" => Ok(MergeOutcome {
            genome,
            disposition: Disposition::Clarifying,
            document: None,
        }),
        "completed" => {
            let document = match object.get("document") {
                Some(value) => Some(
                    serde_json::from_value(value.clone()).map_err(|e| {
                        MergeError::MalformedResponse(format!("invalid document: {}", e))
                    })?,
                ),
                None => None,
            };
            Ok(MergeOutcome {
                genome,
                disposition: Disposition::Completed,
                document,
            })
        }
        other => Err(MergeError::MalformedResponse(format!(
            "unrecognized status: {:?}",
            other
        ))),
    }
}
