use crate::domain::answer_store::AnswerStore;
use crate::domain::flow_definition::ScaleDefinition;
use crate::domain::flow_state::{FlowId, FlowInstanceId, ScaleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Score and raw answers of one completed questionnaire scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleResult {
    /// Sum of the selected option values
    pub score: u32,

    /// Highest achievable score
    pub max_score: u32,

    /// Selected value per question index
    pub answers: BTreeMap<usize, u32>,

    /// Interpretation band the score falls into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,

    /// Critical questions answered with a non-zero value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flagged: Vec<usize>,
}

impl ScaleResult {
    /// Summarize `store` against its scale definition
    pub fn from_store(definition: &ScaleDefinition, store: &AnswerStore) -> Self {
        let score = store.score();
        let flagged = definition
            .questions()
            .iter()
            .enumerate()
            .filter(|(index, question)| {
                question.critical && store.get_answer(*index).map_or(false, |v| v > 0)
            })
            .map(|(index, _)| index)
            .collect();

        Self {
            score,
            max_score: definition.max_score(),
            answers: store.answers().clone(),
            band: definition.band_for(score).map(str::to_string),
            flagged,
        }
    }
}

/// Terminal artifact of a completed flow
///
/// Serialized in camelCase with the per-scale results flattened next to the
/// metadata, e.g. `{"phq9": {"score": 12, ...}, "gad7": {...}, "duration": 8123}`.
/// Stored records are read back as plain JSON values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    /// Flow definition the result belongs to
    pub flow_id: FlowId,

    /// Flow instance that produced the result
    pub instance_id: FlowInstanceId,

    /// Questionnaire results keyed by scale id
    #[serde(flatten)]
    pub scales: BTreeMap<String, ScaleResult>,

    /// Free-form wizard data collected during the flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Walkthrough scales the user skipped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScaleId>,

    /// When the flow started
    pub started_at: DateTime<Utc>,

    /// When the flow completed
    pub completed_at: DateTime<Utc>,

    /// Elapsed time in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl FlowResult {
    /// Result of a single scale
    pub fn scale(&self, id: &str) -> Option<&ScaleResult> {
        self.scales.get(id)
    }

    /// Sum of all scale scores
    pub fn total_score(&self) -> u32 {
        self.scales
            .values()
            .fold(0u32, |sum, s| sum.saturating_add(s.score))
    }

    /// True if any scale reported a flagged critical answer
    pub fn has_flags(&self) -> bool {
        self.scales.values().any(|s| !s.flagged.is_empty())
    }
}
