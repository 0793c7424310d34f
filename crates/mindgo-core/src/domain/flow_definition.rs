use crate::domain::flow_state::{FlowId, ScaleId};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Keys of a serialized `FlowResult` that a scale id must not shadow
pub const RESERVED_RESULT_KEYS: &[&str] = &[
    "flowId",
    "instanceId",
    "payload",
    "skipped",
    "startedAt",
    "completedAt",
    "duration",
];

/// Represents a parsed and validated flow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// ID of the flow
    pub id: FlowId,

    /// Human-readable name of the flow
    pub name: String,

    /// Description of the flow
    #[serde(default)]
    pub description: Option<String>,

    /// The scales in this flow, in presentation order
    pub scales: Vec<ScaleDefinition>,

    /// Collection the result is appended to; the controller default applies when absent
    #[serde(default)]
    pub result_collection: Option<String>,

    /// Route to navigate to once the whole flow is finished
    #[serde(default)]
    pub completion_route: Option<String>,
}

/// One scale of a flow: a questionnaire instrument or a walkthrough step group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDefinition {
    /// ID of the scale, unique within the flow
    pub id: ScaleId,

    /// Display name
    pub name: String,

    /// Questions or steps
    pub kind: ScaleKind,

    /// Scale that must be complete before this one can be entered
    #[serde(default)]
    pub prerequisite: Option<ScaleId>,

    /// Route to navigate to when this scale completes
    #[serde(default)]
    pub completion_route: Option<String>,

    /// Score interpretation bands, questionnaires only
    #[serde(default)]
    pub bands: Vec<ScoreBand>,
}

/// The content of a scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleKind {
    /// Scored question set
    Questionnaire {
        /// Questions, identified by their position
        questions: Vec<Question>,
    },

    /// Unscored sequence of informational steps
    Walkthrough {
        /// Steps in order
        steps: Vec<WalkthroughStep>,
    },
}

/// A single question of a questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt shown to the user
    pub prompt: String,

    /// Selectable options
    pub options: Vec<AnswerOption>,

    /// Any non-zero answer is reported in the scale result's flagged list
    #[serde(default)]
    pub critical: bool,
}

/// A selectable option with its numeric value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Value contributed to the score
    pub value: u32,

    /// Label shown to the user
    pub label: String,
}

/// A single walkthrough step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkthroughStep {
    /// Step title
    pub title: String,

    /// Step body text
    #[serde(default)]
    pub body: String,
}

/// Inclusive score range with its interpretation label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBand {
    /// Lowest score in the band
    pub min: u32,

    /// Highest score in the band
    pub max: u32,

    /// Interpretation, e.g. "mild"
    pub label: String,
}

impl Question {
    /// Create a non-critical question
    pub fn new(prompt: impl Into<String>, options: Vec<AnswerOption>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            critical: false,
        }
    }

    /// Mark the question as critical
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Whether `value` is one of this question's option values
    #[inline]
    pub fn allows(&self, value: u32) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// Highest option value
    pub fn max_value(&self) -> u32 {
        self.options.iter().map(|o| o.value).max().unwrap_or(0)
    }
}

impl AnswerOption {
    /// Create an option
    pub fn new(value: u32, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

impl WalkthroughStep {
    /// Create a step
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl ScaleDefinition {
    /// Number of questions or steps
    pub fn len(&self) -> usize {
        match &self.kind {
            ScaleKind::Questionnaire { questions } => questions.len(),
            ScaleKind::Walkthrough { steps } => steps.len(),
        }
    }

    /// True when the scale has no questions or steps
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for scored question sets
    pub fn is_questionnaire(&self) -> bool {
        matches!(self.kind, ScaleKind::Questionnaire { .. })
    }

    /// Questions of a questionnaire, empty for walkthroughs
    pub fn questions(&self) -> &[Question] {
        match &self.kind {
            ScaleKind::Questionnaire { questions } => questions,
            ScaleKind::Walkthrough { .. } => &[],
        }
    }

    /// Highest achievable score, saturating at `u32::MAX`
    pub fn max_score(&self) -> u32 {
        self.checked_max_score().unwrap_or(u32::MAX)
    }

    /// Highest achievable score, `None` if it does not fit in `u32`
    pub fn checked_max_score(&self) -> Option<u32> {
        self.questions()
            .iter()
            .try_fold(0u32, |sum, question| sum.checked_add(question.max_value()))
    }

    /// Interpretation label for `score`
    pub fn band_for(&self, score: u32) -> Option<&str> {
        self.bands
            .iter()
            .find(|band| band.min <= score && score <= band.max)
            .map(|band| band.label.as_str())
    }
}

impl FlowDefinition {
    /// Parse a YAML flow definition and validate it
    pub fn from_yaml(yaml: &str) -> Result<Self, CoreError> {
        let definition: FlowDefinition = serde_yaml::from_str(yaml)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Position of a scale by id
    pub fn scale_index(&self, id: &ScaleId) -> Option<usize> {
        self.scales.iter().position(|scale| &scale.id == id)
    }

    /// Total number of questions across all questionnaire scales
    pub fn question_count(&self) -> usize {
        self.scales.iter().map(|s| s.questions().len()).sum()
    }

    /// Validate the flow definition
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scales.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Flow {} must have at least one scale",
                self.id.0
            )));
        }

        let mut scale_ids = HashSet::new();
        for scale in &self.scales {
            if !scale_ids.insert(scale.id.0.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate scale ID: {}",
                    scale.id.0
                )));
            }
            if RESERVED_RESULT_KEYS.contains(&scale.id.0.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Scale ID {} is reserved",
                    scale.id.0
                )));
            }
            self.validate_scale(scale)?;
        }

        for scale in &self.scales {
            if let Some(prerequisite) = &scale.prerequisite {
                if prerequisite == &scale.id {
                    return Err(CoreError::ValidationError(format!(
                        "Scale {} cannot be its own prerequisite",
                        scale.id.0
                    )));
                }
                if !scale_ids.contains(prerequisite.0.as_str()) {
                    return Err(CoreError::ValidationError(format!(
                        "Scale {} references non-existent prerequisite: {}",
                        scale.id.0, prerequisite.0
                    )));
                }
            }
        }

        self.check_for_cycles()?;

        let total = self.scales.iter().try_fold(0u32, |sum, scale| {
            scale
                .checked_max_score()
                .and_then(|max| sum.checked_add(max))
        });
        if total.is_none() {
            return Err(CoreError::ValidationError(format!(
                "Maximum total score of flow {} does not fit in 32 bits",
                self.id.0
            )));
        }

        Ok(())
    }

    fn validate_scale(&self, scale: &ScaleDefinition) -> Result<(), CoreError> {
        if scale.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Scale {} must have at least one question or step",
                scale.id.0
            )));
        }

        for (index, question) in scale.questions().iter().enumerate() {
            if question.options.is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "Question {} of scale {} has no options",
                    index, scale.id.0
                )));
            }
            let mut values = HashSet::new();
            for option in &question.options {
                if !values.insert(option.value) {
                    return Err(CoreError::ValidationError(format!(
                        "Question {} of scale {} repeats option value {}",
                        index, scale.id.0, option.value
                    )));
                }
            }
        }

        if scale.checked_max_score().is_none() {
            return Err(CoreError::ValidationError(format!(
                "Maximum score of scale {} does not fit in 32 bits",
                scale.id.0
            )));
        }

        for band in &scale.bands {
            if band.min > band.max {
                return Err(CoreError::ValidationError(format!(
                    "Band {} of scale {} has min {} above max {}",
                    band.label, scale.id.0, band.min, band.max
                )));
            }
        }

        Ok(())
    }

    /// Check for cycles in the prerequisite chain
    fn check_for_cycles(&self) -> Result<(), CoreError> {
        let dep_map: HashMap<&str, Option<&str>> = self
            .scales
            .iter()
            .map(|s| (s.id.0.as_str(), s.prerequisite.as_ref().map(|p| p.0.as_str())))
            .collect();

        // every scale has at most one prerequisite, so following the chain suffices
        for scale in &self.scales {
            let mut seen = HashSet::new();
            let mut current = Some(scale.id.0.as_str());
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(CoreError::ValidationError(format!(
                        "Cycle detected in scale prerequisites involving scale: {}",
                        scale.id.0
                    )));
                }
                current = dep_map.get(id).copied().flatten();
            }
        }

        Ok(())
    }
}
