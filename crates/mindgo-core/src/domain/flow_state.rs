//! Flow instance aggregate
//!
//! `FlowState` is owned by exactly one controller for the duration of a user
//! session. It combines the step sequencer with one answer store per
//! questionnaire scale and buffers the domain events produced by every change.

use crate::domain::answer_store::AnswerStore;
use crate::domain::events::FlowEvent;
use crate::domain::flow_definition::{FlowDefinition, ScaleDefinition, ScaleKind};
use crate::domain::result::{FlowResult, ScaleResult};
use crate::domain::sequencer::{Advance, StepSequencer};
use crate::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Value object: Flow ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub String);

/// Value object: Scale ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScaleId(pub String);

/// Value object: Flow Instance ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowInstanceId(pub String);

/// Represents a timer identifier for scheduled auto-advances
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub String);

macro_rules! string_id {
    ($($name:ident),*) => {
        $(
            impl $name {
                /// Borrow the raw identifier
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

string_id!(FlowId, ScaleId, FlowInstanceId, TimerId);

impl FlowInstanceId {
    /// Generate a random instance id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl TimerId {
    /// Generate a random timer id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Flow instance status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    /// No flow has been started
    NotStarted,

    /// A scale is active at the given step
    InScale {
        /// Active scale
        scale: ScaleId,
        /// Step index within the scale
        step: usize,
    },

    /// The flow completed and its result was handed to storage
    FlowComplete,

    /// The flow was discarded before completion
    Abandoned,
}

impl FlowStatus {
    /// True for `FlowComplete` and `Abandoned`
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::FlowComplete | FlowStatus::Abandoned)
    }
}

/// Outcome of a navigation operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Position did not change
    Stayed,

    /// Moved to another step of the active scale
    Moved {
        /// Active scale
        scale: ScaleId,
        /// New step index
        step: usize,
    },

    /// The previous scale finished and another one became active
    ScaleStarted {
        /// Newly active scale
        scale: ScaleId,
    },

    /// On the final step of a scale that still has unanswered questions
    AwaitingAnswers {
        /// Active scale
        scale: ScaleId,
        /// Unanswered question indices
        missing: Vec<usize>,
    },

    /// Every scale is complete
    FlowComplete,
}

impl Transition {
    /// True if the transition changed the user's position
    pub fn changes_position(&self) -> bool {
        matches!(
            self,
            Transition::Moved { .. } | Transition::ScaleStarted { .. } | Transition::FlowComplete
        )
    }
}

/// Per-scale progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleProgress {
    /// Answers of a questionnaire scale
    Questionnaire(AnswerStore),

    /// Walkthrough scales only remember whether they were skipped
    Walkthrough {
        /// Set when the user skipped the walkthrough
        skipped: bool,
    },
}

/// Aggregate: one user's pass through a flow
#[derive(Debug, Clone)]
pub struct FlowState {
    /// Unique identifier
    pub id: FlowInstanceId,

    definition: Arc<FlowDefinition>,
    sequencer: StepSequencer,
    progress: Vec<ScaleProgress>,
    payload: Map<String, Value>,
    started_at: DateTime<Utc>,
    events: Vec<FlowEvent>,
}

impl FlowState {
    /// Start a new instance at scale 0, step 0
    ///
    /// The definition is expected to have passed `FlowDefinition::validate`.
    pub fn new(definition: Arc<FlowDefinition>) -> Self {
        let progress = definition
            .scales
            .iter()
            .map(|scale| match &scale.kind {
                ScaleKind::Questionnaire { questions } => {
                    ScaleProgress::Questionnaire(AnswerStore::new(scale.id.clone(), questions))
                }
                ScaleKind::Walkthrough { .. } => ScaleProgress::Walkthrough { skipped: false },
            })
            .collect();
        let started_at = Utc::now();

        let mut state = Self {
            id: FlowInstanceId::generate(),
            sequencer: StepSequencer::new(&definition),
            definition,
            progress,
            payload: Map::new(),
            started_at,
            events: Vec::with_capacity(8),
        };

        state.record_event(FlowEvent::FlowStarted {
            instance_id: state.id.clone(),
            flow_id: state.definition.id.clone(),
            timestamp: started_at,
        });

        state
    }

    /// Definition this instance runs
    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    /// Position within the flow
    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    /// When the instance started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current status, always `InScale` while the aggregate exists
    pub fn status(&self) -> FlowStatus {
        FlowStatus::InScale {
            scale: self.sequencer.scale_id().clone(),
            step: self.sequencer.current_index(),
        }
    }

    /// Definition of the active scale
    pub fn active_scale(&self) -> &ScaleDefinition {
        &self.definition.scales[self.sequencer.scale_index()]
    }

    /// Progress of the scale at `index`
    pub fn progress(&self, index: usize) -> Option<&ScaleProgress> {
        self.progress.get(index)
    }

    /// Answer store of the questionnaire scale at `index`
    pub fn answers_at(&self, index: usize) -> Option<&AnswerStore> {
        match self.progress.get(index) {
            Some(ScaleProgress::Questionnaire(store)) => Some(store),
            _ => None,
        }
    }

    /// Answer store of a questionnaire scale by id
    pub fn answers(&self, scale: &ScaleId) -> Option<&AnswerStore> {
        self.definition
            .scale_index(scale)
            .and_then(|index| self.answers_at(index))
    }

    /// Answer store of the active scale
    pub fn active_answers(&self) -> Option<&AnswerStore> {
        self.answers_at(self.sequencer.scale_index())
    }

    /// Questionnaires are complete when every question is answered,
    /// walkthroughs once their final step was reached or they were skipped
    pub fn is_scale_complete(&self, index: usize) -> bool {
        match self.progress.get(index) {
            Some(ScaleProgress::Questionnaire(store)) => store.is_complete(),
            Some(ScaleProgress::Walkthrough { skipped }) => {
                *skipped || self.sequencer.reached_end(index)
            }
            None => false,
        }
    }

    /// True if the walkthrough at `index` was skipped
    pub fn is_scale_skipped(&self, index: usize) -> bool {
        matches!(
            self.progress.get(index),
            Some(ScaleProgress::Walkthrough { skipped: true })
        )
    }

    /// True once every scale is complete
    pub fn all_complete(&self) -> bool {
        (0..self.progress.len()).all(|index| self.is_scale_complete(index))
    }

    /// Answered questions across all questionnaire scales
    pub fn answered_questions(&self) -> usize {
        self.progress
            .iter()
            .map(|progress| match progress {
                ScaleProgress::Questionnaire(store) => store.answered_count(),
                ScaleProgress::Walkthrough { .. } => 0,
            })
            .sum()
    }

    /// Whether the scale at `index` may be entered now
    pub fn is_selectable(&self, index: usize) -> bool {
        self.sequencer
            .is_selectable(index, |prerequisite| self.is_scale_complete(prerequisite))
    }

    /// Answer the question on the current step
    pub fn record_answer(&mut self, value: u32) -> Result<Option<u32>, CoreError> {
        let question = self.sequencer.current_index();
        self.set_answer(question, value)
    }

    /// Answer an arbitrary question of the active scale
    pub fn set_answer(&mut self, question: usize, value: u32) -> Result<Option<u32>, CoreError> {
        let index = self.sequencer.scale_index();
        let store = match &mut self.progress[index] {
            ScaleProgress::Questionnaire(store) => store,
            ScaleProgress::Walkthrough { .. } => {
                return Err(CoreError::QuestionOutOfRange {
                    scale: self.sequencer.scale_id().0.clone(),
                    question,
                    count: 0,
                })
            }
        };

        let previous = store.set_answer(question, value)?;
        let scale = store.scale().clone();
        self.record_event(FlowEvent::AnswerRecorded {
            instance_id: self.id.clone(),
            scale,
            question,
            value,
            previous,
            timestamp: Utc::now(),
        });

        Ok(previous)
    }

    /// Move forward, finishing the scale from its final step when it is complete
    pub fn advance(&mut self) -> Transition {
        match self.sequencer.advance() {
            Advance::Moved(step) => {
                let scale = self.sequencer.scale_id().clone();
                self.record_event(FlowEvent::StepChanged {
                    instance_id: self.id.clone(),
                    scale: scale.clone(),
                    step,
                    timestamp: Utc::now(),
                });
                Transition::Moved { scale, step }
            }
            Advance::EndOfScale | Advance::EndOfFlow => {
                let index = self.sequencer.scale_index();
                if self.is_scale_complete(index) {
                    self.finish_active_scale()
                } else {
                    Transition::AwaitingAnswers {
                        scale: self.sequencer.scale_id().clone(),
                        missing: self.missing(index),
                    }
                }
            }
        }
    }

    /// Move back one step; `Stayed` at step 0
    pub fn retreat(&mut self) -> Transition {
        if !self.sequencer.retreat() {
            return Transition::Stayed;
        }

        let scale = self.sequencer.scale_id().clone();
        let step = self.sequencer.current_index();
        self.record_event(FlowEvent::StepChanged {
            instance_id: self.id.clone(),
            scale: scale.clone(),
            step,
            timestamp: Utc::now(),
        });
        Transition::Moved { scale, step }
    }

    /// Select another scale; answers already given are kept
    pub fn jump_to_scale(&mut self, scale: &ScaleId) -> Result<Transition, CoreError> {
        let complete: Vec<bool> = (0..self.progress.len())
            .map(|index| self.is_scale_complete(index))
            .collect();
        let before = self.sequencer.scale_index();
        let target = self.sequencer.jump_to_scale(scale, |index| complete[index])?;

        if target == before {
            return Ok(Transition::Stayed);
        }

        self.record_event(FlowEvent::ScaleActivated {
            instance_id: self.id.clone(),
            scale: scale.clone(),
            timestamp: Utc::now(),
        });
        Ok(Transition::ScaleStarted {
            scale: scale.clone(),
        })
    }

    /// Finish the active scale, rejected while it is incomplete
    pub fn complete_scale(&mut self) -> Result<Transition, CoreError> {
        let index = self.sequencer.scale_index();
        if !self.is_scale_complete(index) {
            return Err(CoreError::IncompleteScale {
                scale: self.sequencer.scale_id().0.clone(),
                missing: self.missing(index),
            });
        }
        Ok(self.finish_active_scale())
    }

    /// Skip a walkthrough entirely, or step past a question without answering it
    pub fn skip(&mut self) -> Transition {
        let index = self.sequencer.scale_index();
        match &mut self.progress[index] {
            ScaleProgress::Walkthrough { skipped } => {
                *skipped = true;
                self.finish_active_scale()
            }
            ScaleProgress::Questionnaire(_) => self.advance(),
        }
    }

    /// Attach wizard data that ends up in the result payload
    pub fn set_payload(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.payload.insert(key.into(), value)
    }

    /// Wizard data collected so far
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Build the result and record the completion event
    ///
    /// Rejected with `IncompleteScale` for the first scale that is not complete.
    pub fn complete_flow(&mut self) -> Result<FlowResult, CoreError> {
        if let Some(index) = (0..self.progress.len()).find(|&i| !self.is_scale_complete(i)) {
            return Err(CoreError::IncompleteScale {
                scale: self.definition.scales[index].id.0.clone(),
                missing: self.missing(index),
            });
        }

        let result = self.build_result(Utc::now());
        self.record_event(FlowEvent::FlowCompleted {
            instance_id: self.id.clone(),
            result: Box::new(result.clone()),
            route: self.definition.completion_route.clone(),
            timestamp: result.completed_at,
        });
        Ok(result)
    }

    /// Record that the user left the flow
    pub fn abandon(&mut self) {
        self.record_event(FlowEvent::FlowAbandoned {
            instance_id: self.id.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Snapshot of scores, answers and timing at `completed_at`
    pub fn build_result(&self, completed_at: DateTime<Utc>) -> FlowResult {
        let mut scales = BTreeMap::new();
        let mut skipped = Vec::new();

        for (definition, progress) in self.definition.scales.iter().zip(&self.progress) {
            match progress {
                ScaleProgress::Questionnaire(store) => {
                    scales.insert(
                        definition.id.0.clone(),
                        ScaleResult::from_store(definition, store),
                    );
                }
                ScaleProgress::Walkthrough { skipped: true } => skipped.push(definition.id.clone()),
                ScaleProgress::Walkthrough { skipped: false } => {}
            }
        }

        let duration_ms = (completed_at - self.started_at).num_milliseconds().max(0) as u64;

        FlowResult {
            flow_id: self.definition.id.clone(),
            instance_id: self.id.clone(),
            scales,
            payload: (!self.payload.is_empty()).then(|| Value::Object(self.payload.clone())),
            skipped,
            started_at: self.started_at,
            completed_at,
            duration_ms,
        }
    }

    /// Record a domain event
    pub fn record_event(&mut self, event: FlowEvent) {
        self.events.push(event);
    }

    /// Get and clear all domain events
    pub fn take_events(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.events)
    }

    fn missing(&self, index: usize) -> Vec<usize> {
        match self.progress.get(index) {
            Some(ScaleProgress::Questionnaire(store)) => store.unanswered(),
            Some(ScaleProgress::Walkthrough { .. }) => self.sequencer.unvisited(index),
            None => Vec::new(),
        }
    }

    fn finish_active_scale(&mut self) -> Transition {
        let definition = Arc::clone(&self.definition);
        let index = self.sequencer.scale_index();
        let finished = &definition.scales[index];

        self.record_event(FlowEvent::ScaleCompleted {
            instance_id: self.id.clone(),
            scale: finished.id.clone(),
            score: self.answers_at(index).map(AnswerStore::score),
            route: finished.completion_route.clone(),
            timestamp: Utc::now(),
        });

        let count = self.progress.len();
        let next = (1..count)
            .map(|offset| (index + offset) % count)
            .find(|&candidate| !self.is_scale_complete(candidate) && self.is_selectable(candidate));

        match next {
            Some(next) => {
                self.sequencer.activate_scale(next);
                let scale = definition.scales[next].id.clone();
                self.record_event(FlowEvent::ScaleActivated {
                    instance_id: self.id.clone(),
                    scale: scale.clone(),
                    timestamp: Utc::now(),
                });
                Transition::ScaleStarted { scale }
            }
            None => Transition::FlowComplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow_definition::{AnswerOption, Question, WalkthroughStep};
    use serde_json::json;

    fn options() -> Vec<AnswerOption> {
        (0..4).map(|v| AnswerOption::new(v, format!("option {}", v))).collect()
    }

    fn questionnaire(id: &str, count: usize, prerequisite: Option<&str>) -> ScaleDefinition {
        ScaleDefinition {
            id: ScaleId(id.to_string()),
            name: id.to_uppercase(),
            kind: ScaleKind::Questionnaire {
                questions: (0..count)
                    .map(|i| Question::new(format!("{} item {}", id, i + 1), options()))
                    .collect(),
            },
            prerequisite: prerequisite.map(ScaleId::from),
            completion_route: Some(format!("{}-done", id)),
            bands: Vec::new(),
        }
    }

    fn walkthrough(id: &str, steps: usize) -> ScaleDefinition {
        ScaleDefinition {
            id: ScaleId(id.to_string()),
            name: id.to_string(),
            kind: ScaleKind::Walkthrough {
                steps: (0..steps)
                    .map(|i| WalkthroughStep::new(format!("Step {}", i + 1), "body"))
                    .collect(),
            },
            prerequisite: None,
            completion_route: None,
            bands: Vec::new(),
        }
    }

    fn flow(scales: Vec<ScaleDefinition>) -> FlowState {
        let definition = FlowDefinition {
            id: FlowId("test_flow".to_string()),
            name: "Test".to_string(),
            description: None,
            scales,
            result_collection: None,
            completion_route: Some("complete".to_string()),
        };
        definition.validate().unwrap();
        let mut state = FlowState::new(Arc::new(definition));
        state.take_events();
        state
    }

    fn answer_all(state: &mut FlowState, value: u32) {
        let count = state.active_answers().unwrap().question_count();
        for question in 0..count {
            state.set_answer(question, value).unwrap();
        }
    }

    #[test]
    fn test_new_state_records_start_event() {
        let definition = FlowDefinition {
            id: FlowId("started".to_string()),
            name: "Started".to_string(),
            description: None,
            scales: vec![walkthrough("intro", 2)],
            result_collection: None,
            completion_route: None,
        };
        let mut state = FlowState::new(Arc::new(definition));

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "flow.started");
        assert_eq!(events[0].instance_id(), &state.id);
        assert!(state.take_events().is_empty());
        assert_eq!(
            state.status(),
            FlowStatus::InScale {
                scale: ScaleId::from("intro"),
                step: 0
            }
        );
    }

    #[test]
    fn test_record_answer_targets_current_step() {
        let mut state = flow(vec![questionnaire("phq9", 3, None)]);
        state.advance();
        assert_eq!(state.record_answer(2).unwrap(), None);
        assert_eq!(state.active_answers().unwrap().get_answer(1), Some(2));

        let events = state.take_events();
        assert!(matches!(
            events.last(),
            Some(FlowEvent::AnswerRecorded { question: 1, value: 2, previous: None, .. })
        ));
    }

    #[test]
    fn test_answer_on_walkthrough_is_rejected() {
        let mut state = flow(vec![walkthrough("intro", 3)]);
        let result = state.record_answer(1);
        assert!(matches!(result, Err(CoreError::QuestionOutOfRange { count: 0, .. })));
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_invalid_answer_leaves_state_unchanged() {
        let mut state = flow(vec![questionnaire("gad7", 2, None)]);
        state.record_answer(1).unwrap();
        state.take_events();

        assert!(state.record_answer(9).is_err());
        assert_eq!(state.active_answers().unwrap().get_answer(0), Some(1));
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_advance_awaits_missing_answers_on_last_step() {
        let mut state = flow(vec![questionnaire("phq9", 3, None)]);
        state.set_answer(0, 1).unwrap();
        state.advance();
        state.advance();

        assert_eq!(
            state.advance(),
            Transition::AwaitingAnswers {
                scale: ScaleId::from("phq9"),
                missing: vec![1, 2],
            }
        );
        assert_eq!(state.sequencer().current_index(), 2);
    }

    #[test]
    fn test_complete_scale_activates_next_scale() {
        let mut state = flow(vec![
            questionnaire("phq9", 2, None),
            questionnaire("gad7", 2, Some("phq9")),
        ]);
        answer_all(&mut state, 2);
        state.take_events();

        assert_eq!(
            state.complete_scale().unwrap(),
            Transition::ScaleStarted {
                scale: ScaleId::from("gad7")
            }
        );
        assert_eq!(state.sequencer().scale_index(), 1);
        assert_eq!(state.sequencer().current_index(), 0);

        let events = state.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            FlowEvent::ScaleCompleted { score: Some(4), route: Some(route), .. } if route == "phq9-done"
        ));
        assert_eq!(events[1].event_type(), "scale.activated");
    }

    #[test]
    fn test_complete_scale_rejected_while_incomplete() {
        let mut state = flow(vec![questionnaire("phq9", 3, None), questionnaire("gad7", 1, None)]);
        state.set_answer(1, 3).unwrap();
        state.take_events();
        let before = state.status();

        let result = state.complete_scale();
        assert_eq!(
            result,
            Err(CoreError::IncompleteScale {
                scale: "phq9".to_string(),
                missing: vec![0, 2],
            })
        );
        assert_eq!(state.status(), before);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_jump_preserves_answers() {
        let mut state = flow(vec![questionnaire("phq9", 2, None), questionnaire("gad7", 2, None)]);
        state.set_answer(0, 3).unwrap();

        assert_eq!(
            state.jump_to_scale(&ScaleId::from("gad7")).unwrap(),
            Transition::ScaleStarted {
                scale: ScaleId::from("gad7")
            }
        );
        state.set_answer(1, 1).unwrap();
        state.jump_to_scale(&ScaleId::from("phq9")).unwrap();

        assert_eq!(state.answers(&ScaleId::from("phq9")).unwrap().get_answer(0), Some(3));
        assert_eq!(state.answers(&ScaleId::from("gad7")).unwrap().get_answer(1), Some(1));
        assert_eq!(state.jump_to_scale(&ScaleId::from("phq9")).unwrap(), Transition::Stayed);
    }

    #[test]
    fn test_reviewed_scale_returns_to_first_incomplete() {
        let mut state = flow(vec![
            questionnaire("phq9", 1, None),
            questionnaire("gad7", 1, Some("phq9")),
        ]);
        state.record_answer(0).unwrap();
        state.complete_scale().unwrap();

        // Review the finished scale, then finish it again
        state.jump_to_scale(&ScaleId::from("phq9")).unwrap();
        state.record_answer(1).unwrap();
        assert_eq!(
            state.advance(),
            Transition::ScaleStarted {
                scale: ScaleId::from("gad7")
            }
        );

        state.record_answer(2).unwrap();
        assert_eq!(state.advance(), Transition::FlowComplete);
    }

    #[test]
    fn test_skip_walkthrough_marks_it_skipped() {
        let mut state = flow(vec![walkthrough("intro", 4), questionnaire("phq9", 1, None)]);
        assert_eq!(
            state.skip(),
            Transition::ScaleStarted {
                scale: ScaleId::from("phq9")
            }
        );
        assert!(state.is_scale_complete(0));
        assert!(state.is_scale_skipped(0));

        state.record_answer(0).unwrap();
        assert_eq!(state.skip(), Transition::FlowComplete);
    }

    #[test]
    fn test_skip_question_does_not_answer() {
        let mut state = flow(vec![questionnaire("phq9", 2, None)]);
        assert_eq!(
            state.skip(),
            Transition::Moved {
                scale: ScaleId::from("phq9"),
                step: 1
            }
        );
        assert_eq!(state.active_answers().unwrap().answered_count(), 0);
        assert!(matches!(state.skip(), Transition::AwaitingAnswers { .. }));
    }

    #[test]
    fn test_complete_flow_builds_result() {
        let mut state = flow(vec![walkthrough("intro", 1), questionnaire("phq9", 2, None)]);
        state.skip();
        answer_all(&mut state, 3);
        state.set_payload("mood", json!("calm"));
        state.take_events();

        let result = state.complete_flow().unwrap();
        assert_eq!(result.scale("phq9").unwrap().score, 6);
        assert_eq!(result.skipped, vec![ScaleId::from("intro")]);
        assert_eq!(result.payload, Some(json!({"mood": "calm"})));
        assert!(result.completed_at >= result.started_at);

        let events = state.take_events();
        assert!(matches!(
            events.as_slice(),
            [FlowEvent::FlowCompleted { route: Some(route), .. }] if route == "complete"
        ));
    }

    #[test]
    fn test_complete_flow_rejected_while_incomplete() {
        let mut state = flow(vec![walkthrough("intro", 3), questionnaire("phq9", 1, None)]);
        assert_eq!(
            state.complete_flow(),
            Err(CoreError::IncompleteScale {
                scale: "intro".to_string(),
                missing: vec![1, 2],
            })
        );
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ScaleId::from("phq9").to_string(), "phq9");
        assert_eq!(FlowId::from("assessment").as_str(), "assessment");
        assert_ne!(FlowInstanceId::generate(), FlowInstanceId::generate());
        assert!(FlowStatus::Abandoned.is_terminal());
        assert!(!FlowStatus::NotStarted.is_terminal());
    }
}
