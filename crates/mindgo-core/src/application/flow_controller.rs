use crate::{
    config::FlowConfig,
    domain::events::FlowEvent,
    domain::flow_definition::{AnswerOption, FlowDefinition, ScaleKind},
    domain::flow_state::{FlowId, FlowInstanceId, FlowState, FlowStatus, ScaleId, Transition},
    domain::repository::{Collection, RecordStore},
    domain::result::FlowResult,
    CoreError,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Handler for flow events
pub trait FlowEventHandler: Send + Sync {
    /// Handle a flow event
    fn handle_event(&self, event: &FlowEvent) -> Result<(), CoreError>;
}

/// Event handler that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventHandler;

impl FlowEventHandler for NoopEventHandler {
    fn handle_event(&self, _event: &FlowEvent) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Fans every event out to a list of handlers
///
/// All handlers see the event even if an earlier one fails; the first error is returned.
#[derive(Default, Clone)]
pub struct CompositeEventHandler {
    handlers: Vec<Arc<dyn FlowEventHandler>>,
}

impl CompositeEventHandler {
    /// Create an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler
    pub fn with(mut self, handler: Arc<dyn FlowEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FlowEventHandler for CompositeEventHandler {
    fn handle_event(&self, event: &FlowEvent) -> Result<(), CoreError> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(e) = handler.handle_event(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// User intents exposed by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// An answer option was tapped
    OptionSelected(u32),
    /// "Next" was pressed
    Next,
    /// "Previous" was pressed
    Previous,
    /// "Skip" was pressed
    Skip,
    /// A scale tab was selected
    SelectScale(ScaleId),
}

/// What the current step shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepContent {
    /// A questionnaire item
    Question {
        /// Question text
        prompt: String,
        /// Selectable options
        options: Vec<AnswerOption>,
        /// Value currently selected
        selected: Option<u32>,
        /// Whether a non-zero answer is flagged
        critical: bool,
    },

    /// A tutorial page
    Walkthrough {
        /// Page title
        title: String,
        /// Page text
        body: String,
    },
}

/// Tab shown for each scale of a multi-scale flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleTab {
    /// Scale id
    pub id: ScaleId,
    /// Display name
    pub name: String,
    /// Every question answered or walkthrough finished
    pub complete: bool,
    /// Prerequisite satisfied
    pub selectable: bool,
    /// Currently shown
    pub active: bool,
}

/// Presentation snapshot of the current step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    /// Flow definition id
    pub flow_id: FlowId,
    /// Flow display name
    pub flow_name: String,
    /// Active scale id
    pub scale_id: ScaleId,
    /// Active scale display name
    pub scale_name: String,
    /// Step index within the active scale
    pub current_index: usize,
    /// Steps in the active scale
    pub total_steps: usize,
    /// Position within the active scale
    pub progress_percent: u8,
    /// Answered questions over all questions of the flow
    pub flow_progress_percent: u8,
    /// Content of the current step
    pub content: StepContent,
    /// Partial score of the active questionnaire
    pub running_score: Option<u32>,
    /// "Previous" is available
    pub can_retreat: bool,
    /// "Next" leads somewhere
    pub can_advance: bool,
    /// One tab per scale
    pub tabs: Vec<ScaleTab>,
}

enum Lifecycle {
    NotStarted,
    Running(Box<FlowState>),
    Finished(FlowStatus),
}

/// Orchestrates one user's pass through a flow
///
/// The controller owns the flow state exclusively. Completed results are
/// appended to the record store on a best-effort basis and announced through
/// the event handler; neither failure rolls back the transition.
pub struct FlowController {
    store: Arc<dyn RecordStore>,
    event_handler: Arc<dyn FlowEventHandler>,
    default_collection: String,
    lifecycle: Lifecycle,
    epoch: u64,
}

impl FlowController {
    /// Create a controller that appends results to `assessments` by default
    pub fn new(store: Arc<dyn RecordStore>, event_handler: Arc<dyn FlowEventHandler>) -> Self {
        Self {
            store,
            event_handler,
            default_collection: Collection::Assessments.key().into_owned(),
            lifecycle: Lifecycle::NotStarted,
            epoch: 0,
        }
    }

    /// Collection used for flows that do not name their own
    pub fn with_default_collection(mut self, collection: impl Into<String>) -> Self {
        self.default_collection = collection.into();
        self
    }

    /// Create a controller from configuration
    pub fn from_config(
        store: Arc<dyn RecordStore>,
        event_handler: Arc<dyn FlowEventHandler>,
        config: &FlowConfig,
    ) -> Self {
        Self::new(store, event_handler).with_default_collection(config.results_collection.clone())
    }

    /// Collection used for flows that do not name their own
    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    /// Start `definition` at its first scale and step
    ///
    /// A flow that is still running is abandoned first.
    #[instrument(skip(self, definition))]
    pub fn start(
        &mut self,
        definition: impl Into<Arc<FlowDefinition>>,
    ) -> Result<FlowInstanceId, CoreError> {
        let definition = definition.into();
        definition.validate()?;

        if let Lifecycle::Running(state) = &mut self.lifecycle {
            debug!(instance_id = %state.id, "Abandoning running flow before restart");
            state.abandon();
            self.flush();
        }

        let state = FlowState::new(definition);
        let instance_id = state.id.clone();
        info!(
            flow_id = %state.definition().id,
            instance_id = %instance_id,
            scales = state.definition().scales.len(),
            "Flow started"
        );

        self.lifecycle = Lifecycle::Running(Box::new(state));
        self.epoch += 1;
        self.flush();
        Ok(instance_id)
    }

    /// Store an answer for the current step without moving
    pub fn record_answer(&mut self, value: u32) -> Result<Option<u32>, CoreError> {
        let previous = self.running_mut("record_answer")?.record_answer(value)?;
        self.flush();
        Ok(previous)
    }

    /// Store an answer for any question of the active scale
    pub fn set_answer(&mut self, question: usize, value: u32) -> Result<Option<u32>, CoreError> {
        let previous = self.running_mut("set_answer")?.set_answer(question, value)?;
        self.flush();
        Ok(previous)
    }

    /// Store an answer for the current step, then advance
    pub fn submit_answer(&mut self, value: u32) -> Result<Transition, CoreError> {
        self.record_answer(value)?;
        self.advance()
    }

    /// Move to the next step, scale or completion
    ///
    /// Once the flow is complete this keeps returning `FlowComplete`.
    pub fn advance(&mut self) -> Result<Transition, CoreError> {
        if matches!(self.lifecycle, Lifecycle::Finished(FlowStatus::FlowComplete)) {
            return Ok(Transition::FlowComplete);
        }
        let transition = self.running_mut("advance")?.advance();
        self.settle(transition)
    }

    /// Move to the previous step; `Stayed` at step 0
    pub fn retreat(&mut self) -> Result<Transition, CoreError> {
        let transition = self.running_mut("retreat")?.retreat();
        self.settle(transition)
    }

    /// Select a scale whose prerequisite is complete
    pub fn jump_to_scale(&mut self, scale: &ScaleId) -> Result<Transition, CoreError> {
        let transition = self.running_mut("jump_to_scale")?.jump_to_scale(scale)?;
        self.settle(transition)
    }

    /// Finish the active scale; rejected while it has unanswered questions
    pub fn complete_scale(&mut self) -> Result<Transition, CoreError> {
        let transition = self.running_mut("complete_scale")?.complete_scale()?;
        self.settle(transition)
    }

    /// Build and persist the result once every scale is complete
    pub fn complete_flow(&mut self) -> Result<FlowResult, CoreError> {
        let result = self.finish()?;
        self.epoch += 1;
        Ok(result)
    }

    /// Skip the active walkthrough or the current question
    pub fn skip(&mut self) -> Result<Transition, CoreError> {
        let transition = self.running_mut("skip")?.skip();
        self.settle(transition)
    }

    /// Discard the running flow without persisting anything
    pub fn abandon(&mut self) -> Result<(), CoreError> {
        let state = self.running_mut("abandon")?;
        state.abandon();
        info!(instance_id = %state.id, "Flow abandoned");

        let events = state.take_events();
        self.lifecycle = Lifecycle::Finished(FlowStatus::Abandoned);
        self.epoch += 1;
        self.handle_events(events);
        Ok(())
    }

    /// Attach wizard data to the result payload
    pub fn set_payload(&mut self, key: impl Into<String>, value: Value) -> Result<(), CoreError> {
        self.running_mut("set_payload")?.set_payload(key, value);
        Ok(())
    }

    /// Translate a presentation intent into the matching operation
    pub fn dispatch(&mut self, intent: UserIntent) -> Result<Transition, CoreError> {
        match intent {
            UserIntent::OptionSelected(value) => self.submit_answer(value),
            UserIntent::Next => self.advance(),
            UserIntent::Previous => self.retreat(),
            UserIntent::Skip => self.skip(),
            UserIntent::SelectScale(scale) => self.jump_to_scale(&scale),
        }
    }

    /// Current status
    pub fn status(&self) -> FlowStatus {
        match &self.lifecycle {
            Lifecycle::NotStarted => FlowStatus::NotStarted,
            Lifecycle::Running(state) => state.status(),
            Lifecycle::Finished(status) => status.clone(),
        }
    }

    /// Counter bumped on every change of position
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Running flow state, if any
    pub fn state(&self) -> Option<&FlowState> {
        match &self.lifecycle {
            Lifecycle::Running(state) => Some(&**state),
            _ => None,
        }
    }

    /// Presentation snapshot, `None` unless a flow is running
    pub fn view(&self) -> Option<StepView> {
        self.state().map(build_view)
    }

    fn running_mut(&mut self, operation: &str) -> Result<&mut FlowState, CoreError> {
        match &mut self.lifecycle {
            Lifecycle::Running(state) => Ok(&mut **state),
            _ => Err(CoreError::FlowNotActive(operation.to_string())),
        }
    }

    fn settle(&mut self, transition: Transition) -> Result<Transition, CoreError> {
        if transition.changes_position() {
            self.epoch += 1;
        }

        match &transition {
            Transition::Moved { scale, step } => debug!(scale = %scale, step, "Step changed"),
            Transition::ScaleStarted { scale } => debug!(scale = %scale, "Scale started"),
            Transition::AwaitingAnswers { scale, missing } => {
                debug!(scale = %scale, missing = ?missing, "Scale awaiting answers")
            }
            Transition::Stayed | Transition::FlowComplete => {}
        }

        if transition == Transition::FlowComplete {
            if let Err(e) = self.finish() {
                self.flush();
                return Err(e);
            }
        } else {
            self.flush();
        }
        Ok(transition)
    }

    fn finish(&mut self) -> Result<FlowResult, CoreError> {
        let result = self.running_mut("complete_flow")?.complete_flow()?;
        let finished = std::mem::replace(
            &mut self.lifecycle,
            Lifecycle::Finished(FlowStatus::FlowComplete),
        );

        if let Lifecycle::Running(mut state) = finished {
            let collection = state
                .definition()
                .result_collection
                .clone()
                .unwrap_or_else(|| self.default_collection.clone());
            info!(
                flow_id = %result.flow_id,
                instance_id = %result.instance_id,
                collection = %collection,
                duration_ms = result.duration_ms,
                total_score = result.total_score(),
                "Flow completed"
            );
            self.persist(&collection, &result);
            let events = state.take_events();
            self.handle_events(events);
        }

        Ok(result)
    }

    fn persist(&self, collection: &str, result: &FlowResult) {
        let record = match serde_json::to_value(result) {
            Ok(record) => record,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Failed to serialize flow result");
                return;
            }
        };

        if let Err(e) = self.store.append(collection, record) {
            warn!(collection = %collection, error = %e, "Failed to persist flow result");
        }
    }

    fn flush(&mut self) {
        if let Lifecycle::Running(state) = &mut self.lifecycle {
            let events = state.take_events();
            self.handle_events(events);
        }
    }

    fn handle_events(&self, events: Vec<FlowEvent>) {
        for event in events {
            debug!(event_type = event.event_type(), instance_id = %event.instance_id(), "Dispatching event");
            if let Err(e) = self.event_handler.handle_event(&event) {
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    "Event handler failed"
                );
            }
        }
    }
}

fn build_view(state: &FlowState) -> StepView {
    let definition = state.definition();
    let sequencer = state.sequencer();
    let index = sequencer.scale_index();
    let scale = &definition.scales[index];
    let step = sequencer.current_index();
    let answers = state.answers_at(index);

    let content = match &scale.kind {
        ScaleKind::Questionnaire { questions } => {
            let question = &questions[step];
            StepContent::Question {
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                selected: answers.and_then(|store| store.get_answer(step)),
                critical: question.critical,
            }
        }
        ScaleKind::Walkthrough { steps } => StepContent::Walkthrough {
            title: steps[step].title.clone(),
            body: steps[step].body.clone(),
        },
    };

    let total_questions = definition.question_count();
    let flow_progress_percent = if total_questions > 0 {
        percent(state.answered_questions(), total_questions)
    } else {
        let complete = (0..definition.scales.len())
            .filter(|&i| state.is_scale_complete(i))
            .count();
        percent(complete, definition.scales.len())
    };

    let tabs = definition
        .scales
        .iter()
        .enumerate()
        .map(|(i, s)| ScaleTab {
            id: s.id.clone(),
            name: s.name.clone(),
            complete: state.is_scale_complete(i),
            selectable: state.is_selectable(i),
            active: i == index,
        })
        .collect();

    StepView {
        flow_id: definition.id.clone(),
        flow_name: definition.name.clone(),
        scale_id: scale.id.clone(),
        scale_name: scale.name.clone(),
        current_index: step,
        total_steps: sequencer.total_steps(),
        progress_percent: sequencer.progress_percent(),
        flow_progress_percent,
        content,
        running_score: answers.map(|store| store.score()),
        can_retreat: !sequencer.is_first_step(),
        can_advance: !sequencer.is_last_step() || state.is_scale_complete(index),
        tabs,
    }
}

fn percent(part: usize, total: usize) -> u8 {
    ((part * 100 + total / 2) / total) as u8
}
