use crate::domain::flow_state::{FlowId, FlowInstanceId, ScaleId};
use crate::domain::result::FlowResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Domain events recorded by a flow while it runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    /// A flow instance was started
    FlowStarted {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// The flow definition
        flow_id: FlowId,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// An answer was stored for a question
    AnswerRecorded {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// Scale the question belongs to
        scale: ScaleId,
        /// Question index
        question: usize,
        /// Selected value
        value: u32,
        /// Value that was overwritten, if any
        previous: Option<u32>,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// The step index within the active scale changed
    StepChanged {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// Active scale
        scale: ScaleId,
        /// New step index
        step: usize,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// A scale was finished
    ScaleCompleted {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// Finished scale
        scale: ScaleId,
        /// Total score, questionnaires only
        score: Option<u32>,
        /// Route to show once the scale is done
        route: Option<String>,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// A different scale became active
    ScaleActivated {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// Newly active scale
        scale: ScaleId,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// The flow reached its terminal state and produced a result
    FlowCompleted {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// Persisted result
        result: Box<FlowResult>,
        /// Route to the completion screen
        route: Option<String>,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },

    /// The user left the flow before completing it
    FlowAbandoned {
        /// The flow instance
        instance_id: FlowInstanceId,
        /// When the event occurred
        timestamp: DateTime<Utc>,
    },
}

impl FlowEvent {
    /// Returns the type of the event as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            FlowEvent::FlowStarted { .. } => "flow.started",
            FlowEvent::AnswerRecorded { .. } => "answer.recorded",
            FlowEvent::StepChanged { .. } => "step.changed",
            FlowEvent::ScaleCompleted { .. } => "scale.completed",
            FlowEvent::ScaleActivated { .. } => "scale.activated",
            FlowEvent::FlowCompleted { .. } => "flow.completed",
            FlowEvent::FlowAbandoned { .. } => "flow.abandoned",
        }
    }

    /// Returns the flow instance ID this event is associated with
    pub fn instance_id(&self) -> &FlowInstanceId {
        match self {
            FlowEvent::FlowStarted { instance_id, .. }
            | FlowEvent::AnswerRecorded { instance_id, .. }
            | FlowEvent::StepChanged { instance_id, .. }
            | FlowEvent::ScaleCompleted { instance_id, .. }
            | FlowEvent::ScaleActivated { instance_id, .. }
            | FlowEvent::FlowCompleted { instance_id, .. }
            | FlowEvent::FlowAbandoned { instance_id, .. } => instance_id,
        }
    }

    /// Returns the timestamp when the event occurred
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FlowEvent::FlowStarted { timestamp, .. }
            | FlowEvent::AnswerRecorded { timestamp, .. }
            | FlowEvent::StepChanged { timestamp, .. }
            | FlowEvent::ScaleCompleted { timestamp, .. }
            | FlowEvent::ScaleActivated { timestamp, .. }
            | FlowEvent::FlowCompleted { timestamp, .. }
            | FlowEvent::FlowAbandoned { timestamp, .. } => *timestamp,
        }
    }

    /// Navigation target carried by completion events
    pub fn route(&self) -> Option<&str> {
        match self {
            FlowEvent::ScaleCompleted { route, .. } | FlowEvent::FlowCompleted { route, .. } => {
                route.as_deref()
            }
            _ => None,
        }
    }
}
