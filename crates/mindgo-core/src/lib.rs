//!
//! MindGo Core - Multi-step flow runtime for the MindGo patient app
//!
//! This crate defines the domain model, the flow controller and the
//! collaborator interfaces used to run questionnaires and walkthroughs.
//! Storage and logging implementations live in sibling crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - flow definitions, answers, positions, results and events
pub mod domain;

/// Application services - flow controller and interactive session
pub mod application;

/// Runtime configuration
pub mod config;

/// Error types
pub mod error;

/// Built-in questionnaires and walkthroughs
pub mod instruments;

// Re-export key types
pub use error::CoreError;

pub use application::flow_controller::{
    CompositeEventHandler, FlowController, FlowEventHandler, NoopEventHandler, ScaleTab,
    StepContent, StepView, UserIntent,
};
pub use application::flow_session::FlowSession;
pub use application::navigation::NavigationEventHandler;
pub use config::FlowConfig;
pub use domain::answer_store::AnswerStore;
pub use domain::events::FlowEvent;
pub use domain::flow_definition::{
    AnswerOption, FlowDefinition, Question, ScaleDefinition, ScaleKind, ScoreBand, WalkthroughStep,
};
pub use domain::flow_state::{
    FlowId, FlowInstanceId, FlowState, FlowStatus, ScaleId, ScaleProgress, TimerId, Transition,
};
pub use domain::repository::{is_onboarded, mark_onboarded, Collection, Navigator, RecordStore};
pub use domain::result::{FlowResult, ScaleResult};
pub use domain::sequencer::{Advance, StepSequencer};
