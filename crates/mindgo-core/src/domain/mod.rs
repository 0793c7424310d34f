/// Flow instance aggregate and value objects
pub mod flow_state;

/// Domain events
pub mod events;

/// Flow definition domain models
pub mod flow_definition;

/// Per-scale answer storage
pub mod answer_store;

/// Position tracking within a flow
pub mod sequencer;

/// Terminal flow results
pub mod result;

/// Collaborator interfaces
pub mod repository;
