//! Shared fixtures for the MindGo end-to-end tests

use mindgo_core::{
    CompositeEventHandler, CoreError, FlowController, FlowEvent, FlowEventHandler,
    NavigationEventHandler, Navigator,
};
use mindgo_state_inmemory::InMemoryRecordStore;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// PHQ-9 answers summing to 12
pub const PHQ9_MODERATE: [u32; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 0];

/// GAD-7 answers summing to 8
pub const GAD7_MILD: [u32; 7] = [1, 1, 1, 1, 1, 1, 2];

/// Navigator that remembers every route it was sent to
#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(String, Option<Value>)>>,
}

impl RecordingNavigator {
    /// Routes in visiting order
    pub fn routes(&self) -> Vec<String> {
        self.visits
            .lock()
            .map(|visits| visits.iter().map(|(route, _)| route.clone()).collect())
            .unwrap_or_default()
    }

    /// Parameters passed with the most recent visit
    pub fn last_params(&self) -> Option<Value> {
        self.visits
            .lock()
            .ok()
            .and_then(|visits| visits.last().and_then(|(_, params)| params.clone()))
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: &str, params: Option<Value>) -> Result<(), CoreError> {
        self.visits
            .lock()
            .map_err(|e| CoreError::NavigationError(e.to_string()))?
            .push((route.to_string(), params));
        Ok(())
    }
}

/// Handler that keeps every dispatched event
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<FlowEvent>>,
}

impl EventRecorder {
    /// Event types in dispatch order
    pub fn types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(FlowEvent::event_type).collect())
            .unwrap_or_default()
    }
}

impl FlowEventHandler for EventRecorder {
    fn handle_event(&self, event: &FlowEvent) -> Result<(), CoreError> {
        self.events
            .lock()
            .map_err(|e| CoreError::Other(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}

/// A controller wired to an in-memory store, a recording navigator and an event recorder
pub struct TestApp {
    /// Shared record store
    pub store: InMemoryRecordStore,
    /// Routes requested on completion
    pub navigator: Arc<RecordingNavigator>,
    /// Dispatched events
    pub events: Arc<EventRecorder>,
}

impl TestApp {
    /// Create the collaborators
    pub fn new() -> Self {
        Self {
            store: InMemoryRecordStore::new(),
            navigator: Arc::new(RecordingNavigator::default()),
            events: Arc::new(EventRecorder::default()),
        }
    }

    /// Build a controller over the shared collaborators
    pub fn controller(&self) -> FlowController {
        let handler = CompositeEventHandler::new()
            .with(Arc::new(NavigationEventHandler::new(self.navigator.clone())))
            .with(self.events.clone());
        FlowController::new(Arc::new(self.store.clone()), Arc::new(handler))
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
