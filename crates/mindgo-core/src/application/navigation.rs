//! Event handler that turns completion events into screen changes

use crate::application::flow_controller::FlowEventHandler;
use crate::domain::events::FlowEvent;
use crate::domain::repository::Navigator;
use crate::CoreError;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Forwards `ScaleCompleted` and `FlowCompleted` routes to a `Navigator`
pub struct NavigationEventHandler {
    navigator: Arc<dyn Navigator>,
}

impl NavigationEventHandler {
    /// Create a handler for `navigator`
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl FlowEventHandler for NavigationEventHandler {
    fn handle_event(&self, event: &FlowEvent) -> Result<(), CoreError> {
        let Some(route) = event.route() else {
            return Ok(());
        };

        let params = match event {
            FlowEvent::ScaleCompleted { scale, score, .. } => json!({
                "scale": scale,
                "score": score,
            }),
            FlowEvent::FlowCompleted { result, .. } => json!({
                "flowId": result.flow_id,
                "instanceId": result.instance_id,
                "totalScore": result.total_score(),
                "flagged": result.has_flags(),
            }),
            _ => return Ok(()),
        };

        debug!(route = %route, event_type = event.event_type(), "Navigating");
        self.navigator.go_to(route, Some(params))
    }
}
