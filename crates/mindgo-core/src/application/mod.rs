/// Flow controller and event handler seam
pub mod flow_controller;

/// Auto-advance session around the controller
pub mod flow_session;

/// Route forwarding for completion events
pub mod navigation;
