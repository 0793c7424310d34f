//! Interactive session with deferred auto-advance
//!
//! Selecting an option schedules an `advance` after a short delay so the
//! selection stays visible before the next question appears. The pending
//! advance is a cancellable task; any manual navigation aborts it first.
//! The controller epoch guards against double transitions: a timer only acts
//! if the position is still the one it was scheduled for.

use crate::application::flow_controller::{FlowController, StepView};
use crate::config::FlowConfig;
use crate::domain::flow_definition::FlowDefinition;
use crate::domain::flow_state::{FlowInstanceId, FlowStatus, ScaleId, TimerId, Transition};
use crate::CoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Auto-advance waiting to fire
struct PendingAdvance {
    timer_id: TimerId,
    epoch: u64,
    handle: JoinHandle<()>,
}

/// Auto-advance that already moved the user
struct FiredAdvance {
    epoch: u64,
    at: Instant,
}

struct SessionState {
    controller: FlowController,
    pending: Option<PendingAdvance>,
    fired: Option<FiredAdvance>,
}

impl SessionState {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                debug!(
                    timer_id = %pending.timer_id,
                    epoch = pending.epoch,
                    "Cancelled pending auto-advance"
                );
                true
            }
            None => false,
        }
    }
}

/// A flow controller driven by user intents, with auto-advance
#[derive(Clone)]
pub struct FlowSession {
    state: Arc<Mutex<SessionState>>,
    auto_advance: Option<Duration>,
    absorb_racing_next: bool,
}

impl FlowSession {
    /// Wrap `controller`, taking the auto-advance settings from `config`
    pub fn new(controller: FlowController, config: &FlowConfig) -> Self {
        let auto_advance = config
            .auto_advance_enabled
            .then(|| config.auto_advance_delay());
        Self::with_auto_advance(controller, auto_advance)
            .with_absorb_racing_next(config.absorb_racing_next)
    }

    /// Wrap `controller`; `None` disables auto-advance
    pub fn with_auto_advance(controller: FlowController, delay: Option<Duration>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                controller,
                pending: None,
                fired: None,
            })),
            auto_advance: delay,
            absorb_racing_next: true,
        }
    }

    /// Whether a "Next" racing a fired auto-advance is ignored
    pub fn with_absorb_racing_next(mut self, absorb: bool) -> Self {
        self.absorb_racing_next = absorb;
        self
    }

    /// Start a flow, cancelling any pending advance of the previous one
    pub async fn start(
        &self,
        definition: impl Into<Arc<FlowDefinition>>,
    ) -> Result<FlowInstanceId, CoreError> {
        let mut state = self.state.lock().await;
        state.cancel_pending();
        state.fired = None;
        state.controller.start(definition)
    }

    /// Record an answer for the current question and schedule the auto-advance
    pub async fn select_option(&self, value: u32) -> Result<Option<u32>, CoreError> {
        let mut state = self.state.lock().await;
        let previous = state.controller.record_answer(value)?;
        state.cancel_pending();
        state.fired = None;

        if let Some(delay) = self.auto_advance {
            let epoch = state.controller.epoch();
            let timer_id = TimerId::generate();
            let handle = self.spawn_advance(timer_id.clone(), epoch, delay);
            debug!(timer_id = %timer_id, epoch, delay_ms = delay.as_millis() as u64, "Scheduled auto-advance");
            state.pending = Some(PendingAdvance {
                timer_id,
                epoch,
                handle,
            });
        }

        Ok(previous)
    }

    /// Manual "Next"
    ///
    /// Replaces a pending auto-advance. Unless disabled, a press that arrives
    /// within one delay after an auto-advance fired, before the user could
    /// have seen the new step, is absorbed and returns `Stayed`.
    pub async fn next(&self) -> Result<Transition, CoreError> {
        let mut state = self.state.lock().await;
        let replaced = state.cancel_pending();

        if let Some(fired) = state.fired.take() {
            let elapsed = fired.at.elapsed();
            let within_grace = self.auto_advance.map_or(false, |delay| elapsed < delay);
            if self.absorb_racing_next
                && !replaced
                && within_grace
                && fired.epoch == state.controller.epoch()
            {
                debug!(
                    intent = "next",
                    epoch = fired.epoch,
                    since_auto_advance_ms = elapsed.as_millis() as u64,
                    "Dropped next racing an auto-advance"
                );
                return Ok(Transition::Stayed);
            }
        }

        state.controller.advance()
    }

    /// Manual "Previous"
    pub async fn previous(&self) -> Result<Transition, CoreError> {
        let mut state = self.state.lock().await;
        state.cancel_pending();
        state.fired = None;
        state.controller.retreat()
    }

    /// Manual "Skip"
    pub async fn skip(&self) -> Result<Transition, CoreError> {
        let mut state = self.state.lock().await;
        state.cancel_pending();
        state.fired = None;
        state.controller.skip()
    }

    /// Scale tab selection
    pub async fn select_scale(&self, scale: &ScaleId) -> Result<Transition, CoreError> {
        let mut state = self.state.lock().await;
        state.cancel_pending();
        state.fired = None;
        state.controller.jump_to_scale(scale)
    }

    /// Abandon the running flow
    pub async fn abandon(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        state.cancel_pending();
        state.fired = None;
        state.controller.abandon()
    }

    /// Cancel the pending auto-advance; returns false if none was pending
    pub async fn cancel_pending(&self) -> bool {
        self.state.lock().await.cancel_pending()
    }

    /// True while an auto-advance is scheduled
    pub async fn has_pending_advance(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }

    /// Presentation snapshot of the current step
    pub async fn view(&self) -> Option<StepView> {
        self.state.lock().await.controller.view()
    }

    /// Current flow status
    pub async fn status(&self) -> FlowStatus {
        self.state.lock().await.controller.status()
    }

    /// Run `f` against the controller, e.g. to set payload data
    pub async fn with_controller<R>(&self, f: impl FnOnce(&mut FlowController) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state.controller)
    }

    fn spawn_advance(&self, timer_id: TimerId, epoch: u64, delay: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = state.lock().await;
            let is_current = state
                .pending
                .as_ref()
                .map_or(false, |pending| pending.timer_id == timer_id);
            if !is_current {
                return;
            }
            state.pending = None;

            if state.controller.epoch() != epoch {
                debug!(timer_id = %timer_id, epoch, "Skipped stale auto-advance");
                return;
            }

            match state.controller.advance() {
                Ok(transition) => {
                    debug!(timer_id = %timer_id, transition = ?transition, "Auto-advanced");
                    state.fired = Some(FiredAdvance {
                        epoch: state.controller.epoch(),
                        at: Instant::now(),
                    });
                }
                Err(e) => warn!(timer_id = %timer_id, error = %e, "Auto-advance failed"),
            }
        })
    }
}
