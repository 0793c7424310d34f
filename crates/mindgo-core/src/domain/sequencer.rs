use crate::domain::flow_definition::FlowDefinition;
use crate::domain::flow_state::ScaleId;
use crate::CoreError;
use serde::{Deserialize, Serialize};

/// Outcome of a single `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advance {
    /// Moved to the given step of the active scale
    Moved(usize),

    /// Already on the last step and more scales remain
    EndOfScale,

    /// Already on the last step of the last scale
    EndOfFlow,
}

/// Tracks the position within a flow and the allowed transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequencer {
    ids: Vec<ScaleId>,
    lengths: Vec<usize>,
    prerequisites: Vec<Option<usize>>,
    furthest: Vec<Option<usize>>,
    scale: usize,
    step: usize,
}

impl StepSequencer {
    /// Build a sequencer positioned on the first step of the first scale
    ///
    /// The definition is expected to have passed `FlowDefinition::validate`.
    pub fn new(definition: &FlowDefinition) -> Self {
        let ids: Vec<ScaleId> = definition.scales.iter().map(|s| s.id.clone()).collect();
        let prerequisites = definition
            .scales
            .iter()
            .map(|s| s.prerequisite.as_ref().and_then(|p| definition.scale_index(p)))
            .collect();
        let mut furthest = vec![None; ids.len()];
        if let Some(first) = furthest.first_mut() {
            *first = Some(0);
        }

        Self {
            lengths: definition.scales.iter().map(|s| s.len()).collect(),
            ids,
            prerequisites,
            furthest,
            scale: 0,
            step: 0,
        }
    }

    /// Index of the active scale
    #[inline]
    pub fn scale_index(&self) -> usize {
        self.scale
    }

    /// Id of the active scale
    pub fn scale_id(&self) -> &ScaleId {
        &self.ids[self.scale]
    }

    /// Number of scales in the flow
    #[inline]
    pub fn scale_count(&self) -> usize {
        self.ids.len()
    }

    /// Step index within the active scale
    #[inline]
    pub fn current_index(&self) -> usize {
        self.step
    }

    /// Number of steps in the active scale
    #[inline]
    pub fn total_steps(&self) -> usize {
        self.lengths[self.scale]
    }

    /// `(current_index + 1) / total_steps * 100`, rounded half up
    pub fn progress_percent(&self) -> u8 {
        let total = self.total_steps();
        (((self.step + 1) * 100 + total / 2) / total) as u8
    }

    /// True on step 0
    pub fn is_first_step(&self) -> bool {
        self.step == 0
    }

    /// True on the final step of the active scale
    pub fn is_last_step(&self) -> bool {
        self.step + 1 >= self.total_steps()
    }

    /// True while the last scale is active
    pub fn is_last_scale(&self) -> bool {
        self.scale + 1 >= self.scale_count()
    }

    /// Move to the next step; never moves past the final step
    pub fn advance(&mut self) -> Advance {
        if !self.is_last_step() {
            self.step += 1;
            self.mark_visited();
            Advance::Moved(self.step)
        } else if self.is_last_scale() {
            Advance::EndOfFlow
        } else {
            Advance::EndOfScale
        }
    }

    /// Move to the previous step; returns false at step 0
    pub fn retreat(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step -= 1;
        true
    }

    /// Activate `scale` at step 0 without checking its prerequisite
    pub fn activate_scale(&mut self, scale: usize) {
        debug_assert!(scale < self.scale_count());
        self.scale = scale;
        self.step = 0;
        self.mark_visited();
    }

    /// Activate `scale_id` if its prerequisite is complete
    ///
    /// Selecting the scale that is already active keeps the current step.
    pub fn jump_to_scale(
        &mut self,
        scale_id: &ScaleId,
        is_complete: impl Fn(usize) -> bool,
    ) -> Result<usize, CoreError> {
        let target = self
            .ids
            .iter()
            .position(|id| id == scale_id)
            .ok_or_else(|| CoreError::UnknownScale(scale_id.0.clone()))?;

        if let Some(prerequisite) = self.prerequisites[target] {
            if !is_complete(prerequisite) {
                return Err(CoreError::PreconditionNotMet {
                    scale: scale_id.0.clone(),
                    prerequisite: self.ids[prerequisite].0.clone(),
                });
            }
        }

        if target != self.scale {
            self.activate_scale(target);
        }
        Ok(target)
    }

    /// Whether `scale` may be entered given the completion predicate
    pub fn is_selectable(&self, scale: usize, is_complete: impl Fn(usize) -> bool) -> bool {
        self.prerequisites[scale].map_or(true, is_complete)
    }

    /// True once the user has reached the final step of `scale`
    pub fn reached_end(&self, scale: usize) -> bool {
        self.furthest[scale].map_or(false, |step| step + 1 >= self.lengths[scale])
    }

    /// Steps of `scale` the user has not reached yet
    pub fn unvisited(&self, scale: usize) -> Vec<usize> {
        let from = self.furthest[scale].map_or(0, |step| step + 1);
        (from..self.lengths[scale]).collect()
    }

    fn mark_visited(&mut self) {
        let current = self.step;
        let furthest = &mut self.furthest[self.scale];
        if furthest.map_or(true, |step| step < current) {
            *furthest = Some(current);
        }
    }
}
