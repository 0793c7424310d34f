//! Per-scale answer storage
//!
//! An `AnswerStore` records the option value selected for each question of one
//! questionnaire scale. Re-selecting a question overwrites the previous value,
//! so the running score never double counts.

use crate::domain::flow_definition::Question;
use crate::domain::flow_state::ScaleId;
use crate::CoreError;
use std::collections::BTreeMap;

/// Answers for a single questionnaire scale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerStore {
    scale: ScaleId,
    allowed: Vec<Vec<u32>>,
    answers: BTreeMap<usize, u32>,
}

impl AnswerStore {
    /// Create an empty store for the given questions
    pub fn new(scale: ScaleId, questions: &[Question]) -> Self {
        Self {
            scale,
            allowed: questions
                .iter()
                .map(|q| q.options.iter().map(|o| o.value).collect())
                .collect(),
            answers: BTreeMap::new(),
        }
    }

    /// Scale this store belongs to
    pub fn scale(&self) -> &ScaleId {
        &self.scale
    }

    /// Number of questions in the scale
    #[inline]
    pub fn question_count(&self) -> usize {
        self.allowed.len()
    }

    /// Record `value` for `question`, returning the value it replaced
    pub fn set_answer(&mut self, question: usize, value: u32) -> Result<Option<u32>, CoreError> {
        let allowed = self
            .allowed
            .get(question)
            .ok_or_else(|| CoreError::QuestionOutOfRange {
                scale: self.scale.0.clone(),
                question,
                count: self.allowed.len(),
            })?;

        if !allowed.contains(&value) {
            return Err(CoreError::InvalidAnswer {
                scale: self.scale.0.clone(),
                question,
                value,
            });
        }

        Ok(self.answers.insert(question, value))
    }

    /// Value recorded for `question`, `None` while unanswered
    #[inline]
    pub fn get_answer(&self, question: usize) -> Option<u32> {
        self.answers.get(&question).copied()
    }

    /// Remove the answer for `question`
    pub fn clear_answer(&mut self, question: usize) -> Option<u32> {
        self.answers.remove(&question)
    }

    /// True once every question has an answer
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.allowed.len()
    }

    /// Sum of the recorded values, partial while the scale is incomplete
    pub fn score(&self) -> u32 {
        self.answers
            .values()
            .fold(0u32, |sum, value| sum.saturating_add(*value))
    }

    /// Number of answered questions
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Indices that still have no answer, ascending
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.allowed.len())
            .filter(|i| !self.answers.contains_key(i))
            .collect()
    }

    /// All recorded answers keyed by question index
    pub fn answers(&self) -> &BTreeMap<usize, u32> {
        &self.answers
    }
}
