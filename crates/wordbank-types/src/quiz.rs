//! Quiz questions.

use serde::{Deserialize, Serialize};

/// A multiple-choice question from the daily quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    /// The word being tested
    pub word: String,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    pub answer_index: usize,
}

impl Question {
    /// Returns true if `choice` is the correct option.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }
}
