//! Answer tracking and scoring for the daily quiz.

use std::collections::{BTreeMap, BTreeSet};

use wordbank_types::Question;

/// Result of answering one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { answer_index: usize },
    /// Each question takes one answer; the first one counts.
    AlreadyAnswered,
    UnknownQuestion,
    /// `choice` is outside the question's options.
    InvalidChoice,
    /// No quiz has been loaded.
    NoQuiz,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub answered: u32,
    pub total: u32,
}

/// An in-progress quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizProgress {
    questions: Vec<Question>,
    /// question id -> chosen option
    answers: BTreeMap<String, usize>,
    correct: u32,
}

impl QuizProgress {
    /// Starts a quiz over `questions`. A repeated question id keeps only its
    /// first occurrence.
    pub fn new(mut questions: Vec<Question>) -> Self {
        let mut seen = BTreeSet::new();
        questions.retain(|q| seen.insert(q.id.clone()));
        Self {
            questions,
            answers: BTreeMap::new(),
            correct: 0,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The first question without an answer, in quiz order.
    pub fn next_question(&self) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| !self.answers.contains_key(&q.id))
    }

    pub fn answer(&mut self, question_id: &str, choice: usize) -> AnswerOutcome {
        let Some(question) = self.questions.iter().find(|q| q.id == question_id) else {
            return AnswerOutcome::UnknownQuestion;
        };
        if self.answers.contains_key(question_id) {
            return AnswerOutcome::AlreadyAnswered;
        }
        if choice >= question.options.len() {
            return AnswerOutcome::InvalidChoice;
        }

        let outcome = if question.is_correct(choice) {
            self.correct += 1;
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect {
                answer_index: question.answer_index,
            }
        };
        self.answers.insert(question_id.to_string(), choice);
        outcome
    }

    pub fn score(&self) -> QuizScore {
        QuizScore {
            correct: self.correct,
            answered: self.answers.len() as u32,
            total: self.questions.len() as u32,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.answers.len() == self.questions.len()
    }
}
