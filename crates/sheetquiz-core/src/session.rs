//! Quiz session engine.
//!
//! One [`QuizSession`] owns the question set, the answer map, the navigation
//! cursor and the countdown for a single run. Learning and timed modes, and
//! the single-card and list layouts, are variants of the same state machine.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question, QuestionLayout, QuizMode, SessionConfig};
use crate::summary::{build_summary, Summary, SummaryMeta};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Finished,
}

/// What happened to a `select_answer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The answer was stored.
    Recorded,
    /// Learning mode: the question already has its final answer.
    Locked,
    /// Session not running, or unknown question/option.
    Ignored,
}

/// Display state of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFeedback {
    /// Nothing to highlight.
    Neutral,
    /// Chosen, correctness still hidden.
    Selected,
    /// Revealed as the correct option.
    Correct,
    /// Revealed as a wrong pick.
    Incorrect,
}

/// A single quiz run over a fixed, ordered question set.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: AnswerMap,
    config: SessionConfig,
    current_index: usize,
    remaining_seconds: Option<u32>,
    status: SessionStatus,
    summary: Option<Summary>,
}

impl QuizSession {
    /// Create a session in the not-started state.
    pub fn new(questions: Vec<Question>, config: SessionConfig) -> Self {
        let config = config.normalized();
        Self {
            remaining_seconds: config.limit_seconds(),
            questions,
            answers: AnswerMap::new(),
            config,
            current_index: 0,
            status: SessionStatus::NotStarted,
            summary: None,
        }
    }

    /// Create and immediately launch a session.
    pub fn start(questions: Vec<Question>, config: SessionConfig) -> Self {
        let mut session = Self::new(questions, config);
        session.launch();
        session
    }

    /// Move from not-started to running. No effect in any other state.
    pub fn launch(&mut self) {
        if self.status == SessionStatus::NotStarted {
            tracing::info!(
                mode = %self.config.mode,
                layout = %self.config.layout,
                questions = self.questions.len(),
                "session started"
            );
            self.status = SessionStatus::Running;
        }
    }

    pub fn mode(&self) -> QuizMode {
        self.config.mode
    }

    pub fn layout(&self) -> QuestionLayout {
        self.config.layout
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Seconds left on the countdown. `None` in learning mode.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    pub fn limit_seconds(&self) -> Option<u32> {
        self.config.limit_seconds()
    }

    /// The summary, once the session is finished.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Record an answer according to the mode rules.
    pub fn select_answer(&mut self, question_id: &str, option_id: &str) -> Selection {
        if !self.is_running() {
            return Selection::Ignored;
        }
        let Some(question) = self.question(question_id) else {
            return Selection::Ignored;
        };
        if question.option(option_id).is_none() {
            return Selection::Ignored;
        }

        match self.config.mode {
            QuizMode::Learning if self.answers.contains(question_id) => Selection::Locked,
            _ => {
                self.answers.record(question_id, option_id);
                Selection::Recorded
            }
        }
    }

    /// Answer the question under the cursor.
    pub fn select_current(&mut self, option_id: &str) -> Selection {
        match self.current_question().map(|q| q.id.clone()) {
            Some(id) => self.select_answer(&id, option_id),
            None => Selection::Ignored,
        }
    }

    /// Remove a recorded answer. Timed mode only.
    pub fn clear_answer(&mut self, question_id: &str) -> bool {
        if self.config.mode != QuizMode::Timed || !self.is_running() {
            return false;
        }
        self.answers.clear(question_id)
    }

    /// Move to the next question. Returns `false` at the last one.
    pub fn advance(&mut self) -> bool {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question. Returns `false` at the first one.
    pub fn retreat(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a question by position, clamped to the valid range.
    pub fn go_to(&mut self, index: usize) {
        self.current_index = index.min(self.questions.len().saturating_sub(1));
    }

    /// Count down one second. Auto-submits when the clock reaches zero.
    ///
    /// Returns the summary if this tick finished the session.
    pub fn tick(&mut self) -> Option<&Summary> {
        if !self.is_running() {
            return None;
        }
        let remaining = self.remaining_seconds.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            tracing::info!("time is up, submitting automatically");
            return Some(self.finalize(true));
        }
        None
    }

    /// Finish the session and score it.
    ///
    /// `auto` marks the timer-expiry path: elapsed time is the full limit.
    /// Calling this on a finished session returns the existing summary.
    pub fn finalize(&mut self, auto: bool) -> &Summary {
        let summary = match self.summary.take() {
            Some(existing) => existing,
            None => {
                let meta = match (self.config.limit_seconds(), self.remaining_seconds) {
                    (Some(limit), Some(remaining)) => {
                        let elapsed = if auto { limit } else { limit - remaining.min(limit) };
                        SummaryMeta::timed(elapsed, limit)
                    }
                    _ => SummaryMeta::learning(),
                };
                self.status = SessionStatus::Finished;
                let summary = build_summary(&self.questions, &self.answers, meta);
                tracing::info!(
                    correct = summary.correct,
                    total = summary.total,
                    auto,
                    "session finished"
                );
                summary
            }
        };
        self.summary.insert(summary)
    }

    /// Learning single-card flow: finish from the final question.
    ///
    /// Returns `None` unless the cursor is on the last question.
    pub fn finish(&mut self) -> Option<&Summary> {
        if !self.is_last() {
            return None;
        }
        Some(self.finalize(false))
    }

    /// Reset answers, cursor and timer, keeping the same questions in the same order.
    pub fn retake(&mut self) {
        self.answers = AnswerMap::new();
        self.current_index = 0;
        self.remaining_seconds = self.config.limit_seconds();
        self.summary = None;
        self.status = SessionStatus::Running;
        tracing::info!("session restarted");
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains(&q.id))
            .count()
    }

    pub fn unanswered_count(&self) -> usize {
        self.questions.len() - self.answered_count()
    }

    /// Fraction of questions answered, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            self.answered_count() as f64 / self.questions.len() as f64
        }
    }

    /// A manual timed submission with gaps should be confirmed by the user.
    pub fn needs_submit_confirmation(&self) -> bool {
        self.config.mode == QuizMode::Timed && self.unanswered_count() > 0
    }

    /// Whether correctness and the explanation are visible for a question.
    pub fn is_revealed(&self, question_id: &str) -> bool {
        match self.config.mode {
            QuizMode::Learning => self.answers.contains(question_id) || self.is_finished(),
            QuizMode::Timed => self.is_finished(),
        }
    }

    /// Whether the question currently accepts a selection.
    ///
    /// The single layout exposes only the card under the cursor; the list
    /// layout exposes every question.
    pub fn is_interactive(&self, question_id: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        let on_screen = match self.config.layout {
            QuestionLayout::List => self.question(question_id).is_some(),
            QuestionLayout::Single => self
                .current_question()
                .is_some_and(|q| q.id == question_id),
        };
        on_screen
            && !(self.config.mode == QuizMode::Learning && self.answers.contains(question_id))
    }

    /// How an option should be highlighted.
    pub fn option_feedback(&self, question_id: &str, option_id: &str) -> OptionFeedback {
        let Some(question) = self.question(question_id) else {
            return OptionFeedback::Neutral;
        };
        let selected = self.answers.get(question_id) == Some(option_id);

        if !self.is_revealed(question_id) {
            return if selected {
                OptionFeedback::Selected
            } else {
                OptionFeedback::Neutral
            };
        }
        if question.is_correct(option_id) {
            OptionFeedback::Correct
        } else if selected {
            OptionFeedback::Incorrect
        } else {
            OptionFeedback::Neutral
        }
    }

    /// Remaining time as `MM:SS`, `None` in learning mode.
    pub fn format_remaining(&self) -> Option<String> {
        self.remaining_seconds.map(format_clock)
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
