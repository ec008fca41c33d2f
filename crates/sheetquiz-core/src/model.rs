//! Core data model types for sheetquiz.
//!
//! These are the fundamental types that the whole system uses to represent
//! questions, answers, and session configuration.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single multiple-choice question, normalized from one CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within a loaded question bank.
    pub id: String,
    /// Top-level topic grouping.
    pub module: String,
    /// Finer-grained topic nested under `module`.
    pub submodule: String,
    /// The question text.
    pub prompt: String,
    /// Answer options in display order, labelled "a", "b", "c", "d".
    pub options: Vec<AnswerOption>,
    /// Id of the correct entry in `options`.
    pub correct_option: String,
    /// Shown once the answer is revealed.
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// Look up an option by id.
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// The label of the correct option.
    pub fn correct_label(&self) -> &str {
        self.option(&self.correct_option)
            .map(|o| o.label.as_str())
            .unwrap_or_default()
    }

    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_option == option_id
    }
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub label: String,
}

/// Selected option per question id. Absent means unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(HashMap<String, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The option recorded for a question, if any.
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.0.contains_key(question_id)
    }

    /// Record an answer, replacing any previous one.
    pub fn record(&mut self, question_id: &str, option_id: &str) {
        self.0.insert(question_id.to_string(), option_id.to_string());
    }

    /// Remove an answer. Returns `true` if one was present.
    pub fn clear(&mut self, question_id: &str) -> bool {
        self.0.remove(question_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Quiz mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Untimed practice; first answer is final and revealed immediately.
    #[default]
    Learning,
    /// Exam simulation with a countdown; answers revealed at the end.
    Timed,
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Learning => write!(f, "learning"),
            QuizMode::Timed => write!(f, "timed"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "learning" | "learn" | "practice" => Ok(QuizMode::Learning),
            "timed" | "exam" => Ok(QuizMode::Timed),
            other => Err(format!("unknown quiz mode: {other}")),
        }
    }
}

/// How many questions are presented at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionLayout {
    /// One card at a time.
    #[default]
    Single,
    /// The full set at once. Learning mode only.
    List,
}

impl fmt::Display for QuestionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionLayout::Single => write!(f, "single"),
            QuestionLayout::List => write!(f, "list"),
        }
    }
}

impl FromStr for QuestionLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "card" => Ok(QuestionLayout::Single),
            "list" | "all" => Ok(QuestionLayout::List),
            other => Err(format!("unknown question layout: {other}")),
        }
    }
}

/// Colour scheme for rendered output. Persisted across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Default countdown length in minutes.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 15;

/// Everything needed to launch a session over an already-loaded bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: QuizMode,
    pub layout: QuestionLayout,
    /// Ignored in learning mode.
    pub time_limit_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: QuizMode::Learning,
            layout: QuestionLayout::Single,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
        }
    }
}

impl SessionConfig {
    pub fn learning(layout: QuestionLayout) -> Self {
        Self {
            mode: QuizMode::Learning,
            layout,
            ..Self::default()
        }
    }

    pub fn timed(time_limit_minutes: u32) -> Self {
        Self {
            mode: QuizMode::Timed,
            layout: QuestionLayout::Single,
            time_limit_minutes,
        }
    }

    /// Countdown length in seconds, `None` in learning mode.
    pub fn limit_seconds(&self) -> Option<u32> {
        match self.mode {
            QuizMode::Learning => None,
            QuizMode::Timed => Some(self.time_limit_minutes.max(1) * 60),
        }
    }

    /// Coerce combinations the engine does not offer.
    ///
    /// The list layout only exists for learning mode.
    pub fn normalized(mut self) -> Self {
        if self.mode == QuizMode::Timed && self.layout == QuestionLayout::List {
            tracing::warn!("list layout is not available in timed mode, using single");
            self.layout = QuestionLayout::Single;
        }
        if self.time_limit_minutes == 0 {
            self.time_limit_minutes = DEFAULT_TIME_LIMIT_MINUTES;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_display_and_parse() {
        assert_eq!(QuizMode::Learning.to_string(), "learning");
        assert_eq!(QuizMode::Timed.to_string(), "timed");
        assert_eq!("Timed".parse::<QuizMode>().unwrap(), QuizMode::Timed);
        assert_eq!("exam".parse::<QuizMode>().unwrap(), QuizMode::Timed);
        assert_eq!("practice".parse::<QuizMode>().unwrap(), QuizMode::Learning);
        assert!("speedrun".parse::<QuizMode>().is_err());
    }

    #[test]
    fn theme_parse_and_toggle() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::default().toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn layout_parse() {
        assert_eq!("list".parse::<QuestionLayout>().unwrap(), QuestionLayout::List);
        assert_eq!(" SINGLE ".parse::<QuestionLayout>().unwrap(), QuestionLayout::Single);
        assert!("grid".parse::<QuestionLayout>().is_err());
    }

    #[test]
    fn timed_list_layout_is_coerced() {
        let config = SessionConfig {
            mode: QuizMode::Timed,
            layout: QuestionLayout::List,
            time_limit_minutes: 0,
        }
        .normalized();
        assert_eq!(config.layout, QuestionLayout::Single);
        assert_eq!(config.time_limit_minutes, DEFAULT_TIME_LIMIT_MINUTES);
    }

    #[test]
    fn limit_seconds_only_in_timed_mode() {
        assert_eq!(SessionConfig::learning(QuestionLayout::List).limit_seconds(), None);
        assert_eq!(SessionConfig::timed(2).limit_seconds(), Some(120));
    }

    #[test]
    fn answer_map_record_and_clear() {
        let mut answers = AnswerMap::new();
        answers.record("q1", "a");
        answers.record("q1", "b");
        assert_eq!(answers.get("q1"), Some("b"));
        assert_eq!(answers.len(), 1);
        assert!(answers.clear("q1"));
        assert!(!answers.clear("q1"));
        assert!(answers.is_empty());
    }

    #[test]
    fn answer_map_serializes_as_plain_object() {
        let answers: AnswerMap = [("q1", "c")].into_iter().collect();
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"q1":"c"}"#);
    }
}
