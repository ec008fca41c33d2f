//! Session scoring and grouped accuracy statistics.
//!
//! [`build_summary`] is a pure function of the question set, the answer map,
//! and the session metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question, QuizMode};

/// Groups at or above this accuracy count as strengths.
pub const STRENGTH_THRESHOLD: f64 = 0.75;
/// Groups below this accuracy count as focus areas.
pub const FOCUS_THRESHOLD: f64 = 0.6;
/// Maximum entries in the strengths and focus lists.
pub const HIGHLIGHT_LIMIT: usize = 3;

/// Performance snapshot of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mode: QuizMode,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    /// `correct / total`, 0 for an empty session.
    pub accuracy: f64,
    /// Formatted `"label (P%)"` entries.
    pub strengths: Vec<String>,
    pub focus: Vec<String>,
    pub by_submodule: Vec<GroupStat>,
    pub by_tag: Vec<GroupStat>,
    pub questions: Vec<QuestionResult>,
    #[serde(default)]
    pub timing: Option<Timing>,
}

/// Accuracy of one submodule or tag group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub label: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub submodule: Option<String>,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

impl GroupStat {
    fn new(label: &str, module: Option<&str>, submodule: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            module: module.map(str::to_string),
            submodule: submodule.map(str::to_string),
            correct: 0,
            total: 0,
            accuracy: 0.0,
        }
    }

    fn add(&mut self, was_correct: bool) {
        self.total += 1;
        if was_correct {
            self.correct += 1;
        }
        self.accuracy = self.correct as f64 / self.total as f64;
    }

    /// `"label (P%)"` with the percentage rounded to a tenth.
    pub fn highlight(&self) -> String {
        format!("{} ({}%)", self.label, to_percent(self.accuracy))
    }
}

/// Per-question outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub prompt: String,
    pub module: String,
    pub submodule: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Selected option id, `None` when skipped.
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub selected_label: Option<String>,
    pub correct_answer: String,
    pub correct_label: String,
    pub was_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionResult {
    pub fn outcome(&self) -> Outcome {
        match (&self.selected, self.was_correct) {
            (None, _) => Outcome::Skipped,
            (Some(_), true) => Outcome::Correct,
            (Some(_), false) => Outcome::Incorrect,
        }
    }
}

/// Classification of a single question result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Skipped,
}

/// Time spent in a timed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub elapsed_seconds: u32,
    #[serde(default)]
    pub limit_seconds: Option<u32>,
}

/// Session metadata passed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryMeta {
    pub mode: QuizMode,
    pub timing: Option<Timing>,
}

impl SummaryMeta {
    pub fn learning() -> Self {
        Self {
            mode: QuizMode::Learning,
            timing: None,
        }
    }

    pub fn timed(elapsed_seconds: u32, limit_seconds: u32) -> Self {
        Self {
            mode: QuizMode::Timed,
            timing: Some(Timing {
                elapsed_seconds,
                limit_seconds: Some(limit_seconds),
            }),
        }
    }
}

/// Round a fraction to a percentage with one decimal place.
pub fn to_percent(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}

/// Build the summary for a finished session.
pub fn build_summary(questions: &[Question], answers: &AnswerMap, meta: SummaryMeta) -> Summary {
    let results = question_breakdown(questions, answers);

    let correct = results.iter().filter(|r| r.was_correct).count();
    let skipped = results.iter().filter(|r| r.selected.is_none()).count();
    let incorrect = results.len() - correct - skipped;

    let by_submodule = submodule_stats(questions, answers);
    let by_tag = tag_stats(questions, answers);

    let highlight_source = if by_submodule.is_empty() {
        &by_tag
    } else {
        &by_submodule
    };
    let strengths = pick_highlights(highlight_source, |a| a >= STRENGTH_THRESHOLD);
    let focus = pick_highlights(highlight_source, |a| a < FOCUS_THRESHOLD);

    Summary {
        mode: meta.mode,
        total: questions.len(),
        correct,
        incorrect,
        skipped,
        accuracy: if questions.is_empty() {
            0.0
        } else {
            correct as f64 / questions.len() as f64
        },
        strengths,
        focus,
        by_submodule,
        by_tag,
        questions: results,
        timing: meta.timing,
    }
}

fn question_breakdown(questions: &[Question], answers: &AnswerMap) -> Vec<QuestionResult> {
    questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id);
            QuestionResult {
                question_id: q.id.clone(),
                prompt: q.prompt.clone(),
                module: q.module.clone(),
                submodule: q.submodule.clone(),
                difficulty: q.difficulty.clone(),
                tags: q.tags.clone(),
                selected: selected.map(str::to_string),
                selected_label: selected
                    .and_then(|id| q.option(id))
                    .map(|o| o.label.clone()),
                correct_answer: q.correct_option.clone(),
                correct_label: q.correct_label().to_string(),
                was_correct: selected.is_some_and(|id| q.is_correct(id)),
                explanation: q.explanation.clone(),
            }
        })
        .collect()
}

fn was_correct(question: &Question, answers: &AnswerMap) -> bool {
    answers
        .get(&question.id)
        .is_some_and(|id| question.is_correct(id))
}

/// Accuracy per (module, submodule), sorted by descending accuracy.
pub fn submodule_stats(questions: &[Question], answers: &AnswerMap) -> Vec<GroupStat> {
    let mut groups: Vec<GroupStat> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for q in questions {
        let key = (q.module.as_str(), q.submodule.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupStat::new(&q.submodule, Some(&q.module), Some(&q.submodule)));
            groups.len() - 1
        });
        groups[slot].add(was_correct(q, answers));
    }

    sort_by_accuracy(&mut groups);
    groups
}

/// Accuracy per tag, sorted by descending accuracy.
///
/// A question contributes once to each of its tags.
pub fn tag_stats(questions: &[Question], answers: &AnswerMap) -> Vec<GroupStat> {
    let mut groups: Vec<GroupStat> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for q in questions {
        let correct = was_correct(q, answers);
        for tag in &q.tags {
            let slot = *index.entry(tag.as_str()).or_insert_with(|| {
                groups.push(GroupStat::new(tag, None, None));
                groups.len() - 1
            });
            groups[slot].add(correct);
        }
    }

    sort_by_accuracy(&mut groups);
    groups
}

// Stable: ties keep first-seen order.
fn sort_by_accuracy(groups: &mut [GroupStat]) {
    groups.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
}

// Focus areas keep the descending order too, so the least weak group comes first.
fn pick_highlights(groups: &[GroupStat], accept: impl Fn(f64) -> bool) -> Vec<String> {
    groups
        .iter()
        .filter(|g| g.total >= 1 && accept(g.accuracy))
        .take(HIGHLIGHT_LIMIT)
        .map(GroupStat::highlight)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn question(id: &str, submodule: &str, tags: &[&str]) -> Question {
        Question {
            id: id.into(),
            module: "General".into(),
            submodule: submodule.into(),
            prompt: format!("Question {id}"),
            options: vec![
                AnswerOption {
                    id: "a".into(),
                    label: "Right".into(),
                },
                AnswerOption {
                    id: "b".into(),
                    label: "Wrong".into(),
                },
            ],
            correct_option: "a".into(),
            explanation: None,
            difficulty: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn counts_add_up() {
        let questions = vec![
            question("1", "X", &[]),
            question("2", "X", &[]),
            question("3", "Y", &[]),
            question("4", "Y", &[]),
        ];
        let answers: AnswerMap = [("1", "a"), ("2", "b"), ("3", "a")].into_iter().collect();
        let summary = build_summary(&questions, &answers, SummaryMeta::learning());

        assert_eq!(summary.total, 4);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            summary.correct + summary.incorrect + summary.skipped,
            summary.total
        );
        assert!((summary.accuracy - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.questions[3].outcome(), Outcome::Skipped);
        assert_eq!(summary.questions[1].outcome(), Outcome::Incorrect);
        assert_eq!(summary.questions[1].selected_label.as_deref(), Some("Wrong"));
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        let summary = build_summary(&[], &AnswerMap::new(), SummaryMeta::learning());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert!(summary.strengths.is_empty());
        assert!(summary.focus.is_empty());
    }

    #[test]
    fn submodule_groups_sorted_descending() {
        let questions = vec![
            question("1", "X", &[]),
            question("2", "X", &[]),
            question("3", "Y", &[]),
        ];
        let answers: AnswerMap = [("1", "a"), ("2", "b"), ("3", "a")].into_iter().collect();
        let stats = submodule_stats(&questions, &answers);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "Y");
        assert_eq!(stats[0].accuracy, 1.0);
        assert_eq!(stats[1].label, "X");
        assert_eq!(stats[1].accuracy, 0.5);
        assert_eq!(stats[1].module.as_deref(), Some("General"));
    }

    #[test]
    fn same_submodule_in_different_modules_is_separate() {
        let mut other = question("2", "Core", &[]);
        other.module = "Avionics".into();
        let questions = vec![question("1", "Core", &[]), other];
        let stats = submodule_stats(&questions, &AnswerMap::new());
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn tags_contribute_independently() {
        let questions = vec![
            question("1", "X", &["safety", "tools"]),
            question("2", "X", &["safety"]),
        ];
        let answers: AnswerMap = [("1", "a"), ("2", "b")].into_iter().collect();
        let stats = tag_stats(&questions, &answers);

        assert_eq!(stats[0].label, "tools");
        assert_eq!((stats[0].correct, stats[0].total), (1, 1));
        assert_eq!(stats[1].label, "safety");
        assert_eq!((stats[1].correct, stats[1].total), (1, 2));
    }

    #[test]
    fn strengths_and_focus_keep_descending_order() {
        // A: 4/4, B: 3/4, C: 1/2, D: 1/3, E: 0/1
        let mut questions = Vec::new();
        let mut answers = AnswerMap::new();
        let plan = [("A", 4, 4), ("B", 3, 4), ("C", 1, 2), ("D", 1, 3), ("E", 0, 1)];
        for (sub, right, total) in plan {
            for i in 0..total {
                let id = format!("{sub}{i}");
                questions.push(question(&id, sub, &[]));
                answers.record(&id, if i < right { "a" } else { "b" });
            }
        }

        let summary = build_summary(&questions, &answers, SummaryMeta::learning());
        assert_eq!(summary.strengths, vec!["A (100%)", "B (75%)"]);
        assert_eq!(summary.focus, vec!["C (50%)", "D (33.3%)", "E (0%)"]);
    }

    #[test]
    fn highlight_label_and_threshold_filter() {
        let stats = vec![GroupStat {
            label: "wiring".into(),
            module: None,
            submodule: None,
            correct: 2,
            total: 3,
            accuracy: 2.0 / 3.0,
        }];
        assert_eq!(stats[0].highlight(), "wiring (66.7%)");
        assert_eq!(pick_highlights(&stats, |a| a >= 0.6), vec!["wiring (66.7%)"]);
    }

    #[test]
    fn empty_bank_uses_tag_groups_and_has_no_highlights() {
        let summary = build_summary(&[], &AnswerMap::new(), SummaryMeta::learning());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert!(summary.by_submodule.is_empty());
        assert!(summary.by_tag.is_empty());
        assert!(summary.strengths.is_empty());
        assert!(summary.focus.is_empty());
    }

    #[test]
    fn percent_rounding() {
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(2.0 / 3.0), 66.7);
        assert_eq!(to_percent(0.12345), 12.3);
        assert_eq!(format!("{}", to_percent(0.5)), "50");
    }

    #[test]
    fn aggregator_is_idempotent() {
        let questions = vec![question("1", "X", &["t"]), question("2", "Y", &["t"])];
        let answers: AnswerMap = [("1", "a")].into_iter().collect();
        let meta = SummaryMeta::timed(42, 60);
        let first = build_summary(&questions, &answers, meta);
        let second = build_summary(&questions, &answers, meta);
        assert_eq!(first, second);
        assert_eq!(first.timing.unwrap().elapsed_seconds, 42);
    }
}
