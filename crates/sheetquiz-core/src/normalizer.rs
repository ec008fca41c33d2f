//! CSV question normalizer.
//!
//! Turns loosely formatted spreadsheet rows into canonical [`Question`]s.
//! Malformed rows are dropped, never fatal; only an empty result is an error.

use std::collections::HashMap;

use crate::error::LoadError;
use crate::model::{AnswerOption, Question};
use crate::random::{shuffle, RandomSource};

/// Fixed option slots, in column order.
pub const OPTION_SLOTS: [&str; 4] = ["a", "b", "c", "d"];

const DEFAULT_MODULE: &str = "General";
const DEFAULT_SUBMODULE: &str = "Core";

/// A raw spreadsheet record keyed by lower-cased header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter, mostly useful in tests.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.fields
            .insert(key.trim().to_lowercase(), value.to_string());
    }

    /// The trimmed value of the first non-blank key among `keys`.
    pub fn field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.fields.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k.as_ref(), v.as_ref());
        }
        row
    }
}

/// Tokenize CSV text into raw rows. The first line is the header.
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(headers.iter().map(String::as_str).zip(record.iter()).collect());
    }
    Ok(rows)
}

/// Outcome of normalizing one batch of rows.
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub questions: Vec<Question>,
    /// Rows dropped for a blank prompt or no usable options.
    pub dropped: usize,
}

/// Normalize raw rows, failing only when nothing usable remains.
pub fn normalize_rows(
    rows: &[RawRow],
    rng: &mut dyn RandomSource,
) -> Result<Vec<Question>, LoadError> {
    let report = normalize_rows_with_report(rows, rng);
    if report.questions.is_empty() {
        return Err(LoadError::NoQuestionsFound);
    }
    Ok(report.questions)
}

/// Normalize raw rows and report how many were dropped.
pub fn normalize_rows_with_report(rows: &[RawRow], rng: &mut dyn RandomSource) -> NormalizeReport {
    let mut questions = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row, index, rng) {
            Some(q) => questions.push(q),
            None => {
                tracing::debug!("dropping row {index}: missing prompt or options");
                dropped += 1;
            }
        }
    }

    NormalizeReport { questions, dropped }
}

/// Parse CSV text and normalize it in one step.
pub fn normalize_csv(text: &str, rng: &mut dyn RandomSource) -> Result<Vec<Question>, LoadError> {
    normalize_rows(&parse_csv(text)?, rng)
}

/// Normalize a single row. `None` means the row is dropped.
pub fn normalize_row(row: &RawRow, index: usize, rng: &mut dyn RandomSource) -> Option<Question> {
    let prompt = row.field(&["question", "prompt"])?;

    // (original slot, label)
    let mut slots: Vec<(&str, &str)> = OPTION_SLOTS
        .into_iter()
        .filter_map(|slot| {
            let column = format!("option_{slot}");
            row.field(&[column.as_str(), slot]).map(|label| (slot, label))
        })
        .collect();
    if slots.is_empty() {
        return None;
    }

    let requested = row
        .field(&["correct", "answer"])
        .map(|c| c.to_lowercase())
        .unwrap_or_default();
    let correct_slot = slots
        .iter()
        .map(|(slot, _)| *slot)
        .find(|slot| *slot == requested)
        .unwrap_or(slots[0].0);

    shuffle(&mut slots, rng);

    let mut correct_option = String::new();
    let options = slots
        .iter()
        .zip(OPTION_SLOTS)
        .map(|((slot, label), id)| {
            if *slot == correct_slot {
                correct_option = id.to_string();
            }
            AnswerOption {
                id: id.to_string(),
                label: label.to_string(),
            }
        })
        .collect();

    Some(Question {
        id: format!("{}-{index}", rng.token()),
        module: row.field(&["module"]).unwrap_or(DEFAULT_MODULE).to_string(),
        submodule: row
            .field(&["submodule"])
            .unwrap_or(DEFAULT_SUBMODULE)
            .to_string(),
        prompt: prompt.to_string(),
        options,
        correct_option,
        explanation: row.field(&["explanation"]).map(str::to_string),
        difficulty: row.field(&["difficulty"]).map(str::to_string),
        tags: parse_tags(row.field(&["tags"]).unwrap_or_default()),
    })
}

/// Split a comma/semicolon separated tag list.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
