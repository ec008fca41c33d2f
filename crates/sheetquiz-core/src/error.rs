//! Question bank load errors.
//!
//! Defined in `sheetquiz-core` so every source implementation reports the
//! same taxonomy and the caller can turn any load failure into a single
//! user-facing message.

use thiserror::Error;

/// Errors that can occur while loading a question bank.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The CSV or sheet index could not be fetched (network, non-2xx, missing file).
    #[error("unable to load {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// The CSV parsed but no row produced a valid question.
    #[error("no valid questions were found in the CSV file")]
    NoQuestionsFound,

    /// The CSV text could not be tokenized.
    #[error("malformed CSV: {0}")]
    Csv(String),
}

impl LoadError {
    pub fn unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::SourceUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err.to_string())
    }
}
