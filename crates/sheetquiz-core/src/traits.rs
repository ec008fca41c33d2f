//! Core trait definitions for question bank sources.
//!
//! Implemented by the `sheetquiz-sources` crate (HTTP, local files, mock).

use async_trait::async_trait;

use crate::error::LoadError;

/// Something that can hand back the raw CSV text behind a URL or path.
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the CSV document at `location`.
    ///
    /// Any failure to obtain the text is a [`LoadError::SourceUnavailable`].
    async fn fetch_csv(&self, location: &str) -> Result<String, LoadError>;
}
