//! Mock source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use sheetquiz_core::error::LoadError;
use sheetquiz_core::traits::CsvSource;

/// An in-memory CSV source for exercising loaders without network or disk.
///
/// Unknown locations fail with `HTTP 404` unless a default document is set.
pub struct MockSource {
    /// Map of location → CSV text.
    documents: HashMap<String, String>,
    /// Returned for locations not in `documents`.
    default_document: Option<String>,
    call_count: AtomicU32,
    last_location: Mutex<Option<String>>,
}

impl MockSource {
    pub fn new(documents: HashMap<String, String>) -> Self {
        Self {
            documents,
            default_document: None,
            call_count: AtomicU32::new(0),
            last_location: Mutex::new(None),
        }
    }

    /// Create a mock that serves the same CSV for every location.
    pub fn with_fixed_document(csv: &str) -> Self {
        Self {
            default_document: Some(csv.to_string()),
            ..Self::new(HashMap::new())
        }
    }

    /// Number of fetches made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_location(&self) -> Option<String> {
        self.last_location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CsvSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_csv(&self, location: &str) -> Result<String, LoadError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(location.to_string());

        self.documents
            .get(location)
            .or(self.default_document.as_ref())
            .cloned()
            .ok_or_else(|| LoadError::unavailable(location, "HTTP 404"))
    }
}
