//! Local file question source.

use std::path::PathBuf;

use async_trait::async_trait;

use sheetquiz_core::error::LoadError;
use sheetquiz_core::traits::CsvSource;

/// Reads CSV from the local filesystem. `file://` prefixes are accepted.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root` instead of the working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, location: &str) -> PathBuf {
        let raw = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
        match &self.root {
            Some(root) if raw.is_relative() => root.join(raw),
            _ => raw,
        }
    }
}

#[async_trait]
impl CsvSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_csv(&self, location: &str) -> Result<String, LoadError> {
        let path = self.path_for(location);
        tracing::debug!("reading {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::unavailable(location, e.to_string()))
    }
}
