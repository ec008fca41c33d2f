//! Source that picks HTTP or file access per location.

use async_trait::async_trait;

use sheetquiz_core::error::LoadError;
use sheetquiz_core::traits::CsvSource;

use crate::file::FileSource;
use crate::http::HttpSource;

/// Routes `http(s)://` locations to [`HttpSource`] and everything else to [`FileSource`].
#[derive(Default)]
pub struct DefaultSource {
    http: HttpSource,
    file: FileSource,
}

impl DefaultSource {
    pub fn new(http: HttpSource, file: FileSource) -> Self {
        Self { http, file }
    }

    pub fn http(&self) -> &HttpSource {
        &self.http
    }
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl CsvSource for DefaultSource {
    fn name(&self) -> &str {
        "default"
    }

    async fn fetch_csv(&self, location: &str) -> Result<String, LoadError> {
        if is_remote(location) {
            self.http.fetch_csv(location).await
        } else {
            self.file.fetch_csv(location).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/a.csv"));
        assert!(is_remote("HTTP://example.com/a.csv"));
        assert!(!is_remote("data/a.csv"));
        assert!(!is_remote("file:///tmp/a.csv"));
    }

    #[tokio::test]
    async fn routes_by_scheme() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/remote.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("remote"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local.csv"), "local").unwrap();

        let source = DefaultSource::new(HttpSource::new(), FileSource::with_root(dir.path()));
        let remote = source
            .fetch_csv(&format!("{}/remote.csv", server.uri()))
            .await
            .unwrap();
        assert_eq!(remote, "remote");
        assert_eq!(source.fetch_csv("local.csv").await.unwrap(), "local");
    }
}
