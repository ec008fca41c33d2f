//! Question bank loader.
//!
//! Fetches one or more CSV sources concurrently, normalizes each, merges
//! them in source order, then applies the optional shuffle and question cap.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;

use crate::error::LoadError;
use crate::model::Question;
use crate::normalizer::{normalize_csv, parse_csv};
use crate::random::{shuffle, RandomSource};
use crate::traits::CsvSource;

/// Post-merge options for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Shuffle the merged question order.
    pub shuffle: bool,
    /// Keep only the first N questions after merge and shuffle.
    pub question_limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            shuffle: true,
            question_limit: None,
        }
    }
}

/// Loads question banks through a [`CsvSource`].
pub struct QuestionBankLoader {
    source: Arc<dyn CsvSource>,
}

impl QuestionBankLoader {
    pub fn new(source: Arc<dyn CsvSource>) -> Self {
        Self { source }
    }

    /// Load and merge every location. Any failed source fails the whole load.
    pub async fn load(
        &self,
        locations: &[String],
        options: LoadOptions,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<Question>, LoadError> {
        let start = Instant::now();
        let texts = self.fetch_all(locations).await?;

        let mut merged = Vec::new();
        for (location, text) in locations.iter().zip(&texts) {
            let questions = normalize_csv(text, rng).inspect_err(|e| {
                tracing::warn!("{location}: {e}");
            })?;
            tracing::debug!("{location}: {} questions", questions.len());
            merged.extend(questions);
        }

        if merged.is_empty() {
            return Err(LoadError::NoQuestionsFound);
        }
        let merged = arrange(merged, options, rng);

        tracing::info!(
            sources = locations.len(),
            questions = merged.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "question bank loaded"
        );
        Ok(merged)
    }

    /// Fetch every location concurrently, keeping input order.
    pub async fn fetch_all(&self, locations: &[String]) -> Result<Vec<String>, LoadError> {
        try_join_all(locations.iter().map(|loc| self.source.fetch_csv(loc))).await
    }

    /// Count raw rows and usable questions per location without shuffling.
    pub async fn inspect(&self, locations: &[String]) -> Result<Vec<SourceInspection>, LoadError> {
        let texts = self.fetch_all(locations).await?;
        let mut rng = crate::random::SeededRandom::new(0);

        locations
            .iter()
            .zip(texts)
            .map(|(location, text)| -> Result<SourceInspection, LoadError> {
                let rows = parse_csv(&text)?;
                let report = crate::normalizer::normalize_rows_with_report(&rows, &mut rng);
                Ok(SourceInspection {
                    location: location.clone(),
                    rows: rows.len(),
                    dropped: report.dropped,
                    questions: report.questions,
                })
            })
            .collect()
    }
}

/// Per-source normalization outcome, used by validation tooling.
#[derive(Debug, Clone)]
pub struct SourceInspection {
    pub location: String,
    pub rows: usize,
    pub dropped: usize,
    pub questions: Vec<Question>,
}

/// Apply shuffle and cap to an already merged bank.
pub fn arrange(
    mut questions: Vec<Question>,
    options: LoadOptions,
    rng: &mut dyn RandomSource,
) -> Vec<Question> {
    if options.shuffle {
        shuffle(&mut questions, rng);
    }
    if let Some(limit) = options.question_limit.filter(|l| *l > 0) {
        questions.truncate(limit);
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        docs: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(docs: &[(&str, &str)]) -> Self {
            Self {
                docs: docs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CsvSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch_csv(&self, location: &str) -> Result<String, LoadError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.docs
                .get(location)
                .cloned()
                .ok_or_else(|| LoadError::unavailable(location, "HTTP 404"))
        }
    }

    fn numbered_csv(prefix: &str, n: usize) -> String {
        let mut csv = String::from("module,submodule,question,option_a,option_b,correct\n");
        for i in 0..n {
            csv.push_str(&format!("M,S,{prefix} {i},yes,no,a\n"));
        }
        csv
    }

    fn loader(docs: &[(&str, &str)]) -> (Arc<FakeSource>, QuestionBankLoader) {
        let source = Arc::new(FakeSource::new(docs));
        let loader = QuestionBankLoader::new(source.clone());
        (source, loader)
    }

    #[tokio::test]
    async fn merges_sources_in_order_without_shuffle() {
        let first = numbered_csv("first", 2);
        let second = numbered_csv("second", 2);
        let (source, loader) = loader(&[("one", first.as_str()), ("two", second.as_str())]);

        let options = LoadOptions {
            shuffle: false,
            question_limit: None,
        };
        let questions = loader
            .load(&["one".into(), "two".into()], options, &mut SeededRandom::new(3))
            .await
            .unwrap();

        let prompts: Vec<&str> = questions.iter().map(|q| q.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["first 0", "first 1", "second 0", "second 1"]);
        assert_eq!(source.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn any_failed_source_fails_the_load() {
        let good = numbered_csv("good", 3);
        let (_, loader) = loader(&[("good", good.as_str())]);

        let err = loader
            .load(
                &["good".into(), "missing".into()],
                LoadOptions::default(),
                &mut SeededRandom::new(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { ref url, .. } if url == "missing"));
    }

    #[tokio::test]
    async fn empty_source_fails_with_no_questions() {
        let good = numbered_csv("good", 1);
        let (_, loader) = loader(&[("good", good.as_str()), ("empty", "question,option_a\n,\n")]);

        let err = loader
            .load(
                &["good".into(), "empty".into()],
                LoadOptions::default(),
                &mut SeededRandom::new(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NoQuestionsFound));
    }

    #[tokio::test]
    async fn cap_truncates_the_shuffled_order() {
        let bank = numbered_csv("q", 10);
        let (_, loader) = loader(&[("bank", bank.as_str())]);
        let options = LoadOptions {
            shuffle: true,
            question_limit: Some(2),
        };

        let capped = loader
            .load(&["bank".into()], options, &mut SeededRandom::new(99))
            .await
            .unwrap();

        let uncapped_options = LoadOptions {
            question_limit: None,
            ..options
        };
        let full = loader
            .load(&["bank".into()], uncapped_options, &mut SeededRandom::new(99))
            .await
            .unwrap();

        assert_eq!(capped.len(), 2);
        assert_eq!(full.len(), 10);
        assert_eq!(capped[0].prompt, full[0].prompt);
        assert_eq!(capped[1].prompt, full[1].prompt);
    }

    #[tokio::test]
    async fn inspect_reports_dropped_rows() {
        let csv = "question,option_a\nKept,yes\n,orphan\n";
        let (_, loader) = loader(&[("bank", csv)]);
        let report = loader.inspect(&["bank".into()]).await.unwrap();
        assert_eq!(report[0].rows, 2);
        assert_eq!(report[0].dropped, 1);
        assert_eq!(report[0].questions.len(), 1);
    }

    #[test]
    fn zero_limit_means_no_cap() {
        let mut rng = SeededRandom::new(5);
        let questions = crate::normalizer::normalize_csv(&numbered_csv("q", 3), &mut rng).unwrap();
        let options = LoadOptions {
            shuffle: false,
            question_limit: Some(0),
        };
        assert_eq!(arrange(questions, options, &mut rng).len(), 3);
    }
}
