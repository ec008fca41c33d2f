//! Session report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summary::{to_percent, Outcome, Summary};

/// A finished session, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the session finished.
    pub created_at: DateTime<Utc>,
    /// Where the questions came from (URL, path, or a joined list).
    pub source_label: String,
    /// Number of questions in the session.
    pub question_count: usize,
    pub summary: Summary,
}

impl SessionReport {
    pub fn new(source_label: impl Into<String>, summary: Summary) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source_label: source_label.into(),
            question_count: summary.total,
            summary,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file stem, e.g. `sheetquiz-20261019-143000`.
    pub fn file_stem(&self) -> String {
        format!("sheetquiz-{}", self.created_at.format("%Y%m%d-%H%M%S"))
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let s = &self.summary;
        let mut md = String::new();

        md.push_str(&format!(
            "**{} session:** {}/{} correct ({}%), {} incorrect, {} skipped\n\n",
            s.mode,
            s.correct,
            s.total,
            to_percent(s.accuracy),
            s.incorrect,
            s.skipped
        ));

        if let Some(timing) = s.timing {
            md.push_str(&format!(
                "**Time:** {}s elapsed\n\n",
                timing.elapsed_seconds
            ));
        }

        if !s.strengths.is_empty() {
            md.push_str(&format!("**Strengths:** {}\n\n", s.strengths.join(", ")));
        }
        if !s.focus.is_empty() {
            md.push_str(&format!("**Focus areas:** {}\n\n", s.focus.join(", ")));
        }

        if !s.by_submodule.is_empty() {
            md.push_str("### By submodule\n\n");
            md.push_str("| Module | Submodule | Correct | Total | Accuracy |\n");
            md.push_str("|--------|-----------|---------|-------|----------|\n");
            for g in &s.by_submodule {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.1}% |\n",
                    g.module.as_deref().unwrap_or("-"),
                    g.label,
                    g.correct,
                    g.total,
                    g.accuracy * 100.0
                ));
            }
            md.push('\n');
        }

        let missed: Vec<_> = s
            .questions
            .iter()
            .filter(|q| q.outcome() != Outcome::Correct)
            .collect();
        if !missed.is_empty() {
            md.push_str("### Review\n\n");
            for q in missed {
                let yours = q.selected_label.as_deref().unwrap_or("(skipped)");
                md.push_str(&format!(
                    "- {} (yours: {}, answer: {})\n",
                    q.prompt, yours, q.correct_label
                ));
            }
        }

        md
    }
}
