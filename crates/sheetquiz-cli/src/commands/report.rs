//! The `sheetquiz report` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use sheetquiz_core::model::Theme;
use sheetquiz_core::report::SessionReport;
use sheetquiz_sources::load_config_from;

use crate::commands::run::{parse_formats, Exports};
use crate::console::render_summary;

pub fn execute(
    path: PathBuf,
    format: Option<String>,
    theme: Option<Theme>,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = SessionReport::load_json(&path)?;

    println!(
        "Session {} from {} ({})",
        report.id,
        report.source_label,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{}", render_summary(&report.summary));

    let Some(format) = format else {
        return Ok(());
    };
    let formats = parse_formats(Some(&format), true)?;
    let theme = match theme {
        Some(theme) => theme,
        None => load_config_from(None)?.theme,
    };
    let output_dir = output
        .or_else(|| {
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from("."));

    Exports {
        source_label: report.source_label.clone(),
        output_dir,
        formats,
    }
    .write(&report, theme)
}
