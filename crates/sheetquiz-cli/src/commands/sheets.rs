//! The `sheetquiz sheets` command.

use anyhow::Result;

use sheetquiz_sources::sheets::{partition_sheet_options, SheetMetadataMap};
use sheetquiz_sources::{parse_sheet_link, HttpSource};

use crate::commands::print_sheet_list;

pub async fn execute(source: String) -> Result<()> {
    let link = parse_sheet_link(&source);
    anyhow::ensure!(
        link.is_google(),
        "{source} is not a Google Sheets link; pass it to `sheetquiz run --source` directly"
    );

    let http = HttpSource::new();
    let (sheets, config_sheet) = partition_sheet_options(http.fetch_sheet_index(&link).await?);

    let metadata = match &config_sheet {
        Some(config) => http
            .fetch_sheet_metadata(&link, config)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("ignoring _config sheet: {e}");
                SheetMetadataMap::new()
            }),
        None => SheetMetadataMap::new(),
    };

    if sheets.is_empty() {
        println!("No question sheets found.");
        return Ok(());
    }
    print_sheet_list(&sheets, &metadata);
    println!(
        "\nRun with: sheetquiz run --source {source} --sheets <gid>[,<gid>...] (or --sheets all)"
    );
    Ok(())
}
