//! Subcommand implementations.

pub mod init;
pub mod report;
pub mod run;
pub mod sheets;
pub mod validate;

use anyhow::Result;

use sheetquiz_sources::sheets::{SheetMetadataMap, SheetOption};
use sheetquiz_sources::{HttpSource, Resolution, SheetSelection};

/// Resolve every input into CSV locations.
///
/// A workbook link without a selection prints its sheets and fails with a hint.
pub async fn resolve_locations(
    http: &HttpSource,
    inputs: &[String],
    selection: Option<&SheetSelection>,
) -> Result<Vec<String>> {
    let mut locations = Vec::new();
    for input in inputs {
        match http.resolve(input, selection).await? {
            Resolution::Ready(urls) => locations.extend(urls),
            Resolution::SelectionRequired { sheets, metadata } => {
                println!("{input} contains several sheets:");
                print_sheet_list(&sheets, &metadata);
                anyhow::bail!(
                    "choose sheets with --sheets all or --sheets <gid>[,<gid>...]"
                );
            }
        }
    }
    Ok(locations)
}

pub fn print_sheet_list(sheets: &[SheetOption], metadata: &SheetMetadataMap) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Gid", "Sheet", "Module", "Summary"]);
    for sheet in sheets {
        let meta = sheet.metadata(metadata);
        table.add_row(vec![
            Cell::new(&sheet.gid),
            Cell::new(&sheet.label),
            Cell::new(meta.and_then(|m| m.module.as_deref()).unwrap_or("")),
            Cell::new(meta.and_then(|m| m.summary.as_deref()).unwrap_or("")),
        ]);
    }
    println!("{table}");
}
