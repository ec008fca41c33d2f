//! The `sheetquiz validate` command.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use sheetquiz_core::loader::QuestionBankLoader;
use sheetquiz_sources::{DefaultSource, SheetSelection};

use crate::commands::resolve_locations;

pub async fn execute(source: Vec<String>, sheets: Option<SheetSelection>) -> Result<()> {
    let default_source = Arc::new(DefaultSource::default());
    let locations = resolve_locations(default_source.http(), &source, sheets.as_ref()).await?;

    let loader = QuestionBankLoader::new(default_source);
    let inspections = loader.inspect(&locations).await?;

    let mut empty = 0;
    for inspection in &inspections {
        println!(
            "{}: {} rows, {} questions, {} dropped",
            inspection.location,
            inspection.rows,
            inspection.questions.len(),
            inspection.dropped
        );
        if inspection.questions.is_empty() {
            println!("  WARNING: no usable questions");
            empty += 1;
            continue;
        }

        let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for q in &inspection.questions {
            *counts
                .entry((q.module.as_str(), q.submodule.as_str()))
                .or_default() += 1;
        }

        let mut table = Table::new();
        table.set_header(vec!["Module", "Submodule", "Questions"]);
        for ((module, submodule), count) in counts {
            table.add_row(vec![Cell::new(module), Cell::new(submodule), Cell::new(count)]);
        }
        println!("{table}");
    }

    anyhow::ensure!(
        empty == 0,
        "{empty} source(s) contain no usable questions"
    );
    println!("All question banks valid.");
    Ok(())
}
