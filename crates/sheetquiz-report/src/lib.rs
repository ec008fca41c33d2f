//! sheetquiz-report: Self-contained HTML session reports.

pub mod html;
