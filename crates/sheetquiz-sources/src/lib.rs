//! sheetquiz-sources: Where question banks come from.
//!
//! Implements the `CsvSource` trait for HTTP, local files, and an in-memory
//! mock, resolves Google Sheets links into CSV export URLs, and loads the
//! TOML configuration.

pub mod config;
pub mod file;
pub mod http;
pub mod mock;
pub mod router;
pub mod sheets;

pub use config::{load_config_from, save_config_to, SheetquizConfig};
pub use file::FileSource;
pub use http::HttpSource;
pub use router::DefaultSource;
pub use sheets::{parse_sheet_link, Resolution, SheetLink, SheetSelection};
