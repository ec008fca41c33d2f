//! Google Sheets link handling.
//!
//! Recognizes published and classic spreadsheet links, builds their CSV
//! export URLs, and reads the published sheet index plus the optional
//! `_config` metadata tab.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use sheetquiz_core::error::LoadError;
use sheetquiz_core::normalizer::parse_csv;

/// Public host for Google Sheets.
pub const GOOGLE_BASE: &str = "https://docs.google.com";

const GOOGLE_HOST: &str = "docs.google.com";
const CONFIG_SHEET_NAME: &str = "_config";

static PUBLISHED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/e/([a-zA-Z0-9_-]+)").unwrap());
static CLASSIC_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap());
static SHEET_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"items\.push\(\{name: "([^"]+)",[^}]*gid: "([^"]+)""#).unwrap()
});

/// Which kind of Google Sheets link was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetVariant {
    /// "Publish to web" link (`/spreadsheets/d/e/<id>`).
    Published,
    /// Regular editor/share link (`/spreadsheets/d/<id>`).
    Classic,
}

/// A parsed question source link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetLink {
    GoogleSheet {
        variant: SheetVariant,
        id: String,
        gid: Option<String>,
    },
    /// Anything else: a direct CSV URL or a local path, used verbatim.
    External { url: String },
}

/// Classify `input`. Never fails; unrecognized input is [`SheetLink::External`].
pub fn parse_sheet_link(input: &str) -> SheetLink {
    let external = || SheetLink::External {
        url: input.to_string(),
    };

    let Ok(url) = Url::parse(input.trim()) else {
        return external();
    };
    if !url.host_str().is_some_and(|h| h.contains(GOOGLE_HOST)) {
        return external();
    }

    let gid = url
        .query_pairs()
        .find(|(k, _)| k == "gid")
        .map(|(_, v)| v.into_owned());

    let (variant, captures) = if let Some(c) = PUBLISHED_PATH.captures(url.path()) {
        (SheetVariant::Published, c)
    } else if let Some(c) = CLASSIC_PATH.captures(url.path()) {
        (SheetVariant::Classic, c)
    } else {
        return external();
    };

    SheetLink::GoogleSheet {
        variant,
        id: captures[1].to_string(),
        gid,
    }
}

impl SheetLink {
    pub fn is_google(&self) -> bool {
        matches!(self, SheetLink::GoogleSheet { .. })
    }

    /// A Google link with no `gid` names a whole workbook, not one tab.
    pub fn needs_sheet_selection(&self) -> bool {
        matches!(self, SheetLink::GoogleSheet { gid: None, .. })
    }

    /// CSV export URL on the public Google host.
    pub fn csv_url(&self, gid_override: Option<&str>) -> String {
        self.csv_url_at(GOOGLE_BASE, gid_override)
    }

    /// CSV export URL against `base`. The gid falls back to the link's own, then `0`.
    pub fn csv_url_at(&self, base: &str, gid_override: Option<&str>) -> String {
        match self {
            SheetLink::External { url } => url.clone(),
            SheetLink::GoogleSheet { variant, id, gid } => {
                let gid = gid_override.or(gid.as_deref()).unwrap_or("0");
                match variant {
                    SheetVariant::Published => {
                        format!("{base}/spreadsheets/d/e/{id}/pub?output=csv&gid={gid}")
                    }
                    SheetVariant::Classic => {
                        format!("{base}/spreadsheets/d/{id}/export?format=csv&gid={gid}")
                    }
                }
            }
        }
    }

    /// The `pubhtml` page listing every published tab. `None` for external links.
    pub fn pubhtml_url_at(&self, base: &str) -> Option<String> {
        match self {
            SheetLink::External { .. } => None,
            SheetLink::GoogleSheet {
                variant: SheetVariant::Published,
                id,
                ..
            } => Some(format!("{base}/spreadsheets/d/e/{id}/pubhtml")),
            SheetLink::GoogleSheet {
                variant: SheetVariant::Classic,
                id,
                ..
            } => Some(format!("{base}/spreadsheets/d/{id}/pubhtml")),
        }
    }
}

/// One published tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetOption {
    pub gid: String,
    pub label: String,
}

impl SheetOption {
    /// Metadata for this tab, matched by lower-cased label.
    pub fn metadata<'a>(&self, map: &'a SheetMetadataMap) -> Option<&'a SheetMetadata> {
        map.get(&normalize_sheet_label(&self.label))
    }
}

/// Extract `{label, gid}` entries from a `pubhtml` page, in page order.
pub fn parse_sheet_index(html: &str) -> Vec<SheetOption> {
    SHEET_ITEM
        .captures_iter(html)
        .map(|c| SheetOption {
            label: c[1].to_string(),
            gid: c[2].to_string(),
        })
        .collect()
}

pub fn normalize_sheet_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Split the `_config` tab (if any) from the question tabs.
pub fn partition_sheet_options(
    options: Vec<SheetOption>,
) -> (Vec<SheetOption>, Option<SheetOption>) {
    let mut config = None;
    let mut questions = Vec::with_capacity(options.len());
    for option in options {
        if normalize_sheet_label(&option.label) == CONFIG_SHEET_NAME {
            config = Some(option);
        } else {
            questions.push(option);
        }
    }
    (questions, config)
}

/// Display decoration for a tab, read from `_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMetadata {
    pub sheet_name: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Metadata keyed by lower-cased sheet name.
pub type SheetMetadataMap = HashMap<String, SheetMetadata>;

/// Parse `_config` CSV (`sheetname, module, summary|setsummary`).
pub fn parse_sheet_metadata(csv_text: &str) -> Result<SheetMetadataMap, LoadError> {
    let mut map = SheetMetadataMap::new();
    for row in parse_csv(csv_text)? {
        let Some(sheet_name) = row.field(&["sheetname"]) else {
            continue;
        };
        map.insert(
            normalize_sheet_label(sheet_name),
            SheetMetadata {
                sheet_name: sheet_name.to_string(),
                module: row.field(&["module"]).map(str::to_string),
                summary: row.field(&["setsummary", "summary"]).map(str::to_string),
            },
        );
    }
    Ok(map)
}

/// Which tabs of a workbook to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    All,
    Gids(Vec<String>),
}

impl FromStr for SheetSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SheetSelection::All);
        }
        let gids: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        if gids.is_empty() {
            return Err("expected `all` or a comma-separated list of gids".to_string());
        }
        Ok(SheetSelection::Gids(gids))
    }
}

impl fmt::Display for SheetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelection::All => write!(f, "all"),
            SheetSelection::Gids(gids) => write!(f, "{}", gids.join(",")),
        }
    }
}

/// Outcome of resolving a source link into loadable CSV URLs.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// CSV URLs to load, in order.
    Ready(Vec<String>),
    /// The link names a workbook; the caller must pick tabs.
    SelectionRequired {
        sheets: Vec<SheetOption>,
        metadata: SheetMetadataMap,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLISHED: &str =
        "https://docs.google.com/spreadsheets/d/e/2PACX-1vabc_DEF-123/pubhtml?gid=77";
    const CLASSIC: &str = "https://docs.google.com/spreadsheets/d/1AbC-xyz_9/edit#gid=0";

    #[test]
    fn published_link_with_gid() {
        let link = parse_sheet_link(PUBLISHED);
        assert_eq!(
            link,
            SheetLink::GoogleSheet {
                variant: SheetVariant::Published,
                id: "2PACX-1vabc_DEF-123".into(),
                gid: Some("77".into()),
            }
        );
        assert!(!link.needs_sheet_selection());
        assert_eq!(
            link.csv_url(None),
            "https://docs.google.com/spreadsheets/d/e/2PACX-1vabc_DEF-123/pub?output=csv&gid=77"
        );
    }

    #[test]
    fn classic_link_gid_in_fragment_is_ignored() {
        let link = parse_sheet_link(CLASSIC);
        assert_eq!(
            link,
            SheetLink::GoogleSheet {
                variant: SheetVariant::Classic,
                id: "1AbC-xyz_9".into(),
                gid: None,
            }
        );
        assert!(link.needs_sheet_selection());
        assert_eq!(
            link.csv_url(None),
            "https://docs.google.com/spreadsheets/d/1AbC-xyz_9/export?format=csv&gid=0"
        );
        assert_eq!(
            link.csv_url(Some("42")),
            "https://docs.google.com/spreadsheets/d/1AbC-xyz_9/export?format=csv&gid=42"
        );
    }

    #[test]
    fn other_inputs_are_external() {
        for input in [
            "https://example.com/bank.csv",
            "questions.csv",
            "not a url at all",
            "https://docs.google.com/document/d/xyz",
        ] {
            let link = parse_sheet_link(input);
            assert_eq!(link, SheetLink::External { url: input.into() });
            assert_eq!(link.csv_url(Some("5")), input);
            assert!(link.pubhtml_url_at(GOOGLE_BASE).is_none());
        }
    }

    #[test]
    fn pubhtml_urls() {
        assert_eq!(
            parse_sheet_link(PUBLISHED).pubhtml_url_at("http://localhost:9"),
            Some("http://localhost:9/spreadsheets/d/e/2PACX-1vabc_DEF-123/pubhtml".into())
        );
        assert_eq!(
            parse_sheet_link(CLASSIC).pubhtml_url_at(GOOGLE_BASE),
            Some("https://docs.google.com/spreadsheets/d/1AbC-xyz_9/pubhtml".into())
        );
    }

    #[test]
    fn sheet_index_in_page_order() {
        let html = r#"<script>
            items.push({name: "Networking", pageUrl: "x", gid: "0",initialSheet: true});
            items.push({name: "_config", pageUrl: "y", gid: "991"});
            items.push({name: "Storage", pageUrl: "z", gid: "123"});
        </script>"#;
        let sheets = parse_sheet_index(html);
        let labels: Vec<&str> = sheets.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Networking", "_config", "Storage"]);
        assert_eq!(sheets[2].gid, "123");

        let (questions, config) = partition_sheet_options(sheets);
        assert_eq!(questions.len(), 2);
        assert_eq!(config.unwrap().gid, "991");
    }

    #[test]
    fn empty_index() {
        assert!(parse_sheet_index("<html>nothing here</html>").is_empty());
    }

    #[test]
    fn config_label_match_is_case_insensitive() {
        let (questions, config) = partition_sheet_options(vec![SheetOption {
            gid: "1".into(),
            label: " _Config ".into(),
        }]);
        assert!(questions.is_empty());
        assert!(config.is_some());
    }

    #[test]
    fn metadata_rows() {
        let csv = "SheetName,Module,SetSummary,Summary\n\
                   Networking,Infra,Routing basics,ignored\n\
                   Storage,,,Disks and volumes\n\
                   ,Orphan,No name,\n";
        let map = parse_sheet_metadata(csv).unwrap();
        assert_eq!(map.len(), 2);

        let net = &map["networking"];
        assert_eq!(net.sheet_name, "Networking");
        assert_eq!(net.module.as_deref(), Some("Infra"));
        assert_eq!(net.summary.as_deref(), Some("Routing basics"));

        let storage = &map["storage"];
        assert_eq!(storage.module, None);
        assert_eq!(storage.summary.as_deref(), Some("Disks and volumes"));

        let option = SheetOption {
            gid: "5".into(),
            label: "STORAGE".into(),
        };
        assert!(option.metadata(&map).is_some());
    }

    #[test]
    fn selection_parsing() {
        assert_eq!("ALL".parse::<SheetSelection>(), Ok(SheetSelection::All));
        assert_eq!(
            "0, 123,".parse::<SheetSelection>(),
            Ok(SheetSelection::Gids(vec!["0".into(), "123".into()]))
        );
        assert!(" , ".parse::<SheetSelection>().is_err());
    }
}
