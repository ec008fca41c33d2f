//! HTTP question source and Google Sheets resolution.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::instrument;

use sheetquiz_core::error::LoadError;
use sheetquiz_core::traits::CsvSource;

use crate::sheets::{
    parse_sheet_index, parse_sheet_link, parse_sheet_metadata, partition_sheet_options,
    Resolution, SheetLink, SheetMetadataMap, SheetOption, SheetSelection, GOOGLE_BASE,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches CSV over HTTP(S).
///
/// Google Sheets URLs are built against `google_base`, which tests point at
/// a local mock server.
pub struct HttpSource {
    client: reqwest::Client,
    google_base: String,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_google_base(GOOGLE_BASE)
    }

    pub fn with_google_base(base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            google_base: base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, LoadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::unavailable(url, format!("timed out after {DEFAULT_TIMEOUT_SECS}s"))
            } else {
                LoadError::unavailable(url, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::unavailable(url, format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::unavailable(url, format!("failed to read body: {e}")))
    }

    /// CSV URL for one tab of `link`, against this source's Google host.
    pub fn csv_url(&self, link: &SheetLink, gid: Option<&str>) -> String {
        link.csv_url_at(&self.google_base, gid)
    }

    /// List every published tab of a Google workbook.
    #[instrument(skip(self, link))]
    pub async fn fetch_sheet_index(&self, link: &SheetLink) -> Result<Vec<SheetOption>, LoadError> {
        let url = link
            .pubhtml_url_at(&self.google_base)
            .ok_or_else(|| LoadError::unavailable(link.csv_url(None), "not a Google Sheets link"))?;

        let html = self.get_text(&url).await.map_err(|_| {
            LoadError::unavailable(
                &url,
                "unable to load the sheet index; ensure the spreadsheet is published to the web",
            )
        })?;

        let sheets = parse_sheet_index(&html);
        if sheets.is_empty() {
            return Err(LoadError::unavailable(
                &url,
                "no published sheets were found; check the sharing settings",
            ));
        }
        tracing::debug!("found {} published sheets", sheets.len());
        Ok(sheets)
    }

    /// Read the `_config` tab into display metadata.
    #[instrument(skip(self, link, config_sheet), fields(gid = %config_sheet.gid))]
    pub async fn fetch_sheet_metadata(
        &self,
        link: &SheetLink,
        config_sheet: &SheetOption,
    ) -> Result<SheetMetadataMap, LoadError> {
        let text = self.get_text(&self.csv_url(link, Some(&config_sheet.gid))).await?;
        parse_sheet_metadata(&text)
    }

    /// Turn a user-supplied link into CSV URLs.
    ///
    /// A workbook link with no `gid` yields [`Resolution::SelectionRequired`]
    /// unless `selection` names the tabs to use.
    pub async fn resolve(
        &self,
        input: &str,
        selection: Option<&SheetSelection>,
    ) -> Result<Resolution, LoadError> {
        let link = parse_sheet_link(input);
        if !link.needs_sheet_selection() {
            return Ok(Resolution::Ready(vec![self.csv_url(&link, None)]));
        }

        let (sheets, config_sheet) = partition_sheet_options(self.fetch_sheet_index(&link).await?);
        if sheets.is_empty() {
            return Err(LoadError::unavailable(input, "the workbook has no question sheets"));
        }

        let urls = match selection {
            Some(SheetSelection::All) => sheets
                .iter()
                .map(|s| self.csv_url(&link, Some(&s.gid)))
                .collect(),
            Some(SheetSelection::Gids(gids)) => {
                let mut urls = Vec::with_capacity(gids.len());
                for gid in gids {
                    if !sheets.iter().any(|s| &s.gid == gid) {
                        return Err(LoadError::unavailable(
                            input,
                            format!("no published question sheet with gid {gid}"),
                        ));
                    }
                    urls.push(self.csv_url(&link, Some(gid)));
                }
                urls
            }
            None => {
                let metadata = match &config_sheet {
                    Some(config) => self
                        .fetch_sheet_metadata(&link, config)
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!("ignoring _config sheet: {e}");
                            SheetMetadataMap::new()
                        }),
                    None => SheetMetadataMap::new(),
                };
                return Ok(Resolution::SelectionRequired { sheets, metadata });
            }
        };

        Ok(Resolution::Ready(urls))
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CsvSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_csv(&self, location: &str) -> Result<String, LoadError> {
        let start = Instant::now();
        let text = self.get_text(location).await?;
        tracing::debug!(
            bytes = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched CSV"
        );
        Ok(text)
    }
}
