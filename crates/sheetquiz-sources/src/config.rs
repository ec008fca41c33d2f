//! sheetquiz configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sheetquiz_core::loader::LoadOptions;
use sheetquiz_core::model::{QuestionLayout, QuizMode, SessionConfig, Theme, DEFAULT_TIME_LIMIT_MINUTES};

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sheetquiz.toml";

/// Environment variable that overrides `default_source`.
pub const SOURCE_ENV_VAR: &str = "SHEETQUIZ_SOURCE";

/// Top-level sheetquiz configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetquizConfig {
    /// Sheet link, CSV URL, or path used when `--source` is omitted.
    #[serde(default)]
    pub default_source: Option<String>,
    #[serde(default)]
    pub default_mode: QuizMode,
    /// Countdown length for timed sessions.
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    /// Cap on questions per session. Absent or 0 means no cap.
    #[serde(default)]
    pub question_limit: Option<usize>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub layout: QuestionLayout,
    #[serde(default)]
    pub theme: Theme,
    /// Where session exports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}
fn default_shuffle() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./sheetquiz-results")
}

impl Default for SheetquizConfig {
    fn default() -> Self {
        Self {
            default_source: None,
            default_mode: QuizMode::default(),
            time_limit_minutes: default_time_limit(),
            question_limit: None,
            shuffle: default_shuffle(),
            layout: QuestionLayout::default(),
            theme: Theme::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl SheetquizConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mode: self.default_mode,
            layout: self.layout,
            time_limit_minutes: self.time_limit_minutes,
        }
        .normalized()
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            shuffle: self.shuffle,
            question_limit: self.question_limit,
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(source) = lookup(SOURCE_ENV_VAR).filter(|s| !s.trim().is_empty()) {
            self.default_source = Some(source);
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `sheetquiz.toml` in the current directory
/// 2. `~/.config/sheetquiz/config.toml`
///
/// Environment variable override: `SHEETQUIZ_SOURCE`.
pub fn load_config_from(path: Option<&Path>) -> Result<SheetquizConfig> {
    let mut config = match locate_config(path)? {
        Some(path) => read_config_file(&path)?,
        None => SheetquizConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// The config file that [`load_config_from`] would read, if any.
pub fn locate_config(path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(p) = path {
        if p.exists() {
            return Ok(Some(p.to_path_buf()));
        }
        anyhow::bail!("config file not found: {}", p.display());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }
    Ok(global_config_path().filter(|p| p.exists()))
}

/// `~/.config/sheetquiz/config.toml`, when `HOME` is set.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("sheetquiz")
            .join("config.toml")
    })
}

pub fn read_config_file(path: &Path) -> Result<SheetquizConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<SheetquizConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Write `config` as TOML, creating parent directories.
pub fn save_config_to(config: &SheetquizConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("failed to serialize config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    tracing::debug!("saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SheetquizConfig::default();
        assert_eq!(config.default_mode, QuizMode::Learning);
        assert_eq!(config.time_limit_minutes, 15);
        assert!(config.shuffle);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.default_source, None);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
default_source = "https://docs.google.com/spreadsheets/d/e/abc/pubhtml"
default_mode = "timed"
question_limit = 20
theme = "dark"
"#;
        let config: SheetquizConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_mode, QuizMode::Timed);
        assert_eq!(config.question_limit, Some(20));
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.time_limit_minutes, 15);
        assert!(config.shuffle);
        assert_eq!(config.output_dir, PathBuf::from("./sheetquiz-results"));
    }

    #[test]
    fn session_config_is_normalized() {
        let config = SheetquizConfig {
            default_mode: QuizMode::Timed,
            layout: QuestionLayout::List,
            time_limit_minutes: 0,
            ..SheetquizConfig::default()
        };
        let session = config.session_config();
        assert_eq!(session.layout, QuestionLayout::Single);
        assert_eq!(session.time_limit_minutes, 15);
    }

    #[test]
    fn env_override_replaces_source() {
        let mut config = SheetquizConfig {
            default_source: Some("from-file.csv".into()),
            ..SheetquizConfig::default()
        };
        config.apply_env_overrides(|key| (key == SOURCE_ENV_VAR).then(|| "env.csv".to_string()));
        assert_eq!(config.default_source.as_deref(), Some("env.csv"));

        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.default_source.as_deref(), Some("env.csv"));
    }

    #[test]
    fn save_then_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sheetquiz.toml");
        let config = SheetquizConfig {
            theme: Theme::Dark,
            question_limit: Some(5),
            ..SheetquizConfig::default()
        };

        save_config_to(&config, &path).unwrap();
        let loaded = read_config_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "shuffle = \"maybe\"").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
