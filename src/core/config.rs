use crate::core::align::{Column, SeriesAligner};
use crate::core::cache::DEFAULT_TTL_SECS;
use crate::core::history::HistoryRequest;
use crate::export::RecordLayout;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            }),
        }
    }
}

/// The benchmark and leveraged series to publish.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SeriesConfig {
    pub benchmark: Column,
    pub comparisons: Vec<Column>,
    pub start_date: NaiveDate,
    /// Use split and dividend adjusted closes.
    pub adjusted: bool,
    pub layout: RecordLayout,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        SeriesConfig {
            benchmark: Column::labeled("0050.TW", "price1x"),
            comparisons: vec![
                Column::labeled("00631L.TW", "price2x_631"),
                Column::labeled("00675L.TW", "price2x_675"),
            ],
            // 00631L listing
            start_date: NaiveDate::from_ymd_opt(2014, 10, 1).unwrap_or_default(),
            adjusted: true,
            layout: RecordLayout::Nested,
        }
    }
}

impl SeriesConfig {
    /// Rejects labels that would collide as output keys.
    ///
    /// The benchmark and every comparison need a distinct label, and `date`
    /// is taken by the flat layout.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in std::iter::once(&self.benchmark).chain(&self.comparisons) {
            let label = column.label();
            if label == "date" {
                bail!("Series label \"date\" is reserved (symbol {})", column.symbol);
            }
            if !seen.insert(label) {
                bail!("Duplicate series label \"{label}\" (symbol {})", column.symbol);
            }
        }
        Ok(())
    }

    pub fn history_request(&self) -> HistoryRequest {
        HistoryRequest {
            aligner: SeriesAligner::new(self.benchmark.clone(), self.comparisons.clone()),
            start: self.start_date,
            adjusted: self.adjusted,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cache_ttl_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cache_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl ServerConfig {
    /// Port to listen on; a `PORT` value from the environment wins.
    pub fn resolve_port(&self, env_port: Option<&str>) -> Result<u16> {
        match env_port.map(str::trim).filter(|p| !p.is_empty()) {
            Some(port) => port
                .parse()
                .with_context(|| format!("Invalid PORT value: {port}")),
            None => Ok(self.port),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_path: "frontend/public/data.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub start_date: NaiveDate,
    pub default_suffix: String,
    pub known_suffixes: Vec<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            default_suffix: ".TW".to_string(),
            known_suffixes: vec![".TW".to_string(), ".TWO".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub series: SeriesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl AppConfig {
    /// Loads `path` when given, else the default config file when it exists,
    /// else built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        let default_path = Self::default_config_path()?;
        if default_path.exists() {
            Self::load_from_path(&default_path)
        } else {
            debug!(
                "No config at {}, using built-in defaults",
                default_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "etfseries", "etfseries")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .series
            .validate()
            .with_context(|| format!("Invalid series in config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or(DEFAULT_YAHOO_BASE_URL, |p| &p.base_url)
    }
}
