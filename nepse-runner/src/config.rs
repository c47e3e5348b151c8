//! Refresh configuration, loaded from `nepse.toml`.
//!
//! Every section has defaults, so a missing file or a partial file is fine:
//!
//! ```toml
//! [paths]
//! repo_dir = "."
//!
//! [sources]
//! page_delay_ms = 1500
//!
//! [[sectors]]
//! site_name = "Hydropower"
//! folder = "Hydro_Power"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use nepse_core::data::listing::default_folder_name;
use nepse_core::data::{CalendarStore, HttpSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub remote: RemoteConfig,
    pub sources: SourcesConfig,
    pub holidays: HolidaysConfig,
    pub git: GitConfig,
    pub sectors: Vec<SectorMapping>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            remote: RemoteConfig::default(),
            sources: SourcesConfig::default(),
            holidays: HolidaysConfig::default(),
            git: GitConfig::default(),
            sectors: default_sectors(),
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.max_pages == 0 {
            return Err(ConfigError::Invalid("sources.max_pages must be at least 1".into()));
        }
        if self.sources.timeout_secs == 0 {
            return Err(ConfigError::Invalid("sources.timeout_secs must be at least 1".into()));
        }
        for (name, template) in [
            ("sources.price_url", &self.sources.price_url),
            ("sources.listing_url", &self.sources.listing_url),
            ("sources.holiday_url", &self.sources.holiday_url),
        ] {
            if !template.starts_with("http://") && !template.starts_with("https://") {
                return Err(ConfigError::Invalid(format!("{name} must be an http(s) URL template")));
            }
        }
        Ok(())
    }

    /// Folder name for a site sector name.
    pub fn folder_for(&self, site_name: &str) -> String {
        self.sectors
            .iter()
            .find(|s| s.site_name == site_name)
            .map(|s| s.folder.clone())
            .unwrap_or_else(|| default_folder_name(site_name))
    }

    /// Configured folder names in column order.
    pub fn folder_order(&self) -> Vec<&str> {
        self.sectors.iter().map(|s| s.folder.as_str()).collect()
    }

    pub fn price_dir(&self) -> PathBuf {
        self.paths.repo_dir.join(&self.paths.data_dir)
    }

    pub fn detail_dir(&self) -> PathBuf {
        self.paths.repo_dir.join(&self.paths.detail_dir)
    }

    pub fn listing_path(&self) -> PathBuf {
        self.detail_dir().join(&self.paths.listing_file)
    }

    /// The calendar file and both derived holiday lists.
    pub fn calendar_store(&self) -> CalendarStore {
        let dir = self.detail_dir();
        CalendarStore {
            calendar: dir.join(&self.paths.calendar_file),
            public_holidays: dir.join(&self.paths.public_holidays_file),
            all_holidays: dir.join(&self.paths.all_holidays_file),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.sources.timeout_secs),
            user_agent: self.sources.user_agent.clone(),
            page_delay: Duration::from_millis(self.sources.page_delay_ms),
            max_pages: self.sources.max_pages,
        }
    }
}

/// Where the dataset lives, relative to `repo_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub repo_dir: PathBuf,
    pub data_dir: PathBuf,
    pub detail_dir: PathBuf,
    pub listing_file: String,
    pub calendar_file: String,
    pub public_holidays_file: String,
    pub all_holidays_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            data_dir: PathBuf::from("Nepse_Data"),
            detail_dir: PathBuf::from("other_nepse_detail"),
            listing_file: "listed_company.csv".into(),
            calendar_file: "trading_calendar.csv".into(),
            public_holidays_file: "only_public_holidays.csv".into(),
            all_holidays_file: "public_and_weekly_holidays.csv".into(),
        }
    }
}

/// Raw URLs used to bootstrap missing local files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub listing_url: String,
    pub calendar_url: String,
}

const RAW_BASE: &str = "https://raw.githubusercontent.com/Sudipsudip5250/Nepal_Stock_Data/main/other_nepse_detail";

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            listing_url: format!("{RAW_BASE}/listed_company.csv"),
            calendar_url: format!("{RAW_BASE}/trading_calendar.csv"),
        }
    }
}

/// Page sources: URL templates and fetch pacing.
///
/// Templates use `{symbol}`, `{sector}`, `{year}` and `{page}` placeholders.
/// An anchor is a CSS selector for the table, or for an element holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub price_url: String,
    pub price_anchor: Option<String>,
    pub listing_url: String,
    pub listing_anchor: Option<String>,
    pub holiday_url: String,
    pub holiday_anchor: Option<String>,
    pub timeout_secs: u64,
    pub page_delay_ms: u64,
    pub max_pages: usize,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let http = HttpSettings::default();
        Self {
            price_url: "https://www.sharesansar.com/company/{symbol}?tab=price-history&page={page}".into(),
            price_anchor: Some("#cpricehistory".into()),
            listing_url: "https://www.sharesansar.com/company-list?sector={sector}&page={page}".into(),
            listing_anchor: Some("#myTable".into()),
            holiday_url: "https://nepalstock.com.np/holiday-listing?year={year}&page={page}".into(),
            holiday_anchor: None,
            timeout_secs: http.timeout.as_secs(),
            page_delay_ms: http.page_delay.as_millis() as u64,
            max_pages: http.max_pages,
            user_agent: http.user_agent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HolidaysConfig {
    /// Oldest year the holiday walk may reach.
    pub earliest_year: i32,
}

impl Default for HolidaysConfig {
    fn default() -> Self {
        Self { earliest_year: 2007 }
    }
}

/// Version-control publishing. Credentials come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,
    pub branch: String,
    /// Environment variable holding the push token; push is skipped when unset.
    pub token_env: String,
    pub user_name_env: String,
    pub user_email_env: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".into(),
            branch: "main".into(),
            token_env: "TOKEN_GITHUB".into(),
            user_name_env: "USERNAME_GITHUB".into(),
            user_email_env: "USER_EMAIL_GITHUB".into(),
        }
    }
}

/// A sector as named on the listing site, and its data folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorMapping {
    pub site_name: String,
    pub folder: String,
}

fn default_sectors() -> Vec<SectorMapping> {
    [
        ("Commercial Bank", "Commercial_Banks"),
        ("Corporate Debentures", "Corporate_Debentures"),
        ("Development Bank", "Development_Bank_Limited"),
        ("Finance", "Finance"),
        ("Government Bonds", "Government_Bonds"),
        ("Hotel & Tourism", "Hotels_And_Tourism"),
        ("Hydropower", "Hydro_Power"),
        ("Investment", "Investment"),
        ("Life Insurance", "Life_Insurance"),
        ("Manufacturing and Processing", "Manufacturing_And_Processing"),
        ("Microfinance", "Microfinance"),
        ("Mutual Fund", "Mutual_Fund"),
        ("Non-Life Insurance", "Non-Life_Insurance"),
        ("Others", "Others"),
        ("Preference Share", "Preference_Share"),
        ("Promotor Share", "Promotor_Share"),
        ("Promoter Share", "Promoter_Share"),
        ("Trading", "Tradings"),
    ]
    .into_iter()
    .map(|(site_name, folder)| SectorMapping {
        site_name: site_name.into(),
        folder: folder.into(),
    })
    .collect()
}
