//! Dashboard configuration: a TOML file plus environment overrides.

use crate::exec::LaunchForm;
use crate::market::Selection;
use crate::poller::MIN_INTERVAL;
use botdash_client::{Interval, Strategy};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "BOTDASH_CONFIG";
pub const API_URL_ENV: &str = "BOTDASH_API_URL";
pub const TIMEOUT_ENV: &str = "BOTDASH_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{key}={value:?} is not valid: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,

    pub bots_poll_secs: u64,
    pub candles_poll_secs: u64,
    pub trades_poll_secs: u64,
    pub balances_poll_secs: u64,
    /// Unset: the health probe runs once at start-up.
    pub status_poll_secs: Option<u64>,

    /// Name shown in "<exchange> Error".
    pub exchange_name: String,

    pub default_symbol: String,
    pub default_interval: Interval,
    pub default_strategy: Strategy,
    pub default_quantity: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001".to_string(),
            request_timeout_secs: 10,
            bots_poll_secs: 5,
            candles_poll_secs: 60,
            trades_poll_secs: 30,
            balances_poll_secs: 30,
            status_poll_secs: None,
            exchange_name: "Binance".to_string(),
            default_symbol: "BTCUSDT".to_string(),
            default_interval: Interval::OneMinute,
            default_strategy: Strategy::MaCrossover,
            default_quantity: "0.001".to_string(),
        }
    }
}

impl Settings {
    /// Reads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::from_path(&config_path())?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// A missing file yields defaults.
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}; using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), SettingsError> {
        if let Some(url) = var(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = var(TIMEOUT_ENV) {
            self.request_timeout_secs = raw.trim().parse().map_err(|e: std::num::ParseIntError| SettingsError::Env {
                key: TIMEOUT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }

    pub fn bots_poll(&self) -> Duration {
        secs(self.bots_poll_secs)
    }

    pub fn candles_poll(&self) -> Duration {
        secs(self.candles_poll_secs)
    }

    pub fn trades_poll(&self) -> Duration {
        secs(self.trades_poll_secs)
    }

    pub fn balances_poll(&self) -> Duration {
        secs(self.balances_poll_secs)
    }

    pub fn status_poll(&self) -> Option<Duration> {
        self.status_poll_secs.map(secs)
    }

    pub fn initial_selection(&self) -> Selection {
        Selection::new(&self.default_symbol, self.default_interval)
    }

    pub fn initial_form(&self) -> LaunchForm {
        LaunchForm {
            symbol: self.default_symbol.trim().to_uppercase(),
            interval: self.default_interval,
            strategy: self.default_strategy.clone(),
            quantity: self.default_quantity.clone(),
        }
    }
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n).max(MIN_INTERVAL)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "botdash")
}

/// `$BOTDASH_CONFIG`, else `settings.toml` in the platform config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    project_dirs()
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("settings.toml"))
}

/// Where the log file goes. Created on demand.
pub fn data_dir() -> io::Result<PathBuf> {
    let dir = project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
