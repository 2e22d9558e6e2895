//! Configuration file management.
//!
//! Settings are resolved once at startup into [`RunSettings`], which is then
//! passed explicitly to the report. Precedence is flag, then environment
//! (handled by clap), then the config file, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use powertracker_core::ConnectOptions;
use powertracker_core::session::DEFAULT_REQUEST_TIMEOUT;
use serde::{Deserialize, Serialize};

use crate::cli::{ConnectionArgs, ReportArgs};
use crate::format::OutputMode;

/// Default number of trailing days.
pub const DEFAULT_DAYS: u32 = 30;

/// Default CSV output path.
pub const DEFAULT_CSV_FILE: &str = "results.csv";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Home Assistant base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Long-lived access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Energy sensor entity ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,

    /// Default number of days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    /// Default output format (text, table, csv)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Default CSV output path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,

    /// Seconds to wait for each statistics response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("powertracker")
            .join("config.toml")
    }

    /// Load config from `path`, or return default if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to `path`, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Copy with the access token hidden, for display.
    pub fn masked(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Everything a report run needs, fully resolved.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub connect: ConnectOptions,
    pub sensor_id: String,
    pub days: u32,
    pub output: OutputMode,
    pub csv_file: PathBuf,
}

/// Whether flags and environment supply every required connection value.
pub fn has_required_args(args: &ConnectionArgs) -> bool {
    args.url.is_some() && args.api_key.is_some() && args.sensor_id.is_some()
}

/// Merge command-line arguments over the config file.
///
/// The URL is passed through untouched: the session rejects a missing one
/// before any network I/O.
pub fn resolve(conn: &ConnectionArgs, report: &ReportArgs, config: &Config) -> Result<RunSettings> {
    let url = conn
        .url
        .clone()
        .or_else(|| config.url.clone())
        .unwrap_or_default();

    let Some(api_key) = non_empty(conn.api_key.as_ref().or(config.api_key.as_ref())) else {
        bail!("api_key is required");
    };
    let Some(sensor_id) = non_empty(conn.sensor_id.as_ref().or(config.sensor_id.as_ref())) else {
        bail!("sensor_id is required");
    };

    let days = report.days.or(config.days).unwrap_or(DEFAULT_DAYS);
    if days == 0 {
        bail!("days must be at least 1");
    }

    let output = report
        .output
        .as_deref()
        .or(config.output.as_deref())
        .map(OutputMode::from_name)
        .unwrap_or_default();

    let csv_file = report
        .csv_file
        .clone()
        .or_else(|| config.csv_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_FILE));

    let request_timeout = conn
        .timeout
        .or(config.request_timeout)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

    let connect = ConnectOptions::new(url, api_key)
        .insecure(conn.insecure || config.insecure)
        .request_timeout(request_timeout);

    Ok(RunSettings {
        connect,
        sensor_id,
        days,
        output,
        csv_file,
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
