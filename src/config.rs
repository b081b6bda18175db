//! Configuration for Vitals View.
//!
//! The file is plain JSON. Values are checked once at startup by
//! [`Config::validate`], which turns them into a [`ValidatedConfig`] the rest
//! of the crate consumes.

use crate::core::window::MAX_LOOKBACK_DAYS;
use crate::error::ConfigError;
use crate::store::DataKind;
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Month abbreviation, day, year, 12-hour time.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%b %d, %Y at %I:%M %p";

/// Number of calendar days in the step summary.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifier of the step-count data kind. Absent in the file means unset.
    #[serde(default)]
    pub step_kind: Option<String>,

    /// Identifier of the heart-rate data kind. Absent in the file means unset.
    #[serde(default)]
    pub heart_rate_kind: Option<String>,

    /// IANA zone used for day buckets and displayed timestamps. Unset means
    /// the host's zone.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Days covered by the step summary
    pub lookback_days: u32,

    /// strftime pattern for the heart-rate timestamp
    pub timestamp_format: String,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step_kind: Some(DataKind::StepCount.identifier().to_string()),
            heart_rate_kind: Some(DataKind::HeartRate.identifier().to_string()),
            timezone: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vitals-view")
            .join("config.json")
    }

    /// Check every value and resolve identifiers.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let step_kind = resolve_kind("step_kind", self.step_kind.as_deref())?;
        if !step_kind.is_cumulative() {
            return Err(ConfigError::UnknownDataKind(
                step_kind.identifier().to_string(),
            ));
        }

        let heart_rate_kind = resolve_kind("heart_rate_kind", self.heart_rate_kind.as_deref())?;
        if heart_rate_kind.is_cumulative() {
            return Err(ConfigError::UnknownDataKind(
                heart_rate_kind.identifier().to_string(),
            ));
        }

        let timezone = match self.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))?,
            _ => host_timezone(),
        };

        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::InvalidLookback(self.lookback_days));
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidTimestampFormat(
                self.timestamp_format.clone(),
            ));
        }

        Ok(ValidatedConfig {
            step_kind,
            heart_rate_kind,
            timezone,
            lookback_days: self.lookback_days,
            timestamp_format: self.timestamp_format.clone(),
        })
    }
}

/// The host's IANA zone, or UTC when it cannot be determined.
pub fn host_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse().unwrap_or_else(|_| {
            warn!(zone = %name, "host timezone not recognised; using UTC");
            Tz::UTC
        }),
        Err(err) => {
            warn!(error = %err, "could not detect host timezone; using UTC");
            Tz::UTC
        }
    }
}

fn resolve_kind(field: &'static str, identifier: Option<&str>) -> Result<DataKind, ConfigError> {
    let identifier = identifier
        .filter(|id| !id.trim().is_empty())
        .ok_or(ConfigError::MissingDataKind(field))?;
    DataKind::from_identifier(identifier)
        .ok_or_else(|| ConfigError::UnknownDataKind(identifier.to_string()))
}

/// Configuration after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub step_kind: DataKind,
    pub heart_rate_kind: DataKind,
    pub timezone: Tz,
    pub lookback_days: u32,
    pub timestamp_format: String,
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self {
            step_kind: DataKind::StepCount,
            heart_rate_kind: DataKind::HeartRate,
            timezone: host_timezone(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}
