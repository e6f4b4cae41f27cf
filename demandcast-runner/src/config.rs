//! Pipeline configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! horizon_days = 14
//! measure = "revenue"
//! backend = "holt"
//! interval_width = 0.9
//!
//! [holt]
//! alpha = 0.6
//! beta = 0.2
//!
//! [alerts]
//! threshold = 250.0
//! field = "upper_bound"
//!
//! [trend]
//! window_days = 30
//!
//! [export]
//! csv_filename = "forecast_result.csv"
//! ```

use std::num::NonZeroU32;
use std::path::Path;

use demandcast_core::export::DEFAULT_CSV_FILENAME;
use demandcast_core::forecast::BACKEND_NAMES;
use demandcast_core::{BackendSettings, ForecastField, Measure};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_HORIZON_DAYS: NonZeroU32 = match NonZeroU32::new(7) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub horizon_days: NonZeroU32,
    pub measure: Measure,
    pub backend: String,
    pub interval_width: f64,
    pub holt: HoltConfig,
    pub alerts: AlertConfig,
    pub trend: TrendConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoltConfig {
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// No alerts are evaluated when unset.
    pub threshold: Option<f64>,
    pub field: ForecastField,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Trailing window for the recent-sales view; `None` shows all dates.
    pub window_days: Option<NonZeroU32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub csv_filename: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            measure: Measure::UnitsSold,
            backend: "linear".to_string(),
            interval_width: 0.8,
            holt: HoltConfig::default(),
            alerts: AlertConfig::default(),
            trend: TrendConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for HoltConfig {
    fn default() -> Self {
        let settings = BackendSettings::default();
        Self {
            alpha: settings.holt_alpha,
            beta: settings.holt_beta,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_days: Some(DEFAULT_HORIZON_DAYS),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_filename: DEFAULT_CSV_FILENAME.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check value ranges. Unknown backend names are left to the
    /// forecast call, which reports them as unavailable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        for (name, value) in [("holt.alpha", self.holt.alpha), ("holt.beta", self.holt.beta)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if let Some(t) = self.alerts.threshold {
            if !t.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "alerts.threshold must be finite, got {t}"
                )));
            }
        }
        if self.backend.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "backend must be one of: {}",
                BACKEND_NAMES.join(", ")
            )));
        }
        if self.export.csv_filename.trim().is_empty() {
            return Err(ConfigError::Invalid("export.csv_filename is empty".into()));
        }
        Ok(())
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            interval_width: self.interval_width,
            holt_alpha: self.holt.alpha,
            holt_beta: self.holt.beta,
        }
    }
}
