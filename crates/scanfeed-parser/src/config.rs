//! Parser configuration, read from TOML.
//!
//! ```toml
//! feed_name = "Open-Chargen"
//! schema_file = "/var/lib/scanfeed/schema.json"
//! report_format = "csv"
//! overwrite_feed_name = false
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use scanfeed_model::ReportFormat;

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Parse every report with this feed's mapping instead of detecting it
    /// from the file name.
    pub feed_name: Option<String>,
    /// Schema document to load; the bundled schema is used when unset.
    pub schema_file: Option<PathBuf>,
    /// Format for reports that do not declare one.
    pub report_format: ReportFormat,
    /// Replace a `feed.name` the report already carries.
    pub overwrite_feed_name: bool,
    pub logging: LogSettings,
}

impl ParserConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml { path: None, source })
    }

    #[must_use]
    pub fn with_feed_name(mut self, feed_name: impl Into<String>) -> Self {
        self.feed_name = Some(feed_name.into());
        self
    }

    #[must_use]
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = Some(path.into());
        self
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub timestamps: bool,
    pub target: bool,
    pub ansi: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            timestamps: true,
            target: false,
            ansi: true,
            file: None,
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level = Level::from_str(&self.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))?;
        Ok(LogConfig::default()
            .with_level(level)
            .with_format(self.format)
            .with_timestamps(self.timestamps)
            .with_target(self.target)
            .with_ansi(self.ansi)
            .with_log_file(self.file.clone()))
    }
}
