/// Service configuration.
///
/// Loaded from an optional TOML file, then overridden by environment
/// variables (a `.env` file in the working directory is honored). Every key
/// has a default so the service runs with no configuration at all.

use chrono::TimeDelta;
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "idromon.toml";

/// Regional sensor-values API root.
pub const DEFAULT_BASE_URL: &str = "https://allertameteo.regione.emilia-romagna.it/o/api/allerta";

/// Variable code for hydrometric level readings.
pub const DEFAULT_VARIABLE: &str = "254,0,0/1,-,-,-/B13215";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub lookback: LookbackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub variable: String,
    pub timeout_secs: u64,
}

/// Parameters for the "latest populated snapshot" search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LookbackConfig {
    /// Snapshot granularity; the API publishes readings every 15 minutes.
    pub step_minutes: i64,
    /// Minimum stations with a reading for a snapshot to count as populated.
    pub min_readings: usize,
    pub max_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of debug, info, warn, error.
    pub level: String,
    pub file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            lookback: LookbackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            variable: DEFAULT_VARIABLE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self {
            step_minutes: 15,
            min_readings: 10,
            max_steps: 96, // one day of 15-minute snapshots
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LookbackConfig {
    /// Step as a duration; `None` when not positive or out of range.
    pub fn step(&self) -> Option<TimeDelta> {
        TimeDelta::try_minutes(self.step_minutes).filter(|step| *step > TimeDelta::zero())
    }
}

impl Config {
    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads the config file at `path` (or `DEFAULT_CONFIG_PATH`), applies
    /// environment overrides and validates the result.
    ///
    /// An explicitly given path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let explicit = path.is_some();
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents)?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `IDROMON_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("IDROMON_BASE_URL") {
            self.source.base_url = url;
        }
        if let Some(variable) = lookup("IDROMON_VARIABLE") {
            self.source.variable = variable;
        }
        if let Some(level) = lookup("IDROMON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = lookup("IDROMON_LOG_FILE") {
            self.logging.file = Some(file).filter(|f| !f.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("source.base_url cannot be empty".into()));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("source.timeout_secs must be greater than zero".into()));
        }
        if self.lookback.step().is_none() {
            return Err(ConfigError::Invalid(format!(
                "lookback.step_minutes must be a positive duration, got {}",
                self.lookback.step_minutes
            )));
        }
        Ok(())
    }
}
