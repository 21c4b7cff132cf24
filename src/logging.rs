/// Structured logging for the station monitoring service
///
/// Provides context-rich logging tagged with the data source and, where
/// relevant, the station identifier. Events go through `tracing`; the
/// subscriber writes to stderr or appends to a log file.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::model::FetchError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a configured level name. Unrecognized names fall back to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Stations,
    TimeSeries,
    Fixtures,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Stations => write!(f, "STATIONS"),
            DataSource::TimeSeries => write!(f, "SERIES"),
            DataSource::Fixtures => write!(f, "FIXTURES"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the station simply has no data published
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Initialization
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `min_level` when set. With a `log_file`
/// the output is appended there without ANSI colors; otherwise it goes to
/// stderr so stdout stays clean for command output.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A second init (e.g. from tests) is not an error worth surfacing.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(source: DataSource, station_id: Option<&str>, message: &str) {
    tracing::info!(source = %source, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(source: DataSource, station_id: Option<&str>, message: &str) {
    tracing::warn!(source = %source, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(source: DataSource, station_id: Option<&str>, message: &str) {
    tracing::error!(source = %source, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(source: DataSource, station_id: Option<&str>, message: &str) {
    tracing::debug!(source = %source, station = station_id.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a fetch failure by its kind.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // Stations come and go between snapshots
        FetchError::StationNotFound(_) => FailureType::Expected,
        FetchError::Http(_)
        | FetchError::Transport(_)
        | FetchError::Decode(_)
        | FetchError::Url(_)
        | FetchError::InvalidStep(_) => FailureType::Unexpected,
        FetchError::Io(_) => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a fetch failure with automatic classification
pub fn log_fetch_failure(
    source: DataSource,
    station_id: Option<&str>,
    operation: &str,
    err: &FetchError,
) -> FailureType {
    let failure_type = classify_fetch_failure(err);

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, station_id, &message),
        FailureType::Unexpected => error(source, station_id, &message),
        FailureType::Unknown => warn(source, station_id, &message),
    }
    failure_type
}

/// Log a summary of a snapshot: how many stations reported a reading
pub fn log_snapshot_summary(source: DataSource, total: usize, with_readings: usize) {
    let message = format!("Snapshot: {}/{} stations reporting", with_readings, total);

    if total == 0 || with_readings == 0 {
        warn(source, None, &message);
    } else {
        info(source, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_name("warning"), LogLevel::Warning);
        assert_eq!(LogLevel::from_name(" error "), LogLevel::Error);
        assert_eq!(LogLevel::from_name("verbose"), LogLevel::Info);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_fetch_failure(&FetchError::Http(503)), FailureType::Unexpected);

        let missing = FetchError::StationNotFound("-/1,2/simnbo".to_string());
        assert_eq!(classify_fetch_failure(&missing), FailureType::Expected);

        let io = FetchError::Io(std::io::Error::other("disk"));
        assert_eq!(classify_fetch_failure(&io), FailureType::Unknown);

        assert_eq!(classify_fetch_failure(&FetchError::InvalidStep(0)), FailureType::Unexpected);
    }

    #[test]
    fn test_failure_classification_does_not_depend_on_message_text() {
        // A decode error whose text mentions a missing station is still a parse failure.
        let decode = serde_json::from_str::<u8>("\"Station not found\"").unwrap_err();
        assert_eq!(classify_fetch_failure(&FetchError::Decode(decode)), FailureType::Unexpected);

        let io = FetchError::Io(std::io::Error::other("HTTP error: 500"));
        assert_eq!(classify_fetch_failure(&io), FailureType::Unknown);
    }

    #[test]
    fn test_log_fetch_failure_returns_classification() {
        let err = FetchError::Http(500);
        let kind = log_fetch_failure(DataSource::Stations, None, "fetch_stations_now", &err);
        assert_eq!(kind, FailureType::Unexpected);
    }
}
