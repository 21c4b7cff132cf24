/// Data retrieval for station snapshots and time series.
///
/// Submodules:
/// - `allerta`  — HTTP client for the regional sensor-values API.
/// - `lookback` — walks back through snapshots to find a populated one.
///
/// `StationSource` is the seam between retrieval and everything else: the
/// CLI, the lookback search and the integration tests only see the trait,
/// so the HTTP client and the fixture replay source are interchangeable.

pub mod allerta;
pub mod lookback;

use chrono::{DateTime, Utc};

use crate::model::{FetchError, RawTimePoint, Station};

pub trait StationSource {
    /// Current snapshot, sorted by `sort_order`.
    fn fetch_stations_now(&self) -> Result<Vec<Station>, FetchError> {
        self.fetch_stations_at(Utc::now())
    }

    /// Snapshot as of `at`, sorted by `sort_order`.
    fn fetch_stations_at(&self, at: DateTime<Utc>) -> Result<Vec<Station>, FetchError>;

    /// Raw time series for a station, in the order the source returns it.
    fn fetch_time_series(&self, station: &Station) -> Result<Vec<RawTimePoint>, FetchError>;
}

/// Decodes a snapshot body into stations sorted by `sort_order`.
///
/// Array entries that are not station records (the API prepends a
/// `{"time": ...}` header object) are skipped. A station-shaped entry that
/// fails to decode is an error.
pub fn parse_stations_response(body: &str) -> Result<Vec<Station>, FetchError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(body)?;

    let mut stations = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.get("idstazione").is_none() {
            continue;
        }
        stations.push(serde_json::from_value::<Station>(entry)?);
    }
    crate::stations::sort_stations(&mut stations);
    Ok(stations)
}

/// Decodes a time-series body. Order is preserved.
pub fn parse_time_series_response(body: &str) -> Result<Vec<RawTimePoint>, FetchError> {
    Ok(serde_json::from_str(body)?)
}
