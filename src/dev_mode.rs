/// Development mode utilities for working with recorded data
///
/// When the live API is unavailable, use this module to replay snapshots
/// and time series saved as JSON files. The directory layout mirrors the
/// API responses:
///
/// ```text
/// <dir>/stations.json         body of a get-sensor-values response
/// <dir>/series/<slug>.json    body of a get-time-series response
/// ```
///
/// `<slug>` is the station id with every non-alphanumeric character
/// replaced by `_`, since ids contain `/` and `,`.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::ingest::{StationSource, parse_stations_response, parse_time_series_response};
use crate::logging::{self, DataSource};
use crate::model::{FetchError, RawTimePoint, Station};

/// Replays recorded API responses from a directory.
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn stations_path(&self) -> PathBuf {
        self.dir.join("stations.json")
    }

    pub fn series_path(&self, station_id: &str) -> PathBuf {
        self.dir.join("series").join(format!("{}.json", station_slug(station_id)))
    }
}

/// File-name-safe form of a station id.
pub fn station_slug(station_id: &str) -> String {
    station_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl StationSource for FixtureSource {
    /// Recordings are a single snapshot, so `at` is ignored.
    fn fetch_stations_at(&self, at: DateTime<Utc>) -> Result<Vec<Station>, FetchError> {
        let path = self.stations_path();
        logging::debug(
            DataSource::Fixtures,
            None,
            &format!("replaying {} for {}", path.display(), at.to_rfc3339()),
        );
        parse_stations_response(&std::fs::read_to_string(path)?)
    }

    /// A station without a recorded series replays as empty.
    fn fetch_time_series(&self, station: &Station) -> Result<Vec<RawTimePoint>, FetchError> {
        let path = self.series_path(&station.station_id);
        match std::fs::read_to_string(&path) {
            Ok(body) => parse_time_series_response(&body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logging::debug(
                    DataSource::Fixtures,
                    Some(&station.station_id),
                    &format!("no recording at {}", path.display()),
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
