/// Regional sensor-values API client
///
/// Retrieves hydrometric station snapshots and per-station time series from
/// the Emilia-Romagna "allerta meteo" open API.
///
/// Snapshot:    {base}/get-sensor-values?variabile={var}&time={epoch_ms}
/// Time series: {base}/get-time-series/?stazione={id}&variabile={var}
///
/// One blocking request per call: no retry and no de-duplication.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{StationSource, parse_stations_response, parse_time_series_response};
use crate::config::SourceConfig;
use crate::logging::{self, DataSource};
use crate::model::{FetchError, RawTimePoint, Station};

// ============================================================================
// URL construction
// ============================================================================

/// Builds the snapshot URL for the instant `at`.
///
/// The variable code contains `,` and `/`, which the API expects unescaped,
/// so the query is assembled by hand rather than with form encoding.
pub fn build_stations_url(base_url: &str, variable: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}/get-sensor-values?variabile={}&time={}",
        base_url.trim_end_matches('/'),
        variable,
        at.timestamp_millis()
    )
}

pub fn build_time_series_url(base_url: &str, variable: &str, station_id: &str) -> String {
    format!(
        "{}/get-time-series/?stazione={}&variabile={}",
        base_url.trim_end_matches('/'),
        station_id,
        variable
    )
}

// ============================================================================
// Client
// ============================================================================

pub struct AllertaClient {
    http: reqwest::blocking::Client,
    base_url: String,
    variable: String,
}

impl AllertaClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| FetchError::Url(format!("{}: {}", config.base_url, e)))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            variable: config.variable.clone(),
        })
    }

    fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        Ok(response.text()?)
    }
}

impl StationSource for AllertaClient {
    fn fetch_stations_at(&self, at: DateTime<Utc>) -> Result<Vec<Station>, FetchError> {
        let url = build_stations_url(&self.base_url, &self.variable, at);
        logging::debug(DataSource::Stations, None, &format!("GET {}", url));

        let stations = parse_stations_response(&self.get_body(&url)?)?;
        let with_readings = stations.iter().filter(|s| s.has_reading()).count();
        logging::log_snapshot_summary(DataSource::Stations, stations.len(), with_readings);
        Ok(stations)
    }

    fn fetch_time_series(&self, station: &Station) -> Result<Vec<RawTimePoint>, FetchError> {
        let url = build_time_series_url(&self.base_url, &self.variable, &station.station_id);
        logging::debug(DataSource::TimeSeries, Some(&station.station_id), &format!("GET {}", url));

        let points = parse_time_series_response(&self.get_body(&url)?)?;
        logging::debug(
            DataSource::TimeSeries,
            Some(&station.station_id),
            &format!("{} points", points.len()),
        );
        Ok(points)
    }
}

// ============================================================================
// Tests
// ============================================================================
