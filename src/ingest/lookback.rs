//! Latest populated snapshot search.
//!
//! The most recent snapshot is often sparse because stations report with a
//! lag. Starting one step before `now`, aligned to a step boundary, this
//! walks back one step at a time until enough stations carry a reading.
//!
//! # Clock injection
//! `find_latest_populated_at` takes `now` explicitly so tests are
//! deterministic; `find_latest_populated` uses the real clock.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use super::StationSource;
use crate::config::LookbackConfig;
use crate::logging::{self, DataSource};
use crate::model::{FetchError, Station};

/// A snapshot together with the instant it was requested for.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub at: DateTime<Utc>,
    pub stations: Vec<Station>,
    /// `false` when the step limit was hit before `min_readings` was reached.
    pub populated: bool,
}

/// First instant to try: `now - step`, truncated to a step boundary.
pub fn lookback_start(now: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let shifted = now - step;
    shifted.duration_trunc(step).unwrap_or(shifted)
}

/// Returns the most recent snapshot with at least `min_readings` readings.
///
/// Tries at most `max_steps + 1` instants. When none qualifies the last
/// snapshot fetched is returned with `populated == false`. Fetch errors
/// and an unrepresentable step abort the search.
pub fn find_latest_populated_at<S: StationSource + ?Sized>(
    source: &S,
    config: &LookbackConfig,
    now: DateTime<Utc>,
) -> Result<Snapshot, FetchError> {
    let step = config.step().ok_or(FetchError::InvalidStep(config.step_minutes))?;
    let mut at = lookback_start(now, step);
    let mut attempt = 0;

    loop {
        let stations = source.fetch_stations_at(at)?;
        let with_readings = stations.iter().filter(|s| s.has_reading()).count();

        if with_readings >= config.min_readings {
            return Ok(Snapshot { at, stations, populated: true });
        }

        if attempt == config.max_steps {
            logging::warn(
                DataSource::Stations,
                None,
                &format!(
                    "No snapshot with {} readings in {} steps; using {} ({} readings)",
                    config.min_readings,
                    config.max_steps,
                    at.to_rfc3339(),
                    with_readings
                ),
            );
            return Ok(Snapshot { at, stations, populated: false });
        }

        logging::debug(
            DataSource::Stations,
            None,
            &format!("{} has {} readings, stepping back", at.to_rfc3339(), with_readings),
        );
        at -= step;
        attempt += 1;
    }
}

pub fn find_latest_populated<S: StationSource + ?Sized>(
    source: &S,
    config: &LookbackConfig,
) -> Result<Snapshot, FetchError> {
    find_latest_populated_at(source, config, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTimePoint;
    use chrono::TimeZone;
    use std::cell::RefCell;

    /// Returns `readings_by_call[i]` stations with a reading on the i-th call.
    struct ScriptedSource {
        readings_by_call: Vec<usize>,
        requested: RefCell<Vec<DateTime<Utc>>>,
    }

    impl ScriptedSource {
        fn new(readings_by_call: Vec<usize>) -> Self {
            Self { readings_by_call, requested: RefCell::new(Vec::new()) }
        }
    }

    impl StationSource for ScriptedSource {
        fn fetch_stations_at(&self, at: DateTime<Utc>) -> Result<Vec<Station>, FetchError> {
            let call = self.requested.borrow().len();
            self.requested.borrow_mut().push(at);
            let readings = self.readings_by_call.get(call).copied().unwrap_or(0);
            Ok((0..readings)
                .map(|i| Station {
                    station_id: format!("S{}", i),
                    sort_order: i as i64,
                    name: format!("Station {}", i),
                    longitude: String::new(),
                    latitude: String::new(),
                    current_value: Some(1.0),
                    threshold1: None,
                    threshold2: None,
                    threshold3: None,
                })
                .collect())
        }

        fn fetch_time_series(&self, _station: &Station) -> Result<Vec<RawTimePoint>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 7, 42).unwrap()
    }

    fn config(min_readings: usize, max_steps: usize) -> LookbackConfig {
        LookbackConfig { step_minutes: 15, min_readings, max_steps }
    }

    #[test]
    fn test_start_is_one_step_back_on_boundary() {
        let start = lookback_start(fixed_now(), TimeDelta::minutes(15));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 12, 45, 0).unwrap());
    }

    #[test]
    fn test_first_populated_snapshot_is_returned() {
        let source = ScriptedSource::new(vec![12]);
        let snapshot = find_latest_populated_at(&source, &config(10, 4), fixed_now()).unwrap();
        assert!(snapshot.populated);
        assert_eq!(snapshot.stations.len(), 12);
        assert_eq!(source.requested.borrow().len(), 1);
    }

    #[test]
    fn test_sparse_snapshots_step_back() {
        let source = ScriptedSource::new(vec![2, 5, 10]);
        let snapshot = find_latest_populated_at(&source, &config(10, 4), fixed_now()).unwrap();
        assert!(snapshot.populated);
        assert_eq!(snapshot.at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 15, 0).unwrap());

        let requested = source.requested.borrow();
        assert_eq!(requested.len(), 3);
        assert_eq!(requested[0] - requested[1], TimeDelta::minutes(15));
    }

    #[test]
    fn test_step_limit_returns_last_snapshot_unpopulated() {
        let source = ScriptedSource::new(vec![1, 1, 3]);
        let snapshot = find_latest_populated_at(&source, &config(10, 2), fixed_now()).unwrap();
        assert!(!snapshot.populated);
        assert_eq!(snapshot.stations.len(), 3);
        assert_eq!(source.requested.borrow().len(), 3, "max_steps=2 allows three attempts");
    }

    #[test]
    fn test_out_of_range_step_is_an_error() {
        let source = ScriptedSource::new(vec![12]);
        let config = LookbackConfig { step_minutes: i64::MAX, min_readings: 1, max_steps: 1 };
        let err = find_latest_populated_at(&source, &config, fixed_now()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidStep(i64::MAX)));
        assert!(source.requested.borrow().is_empty(), "no fetch with an invalid step");
    }

    #[test]
    fn test_zero_min_readings_accepts_empty_snapshot() {
        let source = ScriptedSource::new(vec![0]);
        let snapshot = find_latest_populated_at(&source, &config(0, 5), fixed_now()).unwrap();
        assert!(snapshot.populated);
        assert!(snapshot.stations.is_empty());
    }
}
