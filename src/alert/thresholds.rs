//! Alert threshold resolution and status classification.
//!
//! Stations carry three escalating thresholds, any subset of which may be
//! unconfigured (absent or `0`). Display and comparison use the *effective*
//! thresholds produced here.

use crate::model::{EffectiveThresholds, Station, Status};

/// `None` for absent or zero thresholds.
fn configured(threshold: Option<f64>) -> Option<f64> {
    threshold.filter(|t| *t != 0.0)
}

/// Computes the effective thresholds for a station.
///
/// Each slot has its own fallback chain:
///   t1 -> t2 -> t3 -> 0
///   t2 -> t3 -> t1 -> 0
///   t3 -> t2 -> t1 -> 0
pub fn resolve_effective_thresholds(station: &Station) -> EffectiveThresholds {
    let s1 = configured(station.threshold1);
    let s2 = configured(station.threshold2);
    let s3 = configured(station.threshold3);

    EffectiveThresholds {
        t1: s1.or(s2).or(s3).unwrap_or(0.0),
        t2: s2.or(s3).or(s1).unwrap_or(0.0),
        t3: s3.or(s2).or(s1).unwrap_or(0.0),
    }
}

/// Classifies a reading against effective thresholds.
///
/// Severity 3 is checked first so a value above all thresholds is
/// `Critical`. Thresholds of `0` never match.
pub fn classify_status(current_value: Option<f64>, thresholds: &EffectiveThresholds) -> Status {
    let Some(value) = current_value else {
        return Status::Unknown;
    };

    if thresholds.t3 > 0.0 && value >= thresholds.t3 {
        Status::Critical
    } else if thresholds.t2 > 0.0 && value >= thresholds.t2 {
        Status::Elevated
    } else if thresholds.t1 > 0.0 && value >= thresholds.t1 {
        Status::Watch
    } else {
        Status::Normal
    }
}

/// Resolves thresholds and classifies the station's current reading.
pub fn station_status(station: &Station) -> (EffectiveThresholds, Status) {
    let thresholds = resolve_effective_thresholds(station);
    let status = classify_status(station.current_value, &thresholds);
    (thresholds, status)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
