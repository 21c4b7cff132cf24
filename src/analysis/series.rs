//! Time series normalization for chart overlay.

use crate::model::{EffectiveThresholds, EnrichedTimePoint, RawTimePoint};

/// Builds the chart series for a station.
///
/// Points are emitted in input order, one per input point. A point with no
/// reading takes the last known value, which starts at `0`. A reading of
/// exactly `0` is treated as missing as well. Every emitted point carries the
/// same effective thresholds.
pub fn normalize_series(
    raw_points: &[RawTimePoint],
    thresholds: &EffectiveThresholds,
) -> Vec<EnrichedTimePoint> {
    let mut last_known = 0.0;

    raw_points
        .iter()
        .map(|point| {
            let value = point.value.filter(|v| *v != 0.0).unwrap_or(last_known);
            last_known = value;
            EnrichedTimePoint {
                time: point.timestamp,
                value,
                threshold1: thresholds.t1,
                threshold2: thresholds.t2,
                threshold3: thresholds.t3,
            }
        })
        .collect()
}

/// Largest value across the series and its thresholds, used to scale bars.
/// Returns `0.0` for an empty series.
pub fn series_peak(points: &[EnrichedTimePoint]) -> f64 {
    points
        .iter()
        .flat_map(|p| [p.value, p.threshold1, p.threshold2, p.threshold3])
        .fold(0.0, f64::max)
}
