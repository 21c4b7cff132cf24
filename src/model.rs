/// Core data types for the station monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// station snapshots, raw and enriched time series points, the effective
/// threshold triple and the status tag. Wire names follow the regional
/// sensor-values API (`idstazione`, `soglia1`, ...).

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A monitoring point as returned in a sensor-values snapshot.
///
/// Threshold fields are `None` when the remote record omits them or sends
/// `null`. A configured value of `0.0` is also "not configured"; the
/// distinction is erased by `alert::thresholds::resolve_effective_thresholds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "idstazione")]
    pub station_id: String,
    #[serde(rename = "ordinamento", default)]
    pub sort_order: i64,
    #[serde(rename = "nomestaz", default)]
    pub name: String,
    #[serde(rename = "lon", default)]
    pub longitude: String,
    #[serde(rename = "lat", default)]
    pub latitude: String,
    #[serde(rename = "value", default, deserialize_with = "de_lenient_f64")]
    pub current_value: Option<f64>,
    #[serde(rename = "soglia1", default, deserialize_with = "de_lenient_f64")]
    pub threshold1: Option<f64>,
    #[serde(rename = "soglia2", default, deserialize_with = "de_lenient_f64")]
    pub threshold2: Option<f64>,
    #[serde(rename = "soglia3", default, deserialize_with = "de_lenient_f64")]
    pub threshold3: Option<f64>,
}

impl Station {
    pub fn has_reading(&self) -> bool {
        self.current_value.is_some()
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.station_id == other.station_id && self.sort_order == other.sort_order
    }
}

impl Eq for Station {}

impl PartialOrd for Station {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Station {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.station_id.cmp(&other.station_id))
    }
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// One observation from the time-series endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimePoint {
    /// Epoch milliseconds. The API sends either a number or a numeric string.
    #[serde(rename = "t", deserialize_with = "de_timestamp")]
    pub timestamp: u64,
    #[serde(rename = "v", default, deserialize_with = "de_lenient_f64")]
    pub value: Option<f64>,
}

/// A raw point after carry-forward, annotated with the station's effective
/// thresholds for chart overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTimePoint {
    pub time: u64,
    pub value: f64,
    pub threshold1: f64,
    pub threshold2: f64,
    pub threshold3: f64,
}

// ---------------------------------------------------------------------------
// Threshold and status types
// ---------------------------------------------------------------------------

/// The three thresholds actually used for status and chart overlay, after
/// fallback substitution for unconfigured levels. Computed once per station.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EffectiveThresholds {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
}

/// Severity classification of a station's current reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Watch,
    Elevated,
    Critical,
    Unknown,
}

impl Status {
    /// All variants in display order, most severe first.
    pub const ALL: [Status; 5] = [
        Status::Critical,
        Status::Elevated,
        Status::Watch,
        Status::Normal,
        Status::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Watch => "watch",
            Status::Elevated => "elevated",
            Status::Critical => "critical",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching station snapshots or time series.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx HTTP response from the remote service.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// Connection, TLS or timeout failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(String),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Fixture file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Station not found: {0}")]
    StationNotFound(String),
    /// Lookback step cannot be represented as a duration.
    #[error("Invalid lookback step: {0} minutes")]
    InvalidStep(i64),
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(num) => num
            .as_u64()
            .or_else(|| num.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| de::Error::custom("invalid timestamp")),
        Value::String(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("wrong timestamp type: {}", other))),
    }
}

/// Accepts a number, a numeric string or `null`. Unparseable strings and
/// non-finite values (`"NaN"`, `"inf"`) become `None` rather than failing
/// the whole record.
fn de_lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(num) => num.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Null => None,
        other => return Err(de::Error::custom(format!("expected a number, got {}", other))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_deserializes_wire_names() {
        let json = r#"{
            "idstazione": "-/1207433,4462108/simnbo",
            "ordinamento": 12,
            "nomestaz": "Ponte Calanca",
            "lon": "1207433",
            "lat": "4462108",
            "value": 1.42,
            "soglia1": 2.5,
            "soglia2": 3.2,
            "soglia3": 4.0
        }"#;
        let station: Station = serde_json::from_str(json).expect("valid station json");
        assert_eq!(station.station_id, "-/1207433,4462108/simnbo");
        assert_eq!(station.sort_order, 12);
        assert_eq!(station.name, "Ponte Calanca");
        assert_eq!(station.current_value, Some(1.42));
        assert_eq!(station.threshold3, Some(4.0));
    }

    #[test]
    fn test_station_missing_and_null_fields_are_none() {
        let json = r#"{"idstazione": "X", "ordinamento": 1, "nomestaz": "X", "value": null, "soglia2": 3}"#;
        let station: Station = serde_json::from_str(json).expect("sparse station json");
        assert_eq!(station.current_value, None);
        assert_eq!(station.threshold1, None);
        assert_eq!(station.threshold2, Some(3.0));
        assert!(!station.has_reading());
    }

    #[test]
    fn test_time_point_accepts_string_timestamp() {
        let point: RawTimePoint =
            serde_json::from_str(r#"{"t": "1712345678000", "v": 0.8}"#).expect("string t");
        assert_eq!(point.timestamp, 1_712_345_678_000);
        assert_eq!(point.value, Some(0.8));

        let point: RawTimePoint = serde_json::from_str(r#"{"t": 1712345678000}"#).expect("numeric t");
        assert_eq!(point.value, None);
    }

    #[test]
    fn test_time_point_rejects_non_numeric_timestamp() {
        assert!(serde_json::from_str::<RawTimePoint>(r#"{"t": "soon", "v": 1}"#).is_err());
        assert!(serde_json::from_str::<RawTimePoint>(r#"{"t": true}"#).is_err());
    }

    #[test]
    fn test_station_equality_uses_id_and_order_only() {
        let a: Station = serde_json::from_str(r#"{"idstazione": "A", "ordinamento": 1, "value": 1}"#).unwrap();
        let b: Station = serde_json::from_str(r#"{"idstazione": "A", "ordinamento": 1, "value": 9}"#).unwrap();
        let c: Station = serde_json::from_str(r#"{"idstazione": "A", "ordinamento": 2}"#).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_non_finite_reading_strings_are_absent() {
        for text in ["NaN", "nan", "inf", "-infinity"] {
            let json = format!(
                r#"{{"idstazione": "X", "ordinamento": 1, "value": "{}", "soglia1": 1, "soglia2": 2, "soglia3": 3}}"#,
                text
            );
            let station: Station = serde_json::from_str(&json).expect("station with odd reading");
            assert_eq!(station.current_value, None, "'{}' should not be a reading", text);
        }
    }

    #[test]
    fn test_non_finite_threshold_strings_are_unconfigured() {
        let json = r#"{"idstazione": "X", "ordinamento": 1, "soglia1": "NaN", "soglia2": "inf", "soglia3": 3}"#;
        let station: Station = serde_json::from_str(json).expect("station with odd thresholds");
        assert_eq!(station.threshold1, None);
        assert_eq!(station.threshold2, None);
        assert_eq!(station.threshold3, Some(3.0));
    }

    #[test]
    fn test_non_finite_series_value_is_absent() {
        let point: RawTimePoint = serde_json::from_str(r#"{"t": 1, "v": "nan"}"#).expect("nan point");
        assert_eq!(point.value, None);
    }

    #[test]
    fn test_status_display_is_lowercase() {
        assert_eq!(Status::Critical.to_string(), "critical");
        assert_eq!(serde_json::to_string(&Status::Watch).unwrap(), "\"watch\"");
    }
}
