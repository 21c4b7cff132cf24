//! Terminal rendering for station cards and the detail chart.
//!
//! Presentation state (theme, whether to emit ANSI colors) is passed in
//! explicitly through `RenderContext`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use crate::alert::thresholds::classify_status;
use crate::analysis::series::series_peak;
use crate::model::{EffectiveThresholds, EnrichedTimePoint, Station, Status};
use crate::stations::{StationCard, status_counts};

/// Width of the value bar in the series view, in characters.
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Red,
    Orange,
    Yellow,
    Green,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext {
    pub theme: Theme,
    /// Emit ANSI escape sequences.
    pub ansi: bool,
}

pub fn status_color(status: Status) -> StatusColor {
    match status {
        Status::Critical => StatusColor::Red,
        Status::Elevated => StatusColor::Orange,
        Status::Watch => StatusColor::Yellow,
        Status::Normal | Status::Unknown => StatusColor::Green,
    }
}

impl StatusColor {
    /// 256-color palette index. Light backgrounds get darker shades.
    fn ansi_index(self, theme: Theme) -> u8 {
        match (self, theme) {
            (StatusColor::Red, Theme::Dark) => 203,
            (StatusColor::Red, Theme::Light) => 160,
            (StatusColor::Orange, Theme::Dark) => 215,
            (StatusColor::Orange, Theme::Light) => 166,
            (StatusColor::Yellow, Theme::Dark) => 227,
            (StatusColor::Yellow, Theme::Light) => 136,
            (StatusColor::Green, Theme::Dark) => 114,
            (StatusColor::Green, Theme::Light) => 28,
        }
    }
}

fn paint(ctx: &RenderContext, color: StatusColor, text: &str) -> String {
    if ctx.ansi {
        format!("\x1b[38;5;{}m{}\x1b[0m", color.ansi_index(ctx.theme), text)
    } else {
        text.to_string()
    }
}

fn fmt_reading(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Epoch milliseconds as `YYYY-MM-DD HH:MM` UTC, or the raw number if out of range.
pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// One line per card, then a status summary line.
pub fn render_cards(cards: &[StationCard], ctx: &RenderContext) -> String {
    let name_width = cards
        .iter()
        .map(|c| c.station.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(7);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<name_width$}  {:>8}  {:>8}  {:>8}  {:>8}  {}",
        "STATION", "VALUE", "T1", "T2", "T3", "STATUS"
    );

    for card in cards {
        let _ = writeln!(
            out,
            "{} {:<name_width$}  {:>8}  {:>8.2}  {:>8.2}  {:>8.2}  {}",
            paint(ctx, status_color(card.status), "●"),
            card.station.name,
            fmt_reading(card.station.current_value),
            card.thresholds.t1,
            card.thresholds.t2,
            card.thresholds.t3,
            paint(ctx, status_color(card.status), card.status.as_str()),
        );
    }

    let summary: Vec<String> = status_counts(cards)
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(status, n)| format!("{} {}", n, status))
        .collect();
    let _ = writeln!(out, "\n{} stations: {}", cards.len(), summary.join(", "));
    out
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Table of points with a bar scaled to the series peak. Bars reaching a
/// threshold are colored by the severity they cross.
pub fn render_series(station: &Station, points: &[EnrichedTimePoint], ctx: &RenderContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", station.name, station.station_id);

    let Some(first) = points.first() else {
        let _ = writeln!(out, "no readings");
        return out;
    };
    let _ = writeln!(
        out,
        "thresholds: {:.2} / {:.2} / {:.2}\n",
        first.threshold1, first.threshold2, first.threshold3
    );

    let peak = series_peak(points);
    for point in points {
        let filled = if peak > 0.0 {
            ((point.value / peak) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize
        } else {
            0
        };
        let status = point_status(point);
        let _ = writeln!(
            out,
            "{}  {:>8.2}  {}",
            format_timestamp(point.time),
            point.value,
            paint(ctx, status_color(status), &"█".repeat(filled)),
        );
    }
    out
}

/// Severity of a single chart point against the thresholds it carries.
fn point_status(point: &EnrichedTimePoint) -> Status {
    classify_status(
        Some(point.value),
        &EffectiveThresholds {
            t1: point.threshold1,
            t2: point.threshold2,
            t3: point.threshold3,
        },
    )
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SeriesDocument<'a> {
    station: &'a Station,
    points: &'a [EnrichedTimePoint],
}

pub fn cards_json(cards: &[StationCard]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(cards)
}

pub fn series_json(station: &Station, points: &[EnrichedTimePoint]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&SeriesDocument { station, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::build_cards;

    fn station(value: Option<f64>) -> Station {
        Station {
            station_id: "-/1165480,4444760/simnbo".to_string(),
            sort_order: 1,
            name: "Bologna Ponte Lungo".to_string(),
            longitude: "1165480".to_string(),
            latitude: "4444760".to_string(),
            current_value: value,
            threshold1: Some(1.0),
            threshold2: Some(2.0),
            threshold3: Some(3.0),
        }
    }

    fn point(time: u64, value: f64) -> EnrichedTimePoint {
        EnrichedTimePoint { time, value, threshold1: 1.0, threshold2: 2.0, threshold3: 3.0 }
    }

    #[test]
    fn test_status_color_mapping() {
        assert_eq!(status_color(Status::Critical), StatusColor::Red);
        assert_eq!(status_color(Status::Elevated), StatusColor::Orange);
        assert_eq!(status_color(Status::Watch), StatusColor::Yellow);
        assert_eq!(status_color(Status::Normal), StatusColor::Green);
        assert_eq!(status_color(Status::Unknown), StatusColor::Green);
    }

    #[test]
    fn test_theme_changes_palette() {
        assert_ne!(
            StatusColor::Red.ansi_index(Theme::Dark),
            StatusColor::Red.ansi_index(Theme::Light)
        );
    }

    #[test]
    fn test_render_cards_plain_has_no_escapes() {
        let cards = build_cards(&[station(Some(2.5)), station(None)]);
        let text = render_cards(&cards, &RenderContext { theme: Theme::Dark, ansi: false });
        assert!(!text.contains('\x1b'));
        assert!(text.contains("Bologna Ponte Lungo"));
        assert!(text.contains("elevated"));
        assert!(text.contains("2 stations: 1 elevated, 1 unknown"));
    }

    #[test]
    fn test_render_cards_ansi_colors_status() {
        let cards = build_cards(&[station(Some(3.5))]);
        let text = render_cards(&cards, &RenderContext { theme: Theme::Dark, ansi: true });
        assert!(text.contains("\x1b[38;5;203m"), "critical should be painted red");
    }

    #[test]
    fn test_render_series_scales_bars_to_peak() {
        let points = vec![point(0, 1.5), point(900_000, 3.0)];
        let text = render_series(&station(None), &points, &RenderContext::default());
        assert!(text.contains("1970-01-01 00:15"));
        assert!(text.contains(&"█".repeat(BAR_WIDTH)));
        assert!(text.contains(&format!(" {}\n", "█".repeat(BAR_WIDTH / 2))));
    }

    #[test]
    fn test_render_empty_series() {
        let text = render_series(&station(None), &[], &RenderContext::default());
        assert!(text.contains("no readings"));
    }

    #[test]
    fn test_series_json_shape() {
        let json = series_json(&station(Some(1.0)), &[point(1, 1.0)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["station"]["idstazione"], "-/1165480,4444760/simnbo");
        assert_eq!(value["points"][0]["threshold3"], 3.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_714_564_800_000), "2024-05-01 12:00");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }
}
