/// Series preparation for the station detail chart.
///
/// Submodules:
/// - `series` — carry-forward normalization and threshold overlay.

pub mod series;
