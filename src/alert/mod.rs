/// Alerting logic: threshold resolution and status classification.
///
/// Submodules:
/// - `thresholds` — effective thresholds and the severity classifier.

pub mod thresholds;
