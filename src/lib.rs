//! Hydrometric station monitoring.
//!
//! Fetches station snapshots and per-station time series from the regional
//! sensor-values API, derives each station's effective alert thresholds and
//! status, and prepares threshold-annotated series for charting.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod render;
pub mod stations;
