/// Station list helpers for the overview and detail views.
///
/// The overview shows one card per station: the snapshot record plus its
/// effective thresholds and status. The detail view receives only a station
/// id and resolves it against a snapshot with `find_station`, so it always
/// works from the snapshot it was handed rather than a stale copy.

use serde::Serialize;

use crate::alert::thresholds::station_status;
use crate::model::{EffectiveThresholds, FetchError, Station, Status};

// ---------------------------------------------------------------------------
// Card view model
// ---------------------------------------------------------------------------

/// A station with its derived status, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct StationCard {
    pub station: Station,
    pub thresholds: EffectiveThresholds,
    pub status: Status,
}

impl StationCard {
    pub fn new(station: Station) -> Self {
        let (thresholds, status) = station_status(&station);
        Self { station, thresholds, status }
    }
}

/// Builds cards in snapshot order.
pub fn build_cards(stations: &[Station]) -> Vec<StationCard> {
    stations.iter().cloned().map(StationCard::new).collect()
}

/// Number of cards per status, in `Status::ALL` order. Statuses with no
/// cards are included with a count of zero.
pub fn status_counts(cards: &[StationCard]) -> Vec<(Status, usize)> {
    Status::ALL
        .iter()
        .map(|status| (*status, cards.iter().filter(|c| c.status == *status).count()))
        .collect()
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Sorts by display order (`sort_order`, then id).
pub fn sort_stations(stations: &mut [Station]) {
    stations.sort();
}

/// Looks up a station by id. Returns `None` if not found.
pub fn find_station<'a>(stations: &'a [Station], station_id: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.station_id == station_id)
}

/// Like `find_station`, but as a fetch error for callers that go on to
/// request the station's series.
pub fn require_station<'a>(stations: &'a [Station], station_id: &str) -> Result<&'a Station, FetchError> {
    find_station(stations, station_id).ok_or_else(|| FetchError::StationNotFound(station_id.to_string()))
}

pub fn count_with_readings(stations: &[Station]) -> usize {
    stations.iter().filter(|s| s.has_reading()).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
