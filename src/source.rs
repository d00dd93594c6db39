// =============================================================================
// source.rs — THE ONE-SHOT DATA ACQUISITION DEPARTMENT
// =============================================================================
//
// One HTTP GET. One JSON payload. One dataset snapshot for the lifetime of
// the session. That's the entire remote protocol of this engine, and this
// module treats it with the gravity of a deep-space probe downlink anyway.
//
// The pipeline per activation:
// 1. GET the configured endpoint (timeout and User-Agent from Config).
// 2. Reject non-2xx statuses and undecodable bodies as DataSourceError —
//    the caller keeps its (empty) dataset and raises the error flag.
// 3. Decode record by record. Malformed trips are quarantined with their
//    defect and a warn! trail; the rest of the payload sails on.
// 4. Run every identifier through the SnapshotDeduper, because "unique per
//    snapshot" is an invariant, not a suggestion.
//
// What this module deliberately does NOT do: retry, poll, cache, or time
// itself out into a second attempt. A failed fetch leaves the dataset empty
// indefinitely, and the dashboard tells the renderer so.
// =============================================================================

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::dedup::SnapshotDeduper;
use crate::error::{DataSourceError, RecordDefect};
use crate::models::{TripRecord, TripsPayload};

/// One decoded dataset, frozen at fetch time.
#[derive(Debug)]
pub struct DatasetSnapshot {
    /// Every snapshot deserves to feel unique and special.
    pub snapshot_id: Uuid,
    /// When OUR engine pulled the data, not when any trip happened.
    pub fetched_at: DateTime<Utc>,
    /// The survivors, in payload order. The filter pipeline depends on
    /// this order staying untouched.
    pub trips: Vec<TripRecord>,
    /// Why each non-survivor didn't make it. Kept for the stats surface
    /// and for anyone spelunking through logs later.
    pub quarantined: Vec<RecordDefect>,
}

/// The trip record source. Owns the HTTP client; borrows everything else.
pub struct TripSource {
    config: Arc<Config>,
    client: reqwest::Client,
}

impl TripSource {
    /// Build the source and its HTTP client. Client construction can fail
    /// (TLS backends have feelings), and that failure is a DataSourceError
    /// like any other.
    pub fn new(config: Arc<Config>) -> Result<Self, DataSourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.http_user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    /// Perform the one fetch and decode the payload into a snapshot.
    ///
    /// Errors here are fetch-level: transport, status, or a body that isn't
    /// the `{ "trips": [...] }` envelope. Per-record problems never surface
    /// as an Err — they land in `quarantined`.
    pub async fn fetch(&self) -> Result<DatasetSnapshot, DataSourceError> {
        let url = self.config.trips_url.as_str();
        info!(url = url, "Fetching trip dataset — one shot, no retries");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Status(status));
        }

        let body = response.text().await?;
        let payload: TripsPayload = serde_json::from_str(&body)?;

        let deduper = SnapshotDeduper::new(
            self.config.bloom_expected_items,
            self.config.bloom_false_positive_rate,
            self.config.lru_cache_size,
        );
        let (trips, quarantined) = decode_payload(payload, &deduper);
        debug!(dedup = ?deduper.snapshot(), "Snapshot dedup counters");

        let snapshot = DatasetSnapshot {
            snapshot_id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            trips,
            quarantined,
        };

        info!(
            snapshot_id = %snapshot.snapshot_id,
            trips = snapshot.trips.len(),
            quarantined = snapshot.quarantined.len(),
            "Trip dataset decoded"
        );

        Ok(snapshot)
    }
}

/// Decode a payload record by record, quarantining defects.
///
/// Split out from `fetch` so the decode semantics are testable without an
/// HTTP server in the loop. Order in, order out: surviving trips keep their
/// payload positions relative to one another.
pub fn decode_payload(
    payload: TripsPayload,
    deduper: &SnapshotDeduper,
) -> (Vec<TripRecord>, Vec<RecordDefect>) {
    let mut trips = Vec::with_capacity(payload.trips.len());
    let mut quarantined = Vec::new();

    for raw in payload.trips {
        match TripRecord::decode(raw) {
            Ok(record) => {
                if deduper.check_and_insert(&record.id) {
                    debug!(id = record.id.as_str(), "Trip record accepted");
                    trips.push(record);
                } else {
                    warn!(
                        id = record.id.as_str(),
                        "Trip record quarantined — duplicate identifier in this snapshot"
                    );
                    quarantined.push(RecordDefect::DuplicateId(record.id));
                }
            }
            Err(defect) => {
                warn!(defect = %defect, "Trip record quarantined");
                quarantined.push(defect);
            }
        }
    }

    (trips, quarantined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTrip;

    fn raw(id: u64, driver: Option<&str>) -> RawTrip {
        RawTrip {
            id: Some(serde_json::json!(id)),
            pickup_location: Some("CBD".to_string()),
            dropoff_location: Some("Airport".to_string()),
            driver_name: driver.map(str::to_string),
            car_model: Some("Toyota Prius".to_string()),
            status: Some("Completed".to_string()),
            distance: Some(7.0),
            duration: Some(15.0),
            cost: Some(800.0),
            cost_unit: Some("KES".to_string()),
            request_date: Some("2019-06-24 13:46:54".to_string()),
        }
    }

    fn deduper() -> SnapshotDeduper {
        SnapshotDeduper::new(1000, 0.01, 100)
    }

    #[test]
    fn test_decode_payload_keeps_order_and_quarantines_defects() {
        let payload = TripsPayload {
            trips: vec![raw(1, Some("Amina")), raw(2, None), raw(3, Some("Grace"))],
        };
        let (trips, quarantined) = decode_payload(payload, &deduper());
        let ids: Vec<&str> = trips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(quarantined, vec![RecordDefect::MissingField("driver_name")]);
    }

    #[test]
    fn test_decode_payload_quarantines_duplicate_ids() {
        let payload = TripsPayload {
            trips: vec![raw(1, Some("Amina")), raw(1, Some("Grace"))],
        };
        let (trips, quarantined) = decode_payload(payload, &deduper());
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].driver_name, "Amina");
        assert_eq!(quarantined, vec![RecordDefect::DuplicateId("1".to_string())]);
    }

    #[test]
    fn test_empty_payload_decodes_to_empty_snapshot_parts() {
        let payload = TripsPayload { trips: vec![] };
        let (trips, quarantined) = decode_payload(payload, &deduper());
        assert!(trips.is_empty());
        assert!(quarantined.is_empty());
    }

    #[test]
    fn test_envelope_deserializes_without_trips_key() {
        // The endpoint should always send { "trips": [...] }, but "should"
        // is doing a lot of work in that sentence.
        let payload: TripsPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.trips.is_empty());
    }
}
