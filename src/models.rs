// =============================================================================
// models.rs — THE SACRED DATA STRUCTURES OF RIDE-HAILING
// =============================================================================
//
// These structs represent the fundamental building blocks of our trip
// dashboard. The wire shapes trust NOTHING — every field on a RawTrip is an
// Option, because the remote endpoint is a static JSON file maintained by
// someone else, and "someone else's JSON" is a threat model.
//
// The decoded TripRecord, by contrast, is the real deal: every field present,
// every number non-negative, every timestamp an actual DateTime<Utc>. A
// RawTrip becomes a TripRecord by surviving `decode`, or it becomes a
// quarantine log entry. There is no third option.
//
// Is a full decode-and-quarantine layer overkill for a fifty-trip JSON file?
// Yes. Do we care? Absolutely not.
// =============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RecordDefect;

/// The lifecycle state of a trip as the upstream reports it.
///
/// `Completed` and `Cancelled` are the two statuses the dashboard filters on
/// by name. Anything else the endpoint invents ("Waiting", "Driver fled the
/// scene", …) lands in `Other` with its exact text preserved, because the
/// status predicate compares case-sensitively and we are not in the business
/// of editorializing upstream data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TripStatus {
    /// The trip happened. Money changed hands. Everyone survived.
    Completed,
    /// The trip did not happen. Someone pressed the sad button.
    Cancelled,
    /// A status we don't have a name for. We keep the upstream text verbatim.
    Other(String),
}

impl From<String> for TripStatus {
    fn from(raw: String) -> Self {
        // Exact, case-sensitive mapping. "completed" is NOT "Completed";
        // the filter predicate downstream is equally unforgiving.
        match raw.as_str() {
            "Completed" => TripStatus::Completed,
            "Cancelled" => TripStatus::Cancelled,
            _ => TripStatus::Other(raw),
        }
    }
}

impl From<TripStatus> for String {
    fn from(status: TripStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripStatus::Completed => write!(f, "Completed"),
            TripStatus::Cancelled => write!(f, "Cancelled"),
            TripStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// The wire envelope: `{ "trips": [...] }`. That's it. That's the API.
/// No pagination, no cursors, no auth. A simpler time.
#[derive(Debug, Clone, Deserialize)]
pub struct TripsPayload {
    #[serde(default)]
    pub trips: Vec<RawTrip>,
}

/// One trip as it arrives off the wire, before we've verified anything.
/// Think of this as the "ugly duckling" stage of our data pipeline.
///
/// Every field is optional because the endpoint enforces no schema, and a
/// consumer that trusts it verbatim works right up until the day a record
/// arrives without a `driver_name` and a substring check explodes mid-render.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrip {
    /// Upstream identifier. Arrives as a number in practice, but we accept
    /// any JSON scalar and stringify it, because the identifier is opaque.
    pub id: Option<serde_json::Value>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub driver_name: Option<String>,
    pub car_model: Option<String>,
    pub status: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub cost: Option<f64>,
    pub cost_unit: Option<String>,
    pub request_date: Option<String>,
}

/// A fully decoded, fully trusted trip record. Immutable by convention:
/// nothing in the engine mutates one after decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    /// Opaque identifier, unique within a dataset snapshot.
    /// The snapshot deduper enforces the "unique" part.
    pub id: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub driver_name: String,
    pub car_model: String,
    pub status: TripStatus,
    /// Distance in kilometers. Non-negative, we checked.
    pub distance_km: f64,
    /// Duration in minutes. Also non-negative. Also checked.
    pub duration_min: f64,
    pub cost: f64,
    pub cost_unit: String,
    /// When the rider requested the trip. Drives the recent-trips ordering.
    pub requested_at: DateTime<Utc>,
}

impl TripRecord {
    /// Decode a RawTrip into a TripRecord, or report exactly which defect
    /// disqualified it. Field order below mirrors the struct, so a missing
    /// field error always names the first absent field.
    ///
    /// Note what is NOT a defect: empty strings. An empty pickup location is
    /// a valid (if useless) value — it simply never matches a keyword and
    /// never counts as a destination.
    pub fn decode(raw: RawTrip) -> Result<TripRecord, RecordDefect> {
        let id = decode_identifier(raw.id.as_ref())?;
        let pickup_location = raw
            .pickup_location
            .ok_or(RecordDefect::MissingField("pickup_location"))?;
        let dropoff_location = raw
            .dropoff_location
            .ok_or(RecordDefect::MissingField("dropoff_location"))?;
        let driver_name = raw
            .driver_name
            .ok_or(RecordDefect::MissingField("driver_name"))?;
        let car_model = raw.car_model.ok_or(RecordDefect::MissingField("car_model"))?;
        let status = TripStatus::from(raw.status.ok_or(RecordDefect::MissingField("status"))?);
        let distance_km =
            non_negative("distance", raw.distance.ok_or(RecordDefect::MissingField("distance"))?)?;
        let duration_min =
            non_negative("duration", raw.duration.ok_or(RecordDefect::MissingField("duration"))?)?;
        let cost = non_negative("cost", raw.cost.ok_or(RecordDefect::MissingField("cost"))?)?;
        let cost_unit = raw.cost_unit.ok_or(RecordDefect::MissingField("cost_unit"))?;
        let request_date = raw
            .request_date
            .ok_or(RecordDefect::MissingField("request_date"))?;
        let requested_at = parse_request_date(&request_date)?;

        Ok(TripRecord {
            id,
            pickup_location,
            dropoff_location,
            driver_name,
            car_model,
            status,
            distance_km,
            duration_min,
            cost,
            cost_unit,
            requested_at,
        })
    }
}

impl fmt::Display for TripRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} — {} → {} ({} {}, {:.1} km, {:.0} min, {})",
            self.id,
            self.driver_name,
            self.pickup_location,
            self.dropoff_location,
            self.cost,
            self.cost_unit,
            self.distance_km,
            self.duration_min,
            self.status,
        )
    }
}

/// The identifier is opaque, so a number and a string are equally welcome.
/// Anything else (an object? an array? the endpoint has never done this,
/// but we've read enough JSON to stay paranoid) counts as missing.
fn decode_identifier(value: Option<&serde_json::Value>) -> Result<String, RecordDefect> {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(RecordDefect::MissingField("id")),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, RecordDefect> {
    // NaN fails the comparison and lands in the error arm, which is exactly
    // where a NaN distance belongs.
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(RecordDefect::NegativeValue {
            field,
            value: value.to_string(),
        })
    }
}

/// Parse a request date in any format the endpoint has been observed to use.
/// We accept three formats and report everything else, rather than shoveling
/// the string into a do-what-I-mean date parser that reports nothing.
fn parse_request_date(raw: &str) -> Result<DateTime<Utc>, RecordDefect> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        // No zone on the wire means we assume UTC and move on with our lives.
        return Ok(naive.and_utc());
    }
    Err(RecordDefect::BadTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw_trip() -> RawTrip {
        RawTrip {
            id: Some(serde_json::json!(7)),
            pickup_location: Some("Kileleshwa".to_string()),
            dropoff_location: Some("Airport".to_string()),
            driver_name: Some("Grace Campbell".to_string()),
            car_model: Some("Toyota Prius".to_string()),
            status: Some("Completed".to_string()),
            distance: Some(12.4),
            duration: Some(23.0),
            cost: Some(1450.0),
            cost_unit: Some("KES".to_string()),
            request_date: Some("2019-06-24 13:46:54".to_string()),
        }
    }

    #[test]
    fn test_decode_happy_path() {
        let record = TripRecord::decode(raw_trip()).unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.status, TripStatus::Completed);
        assert_eq!(record.distance_km, 12.4);
        assert_eq!(
            record.requested_at,
            Utc.with_ymd_and_hms(2019, 6, 24, 13, 46, 54).unwrap()
        );
    }

    #[test]
    fn test_decode_missing_field_is_a_defect() {
        let mut raw = raw_trip();
        raw.driver_name = None;
        assert_eq!(
            TripRecord::decode(raw),
            Err(RecordDefect::MissingField("driver_name"))
        );
    }

    #[test]
    fn test_decode_negative_distance_is_a_defect() {
        let mut raw = raw_trip();
        raw.distance = Some(-4.2);
        assert!(matches!(
            TripRecord::decode(raw),
            Err(RecordDefect::NegativeValue { field: "distance", .. })
        ));
    }

    #[test]
    fn test_decode_garbage_timestamp_is_a_defect() {
        let mut raw = raw_trip();
        raw.request_date = Some("last tuesday-ish".to_string());
        assert!(matches!(
            TripRecord::decode(raw),
            Err(RecordDefect::BadTimestamp(_))
        ));
    }

    #[test]
    fn test_decode_accepts_rfc3339_and_offset_formats() {
        let mut raw = raw_trip();
        raw.request_date = Some("2019-06-24T13:46:54+03:00".to_string());
        assert!(TripRecord::decode(raw).is_ok());

        let mut raw = raw_trip();
        raw.request_date = Some("2019-06-24 13:46:54 +0300".to_string());
        assert!(TripRecord::decode(raw).is_ok());
    }

    #[test]
    fn test_empty_strings_are_valid_values() {
        let mut raw = raw_trip();
        raw.dropoff_location = Some(String::new());
        let record = TripRecord::decode(raw).unwrap();
        assert_eq!(record.dropoff_location, "");
    }

    #[test]
    fn test_status_mapping_is_case_sensitive() {
        assert_eq!(TripStatus::from("Completed".to_string()), TripStatus::Completed);
        assert_eq!(
            TripStatus::from("completed".to_string()),
            TripStatus::Other("completed".to_string())
        );
        assert_eq!(TripStatus::from("Waiting".to_string()).to_string(), "Waiting");
    }

    #[test]
    fn test_string_identifier_is_accepted() {
        let mut raw = raw_trip();
        raw.id = Some(serde_json::json!("trip-42"));
        assert_eq!(TripRecord::decode(raw).unwrap().id, "trip-42");
    }
}
