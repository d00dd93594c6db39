// =============================================================================
// filter.rs — THE FOUR-STAGE TRIP ANNIHILATOR
// =============================================================================
//
// This is the core of the dashboard: four independent predicates (status,
// keyword, distance bucket, time bucket) applied in a fixed order as a
// sequential narrowing of the dataset. A trip must survive all four to stay
// visible. The order never changes the result — the predicates are
// independent and AND-combined — but it IS fixed, and the surviving records
// keep their source order. Stable filter, no re-sort, no cleverness.
//
// Three rules the pipeline lives by:
//
// 1. PURE. Every predicate is `record × criteria → bool`. No side effects,
//    no exceptions, total over every well-formed record. An empty driver
//    name doesn't crash a substring check; it just fails it.
//
// 2. EXPLICIT. Nothing here runs reactively. Criteria can be staged all day
//    long; recomputation happens when — and only when — someone calls `run`.
//    Same criteria, same dataset, same result, every time.
//
// 3. EXACT. The bucket boundaries are asymmetric on purpose: 3 km belongs to
//    "3 to 6", 6 km belongs to "3 to 6" (inclusive upper), and "6 to 15"
//    starts strictly ABOVE 6. Do not "fix" this. The radio buttons upstream
//    were built around these exact boundaries, and a dashboard that
//    disagrees with its own radio buttons is a support ticket.
//
// The keyword scan uses memchr's SIMD-accelerated memmem. Is SIMD substring
// search overkill for four short strings per trip? The answer is yes, and we
// wouldn't have it any other way.
// =============================================================================

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{TripRecord, TripStatus};

/// The status criterion. Defaults to letting everyone through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum StatusFilter {
    /// "All Trips" — the default dashboard tab. No narrowing.
    #[default]
    AllTrips,
    /// Only trips whose status equals this one exactly. Case-sensitive,
    /// because the upstream strings are the source of truth.
    Only(TripStatus),
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::AllTrips => write!(f, "All Trips"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Distance buckets, in kilometers. The wire names (`any`, `under3`, …) are
/// the values the renderer's radio buttons carry, so both directions of the
/// conversion live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DistanceBucket {
    #[default]
    Any,
    /// d < 3
    Under3,
    /// 3 ≤ d ≤ 6 — both ends inclusive
    From3To6,
    /// 6 < d ≤ 15 — note the STRICT lower bound; 6.0 km is a "3 to 6" trip
    From6To15,
    /// d > 15
    More15,
}

impl DistanceBucket {
    /// Does a distance fall in this bucket? Total over all non-negative
    /// reals; `Any` is the identity.
    pub fn contains(self, distance_km: f64) -> bool {
        match self {
            DistanceBucket::Any => true,
            DistanceBucket::Under3 => distance_km < 3.0,
            DistanceBucket::From3To6 => (3.0..=6.0).contains(&distance_km),
            DistanceBucket::From6To15 => distance_km > 6.0 && distance_km <= 15.0,
            DistanceBucket::More15 => distance_km > 15.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceBucket::Any => "any",
            DistanceBucket::Under3 => "under3",
            DistanceBucket::From3To6 => "3to6",
            DistanceBucket::From6To15 => "6to15",
            DistanceBucket::More15 => "more15",
        }
    }
}

impl FromStr for DistanceBucket {
    type Err = UnknownBucket;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "any" => Ok(DistanceBucket::Any),
            "under3" => Ok(DistanceBucket::Under3),
            "3to6" => Ok(DistanceBucket::From3To6),
            "6to15" => Ok(DistanceBucket::From6To15),
            "more15" => Ok(DistanceBucket::More15),
            _ => Err(UnknownBucket(raw.to_string())),
        }
    }
}

impl fmt::Display for DistanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time buckets, in minutes. Same structure as distance, same boundary
/// asymmetry: 5 and 10 are inclusive in "5 to 10", and "10 to 20" starts
/// strictly above 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimeBucket {
    #[default]
    Any,
    /// t < 5
    Under5,
    /// 5 ≤ t ≤ 10
    From5To10,
    /// 10 < t ≤ 20
    From10To20,
    /// t > 20
    More20,
}

impl TimeBucket {
    pub fn contains(self, duration_min: f64) -> bool {
        match self {
            TimeBucket::Any => true,
            TimeBucket::Under5 => duration_min < 5.0,
            TimeBucket::From5To10 => (5.0..=10.0).contains(&duration_min),
            TimeBucket::From10To20 => duration_min > 10.0 && duration_min <= 20.0,
            TimeBucket::More20 => duration_min > 20.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeBucket::Any => "any",
            TimeBucket::Under5 => "under5",
            TimeBucket::From5To10 => "5to10",
            TimeBucket::From10To20 => "10to20",
            TimeBucket::More20 => "more20",
        }
    }
}

impl FromStr for TimeBucket {
    type Err = UnknownBucket;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "any" => Ok(TimeBucket::Any),
            "under5" => Ok(TimeBucket::Under5),
            "5to10" => Ok(TimeBucket::From5To10),
            "10to20" => Ok(TimeBucket::From10To20),
            "more20" => Ok(TimeBucket::More20),
            _ => Err(UnknownBucket(raw.to_string())),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A renderer sent us a bucket value we've never heard of.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter bucket `{0}`")]
pub struct UnknownBucket(pub String);

/// The staged criteria. Mutable, owned by the dashboard, and deliberately
/// inert: changing a field here does NOT recompute anything. No invariant
/// ties the fields together — any combination is legal, including
/// combinations that can never match (status Cancelled + 40 km + 2 min:
/// knock yourself out).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    /// Free-text keyword, stored lower-cased. `set_keyword` lower-cases
    /// at the staging boundary, so by the time a search runs the keyword
    /// is already lowercase and the predicate only normalizes the fields.
    pub keyword: String,
    pub distance: DistanceBucket,
    pub time: TimeBucket,
}

impl FilterCriteria {
    /// True when every criterion is at its default — the identity filter.
    pub fn is_identity(&self) -> bool {
        *self == FilterCriteria::default()
    }
}

// =============================================================================
// The Four Predicates
// =============================================================================
// Each one is a pure function over (record, criterion). They are public
// because they are individually meaningful — and individually testable —
// not just cogs inside `run`.
// =============================================================================

/// Status predicate: `All Trips` passes everything; otherwise exact,
/// case-sensitive equality against the record's status.
pub fn status_matches(record: &TripRecord, filter: &StatusFilter) -> bool {
    match filter {
        StatusFilter::AllTrips => true,
        StatusFilter::Only(wanted) => record.status == *wanted,
    }
}

/// Keyword predicate: an empty keyword passes everything; otherwise the
/// lower-cased keyword must be a substring of ANY of the four text fields
/// (pickup, dropoff, driver, car model), lower-cased. OR across fields,
/// not AND — searching "airport" should find the trip even when the driver
/// is not literally named Airport.
pub fn keyword_matches(record: &TripRecord, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }

    let needle = keyword.as_bytes();
    [
        &record.pickup_location,
        &record.dropoff_location,
        &record.driver_name,
        &record.car_model,
    ]
    .into_iter()
    .any(|field| {
        // Lower-case the haystack, then let memmem's SIMD kernels do the
        // actual scanning. The keyword arrives pre-lowercased (see
        // FilterCriteria::keyword), so one to_lowercase per field is the
        // whole normalization bill.
        let haystack = field.to_lowercase();
        memchr::memmem::find(haystack.as_bytes(), needle).is_some()
    })
}

/// Distance predicate: bucket membership over `distance_km`.
pub fn distance_matches(record: &TripRecord, bucket: DistanceBucket) -> bool {
    bucket.contains(record.distance_km)
}

/// Duration predicate: bucket membership over `duration_min`.
pub fn time_matches(record: &TripRecord, bucket: TimeBucket) -> bool {
    bucket.contains(record.duration_min)
}

// =============================================================================
// The Pipeline
// =============================================================================

/// One explicit pipeline run: apply status → keyword → distance → duration,
/// in that order, as a sequential narrowing of the surviving set.
///
/// Guarantees, in writing:
/// - the result is a subset of `dataset` in `dataset`'s relative order;
/// - identity criteria return the dataset unchanged (well, cloned);
/// - the run is idempotent and side-effect-free — calling it twice with the
///   same inputs produces the same output, no matter what day it is;
/// - an empty result is a perfectly valid result.
///
/// Four passes instead of one fused `filter` closure. For a dashboard-sized
/// dataset the difference is unmeasurable, and the shape makes the fixed
/// order something you can read instead of something you have to infer.
pub fn run(criteria: &FilterCriteria, dataset: &[TripRecord]) -> Vec<TripRecord> {
    let mut surviving: Vec<TripRecord> = dataset
        .iter()
        .filter(|trip| status_matches(trip, &criteria.status))
        .cloned()
        .collect();

    surviving.retain(|trip| keyword_matches(trip, &criteria.keyword));
    surviving.retain(|trip| distance_matches(trip, criteria.distance));
    surviving.retain(|trip| time_matches(trip, criteria.time));

    surviving
}
