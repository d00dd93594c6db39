// =============================================================================
// aggregate.rs — THE DESTINATION LEADERBOARD
// =============================================================================
//
// The "home" half of the dashboard: which trips happened most recently, and
// where does everybody keep going? Computed exactly once per dataset load,
// over the FULL unfiltered dataset — the search pipeline has no say here.
//
// Two outputs:
//
// 1. The N most recent trips by request timestamp, newest first. Default
//    five, because the mockup had five list items.
//
// 2. The top M dropoff locations by occurrence count, each annotated with
//    its share of the TOTAL trip count as a percentage rounded to two
//    decimals. Default three, because the pie chart had three colors.
//
// The fine print, all of it load-bearing:
// - ties in destination frequency break by first-encountered order in the
//   counting pass (stable sort over a stable accumulation);
// - a trip with an empty dropoff location is excluded from the frequency
//   count but still inflates the denominator — six airport runs out of ten
//   trips is 60.00% even if two of the ten went nowhere in particular;
// - an empty dataset produces empty lists and exactly zero divisions by zero.
// =============================================================================

use serde::Serialize;

use crate::models::TripRecord;

/// One row of the destination leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationShare {
    pub location: String,
    /// How many trips ended here.
    pub count: u64,
    /// Share of the total trip count, already rounded to two decimals.
    /// Render with `{:.2}` and you get the dashboard's "60.00%".
    pub percentage: f64,
}

/// Everything the home view needs, computed in one pass over the dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DestinationAggregation {
    /// Most recent trips, newest first.
    pub recent_trips: Vec<TripRecord>,
    /// Top dropoff locations, most frequent first.
    pub top_destinations: Vec<DestinationShare>,
}

/// Build the aggregation over the full dataset.
///
/// `recent_count` and `top_count` come from Config; the dashboard passes
/// them through untouched.
pub fn aggregate(
    dataset: &[TripRecord],
    recent_count: usize,
    top_count: usize,
) -> DestinationAggregation {
    if dataset.is_empty() {
        return DestinationAggregation::default();
    }

    // --- Recent trips: clone, sort newest-first, truncate. -------------------
    // Sorting a copy keeps the dataset itself in source order, which the
    // filter pipeline depends on.
    let mut recent_trips: Vec<TripRecord> = dataset.to_vec();
    recent_trips.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    recent_trips.truncate(recent_count);

    // --- Destination counts, first-encounter order preserved. ----------------
    // A Vec of (location, count) plus a position index. HashMap alone would
    // shuffle the tie-break order, and the tie-break order is part of the
    // contract.
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut index_of: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for trip in dataset {
        let destination = trip.dropoff_location.as_str();
        if destination.is_empty() {
            // Counts toward the denominator, never the leaderboard.
            continue;
        }
        match index_of.get(destination) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index_of.insert(destination, counts.len());
                counts.push((destination.to_string(), 1));
            }
        }
    }

    // Stable sort: equal counts keep their first-encounter order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top_count);

    let total_trips = dataset.len() as f64;
    let top_destinations = counts
        .into_iter()
        .map(|(location, count)| DestinationShare {
            location,
            count,
            percentage: round2(count as f64 / total_trips * 100.0),
        })
        .collect();

    DestinationAggregation {
        recent_trips,
        top_destinations,
    }
}

/// Nearest-rounding to two decimals, so "{:.2}" renders the classic
/// dashboard percentages (60.00, 33.33, 66.67).
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripStatus;
    use chrono::{TimeZone, Utc};

    fn trip(id: &str, dropoff: &str, day: u32) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            pickup_location: "CBD".to_string(),
            dropoff_location: dropoff.to_string(),
            driver_name: "Driver".to_string(),
            car_model: "Car".to_string(),
            status: TripStatus::Completed,
            distance_km: 5.0,
            duration_min: 10.0,
            cost: 100.0,
            cost_unit: "KES".to_string(),
            requested_at: Utc.with_ymd_and_hms(2019, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_airport_sixty_downtown_forty() {
        // Ten trips: six to Airport, four to Downtown.
        let mut dataset = Vec::new();
        for i in 0..6 {
            dataset.push(trip(&format!("a{}", i), "Airport", 1 + i as u32));
        }
        for i in 0..4 {
            dataset.push(trip(&format!("d{}", i), "Downtown", 10 + i as u32));
        }

        let agg = aggregate(&dataset, 5, 3);
        assert_eq!(agg.top_destinations.len(), 2);
        assert_eq!(agg.top_destinations[0].location, "Airport");
        assert_eq!(agg.top_destinations[0].count, 6);
        assert_eq!(format!("{:.2}", agg.top_destinations[0].percentage), "60.00");
        assert_eq!(agg.top_destinations[1].location, "Downtown");
        assert_eq!(format!("{:.2}", agg.top_destinations[1].percentage), "40.00");
    }

    #[test]
    fn test_recent_trips_are_newest_first_and_truncated() {
        let dataset = vec![
            trip("1", "Airport", 3),
            trip("2", "Airport", 9),
            trip("3", "Airport", 1),
            trip("4", "Airport", 7),
            trip("5", "Airport", 5),
            trip("6", "Airport", 2),
        ];
        let agg = aggregate(&dataset, 5, 3);
        let ids: Vec<&str> = agg.recent_trips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "5", "1", "6"]);
    }

    #[test]
    fn test_empty_dataset_aggregates_to_nothing() {
        let agg = aggregate(&[], 5, 3);
        assert!(agg.recent_trips.is_empty());
        assert!(agg.top_destinations.is_empty());
    }

    #[test]
    fn test_frequency_ties_break_by_first_encounter() {
        // Two destinations, two trips each. "Westlands" appears first in
        // the dataset, so it wins the tie.
        let dataset = vec![
            trip("1", "Westlands", 1),
            trip("2", "Karen", 2),
            trip("3", "Karen", 3),
            trip("4", "Westlands", 4),
        ];
        let agg = aggregate(&dataset, 5, 3);
        assert_eq!(agg.top_destinations[0].location, "Westlands");
        assert_eq!(agg.top_destinations[1].location, "Karen");
    }

    #[test]
    fn test_empty_dropoff_counts_toward_denominator_only() {
        // Three Airport trips + one destination-less trip. The leaderboard
        // shows Airport alone, but at 75.00%, not 100.00%.
        let dataset = vec![
            trip("1", "Airport", 1),
            trip("2", "Airport", 2),
            trip("3", "Airport", 3),
            trip("4", "", 4),
        ];
        let agg = aggregate(&dataset, 5, 3);
        assert_eq!(agg.top_destinations.len(), 1);
        assert_eq!(agg.top_destinations[0].count, 3);
        assert_eq!(format!("{:.2}", agg.top_destinations[0].percentage), "75.00");
    }

    #[test]
    fn test_leaderboard_is_truncated_to_top_count() {
        let dataset = vec![
            trip("1", "A", 1),
            trip("2", "A", 2),
            trip("3", "B", 3),
            trip("4", "B", 4),
            trip("5", "C", 5),
            trip("6", "D", 6),
        ];
        let agg = aggregate(&dataset, 5, 3);
        assert_eq!(agg.top_destinations.len(), 3);
        let locations: Vec<&str> = agg
            .top_destinations
            .iter()
            .map(|d| d.location.as_str())
            .collect();
        assert_eq!(locations, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_percentage_rounds_to_nearest_two_decimals() {
        // 1 of 3 trips = 33.333…% → 33.33; 2 of 3 = 66.666…% → 66.67.
        let dataset = vec![trip("1", "A", 1), trip("2", "B", 2), trip("3", "B", 3)];
        let agg = aggregate(&dataset, 5, 3);
        assert_eq!(format!("{:.2}", agg.top_destinations[0].percentage), "66.67");
        assert_eq!(format!("{:.2}", agg.top_destinations[1].percentage), "33.33");
    }
}
