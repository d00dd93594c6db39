// =============================================================================
// dashboard.rs — THE SINGLE-OWNER STATE CITADEL
// =============================================================================
//
// Everything the renderer is allowed to know, owned by one struct, mutated
// by plain method calls on one thread. No reactive framework, no hidden
// recomputation, no observers observing observers. The renderer calls a
// setter, nothing happens. The renderer calls `run_search`, exactly one
// thing happens. Radical, we know.
//
// The state it guards:
// - the full dataset (installed once by `activate`, empty forever if the
//   fetch fails);
// - the staged FilterCriteria;
// - the filtered result — an Option, because "never searched" and
//   "searched, found nothing" are different facts and the UI renders them
//   differently ("press SEARCH" vs "No trips found.");
// - the selection — at most one trip, a value copy of whatever was clicked.
//   NOT validated against the filtered set, and NOT cleared when a later
//   search excludes it. That staleness is a documented gap the renderer
//   owns; `DashboardView::selection_in_filtered` exists so it can tell.
// - the destination aggregation, computed once per dataset install;
// - the load error, if the one fetch went sideways.
// =============================================================================

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregate::{self, DestinationAggregation};
use crate::config::Config;
use crate::error::{DataSourceError, RecordDefect};
use crate::filter::{self, DistanceBucket, FilterCriteria, StatusFilter, TimeBucket};
use crate::models::TripRecord;
use crate::source::{DatasetSnapshot, TripSource};
use crate::stats::{EngineStats, StatsSnapshot};

/// The search half of the view. Renders as "press SEARCH" in one arm and
/// as a (possibly empty) trip list in the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchState<'a> {
    /// No pipeline run has happened yet this session.
    NotYetSearched,
    /// The most recent pipeline run produced these survivors.
    /// An empty slice is a real answer: "searched, zero matches."
    Results(&'a [TripRecord]),
}

/// What the renderer sees. Borrowed straight out of the dashboard; cheap to
/// build on every frame, impossible to mutate through.
#[derive(Debug, Serialize)]
pub struct DashboardView<'a> {
    pub dataset: &'a [TripRecord],
    pub criteria: &'a FilterCriteria,
    pub search: SearchState<'a>,
    pub selection: Option<&'a TripRecord>,
    /// Whether the current selection appears in the current filtered set.
    /// False both when there is no selection and when the selection went
    /// stale. The engine never auto-clears; this flag is the renderer's
    /// fair warning.
    pub selection_in_filtered: bool,
    pub aggregation: &'a DestinationAggregation,
    /// Human-readable load failure, if the one fetch failed.
    pub load_error: Option<String>,
    pub stats: StatsSnapshot,
}

/// The dashboard engine. One per session, one owner, zero locks.
pub struct TripDashboard {
    config: Arc<Config>,
    stats: Arc<EngineStats>,
    dataset: Vec<TripRecord>,
    criteria: FilterCriteria,
    filtered: Option<Vec<TripRecord>>,
    selected: Option<TripRecord>,
    aggregation: DestinationAggregation,
    load_error: Option<DataSourceError>,
}

impl TripDashboard {
    /// An empty dashboard: no dataset, identity criteria, nothing searched,
    /// nothing selected. Exactly the state a renderer should show a spinner
    /// over while `activate` is in flight.
    pub fn new(config: Arc<Config>, stats: Arc<EngineStats>) -> Self {
        Self {
            config,
            stats,
            dataset: Vec::new(),
            criteria: FilterCriteria::default(),
            filtered: None,
            selected: None,
            aggregation: DestinationAggregation::default(),
            load_error: None,
        }
    }

    // =========================================================================
    // ACTIVATION — the one-time load
    // =========================================================================

    /// Perform the session's one dataset load — an explicit initialization
    /// routine rather than a fetch buried in a lifecycle hook, so the
    /// caller regains control either way.
    ///
    /// On success: dataset installed, aggregation computed, error flag
    /// cleared. On failure: dataset stays as it was (almost certainly
    /// empty), error flag raised for the renderer. No retry either way.
    pub async fn activate(&mut self, source: &TripSource) {
        self.stats.record_fetch_attempt();
        match source.fetch().await {
            Ok(snapshot) => self.install_snapshot(snapshot),
            Err(e) => {
                self.stats.record_fetch_failure();
                warn!(error = %e, "Dataset load failed — dashboard stays empty, flag raised");
                self.load_error = Some(e);
            }
        }
    }

    /// Install a decoded snapshot: dataset, stats bookkeeping, aggregation.
    /// Public so tests (and any future non-HTTP source) can feed the
    /// dashboard directly.
    pub fn install_snapshot(&mut self, snapshot: DatasetSnapshot) {
        let duplicates = snapshot
            .quarantined
            .iter()
            .filter(|d| matches!(d, RecordDefect::DuplicateId(_)))
            .count() as u64;
        self.stats.record_decoded(snapshot.trips.len() as u64);
        self.stats.record_quarantined(snapshot.quarantined.len() as u64);
        self.stats.record_duplicate_ids(duplicates);

        self.aggregation = aggregate::aggregate(
            &snapshot.trips,
            self.config.recent_trips_count,
            self.config.top_destinations_count,
        );
        info!(
            snapshot_id = %snapshot.snapshot_id,
            fetched_at = %snapshot.fetched_at,
            trips = snapshot.trips.len(),
            top_destinations = self.aggregation.top_destinations.len(),
            "Dataset installed"
        );

        self.dataset = snapshot.trips;
        self.load_error = None;
    }

    // =========================================================================
    // CRITERIA STAGING — setters that compute nothing
    // =========================================================================
    // Every setter below is inert by design. A user staging four criterion
    // changes pays for zero pipeline runs until they hit SEARCH.
    // =========================================================================

    pub fn set_status(&mut self, status: StatusFilter) {
        debug!(status = %status, "Status criterion staged");
        self.criteria.status = status;
    }

    /// Stage the keyword, lower-casing it on the way in. The stored keyword
    /// is therefore always lowercase by the time a search runs, and the
    /// keyword predicate can bank on it.
    pub fn set_keyword(&mut self, keyword: &str) {
        self.criteria.keyword = keyword.to_lowercase();
    }

    pub fn set_distance_bucket(&mut self, bucket: DistanceBucket) {
        debug!(bucket = bucket.as_str(), "Distance criterion staged");
        self.criteria.distance = bucket;
    }

    pub fn set_time_bucket(&mut self, bucket: TimeBucket) {
        debug!(bucket = bucket.as_str(), "Time criterion staged");
        self.criteria.time = bucket;
    }

    // =========================================================================
    // THE TRIGGER
    // =========================================================================

    /// Run the filter pipeline over the full dataset with the criteria as
    /// staged right now. The only place in the engine where the filtered
    /// result changes.
    pub fn run_search(&mut self) {
        let result = filter::run(&self.criteria, &self.dataset);
        self.stats.record_search();
        info!(
            survivors = result.len(),
            dataset = self.dataset.len(),
            status = %self.criteria.status,
            keyword = self.criteria.keyword.as_str(),
            distance = self.criteria.distance.as_str(),
            time = self.criteria.time.as_str(),
            "Search executed"
        );
        self.filtered = Some(result);
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select a trip for the detail view, replacing any prior selection.
    /// No merge, no validation against the filtered set — picking a trip
    /// from the unfiltered recent-trips list is legitimate and looks
    /// exactly like this.
    pub fn select_trip(&mut self, trip: &TripRecord) {
        debug!(id = trip.id.as_str(), "Trip selected");
        self.stats.record_selection();
        self.selected = Some(trip.clone());
    }

    /// Close the detail view. Clearing an already-empty selection is a
    /// no-op and doesn't inflate the counter.
    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.stats.record_selection_cleared();
        }
    }

    // =========================================================================
    // THE RENDERER CONTRACT
    // =========================================================================

    /// Everything the renderer needs, borrowed in one struct.
    pub fn view(&self) -> DashboardView<'_> {
        let search = match &self.filtered {
            None => SearchState::NotYetSearched,
            Some(results) => SearchState::Results(results),
        };
        let selection_in_filtered = match (&self.selected, &self.filtered) {
            (Some(sel), Some(results)) => results.iter().any(|t| t.id == sel.id),
            _ => false,
        };
        DashboardView {
            dataset: &self.dataset,
            criteria: &self.criteria,
            search,
            selection: self.selected.as_ref(),
            selection_in_filtered,
            aggregation: &self.aggregation,
            load_error: self.load_error.as_ref().map(|e| e.to_string()),
            stats: self.stats.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripStatus;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn trip(id: &str, status: TripStatus, distance_km: f64) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            pickup_location: "CBD".to_string(),
            dropoff_location: "Airport".to_string(),
            driver_name: "Grace Campbell".to_string(),
            car_model: "Toyota Prius".to_string(),
            status,
            distance_km,
            duration_min: 12.0,
            cost: 500.0,
            cost_unit: "KES".to_string(),
            requested_at: Utc.with_ymd_and_hms(2019, 6, 24, 12, 0, 0).unwrap(),
        }
    }

    fn dashboard_with(trips: Vec<TripRecord>) -> TripDashboard {
        let config = Arc::new(Config::from_env());
        let stats = Arc::new(EngineStats::new());
        let mut dashboard = TripDashboard::new(config, stats);
        dashboard.install_snapshot(DatasetSnapshot {
            snapshot_id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            trips,
            quarantined: Vec::new(),
        });
        dashboard
    }

    fn sample_dashboard() -> TripDashboard {
        dashboard_with(vec![
            trip("1", TripStatus::Completed, 2.0),
            trip("2", TripStatus::Cancelled, 8.0),
            trip("3", TripStatus::Completed, 18.0),
        ])
    }

    #[test]
    fn test_not_searched_is_distinct_from_zero_matches() {
        let mut dashboard = sample_dashboard();
        assert_eq!(dashboard.view().search, SearchState::NotYetSearched);

        dashboard.set_keyword("definitely not in any field");
        dashboard.run_search();
        match dashboard.view().search {
            SearchState::Results(results) => assert!(results.is_empty()),
            SearchState::NotYetSearched => panic!("a search ran; the sentinel must be gone"),
        }
    }

    #[test]
    fn test_setters_stage_without_recomputing() {
        let mut dashboard = sample_dashboard();
        dashboard.run_search();
        let before: Vec<String> = match dashboard.view().search {
            SearchState::Results(r) => r.iter().map(|t| t.id.clone()).collect(),
            _ => panic!("search ran"),
        };
        assert_eq!(before, vec!["1", "2", "3"]);

        // Stage a criterion that would exclude everything. Nothing moves
        // until the trigger.
        dashboard.set_keyword("nothing matches this");
        dashboard.set_distance_bucket(DistanceBucket::Under3);
        let after: Vec<String> = match dashboard.view().search {
            SearchState::Results(r) => r.iter().map(|t| t.id.clone()).collect(),
            _ => panic!("search ran"),
        };
        assert_eq!(before, after);

        dashboard.run_search();
        match dashboard.view().search {
            SearchState::Results(r) => assert!(r.is_empty()),
            _ => panic!("search ran"),
        }
    }

    #[test]
    fn test_search_observes_latest_staged_criteria() {
        let mut dashboard = sample_dashboard();
        dashboard.set_status(StatusFilter::Only(TripStatus::Cancelled));
        dashboard.set_status(StatusFilter::Only(TripStatus::Completed));
        dashboard.run_search();
        match dashboard.view().search {
            SearchState::Results(r) => {
                let ids: Vec<&str> = r.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec!["1", "3"]);
            }
            _ => panic!("search ran"),
        }
    }

    #[test]
    fn test_keyword_is_lowercased_on_staging() {
        let mut dashboard = sample_dashboard();
        dashboard.set_keyword("CAMpbell");
        assert_eq!(dashboard.view().criteria.keyword, "campbell");
    }

    #[test]
    fn test_selection_replaces_and_clears() {
        let mut dashboard = sample_dashboard();
        let first = trip("1", TripStatus::Completed, 2.0);
        let second = trip("2", TripStatus::Cancelled, 8.0);

        dashboard.select_trip(&first);
        assert_eq!(dashboard.view().selection.map(|t| t.id.as_str()), Some("1"));

        dashboard.select_trip(&second);
        assert_eq!(dashboard.view().selection.map(|t| t.id.as_str()), Some("2"));

        dashboard.clear_selection();
        assert!(dashboard.view().selection.is_none());
    }

    #[test]
    fn test_stale_selection_survives_excluding_search() {
        let mut dashboard = sample_dashboard();
        let cancelled = trip("2", TripStatus::Cancelled, 8.0);
        dashboard.select_trip(&cancelled);

        // Search for Completed trips only; the selection is now stale.
        dashboard.set_status(StatusFilter::Only(TripStatus::Completed));
        dashboard.run_search();

        let view = dashboard.view();
        assert_eq!(view.selection.map(|t| t.id.as_str()), Some("2"));
        assert!(!view.selection_in_filtered);
    }

    #[test]
    fn test_selection_in_filtered_when_present() {
        let mut dashboard = sample_dashboard();
        let completed = trip("1", TripStatus::Completed, 2.0);
        dashboard.select_trip(&completed);
        dashboard.run_search();
        assert!(dashboard.view().selection_in_filtered);
    }

    #[test]
    fn test_load_failure_raises_flag_and_keeps_dataset_empty() {
        let config = Arc::new(Config::from_env());
        let stats = Arc::new(EngineStats::new());
        let mut dashboard = TripDashboard::new(config, Arc::clone(&stats));

        stats.record_fetch_attempt();
        stats.record_fetch_failure();
        dashboard.load_error = Some(DataSourceError::Status(reqwest::StatusCode::NOT_FOUND));

        let view = dashboard.view();
        assert!(view.dataset.is_empty());
        assert!(view.load_error.is_some());
        assert_eq!(view.stats.fetch_failures, 1);
    }

    #[test]
    fn test_aggregation_is_computed_on_install() {
        let dashboard = sample_dashboard();
        let view = dashboard.view();
        assert_eq!(view.aggregation.top_destinations.len(), 1);
        assert_eq!(view.aggregation.top_destinations[0].location, "Airport");
        assert_eq!(view.aggregation.recent_trips.len(), 3);
    }

    #[test]
    fn test_empty_dashboard_searches_to_empty() {
        let mut dashboard = dashboard_with(Vec::new());
        dashboard.run_search();
        match dashboard.view().search {
            SearchState::Results(r) => assert!(r.is_empty()),
            _ => panic!("search ran"),
        }
    }

    #[test]
    fn test_stats_track_searches_and_selections() {
        let mut dashboard = sample_dashboard();
        dashboard.run_search();
        dashboard.run_search();
        let record = trip("1", TripStatus::Completed, 2.0);
        dashboard.select_trip(&record);
        dashboard.clear_selection();
        dashboard.clear_selection(); // no-op, nothing selected

        let snap = dashboard.view().stats;
        assert_eq!(snap.searches_run, 2);
        assert_eq!(snap.selections_made, 1);
        assert_eq!(snap.selections_cleared, 1);
    }
}
