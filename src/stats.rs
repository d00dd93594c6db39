// ═══════════════════════════════════════════════════════════════
// STATS COLLECTOR - Because if you can't measure it, it didn't happen
// ═══════════════════════════════════════════════════════════════
//
// Atomic counters for everything. Lock-free because we're THAT paranoid
// about contention on a single-threaded dashboard. The renderer reads a
// serializable snapshot straight out of the dashboard view; there is no
// server, no endpoint, no scrape target — just counters and honesty.

use portable_atomic::{AtomicU64, Ordering};
use serde::Serialize;
use std::time::Instant;

/// The stats snapshot — what the renderer (or a curious log line) sees.
#[derive(Debug, Serialize, Clone)]
pub struct StatsSnapshot {
    pub fetch_attempts: u64,
    pub fetch_failures: u64,
    pub records_decoded: u64,
    pub records_quarantined: u64,
    pub duplicate_ids: u64,
    pub searches_run: u64,
    pub selections_made: u64,
    pub selections_cleared: u64,
    pub uptime_seconds: u64,
}

/// Thread-safe atomic stats collector.
/// Every counter is atomic because mutexes are for the weak.
pub struct EngineStats {
    fetch_attempts: AtomicU64,
    fetch_failures: AtomicU64,
    records_decoded: AtomicU64,
    records_quarantined: AtomicU64,
    duplicate_ids: AtomicU64,
    searches_run: AtomicU64,
    selections_made: AtomicU64,
    selections_cleared: AtomicU64,
    start_time: Instant,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            fetch_attempts: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            records_decoded: AtomicU64::new(0),
            records_quarantined: AtomicU64::new(0),
            duplicate_ids: AtomicU64::new(0),
            searches_run: AtomicU64::new(0),
            selections_made: AtomicU64::new(0),
            selections_cleared: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_fetch_attempt(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decoded(&self, count: u64) {
        self.records_decoded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_quarantined(&self, count: u64) {
        self.records_quarantined.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_duplicate_ids(&self, count: u64) {
        self.duplicate_ids.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_search(&self) {
        self.searches_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_selection(&self) {
        self.selections_made.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_selection_cleared(&self) {
        self.selections_cleared.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters (lock-free reads).
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            records_quarantined: self.records_quarantined.load(Ordering::Relaxed),
            duplicate_ids: self.duplicate_ids.load(Ordering::Relaxed),
            searches_run: self.searches_run.load(Ordering::Relaxed),
            selections_made: self.selections_made.load(Ordering::Relaxed),
            selections_cleared: self.selections_cleared.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}
