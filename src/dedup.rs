// =============================================================================
// dedup.rs — THE IDENTIFIER UNIQUENESS FORTRESS
// =============================================================================
//
// A trip identifier is unique within a dataset snapshot. That's an invariant,
// and invariants get enforcement, not vibes. This module implements a hybrid
// Bloom Filter + LRU Cache deduper that the decode pass runs every incoming
// identifier through:
//
// 1. The Bloom filter answers "never seen it" in O(1) with zero false
//    negatives. If it says new, the id IS new.
//
// 2. When the Bloom filter says "maybe seen it" (false positives are the
//    price of probabilistic living), the LRU cache delivers the verdict.
//
// 3. A deduper lives exactly as long as one decode pass. New snapshot, new
//    deduper, no rotation ceremony required.
//
// Is this overkill for deduplicating a dataset of maybe fifty trips? YES.
// Could we just use a HashSet? YES.
// Are we going to use a HashSet? ABSOLUTELY NOT.
// =============================================================================

use bloomfilter::Bloom;
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use tracing::debug;

/// Scope: one dataset snapshot, one decode pass, then it's dropped.
/// Thread-safe anyway, because the locks are cheap and the discipline
/// of `&self` methods keeps the decode loop tidy.
pub struct SnapshotDeduper {
    /// First line of defense against duplicate identifiers.
    bloom: RwLock<Bloom<String>>,

    /// Second line of defense. When the Bloom filter says "maybe",
    /// the LRU cache says "definitely."
    lru_cache: RwLock<LruCache<String, bool>>,

    /// Counters for the stats snapshot. If we can't measure the
    /// deduplication, did it even happen?
    checks: portable_atomic::AtomicU64,
    unique: portable_atomic::AtomicU64,
    duplicates: portable_atomic::AtomicU64,
    bloom_maybe_hits: portable_atomic::AtomicU64,
}

impl SnapshotDeduper {
    /// Build a deduper sized for one snapshot.
    ///
    /// # Arguments
    /// * `expected_items` - How many identifiers we expect in the payload
    /// * `fp_rate` - Target Bloom false positive rate (0.01 = 1%)
    /// * `lru_capacity` - Maximum identifiers held by the LRU backstop
    pub fn new(expected_items: u64, fp_rate: f64, lru_capacity: usize) -> Self {
        let bloom = Bloom::new_for_fp_rate(expected_items as usize, fp_rate);
        let lru_size = NonZeroUsize::new(lru_capacity).unwrap_or(NonZeroUsize::new(1000).unwrap());

        Self {
            bloom: RwLock::new(bloom),
            lru_cache: RwLock::new(LruCache::new(lru_size)),
            checks: portable_atomic::AtomicU64::new(0),
            unique: portable_atomic::AtomicU64::new(0),
            duplicates: portable_atomic::AtomicU64::new(0),
            bloom_maybe_hits: portable_atomic::AtomicU64::new(0),
        }
    }

    /// Check whether an identifier has been seen in this snapshot, and if
    /// not, mark it as seen.
    ///
    /// Returns `true` if the identifier is NEW.
    /// Returns `false` if it's a duplicate and the record carrying it
    /// should be quarantined.
    pub fn check_and_insert(&self, id: &str) -> bool {
        use portable_atomic::Ordering;

        self.checks.fetch_add(1, Ordering::Relaxed);

        let key = id.to_string();

        let bloom_says_maybe_seen = {
            let bloom = self.bloom.read();
            bloom.check(&key)
        };

        if bloom_says_maybe_seen {
            // Bloom filters lie (false positives). The LRU doesn't.
            self.bloom_maybe_hits.fetch_add(1, Ordering::Relaxed);

            let mut lru = self.lru_cache.write();
            if lru.get(&key).is_some() {
                self.duplicates.fetch_add(1, Ordering::Relaxed);
                debug!(id = id, "Duplicate trip identifier — Bloom + LRU confirmed");
                return false;
            }

            debug!(
                id = id,
                "Bloom false positive rescued by LRU — identifier is actually new"
            );
        }

        // Genuinely new identifier. Record it in both layers.
        {
            let mut bloom = self.bloom.write();
            bloom.set(&key);
        }
        {
            let mut lru = self.lru_cache.write();
            lru.put(key, true);
        }

        self.unique.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// A point-in-time view of the deduper counters, for the stats surface.
    pub fn snapshot(&self) -> DedupSnapshot {
        use portable_atomic::Ordering;
        DedupSnapshot {
            total_checks: self.checks.load(Ordering::Relaxed),
            unique_ids: self.unique.load(Ordering::Relaxed),
            duplicates_caught: self.duplicates.load(Ordering::Relaxed),
            bloom_false_positive_rescues: self.bloom_maybe_hits.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot from one deduper.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DedupSnapshot {
    pub total_checks: u64,
    pub unique_ids: u64,
    pub duplicates_caught: u64,
    pub bloom_false_positive_rescues: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identifiers_are_accepted() {
        let deduper = SnapshotDeduper::new(1000, 0.01, 100);
        assert!(deduper.check_and_insert("trip-1"));
    }

    #[test]
    fn test_duplicate_identifiers_are_rejected() {
        let deduper = SnapshotDeduper::new(1000, 0.01, 100);
        assert!(deduper.check_and_insert("trip-1"));
        assert!(!deduper.check_and_insert("trip-1"));
    }

    #[test]
    fn test_distinct_identifiers_are_accepted() {
        let deduper = SnapshotDeduper::new(1000, 0.01, 100);
        assert!(deduper.check_and_insert("trip-1"));
        assert!(deduper.check_and_insert("trip-2"));
    }

    #[test]
    fn test_counters_track_the_verdicts() {
        let deduper = SnapshotDeduper::new(1000, 0.01, 100);
        deduper.check_and_insert("trip-1");
        deduper.check_and_insert("trip-1");
        deduper.check_and_insert("trip-2");
        let snap = deduper.snapshot();
        assert_eq!(snap.total_checks, 3);
        assert_eq!(snap.unique_ids, 2);
        assert_eq!(snap.duplicates_caught, 1);
    }
}
