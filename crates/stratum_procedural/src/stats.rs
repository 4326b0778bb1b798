//! Streaming counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the streamer, the cache manager and the workers.
#[derive(Debug, Default)]
pub struct StreamStats {
    /// Chunk loads handed to workers.
    pub loads_dispatched: AtomicU64,
    /// Chunk unloads handed to workers.
    pub unloads_dispatched: AtomicU64,
    /// Pending loads dropped because the chunk left the window first.
    pub loads_cancelled: AtomicU64,
    /// Regions produced by the generation stack.
    pub regions_generated: AtomicU64,
    /// Regions read back from storage.
    pub regions_loaded: AtomicU64,
    /// Regions dropped from memory.
    pub regions_evicted: AtomicU64,
    /// Evictions skipped because the region was referenced again.
    pub evictions_cancelled: AtomicU64,
    /// Region saves that failed.
    pub save_failures: AtomicU64,
    /// Region loads that failed and fell back to generation.
    pub load_failures: AtomicU64,
}

/// Point-in-time copy of [`StreamStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// See [`StreamStats::loads_dispatched`].
    pub loads_dispatched: u64,
    /// See [`StreamStats::unloads_dispatched`].
    pub unloads_dispatched: u64,
    /// See [`StreamStats::loads_cancelled`].
    pub loads_cancelled: u64,
    /// See [`StreamStats::regions_generated`].
    pub regions_generated: u64,
    /// See [`StreamStats::regions_loaded`].
    pub regions_loaded: u64,
    /// See [`StreamStats::regions_evicted`].
    pub regions_evicted: u64,
    /// See [`StreamStats::evictions_cancelled`].
    pub evictions_cancelled: u64,
    /// See [`StreamStats::save_failures`].
    pub save_failures: u64,
    /// See [`StreamStats::load_failures`].
    pub load_failures: u64,
}

impl StreamStats {
    /// Adds one to a counter.
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            loads_dispatched: get(&self.loads_dispatched),
            unloads_dispatched: get(&self.unloads_dispatched),
            loads_cancelled: get(&self.loads_cancelled),
            regions_generated: get(&self.regions_generated),
            regions_loaded: get(&self.regions_loaded),
            regions_evicted: get(&self.regions_evicted),
            evictions_cancelled: get(&self.evictions_cancelled),
            save_failures: get(&self.save_failures),
            load_failures: get(&self.load_failures),
        }
    }
}
