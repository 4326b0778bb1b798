//! # Region Cache
//!
//! Holds generated regions in memory and hands out chunk slices.
//!
//! ## Region Lifecycle
//!
//! ```text
//!            acquire                 load / generate ok
//! Unloaded ──────────> Loading ─────────────────────────> Loaded
//!    ^                    │ generation error                │ refcount 0,
//!    │                    v                                 │ evict
//!    │                 Failed ──evict──> (removed)          v
//!    └──────────────── saved / clean ─────────────────── Unloading
//!                                                           │ save failed or
//!                                      Loaded (dirty) <─────┘ re-acquired
//! ```
//!
//! A region enters the map on the first chunk request inside it and
//! leaves it only after a successful eviction. Readers that find it
//! `Loading` or `Unloading` block on the region's condvar until it
//! settles, so a torn or half-generated slab is never observed.
//!
//! ## Reference Counting
//!
//! Increments and the final "is it still zero" check of an eviction both
//! happen under the map lock, so an eviction can never remove a region
//! that was just acquired again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use stratum_core::{CellGrid, GridPool};
use tracing::{debug, error, info, warn};

use crate::chunk::{ChunkCoord, RegionCoord};
use crate::error::{CacheError, CacheResult, GenerationError};
use crate::layer::GenContext;
use crate::region_store::RegionStore;
use crate::stack::GenerationStack;
use crate::stats::StreamStats;

/// Lifecycle state of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionState {
    /// Not in memory.
    Unloaded,
    /// Being read from storage or generated.
    Loading,
    /// Slab resident.
    Loaded,
    /// Being written back before eviction.
    Unloading,
    /// Generation failed.
    Failed,
}

/// Outcome of an eviction attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eviction {
    /// Persisted (if needed) and dropped from memory.
    Evicted,
    /// Region is referenced again, or not resident.
    Skipped,
    /// Save failed; the slab stays resident and dirty.
    Retained,
}

struct RegionInner {
    state: RegionState,
    slab: Option<CellGrid>,
    refcount: usize,
    /// Slab not yet persisted.
    dirty: bool,
    failure: Option<GenerationError>,
}

/// One region's slab, state and reference count.
pub struct Region {
    coord: RegionCoord,
    inner: Mutex<RegionInner>,
    settled: Condvar,
}

impl Region {
    fn new(coord: RegionCoord) -> Self {
        Self {
            coord,
            inner: Mutex::new(RegionInner {
                state: RegionState::Unloaded,
                slab: None,
                refcount: 0,
                dirty: false,
                failure: None,
            }),
            settled: Condvar::new(),
        }
    }

    /// Region coordinate.
    #[must_use]
    pub const fn coord(&self) -> RegionCoord {
        self.coord
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RegionState {
        self.inner.lock().state
    }

    /// Active chunks inside this region.
    #[must_use]
    pub fn refcount(&self) -> usize {
        self.inner.lock().refcount
    }

    /// Returns true if the slab has not been persisted.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    fn set(&self, state: RegionState) {
        self.inner.lock().state = state;
        self.settled.notify_all();
    }
}

/// Where a loaded slab came from.
enum Source {
    Disk,
    Generated { persisted: bool },
}

/// In-memory regions plus the storage and generator behind them.
pub struct RegionCache {
    regions: Mutex<HashMap<RegionCoord, Arc<Region>>>,
    store: RegionStore,
    stack: GenerationStack,
    ctx: GenContext,
    pool: Arc<GridPool>,
    stats: Arc<StreamStats>,
}

impl RegionCache {
    /// Creates a cache generating with `stack` under `ctx`'s world seed.
    #[must_use]
    pub fn new(
        store: RegionStore,
        stack: GenerationStack,
        ctx: GenContext,
        pool: Arc<GridPool>,
        stats: Arc<StreamStats>,
    ) -> Self {
        Self {
            regions: Mutex::new(HashMap::new()),
            store,
            stack,
            ctx,
            pool,
            stats,
        }
    }

    /// Region size in tiles.
    #[must_use]
    pub fn region_size(&self) -> usize {
        self.store.region_size()
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    /// Counters this cache updates.
    #[must_use]
    pub fn stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }

    /// Looks up a resident region.
    #[must_use]
    pub fn region(&self, coord: RegionCoord) -> Option<Arc<Region>> {
        self.regions.lock().get(&coord).cloned()
    }

    /// Coordinates of every region currently in the map.
    #[must_use]
    pub fn resident(&self) -> Vec<RegionCoord> {
        let mut coords: Vec<RegionCoord> = self.regions.lock().keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Reference count of a region, zero if not resident.
    #[must_use]
    pub fn refcount(&self, coord: RegionCoord) -> usize {
        self.region(coord).map_or(0, |r| r.refcount())
    }

    /// Marks one more chunk of `chunk`'s region active, loading the region
    /// if needed, and returns the chunk's cells.
    ///
    /// The reference is taken even if loading fails, so every call must be
    /// paired with [`RegionCache::release_chunk`].
    ///
    /// # Errors
    ///
    /// [`CacheError::Generation`] if the region could not be generated.
    pub fn acquire_chunk(&self, chunk: ChunkCoord) -> CacheResult<CellGrid> {
        let coord = chunk.region(self.region_size());
        let region = {
            let mut regions = self.regions.lock();
            let region = Arc::clone(
                regions
                    .entry(coord)
                    .or_insert_with(|| Arc::new(Region::new(coord))),
            );
            region.inner.lock().refcount += 1;
            region
        };
        self.ensure_loaded(&region);
        self.slice(&region, chunk)
    }

    /// Marks one chunk of `chunk`'s region inactive.
    ///
    /// Returns the remaining reference count, or `None` if the region was
    /// not resident (an unmatched release).
    pub fn release_chunk(&self, chunk: ChunkCoord) -> Option<usize> {
        let region = self.region(chunk.region(self.region_size()))?;
        let mut inner = region.inner.lock();
        if inner.refcount == 0 {
            warn!(?chunk, "release without matching acquire");
            return None;
        }
        inner.refcount -= 1;
        Some(inner.refcount)
    }

    /// Copies a chunk out of its region, waiting if the region is still
    /// loading. Takes no reference.
    ///
    /// # Errors
    ///
    /// [`CacheError::RegionNotLoaded`] if the region is not resident.
    pub fn chunk_cells(&self, chunk: ChunkCoord) -> CacheResult<CellGrid> {
        let coord = chunk.region(self.region_size());
        let region = self
            .region(coord)
            .ok_or(CacheError::RegionNotLoaded { region: coord, chunk })?;
        self.slice(&region, chunk)
    }

    fn slice(&self, region: &Region, chunk: ChunkCoord) -> CacheResult<CellGrid> {
        let mut inner = region.inner.lock();
        while matches!(inner.state, RegionState::Loading | RegionState::Unloading) {
            region.settled.wait(&mut inner);
        }
        let not_loaded = CacheError::RegionNotLoaded {
            region: region.coord,
            chunk,
        };
        match (inner.state, &inner.failure) {
            (RegionState::Loaded, _) => inner
                .slab
                .as_ref()
                .and_then(|slab| slab.slice(chunk.area()))
                .ok_or(not_loaded),
            (RegionState::Failed, Some(source)) => Err(CacheError::Generation {
                region: region.coord,
                source: source.clone(),
            }),
            _ => Err(not_loaded),
        }
    }

    fn ensure_loaded(&self, region: &Region) {
        {
            let mut inner = region.inner.lock();
            loop {
                match inner.state {
                    RegionState::Loaded | RegionState::Failed => return,
                    RegionState::Loading | RegionState::Unloading => {
                        region.settled.wait(&mut inner);
                    }
                    RegionState::Unloaded => {
                        inner.state = RegionState::Loading;
                        break;
                    }
                }
            }
        }

        let coord = region.coord;
        let outcome = self.load_or_generate(coord);
        let mut inner = region.inner.lock();
        match outcome {
            Ok((slab, source)) => {
                inner.dirty = matches!(source, Source::Generated { persisted: false });
                inner.slab = Some(slab);
                inner.state = RegionState::Loaded;
            }
            Err(err) => {
                inner.failure = Some(err);
                inner.state = RegionState::Failed;
            }
        }
        drop(inner);
        region.settled.notify_all();
    }

    fn load_or_generate(&self, coord: RegionCoord) -> Result<(CellGrid, Source), GenerationError> {
        match self.store.load(coord, &self.pool) {
            Ok(Some(slab)) => {
                info!(?coord, "region loaded from disk");
                StreamStats::bump(&self.stats.regions_loaded);
                return Ok((slab, Source::Disk));
            }
            Ok(None) => {}
            Err(err) => {
                warn!(?coord, %err, "region file unreadable, regenerating");
                StreamStats::bump(&self.stats.load_failures);
            }
        }

        let started = Instant::now();
        let size = self.region_size();
        let slab = self
            .stack
            .generate(&self.ctx, coord.area(size))
            .map_err(|err| {
                error!(?coord, %err, "region generation failed");
                err
            })?;
        debug!(?coord, elapsed_ms = started.elapsed().as_millis() as u64, "region generated");
        StreamStats::bump(&self.stats.regions_generated);

        let persisted = match self.store.save(coord, &slab) {
            Ok(()) => true,
            Err(err) => {
                warn!(?coord, %err, "region save failed, keeping it resident");
                StreamStats::bump(&self.stats.save_failures);
                false
            }
        };
        Ok((slab, Source::Generated { persisted }))
    }

    /// Writes back and drops a region whose reference count is zero.
    ///
    /// Failed regions are dropped without saving so a later request
    /// retries generation.
    pub fn evict(&self, coord: RegionCoord) -> Eviction {
        let Some(region) = self.region(coord) else {
            return Eviction::Skipped;
        };

        let (slab, dirty) = {
            let mut inner = region.inner.lock();
            if inner.refcount > 0 {
                StreamStats::bump(&self.stats.evictions_cancelled);
                return Eviction::Skipped;
            }
            match inner.state {
                RegionState::Loaded => {}
                RegionState::Failed => {
                    drop(inner);
                    return self.remove_if_unreferenced(&region, None);
                }
                _ => return Eviction::Skipped,
            }
            inner.state = RegionState::Unloading;
            (inner.slab.take(), inner.dirty)
        };
        let Some(slab) = slab else {
            region.set(RegionState::Unloaded);
            return self.remove_if_unreferenced(&region, None);
        };

        if dirty {
            if let Err(err) = self.store.save(coord, &slab) {
                warn!(?coord, %err, "region save failed on eviction, retrying later");
                StreamStats::bump(&self.stats.save_failures);
                let mut inner = region.inner.lock();
                inner.slab = Some(slab);
                inner.state = RegionState::Loaded;
                drop(inner);
                region.settled.notify_all();
                return Eviction::Retained;
            }
            region.inner.lock().dirty = false;
        }

        self.remove_if_unreferenced(&region, Some(slab))
    }

    /// Final step of an eviction, under the map lock.
    fn remove_if_unreferenced(&self, region: &Arc<Region>, slab: Option<CellGrid>) -> Eviction {
        let mut regions = self.regions.lock();
        let mut inner = region.inner.lock();
        if inner.refcount > 0 {
            // Re-acquired while saving: the slab goes back in place.
            if let Some(slab) = slab {
                inner.slab = Some(slab);
                inner.state = RegionState::Loaded;
            }
            drop(inner);
            region.settled.notify_all();
            StreamStats::bump(&self.stats.evictions_cancelled);
            return Eviction::Skipped;
        }

        regions.remove(&region.coord);
        inner.state = RegionState::Unloaded;
        drop(inner);
        drop(regions);
        region.settled.notify_all();

        if let Some(slab) = slab {
            self.pool.release(slab);
        }
        info!(coord = ?region.coord, "region evicted");
        StreamStats::bump(&self.stats.regions_evicted);
        Eviction::Evicted
    }

    /// Saves every resident dirty region. Returns how many saves failed.
    pub fn persist_all(&self) -> usize {
        let regions: Vec<Arc<Region>> = self.regions.lock().values().cloned().collect();
        let mut failures = 0;
        for region in regions {
            let mut inner = region.inner.lock();
            if !inner.dirty || inner.state != RegionState::Loaded {
                continue;
            }
            let Some(slab) = inner.slab.as_ref() else {
                continue;
            };
            match self.store.save(region.coord, slab) {
                Ok(()) => inner.dirty = false,
                Err(err) => {
                    warn!(coord = ?region.coord, %err, "region save failed on flush");
                    StreamStats::bump(&self.stats.save_failures);
                    failures += 1;
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use stratum_core::WorldSeed;

    fn temp_dir(tag: &str) -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("stratum_region_{tag}_{id}"))
    }

    fn cache(dir: &PathBuf, size: usize) -> RegionCache {
        let stack = GenerationStack::standard();
        let ctx = stack.initialize(WorldSeed::new(42));
        RegionCache::new(
            RegionStore::open(dir, size).unwrap(),
            stack,
            ctx,
            Arc::new(GridPool::new(2)),
            Arc::new(StreamStats::default()),
        )
    }

    #[test]
    fn test_acquire_generates_then_persists() {
        let dir = temp_dir("acquire");
        let cache = cache(&dir, 64);
        let chunk = ChunkCoord::new(5, -1);
        let region = chunk.region(64);

        let cells = cache.acquire_chunk(chunk).unwrap();
        assert_eq!(cells.area(), chunk.area());
        assert_eq!(cache.refcount(region), 1);
        assert!(cache.store().contains(region));
        assert_eq!(cache.region(region).unwrap().state(), RegionState::Loaded);
        assert!(!cache.region(region).unwrap().is_dirty());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_evict_only_at_zero() {
        let dir = temp_dir("evict");
        let cache = cache(&dir, 64);
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(1, 0);
        cache.acquire_chunk(a).unwrap();
        cache.acquire_chunk(b).unwrap();

        assert_eq!(cache.release_chunk(a), Some(1));
        assert_eq!(cache.evict(a.region(64)), Eviction::Skipped);
        assert_eq!(cache.release_chunk(b), Some(0));
        assert_eq!(cache.evict(a.region(64)), Eviction::Evicted);
        assert!(cache.resident().is_empty());
        assert!(matches!(
            cache.chunk_cells(a),
            Err(CacheError::RegionNotLoaded { .. })
        ));
        assert_eq!(cache.release_chunk(a), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reload_from_disk_is_identical() {
        let dir = temp_dir("reload");
        let cache = cache(&dir, 64);
        let chunk = ChunkCoord::new(2, 3);
        let first = cache.acquire_chunk(chunk).unwrap();
        cache.release_chunk(chunk);
        assert_eq!(cache.evict(chunk.region(64)), Eviction::Evicted);

        let second = cache.acquire_chunk(chunk).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats.snapshot().regions_generated, 1);
        assert_eq!(cache.stats.snapshot().regions_loaded, 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_falls_back_to_generation() {
        let dir = temp_dir("corrupt");
        let cache = cache(&dir, 64);
        let chunk = ChunkCoord::new(0, 0);
        let region = chunk.region(64);
        let expected = cache.acquire_chunk(chunk).unwrap();
        cache.release_chunk(chunk);
        cache.evict(region);

        fs::write(cache.store().path(region), b"garbage").unwrap();
        let regenerated = cache.acquire_chunk(chunk).unwrap();
        assert_eq!(regenerated, expected);
        assert_eq!(cache.stats.snapshot().load_failures, 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_save_keeps_region_dirty() {
        let dir = temp_dir("savefail");
        let cache = cache(&dir, 64);
        // A plain file where the directory should be makes every save fail.
        fs::remove_dir_all(&dir).unwrap();
        fs::write(&dir, b"not a directory").unwrap();

        let chunk = ChunkCoord::new(0, 0);
        let region = chunk.region(64);
        cache.acquire_chunk(chunk).unwrap();
        assert!(cache.region(region).unwrap().is_dirty());

        cache.release_chunk(chunk);
        assert_eq!(cache.evict(region), Eviction::Retained);
        assert_eq!(cache.resident(), vec![region]);
        assert!(cache.chunk_cells(chunk).is_ok());

        // Storage comes back: the next flush succeeds.
        fs::remove_file(&dir).unwrap();
        fs::create_dir_all(&dir).unwrap();
        assert_eq!(cache.persist_all(), 0);
        assert!(!cache.region(region).unwrap().is_dirty());
        assert!(cache.store().contains(region));
        assert_eq!(cache.evict(region), Eviction::Evicted);
        fs::remove_dir_all(&dir).ok();
    }
}
