//! # Terrain Cache Manager
//!
//! Turns chunk load/unload requests into region cache operations on the
//! worker pool and reports results to a [`ChunkConsumer`].
//!
//! Every job is routed by its region coordinate, so all work on one region
//! runs on one worker in request order:
//!
//! ```text
//! request_load(c)   ──> Load(c)   ──> acquire_chunk ──> on_chunk_ready
//! request_unload(c) ──> Unload(c) ──> release_chunk ──> on_chunk_retired
//!                                        │ count hit 0
//!                                        v
//!                                     Evict(r) (queued behind any new loads)
//! ```
//!
//! An eviction that finds the region referenced again is a no-op.

use std::path::Path;
use std::sync::Arc;

use stratum_core::{CellGrid, GridPool, WorldSeed};
use tracing::{debug, warn};

use crate::chunk::{ChunkCoord, RegionCoord};
use crate::config::StratumConfig;
use crate::error::{CacheError, CacheResult, StratumResult};
use crate::region::{Eviction, RegionCache};
use crate::region_store::RegionStore;
use crate::stack::GenerationStack;
use crate::stats::{StatsSnapshot, StreamStats};
use crate::worker::{Handler, WorkerPool};

/// Receives materialized chunks. Called from worker threads.
pub trait ChunkConsumer: Send + Sync {
    /// A chunk's cells are ready.
    fn on_chunk_ready(&self, chunk: ChunkCoord, cells: CellGrid);

    /// A chunk left the active set.
    fn on_chunk_retired(&self, chunk: ChunkCoord);

    /// A chunk could not be materialized. The chunk still counts as
    /// active until its unload arrives.
    fn on_chunk_failed(&self, chunk: ChunkCoord, err: &CacheError) {
        warn!(?chunk, %err, "chunk failed to load");
    }
}

/// Work item for a region's worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Job {
    Load(ChunkCoord),
    Unload(ChunkCoord),
    Evict(RegionCoord),
}

fn run(cache: &RegionCache, consumer: &dyn ChunkConsumer, job: Job) -> Option<Job> {
    match job {
        Job::Load(chunk) => {
            match cache.acquire_chunk(chunk) {
                Ok(cells) => consumer.on_chunk_ready(chunk, cells),
                Err(err) => consumer.on_chunk_failed(chunk, &err),
            }
            None
        }
        Job::Unload(chunk) => {
            let remaining = cache.release_chunk(chunk);
            consumer.on_chunk_retired(chunk);
            (remaining == Some(0)).then(|| Job::Evict(chunk.region(cache.region_size())))
        }
        Job::Evict(region) => {
            if cache.evict(region) == Eviction::Retained {
                debug!(?region, "eviction deferred until next release");
            }
            None
        }
    }
}

/// Loads, slices and evicts regions on background workers.
pub struct TerrainCacheManager {
    cache: Arc<RegionCache>,
    pool: WorkerPool<Job>,
    stats: Arc<StreamStats>,
}

impl TerrainCacheManager {
    /// Starts `workers` threads serving `cache`.
    ///
    /// # Errors
    ///
    /// [`CacheError::WorkerSpawn`] if a worker cannot be started.
    pub fn new(
        cache: Arc<RegionCache>,
        consumer: Arc<dyn ChunkConsumer>,
        workers: usize,
    ) -> CacheResult<Self> {
        let stats = Arc::clone(cache.stats());
        let worker_cache = Arc::clone(&cache);
        let handler: Handler<Job> = Arc::new(move |job| run(&worker_cache, consumer.as_ref(), job));
        let pool = WorkerPool::spawn(workers, "stratum-worker", handler)?;
        Ok(Self { cache, pool, stats })
    }

    /// Builds the whole cache stack from a validated configuration.
    ///
    /// # Errors
    ///
    /// Invalid configuration, an unusable storage directory, or a worker
    /// that cannot be started.
    pub fn from_config(
        config: &StratumConfig,
        world: WorldSeed,
        consumer: Arc<dyn ChunkConsumer>,
    ) -> StratumResult<Self> {
        config.validate()?;
        let store = RegionStore::open(&config.storage_dir, config.region_size as usize)?;
        Self::open(
            store,
            GenerationStack::standard(),
            world,
            consumer,
            config.worker_count,
        )
    }

    /// Builds a cache over `store` generating with `stack`. Generation
    /// and decoding share one buffer pool.
    ///
    /// # Errors
    ///
    /// [`CacheError::WorkerSpawn`] if a worker cannot be started.
    pub fn open(
        store: RegionStore,
        stack: GenerationStack,
        world: WorldSeed,
        consumer: Arc<dyn ChunkConsumer>,
        workers: usize,
    ) -> StratumResult<Self> {
        let pool = Arc::new(GridPool::default());
        let stack = stack.with_pool(Arc::clone(&pool));
        let ctx = stack.initialize(world);
        let cache = RegionCache::new(store, stack, ctx, pool, Arc::new(StreamStats::default()));
        Ok(Self::new(Arc::new(cache), consumer, workers)?)
    }

    fn dispatch(&self, job: Job, region: RegionCoord) -> CacheResult<()> {
        self.pool.dispatch(&region, job)
    }

    /// Queues a chunk load.
    ///
    /// # Errors
    ///
    /// [`CacheError::ShutDown`] if the workers are gone.
    pub fn request_load(&self, chunk: ChunkCoord) -> CacheResult<()> {
        self.dispatch(Job::Load(chunk), chunk.region(self.cache.region_size()))?;
        StreamStats::bump(&self.stats.loads_dispatched);
        Ok(())
    }

    /// Queues a chunk unload. Must follow a load of the same chunk.
    ///
    /// # Errors
    ///
    /// [`CacheError::ShutDown`] if the workers are gone.
    pub fn request_unload(&self, chunk: ChunkCoord) -> CacheResult<()> {
        self.dispatch(Job::Unload(chunk), chunk.region(self.cache.region_size()))?;
        StreamStats::bump(&self.stats.unloads_dispatched);
        Ok(())
    }

    /// Blocks until every queued job, including follow-up evictions, ran.
    pub fn wait_idle(&self) {
        self.pool.wait_idle();
    }

    /// Copies a chunk out of a resident region without taking a reference.
    ///
    /// # Errors
    ///
    /// [`CacheError::RegionNotLoaded`] if its region is not resident.
    pub fn chunk_cells(&self, chunk: ChunkCoord) -> CacheResult<CellGrid> {
        self.cache.chunk_cells(chunk)
    }

    /// Waits for pending work, then saves every dirty region. Returns the
    /// number of saves that failed.
    pub fn flush(&self) -> usize {
        self.wait_idle();
        self.cache.persist_all()
    }

    /// Underlying region cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<RegionCache> {
        &self.cache
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for TerrainCacheManager {
    fn drop(&mut self) {
        self.pool.shutdown();
        let failures = self.cache.persist_all();
        if failures > 0 {
            warn!(failures, "regions left unsaved at shutdown");
        }
    }
}

/// Consumer that drops everything. Useful when only the cache matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullConsumer;

impl ChunkConsumer for NullConsumer {
    fn on_chunk_ready(&self, _chunk: ChunkCoord, _cells: CellGrid) {}

    fn on_chunk_retired(&self, _chunk: ChunkCoord) {}
}

/// Opens a manager with the standard stack over `dir`.
///
/// # Errors
///
/// See [`TerrainCacheManager::open`].
pub fn open_in(
    dir: impl AsRef<Path>,
    region_size: usize,
    world: WorldSeed,
    consumer: Arc<dyn ChunkConsumer>,
    workers: usize,
) -> StratumResult<TerrainCacheManager> {
    let store = RegionStore::open(dir, region_size)?;
    TerrainCacheManager::open(store, GenerationStack::standard(), world, consumer, workers)
}
