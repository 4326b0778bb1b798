//! # Terrain Streamer
//!
//! Control-thread glue between the observer, the window and the cache.
//!
//! Window loads go into a pending set and are handed to workers
//! nearest-first, a bounded number per [`TerrainStreamer::tick`]. An unload
//! for a chunk still pending just drops it, so workers only ever see an
//! unload after the matching load. Nothing here blocks on generation.

use std::collections::HashSet;
use std::sync::Arc;

use stratum_core::WorldSeed;
use tracing::trace;

use crate::cache::{ChunkConsumer, TerrainCacheManager};
use crate::chunk::ChunkCoord;
use crate::config::StratumConfig;
use crate::error::{CacheResult, StratumResult};
use crate::stats::StreamStats;
use crate::window::{ChunkEvent, ChunkWindow};

/// Observer-driven chunk streaming.
pub struct TerrainStreamer {
    window: ChunkWindow,
    pending: HashSet<ChunkCoord>,
    manager: TerrainCacheManager,
    max_loads_per_tick: usize,
}

impl TerrainStreamer {
    /// Streams through `manager` with a window of `radius` chunks.
    #[must_use]
    pub fn new(manager: TerrainCacheManager, radius: u32, max_loads_per_tick: usize) -> Self {
        Self {
            window: ChunkWindow::new(radius),
            pending: HashSet::new(),
            manager,
            max_loads_per_tick: max_loads_per_tick.max(1),
        }
    }

    /// Builds the manager and streamer from a configuration.
    ///
    /// # Errors
    ///
    /// See [`TerrainCacheManager::from_config`].
    pub fn from_config(
        config: &StratumConfig,
        world: WorldSeed,
        consumer: Arc<dyn ChunkConsumer>,
    ) -> StratumResult<Self> {
        let manager = TerrainCacheManager::from_config(config, world, consumer)?;
        Ok(Self::new(
            manager,
            config.rendering_distance,
            config.max_loads_per_tick,
        ))
    }

    /// Moves the observer to a continuous position.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if an unload cannot be queued.
    pub fn set_observer(&mut self, x: f64, z: f64) -> CacheResult<()> {
        let events = self.window.set_observer(x, z);
        self.apply(events)
    }

    /// Moves the observer to a chunk.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if an unload cannot be queued.
    pub fn set_position(&mut self, center: ChunkCoord) -> CacheResult<()> {
        let events = self.window.set_position(center);
        self.apply(events)
    }

    /// Changes the rendering distance.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if an unload cannot be queued.
    pub fn set_radius(&mut self, radius: u32) -> CacheResult<()> {
        let events = self.window.set_radius(radius);
        self.apply(events)
    }

    /// Unloads the whole window.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if an unload cannot be queued.
    pub fn clear(&mut self) -> CacheResult<()> {
        let events = self.window.clear();
        self.apply(events)
    }

    fn apply(&mut self, events: Vec<ChunkEvent>) -> CacheResult<()> {
        for event in events {
            match event {
                ChunkEvent::Load(chunk) => {
                    self.pending.insert(chunk);
                }
                ChunkEvent::Unload(chunk) => {
                    if self.pending.remove(&chunk) {
                        trace!(?chunk, "pending load cancelled");
                        StreamStats::bump(&self.manager.stats().loads_cancelled);
                    } else {
                        self.manager.request_unload(chunk)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn nearest_pending(&self, limit: usize) -> Vec<ChunkCoord> {
        let center = self.window.center().unwrap_or_default();
        let mut queue: Vec<ChunkCoord> = self.pending.iter().copied().collect();
        queue.sort_unstable_by_key(|c| (c.distance_sq(center), *c));
        queue.truncate(limit);
        queue
    }

    /// Hands up to `max_loads_per_tick` pending loads to the workers,
    /// nearest first. Returns how many were dispatched.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if the workers are gone.
    pub fn tick(&mut self) -> CacheResult<usize> {
        self.dispatch(self.max_loads_per_tick)
    }

    /// Dispatches every pending load.
    ///
    /// # Errors
    ///
    /// [`crate::CacheError::ShutDown`] if the workers are gone.
    pub fn flush(&mut self) -> CacheResult<usize> {
        self.dispatch(self.pending.len())
    }

    fn dispatch(&mut self, limit: usize) -> CacheResult<usize> {
        let batch = self.nearest_pending(limit);
        for chunk in &batch {
            self.manager.request_load(*chunk)?;
            self.pending.remove(chunk);
        }
        Ok(batch.len())
    }

    /// Blocks until the workers are idle.
    pub fn wait_idle(&self) {
        self.manager.wait_idle();
    }

    /// Loads not yet dispatched.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The streaming window.
    #[must_use]
    pub fn window(&self) -> &ChunkWindow {
        &self.window
    }

    /// The cache manager.
    #[must_use]
    pub fn manager(&self) -> &TerrainCacheManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::cache::{open_in, NullConsumer};
    use crate::chunk::RegionCoord;

    fn streamer(tag: &str, radius: u32, per_tick: usize) -> (TerrainStreamer, std::path::PathBuf) {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("stratum_streamer_{tag}_{id}"));
        let manager = open_in(&dir, 64, WorldSeed::new(42), Arc::new(NullConsumer), 2).unwrap();
        (TerrainStreamer::new(manager, radius, per_tick), dir)
    }

    #[test]
    fn test_tick_is_bounded_and_nearest_first() {
        let (mut streamer, dir) = streamer("tick", 2, 5);
        streamer.set_position(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(streamer.pending(), 25);

        let first = streamer.nearest_pending(5);
        assert_eq!(first[0], ChunkCoord::new(0, 0));
        assert!(first.iter().all(|c| c.distance_sq(ChunkCoord::new(0, 0)) <= 1));

        assert_eq!(streamer.tick().unwrap(), 5);
        assert_eq!(streamer.pending(), 20);
        assert_eq!(streamer.flush().unwrap(), 20);
        assert_eq!(streamer.tick().unwrap(), 0);
        streamer.wait_idle();

        assert_eq!(streamer.manager().snapshot().loads_dispatched, 25);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unload_cancels_pending_load() {
        let (mut streamer, dir) = streamer("cancel", 1, 4);
        streamer.set_position(ChunkCoord::new(0, 0)).unwrap();
        streamer.set_position(ChunkCoord::new(50, 50)).unwrap();
        streamer.flush().unwrap();
        streamer.wait_idle();

        let stats = streamer.manager().snapshot();
        assert_eq!(stats.loads_cancelled, 9);
        assert_eq!(stats.unloads_dispatched, 0);
        assert_eq!(stats.loads_dispatched, 9);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_clear_releases_every_region() {
        let (mut streamer, dir) = streamer("clear", 2, 8);
        // Straddles the corner of four 64-tile regions.
        streamer.set_position(ChunkCoord::new(4, 4)).unwrap();
        streamer.flush().unwrap();
        streamer.wait_idle();
        assert_eq!(streamer.manager().cache().resident().len(), 4);
        assert_eq!(streamer.manager().cache().refcount(RegionCoord::new(0, 0)), 4);

        streamer.clear().unwrap();
        streamer.wait_idle();
        assert!(streamer.manager().cache().resident().is_empty());
        assert_eq!(streamer.manager().snapshot().regions_evicted, 4);
        fs::remove_dir_all(&dir).ok();
    }
}
