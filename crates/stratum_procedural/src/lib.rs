//! # STRATUM Procedural Generation
//!
//! Layered, deterministic terrain generation with region caching and
//! observer-driven streaming.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed and coordinates, same cells, bit for bit
//! 2. **Pure**: layers hold no seed state; a `GenContext` is passed in
//! 3. **Regional**: the stack runs once per 512×512 region, chunks are slices
//! 4. **Streamable**: the control thread only emits requests, workers do the rest
//!
//! ## Core Components
//!
//! - `Layer` implementations and `GenerationStack`: the pipeline
//! - `RegionStore`: LZ4 region files with checksums
//! - `RegionCache`: reference-counted resident regions
//! - `ChunkWindow`: load/unload events around the observer
//! - `TerrainCacheManager`: sharded workers feeding a `ChunkConsumer`
//! - `TerrainStreamer`: the control-thread front end
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stratum_procedural::{NullConsumer, StratumConfig, TerrainStreamer, WorldSeed};
//!
//! let config = StratumConfig::from_file("stratum.toml")?;
//! let mut streamer =
//!     TerrainStreamer::from_config(&config, WorldSeed::new(42), Arc::new(NullConsumer))?;
//!
//! streamer.set_observer(100.0, 200.0)?;
//! while streamer.tick()? > 0 {}
//! streamer.wait_idle();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod error;
pub mod layer;
pub mod noise;
pub mod region;
pub mod region_store;
pub mod stack;
pub mod stats;
pub mod streamer;
pub mod window;
pub mod worker;

pub use biome::{BiomeSample, BiomeTable};
pub use cache::{open_in, ChunkConsumer, NullConsumer, TerrainCacheManager};
pub use chunk::{ChunkCoord, RegionCoord, CHUNK_SIZE, DEFAULT_REGION_SIZE};
pub use config::StratumConfig;
pub use error::{
    CacheError, CacheResult, ConfigError, ConfigResult, GenResult, GenerationError, StorageError,
    StorageResult, StratumError, StratumResult,
};
pub use layer::{GenContext, Layer, LayerRef, LayerSlot};
pub use noise::ValueNoise;
pub use region::{Eviction, Region, RegionCache, RegionState};
pub use region_store::{decode_region, encode_region, RegionStore};
pub use stack::{GenerationStack, StackBuilder};
pub use stats::{StatsSnapshot, StreamStats};
pub use streamer::TerrainStreamer;
pub use window::{ChunkEvent, ChunkWindow};
pub use worker::{Handler, WorkerPool};

pub use stratum_core::{Biome, CellAttributes, CellGrid, WorldSeed};
