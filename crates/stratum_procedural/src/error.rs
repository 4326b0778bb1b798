//! # Error Types
//!
//! All errors that can occur while configuring, generating, storing and
//! streaming terrain.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::chunk::{ChunkCoord, RegionCoord};

/// Invalid startup configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Rendering distance below 1.
    #[error("rendering distance must be at least 1, got {0}")]
    InvalidRadius(u32),

    /// Region size not a positive multiple of the chunk size.
    #[error("region size must be a positive multiple of {chunk}, got {size}")]
    InvalidRegionSize {
        /// Configured size.
        size: u32,
        /// Chunk size it must divide by.
        chunk: u32,
    },

    /// No workers configured.
    #[error("worker count must be at least 1")]
    NoWorkers,

    /// Zero loads per tick would never make progress.
    #[error("max loads per tick must be at least 1")]
    NoLoadsPerTick,

    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Config text is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Command-line option given without its value.
    #[error("option {0} needs a value")]
    MissingValue(String),

    /// Command-line option value that does not parse.
    #[error("invalid value {value:?} for {option}")]
    InvalidValue {
        /// Option name as typed.
        option: String,
        /// Offending value.
        value: String,
    },

    /// Command-line argument nobody recognises.
    #[error("unknown argument {0}")]
    UnknownArgument(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Generation stack misuse. Signals a wiring bug, never a runtime condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A layer drew randomness from a slot the stack never seeded.
    #[error("layer {layer} drew from unseeded slot {slot}")]
    UnseededLayer {
        /// Layer name.
        layer: &'static str,
        /// Stack slot it asked for.
        slot: usize,
    },

    /// Requested an empty rectangle.
    #[error("invalid evaluation area {width}x{height}")]
    InvalidArea {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
}

/// Result type for generation.
pub type GenResult<T> = Result<T, GenerationError>;

/// Region file failures.
///
/// On load these are treated as a cache miss; on save the region stays
/// resident and is retried later.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem error.
    #[error("region file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// File does not start with the region magic.
    #[error("bad region file magic")]
    BadMagic,

    /// Unknown format version.
    #[error("unsupported region file version {0}")]
    UnsupportedVersion(u16),

    /// File header names a different region than its file name.
    #[error("region file holds {found:?}, expected {expected:?}")]
    KeyMismatch {
        /// Region that was requested.
        expected: RegionCoord,
        /// Region stored in the header.
        found: RegionCoord,
    },

    /// Slab dimensions disagree with the configured region size.
    #[error("region size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// Configured size.
        expected: u32,
        /// Stored size (or decoded cell count).
        found: u32,
    },

    /// Payload CRC does not match.
    #[error("region payload checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// CRC in the header.
        stored: u32,
        /// CRC of the payload read.
        computed: u32,
    },

    /// LZ4 payload is corrupt.
    #[error("region payload failed to decompress: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    /// A packed cell carries an unknown biome id.
    #[error("invalid biome id {0} in region payload")]
    InvalidBiome(u8),
}

/// Result type for region storage.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned to chunk requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Chunk requested from a region that never reached `Loaded`.
    #[error("region {region:?} is not loaded (chunk {chunk:?})")]
    RegionNotLoaded {
        /// Owning region.
        region: RegionCoord,
        /// Requested chunk.
        chunk: ChunkCoord,
    },

    /// The region failed to generate.
    #[error("region {region:?} failed to generate: {source}")]
    Generation {
        /// Region that failed.
        region: RegionCoord,
        /// Underlying error.
        #[source]
        source: GenerationError,
    },

    /// The cache has been shut down.
    #[error("terrain cache is shut down")]
    ShutDown,

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Any error surfaced by the streaming front end.
#[derive(Error, Debug)]
pub enum StratumError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Generation failure.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Result type for the streaming front end.
pub type StratumResult<T> = Result<T, StratumError>;
