//! # Region Storage
//!
//! One file per region, keyed by region coordinate.
//!
//! ## File Format
//!
//! ```text
//! [4 bytes: magic "SRGN"]
//! [2 bytes: version (u16 LE)]
//! [2 bytes: reserved, zero]
//! [4 bytes: region x (i32 LE)]
//! [4 bytes: region z (i32 LE)]
//! [4 bytes: region size in tiles (u32 LE)]
//! [4 bytes: payload length (u32 LE)]
//! [4 bytes: CRC32 of payload]
//! [payload: LZ4 block, size-prepended, of size² packed 24-byte cells]
//! ```
//!
//! Cells are stored row-major exactly as [`PackedCell`], so a round trip
//! preserves every float bit.
//!
//! ## Atomicity
//!
//! A save writes `<name>.tmp`, syncs it and renames it over the old file.
//! A crash leaves either the old or the new region, never a torn one. The
//! cache guarantees a single writer per key, so temp names never collide.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use stratum_core::{CellGrid, GridPool, PackedCell};

use crate::chunk::RegionCoord;
use crate::error::{StorageError, StorageResult};

/// Magic bytes at the start of every region file.
const REGION_MAGIC: &[u8; 4] = b"SRGN";

/// Current format version.
const REGION_VERSION: u16 = 1;

/// Header length in bytes.
const HEADER_LEN: usize = 28;

/// Reads a little-endian `u32` at `at`. Caller checks bounds.
fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Serializes a region slab.
#[must_use]
pub fn encode_region(coord: RegionCoord, grid: &CellGrid) -> Vec<u8> {
    let packed: Vec<PackedCell> = grid.cells().iter().map(|c| c.pack()).collect();
    let payload = compress_prepend_size(bytemuck::cast_slice(&packed));

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(REGION_MAGIC);
    out.extend_from_slice(&REGION_VERSION.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&coord.x.to_le_bytes());
    out.extend_from_slice(&coord.z.to_le_bytes());
    out.extend_from_slice(&(grid.width() as u32).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Deserializes a region slab, validating it against `coord` and `size`.
///
/// # Errors
///
/// Any header, checksum, size or biome mismatch.
pub fn decode_region(
    bytes: &[u8],
    coord: RegionCoord,
    size: usize,
    pool: &GridPool,
) -> StorageResult<CellGrid> {
    if bytes.len() < HEADER_LEN || &bytes[0..4] != REGION_MAGIC {
        return Err(StorageError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != REGION_VERSION {
        return Err(StorageError::UnsupportedVersion(version));
    }

    let found = RegionCoord::new(u32_at(bytes, 8) as i32, u32_at(bytes, 12) as i32);
    if found != coord {
        return Err(StorageError::KeyMismatch {
            expected: coord,
            found,
        });
    }

    let stored_size = u32_at(bytes, 16);
    if stored_size as usize != size {
        return Err(StorageError::SizeMismatch {
            expected: size as u32,
            found: stored_size,
        });
    }

    let payload_len = u32_at(bytes, 20) as usize;
    let payload = bytes
        .get(HEADER_LEN..HEADER_LEN + payload_len)
        .ok_or(StorageError::SizeMismatch {
            expected: payload_len as u32,
            found: (bytes.len() - HEADER_LEN) as u32,
        })?;

    let stored = u32_at(bytes, 24);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(StorageError::ChecksumMismatch { stored, computed });
    }

    let raw = decompress_size_prepended(payload)?;
    let cells = size * size;
    if raw.len() != cells * PackedCell::SIZE {
        return Err(StorageError::SizeMismatch {
            expected: cells as u32,
            found: (raw.len() / PackedCell::SIZE) as u32,
        });
    }

    let mut grid = pool.acquire(coord.area(size));
    for (slot, bytes) in grid
        .cells_mut()
        .iter_mut()
        .zip(raw.chunks_exact(PackedCell::SIZE))
    {
        // The decompressed buffer carries no alignment guarantee.
        let packed: PackedCell = bytemuck::pod_read_unaligned(bytes);
        *slot = packed
            .unpack()
            .ok_or(StorageError::InvalidBiome(packed.biome))?;
    }
    Ok(grid)
}

/// Directory of region files.
#[derive(Clone, Debug)]
pub struct RegionStore {
    dir: PathBuf,
    region_size: usize,
}

impl RegionStore {
    /// Opens (creating if needed) a store in `dir`.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>, region_size: usize) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, region_size })
    }

    /// Storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Region size in tiles.
    #[must_use]
    pub const fn region_size(&self) -> usize {
        self.region_size
    }

    /// File holding `coord`.
    #[must_use]
    pub fn path(&self, coord: RegionCoord) -> PathBuf {
        self.dir.join(format!("r.{}.{}.srgn", coord.x, coord.z))
    }

    /// Returns true if a file exists for `coord`.
    #[must_use]
    pub fn contains(&self, coord: RegionCoord) -> bool {
        self.path(coord).is_file()
    }

    /// Loads a region. `Ok(None)` if it was never saved.
    ///
    /// # Errors
    ///
    /// I/O errors other than "not found", and any decode error.
    pub fn load(&self, coord: RegionCoord, pool: &GridPool) -> StorageResult<Option<CellGrid>> {
        let bytes = match fs::read(self.path(coord)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_region(&bytes, coord, self.region_size, pool).map(Some)
    }

    /// Saves a region, replacing any previous file atomically.
    ///
    /// # Errors
    ///
    /// Any I/O error; the previous file (if any) is left intact.
    pub fn save(&self, coord: RegionCoord, grid: &CellGrid) -> StorageResult<()> {
        if grid.width() != self.region_size || grid.height() != self.region_size {
            return Err(StorageError::SizeMismatch {
                expected: self.region_size as u32,
                found: grid.width() as u32,
            });
        }

        let bytes = encode_region(coord, grid);
        let path = self.path(coord);
        let tmp = path.with_extension("srgn.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
