//! # Chunk and Region Coordinates
//!
//! Three coordinate spaces are in play:
//!
//! | Space | Unit | Type |
//! |-------|------|------|
//! | tile | 1 world unit | `i32` pair |
//! | chunk | 16×16 tiles | [`ChunkCoord`] |
//! | region | `region_size`² tiles | [`RegionCoord`] |
//!
//! All conversions floor towards negative infinity, so chunk `-1` lives in
//! region `-1`, never region `0`.

use stratum_core::Area;

/// Chunk size in tiles (X and Z).
pub const CHUNK_SIZE: usize = 16;

/// Default region size in tiles.
pub const DEFAULT_REGION_SIZE: usize = 512;

/// Chunk coordinate in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Z coordinate (in chunks, not tiles).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the tile.
    #[inline]
    #[must_use]
    pub const fn from_tile(tile_x: i32, tile_z: i32) -> Self {
        Self {
            x: tile_x.div_euclid(CHUNK_SIZE as i32),
            z: tile_z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// Chunk an observer at a continuous world position is centered on.
    ///
    /// Rounds `pos / 16` to the nearest integer on each axis.
    #[must_use]
    pub fn from_observer(pos_x: f64, pos_z: f64) -> Self {
        let size = CHUNK_SIZE as f64;
        Self {
            x: (pos_x / size).round() as i32,
            z: (pos_z / size).round() as i32,
        }
    }

    /// World X of the chunk's west edge.
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE as i32
    }

    /// World Z of the chunk's north edge.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE as i32
    }

    /// Tiles covered by this chunk.
    #[inline]
    #[must_use]
    pub const fn area(self) -> Area {
        Area::new(self.world_x(), self.world_z(), CHUNK_SIZE, CHUNK_SIZE)
    }

    /// Region owning this chunk.
    #[inline]
    #[must_use]
    pub const fn region(self, region_size: usize) -> RegionCoord {
        let per_region = (region_size / CHUNK_SIZE) as i32;
        RegionCoord {
            x: self.x.div_euclid(per_region),
            z: self.z.div_euclid(per_region),
        }
    }

    /// Squared distance to another chunk, in chunks.
    #[inline]
    #[must_use]
    pub const fn distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}

/// Region coordinate in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    /// X coordinate (in regions).
    pub x: i32,
    /// Z coordinate (in regions).
    pub z: i32,
}

impl RegionCoord {
    /// Creates a new region coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Offset of the region's first chunk, in chunk units.
    #[inline]
    #[must_use]
    pub const fn chunk_offset(self, region_size: usize) -> ChunkCoord {
        let per_region = (region_size / CHUNK_SIZE) as i32;
        ChunkCoord::new(self.x * per_region, self.z * per_region)
    }

    /// Tiles covered by this region.
    #[inline]
    #[must_use]
    pub const fn area(self, region_size: usize) -> Area {
        let size = region_size as i32;
        Area::new(self.x * size, self.z * size, region_size, region_size)
    }
}
