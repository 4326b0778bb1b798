//! # STRATUM Core
//!
//! The data model shared by every stage of world generation:
//! - `CellAttributes`: the per-tile value (land, climate, biome, rivers)
//! - `CellGrid` / `Area`: rectangles of cells at world coordinates
//! - `WorldSeed` / `LayerSeed` / `TileRng`: the seed mixer
//! - `GridPool`: recycled cell buffers
//!
//! ## Architecture Rules
//!
//! 1. **Values, not references** - cells are `Copy`, grids own their cells
//! 2. **No hidden randomness** - every random draw goes through `TileRng`
//! 3. **Bit-exact** - the seed mixer is part of the world format
//!
//! ## Example
//!
//! ```rust,ignore
//! use stratum_core::{WorldLayerSeed, WorldSeed};
//!
//! let layer = WorldLayerSeed::derive(2001, WorldSeed::new(42));
//! let mut rng = layer.tile(10, -4);
//! let coin = rng.next_int(2);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cell;
pub mod grid;
pub mod pool;
pub mod seed;

pub use cell::{
    Biome, CellAttributes, PackedCell, MAX_RIVER_LABEL, MIN_RIVER_LABEL, NO_RIVER, RIVER,
};
pub use grid::{Area, CellGrid};
pub use pool::{GridPool, PoolStats};
pub use seed::{mix_round, LayerSeed, TileRng, WorldLayerSeed, WorldSeed};
