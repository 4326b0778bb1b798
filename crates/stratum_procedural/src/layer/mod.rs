//! # Transform Layers
//!
//! Each layer turns one (or, for mixers, two) upstream map-producing
//! functions into a new one. A layer is asked for an [`Area`], asks its
//! parents for that area plus whatever halo its neighbour rules need, and
//! returns a grid covering exactly the requested area.
//!
//! ## Purity
//!
//! Layers hold no per-world state. Everything seed-dependent lives in the
//! [`GenContext`] passed to [`Layer::generate`], built once per world seed
//! by the stack. The same layer objects can therefore generate any number
//! of regions, for any number of worlds, on any number of threads at once.
//!
//! ## Draw Order
//!
//! Every cell's random draws come from its own [`TileRng`], seeded from
//! `(world, layer slot, x, z)`. Cells never share a stream, so the order
//! in which a layer visits cells does not matter.
//!
//! [`TileRng`]: stratum_core::TileRng

use std::sync::Arc;

use stratum_core::{Area, CellAttributes, CellGrid, GridPool, WorldLayerSeed, WorldSeed};

use crate::error::{GenResult, GenerationError};

mod climate;
mod hills;
mod init;
mod island;
mod mix;
mod river;
mod shore;
mod smooth;
mod voronoi;
mod zoom;

pub use climate::{Climate, CLIMATE_SCALE};
pub use hills::{HillsMix, HILL_HEIGHT};
pub use init::{IslandInit, RiverInit};
pub use island::AddIsland;
pub use mix::{RiverMix, RIVER_HEIGHT};
pub use river::{fold_label, River};
pub use shore::{Shore, SHORE_HEIGHT};
pub use smooth::{Smooth, SmoothKey};
pub use voronoi::VoronoiZoom;
pub use zoom::{Zoom, ZoomMode};

/// Shared handle to an upstream layer.
pub type LayerRef = Arc<dyn Layer>;

/// A stage of the generation pipeline.
pub trait Layer: Send + Sync {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// Produces the cells of `area`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::UnseededLayer`] if the context has no
    /// seed for this layer's slot (a wiring bug).
    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid>;
}

/// A layer's position in its stack, plus its fixed base seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSlot {
    /// Index into the context's seed table.
    pub index: usize,
    /// Base seed assigned at construction.
    pub base: i64,
}

/// Immutable per-world generation context.
///
/// Holds the world-layer seed of every slot in the stack, derived once from
/// the world seed.
#[derive(Clone, Debug)]
pub struct GenContext {
    world: WorldSeed,
    seeds: Vec<WorldLayerSeed>,
    pool: Option<Arc<GridPool>>,
}

impl GenContext {
    /// Derives the seed table for the given slot base seeds.
    #[must_use]
    pub fn new(world: WorldSeed, bases: &[i64]) -> Self {
        Self {
            world,
            seeds: bases
                .iter()
                .map(|&base| WorldLayerSeed::derive(base, world))
                .collect(),
            pool: None,
        }
    }

    /// Lets layers recycle scratch grids through `pool`.
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<GridPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// World seed this context was built for.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> WorldSeed {
        self.world
    }

    /// Number of seeded slots.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> usize {
        self.seeds.len()
    }

    /// World-layer seed of a slot.
    ///
    /// # Errors
    ///
    /// Fails fast if the slot was never seeded.
    #[inline]
    pub fn seed(&self, layer: &'static str, slot: LayerSlot) -> GenResult<WorldLayerSeed> {
        self.seeds
            .get(slot.index)
            .copied()
            .ok_or(GenerationError::UnseededLayer {
                layer,
                slot: slot.index,
            })
    }

    /// Allocates an output grid, reusing a pooled buffer if available.
    #[must_use]
    pub fn alloc(&self, area: Area) -> CellGrid {
        match &self.pool {
            Some(pool) => pool.acquire(area),
            None => CellGrid::new(area),
        }
    }

    /// Hands a finished scratch grid back.
    pub fn recycle(&self, grid: CellGrid) {
        if let Some(pool) = &self.pool {
            pool.release(grid);
        }
    }
}

/// Allocates a grid for `area` and fills it cell by cell.
pub(crate) fn fill(
    ctx: &GenContext,
    area: Area,
    mut f: impl FnMut(i32, i32) -> CellAttributes,
) -> CellGrid {
    let mut out = ctx.alloc(area);
    let cells = out.cells_mut();
    let mut i = 0;
    for z in area.z..area.end_z() {
        for x in area.x..area.end_x() {
            cells[i] = f(x, z);
            i += 1;
        }
    }
    out
}

/// The four direct neighbours of `(x, z)` in draw order: N, E, S, W.
#[inline]
pub(crate) fn neighbours4(grid: &CellGrid, x: i32, z: i32) -> [&CellAttributes; 4] {
    [
        grid.at(x, z - 1),
        grid.at(x + 1, z),
        grid.at(x, z + 1),
        grid.at(x - 1, z),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixed upstream maps for layer tests.

    use super::*;

    /// Upstream layer defined by a function of world coordinates.
    pub struct FnLayer<F>(pub F);

    impl<F> Layer for FnLayer<F>
    where
        F: Fn(i32, i32) -> CellAttributes + Send + Sync,
    {
        fn name(&self) -> &'static str {
            "fn"
        }

        fn generate(&self, _ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
            Ok(CellGrid::from_fn(area, &self.0))
        }
    }

    /// Wraps a closure as a shared layer.
    pub fn upstream<F>(f: F) -> LayerRef
    where
        F: Fn(i32, i32) -> CellAttributes + Send + Sync + 'static,
    {
        Arc::new(FnLayer(f))
    }

    /// Context with slots `0..n` seeded from base seeds `1..=n`.
    pub fn context(world: i64, n: usize) -> GenContext {
        let bases: Vec<i64> = (1..=n as i64).collect();
        GenContext::new(WorldSeed::new(world), &bases)
    }

    /// Slot 0 with base seed 1.
    pub const SLOT0: LayerSlot = LayerSlot { index: 0, base: 1 };
}
