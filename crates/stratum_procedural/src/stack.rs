//! # Generation Stack
//!
//! Wires layers into a pipeline and exposes the pure entry point
//! `evaluate(world_seed, x, z, width, height)`.
//!
//! ## Standard Stack
//!
//! ```text
//!                      IslandInit(1)
//!                            │ FuzzyZoom(2000), AddIsland(1), Zoom(2001),
//!                            │ AddIsland(2), AddIsland(50, erosion), Zoom(2002),
//!                            │ AddIsland(3)
//!            ┌───────────────┼────────────────┐
//!      RiverInit(100)   RiverInit(100)    Climate(200)
//!   Zoom(1000..=1003)   Zoom(1000,1001)   Zoom(1000,1001)
//!        River(1)             └──filter──> HillsMix(1000)
//!     Smooth(1000)                        Zoom(1002), Shore(1000),
//!            │                            Zoom(1003), Smooth(1000)
//!            └───────────filter──────────> RiverMix(100)
//!                                          VoronoiZoom(10)
//! ```
//!
//! Three zooms on the trunk, four per branch and the ×4 Voronoi zoom make
//! one root cell 512 tiles wide.

use std::sync::Arc;

use stratum_core::{Area, CellGrid, GridPool, WorldSeed};

use crate::error::{GenResult, GenerationError};
use crate::layer::{
    AddIsland, Climate, GenContext, HillsMix, IslandInit, LayerRef, LayerSlot, River, RiverInit,
    RiverMix, Shore, Smooth, SmoothKey, VoronoiZoom, Zoom,
};

/// Erosion rate of the eroding island pass.
const EROSION_ONE_IN: i32 = 100;

/// Assigns stack slots while layers are being wired.
#[derive(Debug, Default)]
pub struct StackBuilder {
    bases: Vec<i64>,
}

impl StackBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer with the given base seed.
    pub fn slot(&mut self, base: i64) -> LayerSlot {
        self.bases.push(base);
        LayerSlot {
            index: self.bases.len() - 1,
            base,
        }
    }

    /// Majority zoom repeated once per base seed.
    pub fn zooms(&mut self, mut parent: LayerRef, bases: &[i64]) -> LayerRef {
        for &base in bases {
            parent = Arc::new(Zoom::new(self.slot(base), parent));
        }
        parent
    }

    /// Finishes the stack with `root` as its output layer.
    #[must_use]
    pub fn finish(self, root: LayerRef) -> GenerationStack {
        GenerationStack {
            root,
            bases: self.bases,
            pool: None,
        }
    }
}

/// An ordered chain of layers with a single output.
///
/// Holds no seed state: every call derives (or is handed) a [`GenContext`],
/// so one stack can serve any number of concurrent generations.
#[derive(Clone)]
pub struct GenerationStack {
    root: LayerRef,
    bases: Vec<i64>,
    pool: Option<Arc<GridPool>>,
}

impl GenerationStack {
    /// The standard world pipeline.
    #[must_use]
    pub fn standard() -> Self {
        let mut b = StackBuilder::new();

        let mut trunk: LayerRef = Arc::new(IslandInit::new(b.slot(1)));
        trunk = Arc::new(Zoom::fuzzy(b.slot(2000), trunk));
        trunk = Arc::new(AddIsland::new(b.slot(1), trunk));
        trunk = Arc::new(Zoom::new(b.slot(2001), trunk));
        trunk = Arc::new(AddIsland::new(b.slot(2), trunk));
        trunk = Arc::new(AddIsland::eroding(b.slot(50), EROSION_ONE_IN, trunk));
        trunk = Arc::new(Zoom::new(b.slot(2002), trunk));
        trunk = Arc::new(AddIsland::new(b.slot(3), trunk));

        let river_labels: LayerRef = Arc::new(RiverInit::new(b.slot(100), Arc::clone(&trunk)));
        let river_labels = b.zooms(river_labels, &[1000, 1001, 1002, 1003]);
        let rivers: LayerRef = Arc::new(River::new(b.slot(1), river_labels));
        let rivers: LayerRef = Arc::new(Smooth::new(b.slot(1000), SmoothKey::River, rivers));

        let hill_labels: LayerRef = Arc::new(RiverInit::new(b.slot(100), Arc::clone(&trunk)));
        let hill_labels = b.zooms(hill_labels, &[1000, 1001]);

        let biomes: LayerRef = Arc::new(Climate::new(b.slot(200), trunk));
        let biomes = b.zooms(biomes, &[1000, 1001]);
        let biomes: LayerRef = Arc::new(HillsMix::new(b.slot(1000), biomes, hill_labels));
        let biomes = b.zooms(biomes, &[1002]);
        let biomes: LayerRef = Arc::new(Shore::new(b.slot(1000), biomes));
        let biomes = b.zooms(biomes, &[1003]);
        let biomes: LayerRef = Arc::new(Smooth::new(b.slot(1000), SmoothKey::Class, biomes));

        let mixed: LayerRef = Arc::new(RiverMix::new(b.slot(100), biomes, rivers));
        let output: LayerRef = Arc::new(VoronoiZoom::new(b.slot(10), mixed));

        b.finish(output)
    }

    /// Recycles intermediate grids through `pool`.
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<GridPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Number of layer slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.bases.len()
    }

    /// Derives the seed of every slot for `world`.
    #[must_use]
    pub fn initialize(&self, world: WorldSeed) -> GenContext {
        let ctx = GenContext::new(world, &self.bases);
        match &self.pool {
            Some(pool) => ctx.with_pool(Arc::clone(pool)),
            None => ctx,
        }
    }

    /// Generates `area` with a prepared context.
    ///
    /// # Errors
    ///
    /// Fails on an empty area or if `ctx` was built for a different stack.
    pub fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        if area.is_empty() {
            return Err(GenerationError::InvalidArea {
                width: area.width,
                height: area.height,
            });
        }
        self.root.generate(ctx, area)
    }

    /// Pure entry point: the cells of a rectangle of `world`.
    ///
    /// # Errors
    ///
    /// Fails on an empty area.
    pub fn evaluate(
        &self,
        world: WorldSeed,
        x: i32,
        z: i32,
        width: usize,
        height: usize,
    ) -> GenResult<CellGrid> {
        self.generate(&self.initialize(world), Area::new(x, z, width, height))
    }
}

impl Default for GenerationStack {
    fn default() -> Self {
        Self::standard()
    }
}
