//! Root and labelling layers.

use stratum_core::{Area, CellAttributes, CellGrid, MAX_RIVER_LABEL, MIN_RIVER_LABEL, NO_RIVER};

use super::{fill, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// One land cell in this many.
const LAND_ONE_IN: i32 = 10;

/// Root of the stack: sparse random land on ocean.
///
/// The origin cell is always land so a world never spawns in open sea.
pub struct IslandInit {
    slot: LayerSlot,
}

impl IslandInit {
    /// Creates the root layer.
    #[must_use]
    pub const fn new(slot: LayerSlot) -> Self {
        Self { slot }
    }
}

impl Layer for IslandInit {
    fn name(&self) -> &'static str {
        "island_init"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        Ok(fill(ctx, area, |x, z| {
            let land = seed.tile(x, z).chance(LAND_ONE_IN);
            if land || (x == 0 && z == 0) {
                CellAttributes::LAND
            } else {
                CellAttributes::OCEAN
            }
        }))
    }
}

/// Stamps every land cell with a random label in `[2, 300000]`.
///
/// The River layer later draws rivers along label boundaries.
pub struct RiverInit {
    slot: LayerSlot,
    parent: LayerRef,
}

impl RiverInit {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self { slot, parent }
    }
}

impl Layer for RiverInit {
    fn name(&self) -> &'static str {
        "river_init"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let parent = self.parent.generate(ctx, area)?;
        let span = MAX_RIVER_LABEL - MIN_RIVER_LABEL + 1;
        let out = fill(ctx, area, |x, z| {
            let mut cell = *parent.at(x, z);
            cell.river_indicator = if cell.land {
                seed.tile(x, z).next_int(span) + MIN_RIVER_LABEL
            } else {
                NO_RIVER
            };
            cell
        });
        ctx.recycle(parent);
        Ok(out)
    }
}
