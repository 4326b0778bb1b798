//! Hills mixed in from the river label stack.

use stratum_core::{Area, CellGrid, MIN_RIVER_LABEL};

use super::{fill, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// Height added to a hill.
pub const HILL_HEIGHT: f32 = 0.35;

/// Labels in this residue class always raise a hill.
const HILL_PERIOD: i32 = 29;

/// Otherwise a labelled cell is a hill one time in this many.
const HILL_ONE_IN: i32 = 3;

/// Raises hills on land using a parallel label map as a filter.
///
/// The filter is River Init zoomed to this layer's resolution; its labels
/// give hills the same blob shapes rivers are traced around.
pub struct HillsMix {
    slot: LayerSlot,
    base: LayerRef,
    filter: LayerRef,
}

impl HillsMix {
    /// Mixes `filter` labels onto `base`.
    #[must_use]
    pub fn new(slot: LayerSlot, base: LayerRef, filter: LayerRef) -> Self {
        Self { slot, base, filter }
    }
}

impl Layer for HillsMix {
    fn name(&self) -> &'static str {
        "hills_mix"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let base = self.base.generate(ctx, area)?;
        let filter = self.filter.generate(ctx, area)?;

        let out = fill(ctx, area, |x, z| {
            let mut cell = *base.at(x, z);
            let label = filter.at(x, z).river_indicator;
            if !cell.land || cell.is_river() || !cell.biome.allows_hills() {
                return cell;
            }
            if label < MIN_RIVER_LABEL {
                return cell;
            }

            let special = (label - MIN_RIVER_LABEL) % HILL_PERIOD == 1;
            if special || seed.tile(x, z).chance(HILL_ONE_IN) {
                cell.is_hill = true;
                cell.height += HILL_HEIGHT;
            }
            cell
        });

        ctx.recycle(base);
        ctx.recycle(filter);
        Ok(out)
    }
}
