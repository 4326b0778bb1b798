//! River edge detection.
//!
//! Rivers are not traced paths. River Init stamps random labels on land and
//! the zooms spread them into blobs; a river runs wherever two blobs of
//! different label parity meet.

use stratum_core::{Area, Biome, CellGrid, MIN_RIVER_LABEL, NO_RIVER, RIVER};

use super::{fill, neighbours4, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// Folds a river indicator: labels become 2 or 3 by parity, 0 and 1 pass
/// through.
#[inline]
#[must_use]
pub const fn fold_label(indicator: i32) -> i32 {
    if indicator >= MIN_RIVER_LABEL {
        MIN_RIVER_LABEL + (indicator & 1)
    } else {
        indicator
    }
}

/// Marks label boundaries as rivers.
///
/// Draws no randomness; the slot is still checked so a miswired stack is
/// caught here like anywhere else.
pub struct River {
    slot: LayerSlot,
    parent: LayerRef,
}

impl River {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self { slot, parent }
    }
}

impl Layer for River {
    fn name(&self) -> &'static str {
        "river"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        ctx.seed(self.name(), self.slot)?;
        let parent = self.parent.generate(ctx, area.expand(1))?;

        let out = fill(ctx, area, |x, z| {
            let mut cell = *parent.at(x, z);
            let own = fold_label(cell.river_indicator);
            let edge = neighbours4(&parent, x, z)
                .iter()
                .any(|n| fold_label(n.river_indicator) != own);

            if edge {
                cell.river_indicator = RIVER;
                cell.biome = Biome::River;
            } else {
                cell.river_indicator = NO_RIVER;
            }
            cell
        });

        ctx.recycle(parent);
        Ok(out)
    }
}
