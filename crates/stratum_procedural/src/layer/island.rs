//! Island growth and erosion.

use stratum_core::{Area, CellAttributes, CellGrid};

use super::{fill, neighbours4, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// Chance (one in N) that a blended boundary cell keeps the blend.
const BLEND_ONE_IN: i32 = 3;

/// Grows land into ocean along coastlines, optionally eroding interior land.
///
/// Per cell, with draws in this order:
/// 1. If the cell and its four neighbours all agree, there is no coastline;
///    land may erode to ocean (one in `erosion`).
/// 2. Otherwise land neighbours are visited N, E, S, W; the k-th one
///    replaces the running pick with probability `1/k`.
/// 3. One in three the pick is kept, else the cell stays as it was.
pub struct AddIsland {
    slot: LayerSlot,
    erosion: Option<i32>,
    parent: LayerRef,
}

impl AddIsland {
    /// Growth only.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self {
            slot,
            erosion: None,
            parent,
        }
    }

    /// Growth plus erosion of interior land, one cell in `one_in`.
    #[must_use]
    pub fn eroding(slot: LayerSlot, one_in: i32, parent: LayerRef) -> Self {
        Self {
            slot,
            erosion: Some(one_in),
            parent,
        }
    }
}

impl Layer for AddIsland {
    fn name(&self) -> &'static str {
        "add_island"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let parent = self.parent.generate(ctx, area.expand(1))?;

        let out = fill(ctx, area, |x, z| {
            let center = *parent.at(x, z);
            let around = neighbours4(&parent, x, z);
            let mut rng = seed.tile(x, z);

            if around.iter().all(|n| n.land == center.land) {
                return match self.erosion {
                    Some(one_in) if center.land && rng.chance(one_in) => CellAttributes {
                        land: false,
                        ..center
                    },
                    _ => center,
                };
            }

            let mut pick = center;
            let mut seen = 1;
            for n in around.into_iter().filter(|n| n.land) {
                if rng.next_int(seen) == 0 {
                    pick = *n;
                }
                seen += 1;
            }

            if rng.chance(BLEND_ONE_IN) {
                pick
            } else {
                center
            }
        });

        ctx.recycle(parent);
        Ok(out)
    }
}
