//! Rivers mixed onto the biome map.

use stratum_core::{Area, CellGrid, RIVER};

use super::{fill, GenContext, Layer, LayerRef, LayerSlot};
use crate::biome::BiomeTable;
use crate::error::GenResult;

/// Height of a river bed.
pub const RIVER_HEIGHT: f32 = -0.05;

/// Carves rivers from the river stack into land on the biome stack.
pub struct RiverMix {
    slot: LayerSlot,
    base: LayerRef,
    filter: LayerRef,
}

impl RiverMix {
    /// Mixes `filter` rivers onto `base`.
    #[must_use]
    pub fn new(slot: LayerSlot, base: LayerRef, filter: LayerRef) -> Self {
        Self { slot, base, filter }
    }
}

impl Layer for RiverMix {
    fn name(&self) -> &'static str {
        "river_mix"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        ctx.seed(self.name(), self.slot)?;
        let base = self.base.generate(ctx, area)?;
        let filter = self.filter.generate(ctx, area)?;

        let out = fill(ctx, area, |x, z| {
            let mut cell = *base.at(x, z);
            if cell.land && filter.at(x, z).is_river() {
                cell.biome = BiomeTable::river(cell.temperature);
                cell.river_indicator = RIVER;
                cell.height = RIVER_HEIGHT;
            }
            cell
        });

        ctx.recycle(base);
        ctx.recycle(filter);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use stratum_core::{Biome, CellAttributes, NO_RIVER};

    #[test]
    fn test_rivers_only_on_land() {
        let base = upstream(|x, _| CellAttributes {
            land: x >= 0,
            biome: if x >= 0 { Biome::Plains } else { Biome::Ocean },
            temperature: if x >= 2 { -3.0 } else { 12.0 },
            ..CellAttributes::OCEAN
        });
        let filter = upstream(|_, _| CellAttributes {
            river_indicator: RIVER,
            ..CellAttributes::LAND
        });
        let grid = RiverMix::new(SLOT0, base, filter)
            .generate(&context(1, 1), Area::new(-2, 0, 5, 1))
            .unwrap();

        assert_eq!(grid.at(-1, 0).biome, Biome::Ocean);
        assert_eq!(grid.at(-1, 0).river_indicator, NO_RIVER);
        assert_eq!(grid.at(0, 0).biome, Biome::River);
        assert!(grid.at(0, 0).is_river());
        assert!((grid.at(0, 0).height - RIVER_HEIGHT).abs() < f32::EPSILON);
        assert_eq!(grid.at(2, 0).biome, Biome::FrozenRiver);
    }

    #[test]
    fn test_no_filter_river_keeps_base() {
        let base = upstream(|_, _| CellAttributes {
            biome: Biome::Desert,
            height: 0.3,
            ..CellAttributes::LAND
        });
        let filter = upstream(|_, _| CellAttributes::LAND);
        let grid = RiverMix::new(SLOT0, base, filter)
            .generate(&context(1, 1), Area::new(0, 0, 4, 4))
            .unwrap();
        assert!(grid.cells().iter().all(|c| c.biome == Biome::Desert && !c.is_river()));
    }
}
