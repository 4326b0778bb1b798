//! Removes single-cell noise left behind by zooms.

use stratum_core::{Area, CellAttributes, CellGrid};

use super::{fill, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// What two cells must share to count as equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothKey {
    /// Full discrete class (land, biome, river, flags).
    Class,
    /// River indicator only.
    River,
}

impl SmoothKey {
    fn eq(self, a: &CellAttributes, b: &CellAttributes) -> bool {
        match self {
            Self::Class => a.same_class(b),
            Self::River => a.river_indicator == b.river_indicator,
        }
    }
}

/// Smoothing pass.
///
/// If west equals east and north equals south, takes one of the two at
/// random; else takes whichever opposite pair agrees; else keeps the cell.
pub struct Smooth {
    slot: LayerSlot,
    key: SmoothKey,
    parent: LayerRef,
}

impl Smooth {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, key: SmoothKey, parent: LayerRef) -> Self {
        Self { slot, key, parent }
    }
}

impl Layer for Smooth {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let parent = self.parent.generate(ctx, area.expand(1))?;
        let key = self.key;

        let out = fill(ctx, area, |x, z| {
            let center = *parent.at(x, z);
            let west = parent.at(x - 1, z);
            let east = parent.at(x + 1, z);
            let north = parent.at(x, z - 1);
            let south = parent.at(x, z + 1);

            match (key.eq(west, east), key.eq(north, south)) {
                (true, true) => seed.tile(x, z).pick2(*west, *north),
                (true, false) => *west,
                (false, true) => *north,
                (false, false) => center,
            }
        });

        ctx.recycle(parent);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn labelled(label: i32) -> CellAttributes {
        CellAttributes {
            river_indicator: label,
            ..CellAttributes::LAND
        }
    }

    #[test]
    fn test_removes_isolated_cell() {
        let parent = upstream(|x, z| labelled(i32::from(x == 0 && z == 0)));
        let grid = Smooth::new(SLOT0, SmoothKey::River, parent)
            .generate(&context(2, 1), Area::new(-3, -3, 7, 7))
            .unwrap();
        assert!(grid.cells().iter().all(|c| c.river_indicator == 0));
    }

    #[test]
    fn test_keeps_cell_without_agreeing_pair() {
        // Every cell has a distinct label.
        let parent = upstream(|x, z| labelled(x * 100 + z));
        let grid = Smooth::new(SLOT0, SmoothKey::Class, parent)
            .generate(&context(2, 1), Area::new(0, 0, 5, 5))
            .unwrap();
        for (x, z, c) in grid.iter() {
            assert_eq!(c.river_indicator, x * 100 + z);
        }
    }

    #[test]
    fn test_single_agreeing_pair_wins() {
        let parent = upstream(|x, z| {
            labelled(match (x, z) {
                (0, 0) => 9,
                (-1 | 1, 0) => 4,
                (0, -1) => 1,
                (0, 1) => 2,
                _ => 50,
            })
        });
        let grid = Smooth::new(SLOT0, SmoothKey::River, parent)
            .generate(&context(2, 1), Area::new(0, 0, 1, 1))
            .unwrap();
        assert_eq!(grid.at(0, 0).river_indicator, 4);
    }

    #[test]
    fn test_both_pairs_pick_one_of_them() {
        // Alternating columns: W == E and N == S everywhere.
        let parent = upstream(|x, _| labelled(5 + (x & 1)));
        let grid = Smooth::new(SLOT0, SmoothKey::River, parent)
            .generate(&context(2, 1), Area::new(0, 0, 6, 6))
            .unwrap();
        let mut flipped = false;
        for (x, _, c) in grid.iter() {
            let west = 5 + ((x - 1) & 1);
            let north = 5 + (x & 1);
            assert!(c.river_indicator == west || c.river_indicator == north);
            flipped |= c.river_indicator == west;
        }
        assert!(flipped);
    }
}
