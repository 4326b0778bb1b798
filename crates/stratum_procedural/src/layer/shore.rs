//! Coastlines.

use stratum_core::{Area, Biome, CellGrid};

use super::{fill, neighbours4, GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// Height of a beach cell.
pub const SHORE_HEIGHT: f32 = 0.02;

/// Marks land cells touching ocean as shore, turning most into beach.
pub struct Shore {
    slot: LayerSlot,
    parent: LayerRef,
}

impl Shore {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self { slot, parent }
    }
}

impl Layer for Shore {
    fn name(&self) -> &'static str {
        "shore"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        ctx.seed(self.name(), self.slot)?;
        let parent = self.parent.generate(ctx, area.expand(1))?;

        let out = fill(ctx, area, |x, z| {
            let mut cell = *parent.at(x, z);
            if cell.land && neighbours4(&parent, x, z).iter().any(|n| n.is_ocean()) {
                cell.is_shore = true;
                if !cell.biome.keeps_coast() {
                    cell.biome = Biome::Beach;
                    cell.height = SHORE_HEIGHT;
                }
            }
            cell
        });

        ctx.recycle(parent);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use stratum_core::CellAttributes;

    fn coast(biome: Biome) -> LayerRef {
        upstream(move |x, _| {
            if x < 0 {
                CellAttributes {
                    biome: Biome::Ocean,
                    ..CellAttributes::OCEAN
                }
            } else {
                CellAttributes {
                    biome,
                    height: 0.4,
                    ..CellAttributes::LAND
                }
            }
        })
    }

    #[test]
    fn test_coast_becomes_beach() {
        let grid = Shore::new(SLOT0, coast(Biome::Plains))
            .generate(&context(1, 1), Area::new(-2, 0, 5, 3))
            .unwrap();
        for (x, _, c) in grid.iter() {
            match x {
                0 => {
                    assert!(c.is_shore);
                    assert_eq!(c.biome, Biome::Beach);
                    assert!((c.height - SHORE_HEIGHT).abs() < f32::EPSILON);
                }
                1 | 2 => {
                    assert!(!c.is_shore);
                    assert_eq!(c.biome, Biome::Plains);
                }
                _ => assert!(!c.is_shore && c.is_ocean()),
            }
        }
    }

    #[test]
    fn test_coast_keeping_biomes_stay() {
        for biome in [Biome::SnowyTaiga, Biome::Tundra, Biome::Swamp] {
            let grid = Shore::new(SLOT0, coast(biome))
                .generate(&context(1, 1), Area::new(0, 0, 1, 1))
                .unwrap();
            let c = grid.at(0, 0);
            assert!(c.is_shore);
            assert_eq!(c.biome, biome);
            assert!((c.height - 0.4).abs() < f32::EPSILON);
        }
    }
}
