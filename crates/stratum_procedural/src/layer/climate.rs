//! # Climate
//!
//! Assigns temperature, precipitation, base height and biome.
//!
//! Temperature, precipitation and height are three independent value noise
//! fields seeded from this layer's world-layer seed. They are continuous
//! across the whole world, so neighbouring regions agree at their seams.

use stratum_core::{mix_round, Area, CellGrid};

use super::{fill, GenContext, Layer, LayerRef, LayerSlot};
use crate::biome::{
    BiomeTable, MAX_PRECIPITATION, MAX_TEMPERATURE, MIN_PRECIPITATION, MIN_TEMPERATURE,
};
use crate::error::GenResult;
use crate::noise::ValueNoise;

/// Input cells per noise lattice step.
pub const CLIMATE_SCALE: f64 = 8.0;

const LAND_BASE_HEIGHT: f32 = 0.1;
const OCEAN_BASE_HEIGHT: f32 = -0.6;
const HEIGHT_RANGE: f32 = 0.5;

/// Climate and biome assignment.
pub struct Climate {
    slot: LayerSlot,
    parent: LayerRef,
}

impl Climate {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self { slot, parent }
    }
}

impl Layer for Climate {
    fn name(&self) -> &'static str {
        "climate"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?.value();
        let temperature = ValueNoise::new(seed);
        let precipitation = ValueNoise::new(mix_round(seed, 1));
        let height = ValueNoise::new(mix_round(seed, 2));

        let parent = self.parent.generate(ctx, area)?;
        let out = fill(ctx, area, |x, z| {
            let (sx, sz) = (f64::from(x) / CLIMATE_SCALE, f64::from(z) / CLIMATE_SCALE);
            let n_t = temperature.sample(sx, sz) as f32;
            let n_p = precipitation.sample(sx, sz) as f32;
            let n_h = height.sample(sx, sz) as f32;

            let mut cell = *parent.at(x, z);
            cell.temperature = MIN_TEMPERATURE + (MAX_TEMPERATURE - MIN_TEMPERATURE) * n_t;
            cell.precipitation = MIN_PRECIPITATION + (MAX_PRECIPITATION - MIN_PRECIPITATION) * n_p;

            if cell.land {
                let sample = BiomeTable::classify(cell.temperature, cell.precipitation);
                cell.biome = sample.biome;
                cell.biome_intensity = sample.intensity;
                cell.height = LAND_BASE_HEIGHT + HEIGHT_RANGE * n_h;
            } else {
                cell.biome = BiomeTable::ocean(cell.temperature);
                cell.biome_intensity = 1.0;
                cell.height = OCEAN_BASE_HEIGHT + HEIGHT_RANGE * n_h;
            }
            cell
        });

        ctx.recycle(parent);
        Ok(out)
    }
}
