//! # Biome Classification
//!
//! Determines the biome of a land cell from its climate.
//!
//! The table is indexed by temperature band (rows) and precipitation band
//! (columns). Values outside the physical range are clamped to the edge
//! bands first.
//!
//! ```text
//!              0-100cm    100-200cm   200-300cm   300-400cm
//! -10..-2 °C   Tundra     Tundra      SnowyTaiga  SnowyTaiga
//!  -2.. 6 °C   Plains     Taiga       Taiga       Taiga
//!   6..14 °C   Plains     Plains      Forest      Swamp
//!  14..22 °C   Savanna    Plains      Forest      Swamp
//!  22..30 °C   Desert     Savanna     Jungle      Jungle
//! ```

use stratum_core::Biome;

/// Lowest temperature in °C.
pub const MIN_TEMPERATURE: f32 = -10.0;
/// Highest temperature in °C.
pub const MAX_TEMPERATURE: f32 = 30.0;
/// Lowest precipitation in cm.
pub const MIN_PRECIPITATION: f32 = 0.0;
/// Highest precipitation in cm.
pub const MAX_PRECIPITATION: f32 = 400.0;

const TEMPERATURE_BANDS: usize = 5;
const PRECIPITATION_BANDS: usize = 4;

const TABLE: [[Biome; PRECIPITATION_BANDS]; TEMPERATURE_BANDS] = [
    [Biome::Tundra, Biome::Tundra, Biome::SnowyTaiga, Biome::SnowyTaiga],
    [Biome::Plains, Biome::Taiga, Biome::Taiga, Biome::Taiga],
    [Biome::Plains, Biome::Plains, Biome::Forest, Biome::Swamp],
    [Biome::Savanna, Biome::Plains, Biome::Forest, Biome::Swamp],
    [Biome::Desert, Biome::Savanna, Biome::Jungle, Biome::Jungle],
];

/// Result of a table lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    /// Table entry.
    pub biome: Biome,
    /// 1 at the center of the climate cell, 0 on a boundary with another band.
    pub intensity: f32,
}

/// Position of a value on one table axis.
struct Band {
    index: usize,
    /// Distance to the nearest interior boundary, 1 = band center.
    closeness: f32,
}

/// Maps `value` into one of `bands` equal bands over `[min, max]`.
///
/// Outer edges of the first and last band are not boundaries: nothing lies
/// beyond them, so those bands stay at full intensity towards the edge.
fn band(value: f32, min: f32, max: f32, bands: usize) -> Band {
    let clamped = value.clamp(min, max);
    let scaled = (clamped - min) / (max - min) * bands as f32;
    let index = (scaled as usize).min(bands - 1);
    let within = scaled - index as f32;

    let to_west = if index == 0 { 1.0 } else { within * 2.0 };
    let to_east = if index == bands - 1 { 1.0 } else { (1.0 - within) * 2.0 };

    Band {
        index,
        closeness: to_west.min(to_east).clamp(0.0, 1.0),
    }
}

/// Biome lookup table.
///
/// Stateless; the climate layer calls [`BiomeTable::classify`] per cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct BiomeTable;

impl BiomeTable {
    /// Looks up the biome for a land cell.
    #[must_use]
    pub fn classify(temperature: f32, precipitation: f32) -> BiomeSample {
        let t = band(temperature, MIN_TEMPERATURE, MAX_TEMPERATURE, TEMPERATURE_BANDS);
        let p = band(
            precipitation,
            MIN_PRECIPITATION,
            MAX_PRECIPITATION,
            PRECIPITATION_BANDS,
        );
        BiomeSample {
            biome: TABLE[t.index][p.index],
            intensity: t.closeness.min(p.closeness),
        }
    }

    /// Biome for an ocean cell.
    #[must_use]
    pub fn ocean(temperature: f32) -> Biome {
        if temperature < 0.0 {
            Biome::FrozenOcean
        } else {
            Biome::Ocean
        }
    }

    /// Biome for a river cell.
    #[must_use]
    pub fn river(temperature: f32) -> Biome {
        if temperature < 0.0 {
            Biome::FrozenRiver
        } else {
            Biome::River
        }
    }
}
