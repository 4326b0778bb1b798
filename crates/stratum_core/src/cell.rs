//! # Cell Attributes
//!
//! The per-tile value threaded through every generation layer.
//!
//! Cells are plain values: layers copy them, never share them. Fields that
//! a layer does not own are carried through untouched, so an early layer
//! (land/ocean) and a late one (rivers) can both work on the same type.
//!
//! ## Field Ownership
//!
//! | Field | Written by |
//! |-------|------------|
//! | `land` | island layers |
//! | `temperature`, `precipitation`, `biome`, `biome_intensity` | climate |
//! | `river_indicator` | river init, river, river mix |
//! | `is_hill` | hills mix |
//! | `is_shore` | shore |
//! | `height` | climate, then adjusted by hills, shore and river mix |

use bytemuck::{Pod, Zeroable};

/// Biome ids.
///
/// `Unset` is the default: every layer before climate must tolerate it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// No biome assigned yet.
    #[default]
    Unset = 0,
    /// Open ocean.
    Ocean = 1,
    /// Ocean below freezing.
    FrozenOcean = 2,
    /// Sand strip between land and ocean.
    Beach = 3,
    /// Hot and dry.
    Desert = 4,
    /// Hot grassland.
    Savanna = 5,
    /// Temperate grassland.
    Plains = 6,
    /// Temperate forest.
    Forest = 7,
    /// Wet lowland.
    Swamp = 8,
    /// Cold forest.
    Taiga = 9,
    /// Frozen forest.
    SnowyTaiga = 10,
    /// Frozen plain.
    Tundra = 11,
    /// Hot and wet.
    Jungle = 12,
    /// River channel.
    River = 13,
    /// River channel below freezing.
    FrozenRiver = 14,
}

impl Biome {
    /// Every biome id, in id order.
    pub const ALL: [Self; 15] = [
        Self::Unset,
        Self::Ocean,
        Self::FrozenOcean,
        Self::Beach,
        Self::Desert,
        Self::Savanna,
        Self::Plains,
        Self::Forest,
        Self::Swamp,
        Self::Taiga,
        Self::SnowyTaiga,
        Self::Tundra,
        Self::Jungle,
        Self::River,
        Self::FrozenRiver,
    ];

    /// Converts from u8. Unknown ids are rejected.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ALL.len() {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns true for the two ocean biomes.
    #[inline]
    #[must_use]
    pub const fn is_ocean(self) -> bool {
        matches!(self, Self::Ocean | Self::FrozenOcean)
    }

    /// Returns true for the two river biomes.
    #[inline]
    #[must_use]
    pub const fn is_river(self) -> bool {
        matches!(self, Self::River | Self::FrozenRiver)
    }

    /// Returns whether the hills pass may raise this biome.
    #[must_use]
    pub const fn allows_hills(self) -> bool {
        matches!(
            self,
            Self::Desert
                | Self::Savanna
                | Self::Plains
                | Self::Forest
                | Self::Taiga
                | Self::SnowyTaiga
                | Self::Tundra
                | Self::Jungle
        )
    }

    /// Returns whether a coastline keeps this biome instead of turning to beach.
    #[must_use]
    pub const fn keeps_coast(self) -> bool {
        matches!(self, Self::SnowyTaiga | Self::Tundra | Self::Swamp)
    }
}

/// River indicator value for "no river".
pub const NO_RIVER: i32 = 0;

/// River indicator value for a river cell.
pub const RIVER: i32 = 1;

/// Smallest random river label.
pub const MIN_RIVER_LABEL: i32 = 2;

/// Largest random river label.
pub const MAX_RIVER_LABEL: i32 = 300_000;

/// Attributes of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellAttributes {
    /// Terrain height (ocean floor negative, land positive).
    pub height: f32,
    /// Land or ocean.
    pub land: bool,
    /// Temperature in °C, within [-10, 30].
    pub temperature: f32,
    /// Yearly precipitation in cm, within [0, 400].
    pub precipitation: f32,
    /// Biome id. Meaningless before the climate layer ran.
    pub biome: Biome,
    /// 1 at a biome's climatic center, 0 at its boundary.
    pub biome_intensity: f32,
    /// 0 = no river, 1 = river, >= 2 = random river label.
    pub river_indicator: i32,
    /// Raised by the hills pass.
    pub is_hill: bool,
    /// Coastline cell.
    pub is_shore: bool,
}

impl CellAttributes {
    /// An ocean cell with every other field unset.
    pub const OCEAN: Self = Self {
        height: 0.0,
        land: false,
        temperature: 0.0,
        precipitation: 0.0,
        biome: Biome::Unset,
        biome_intensity: 0.0,
        river_indicator: NO_RIVER,
        is_hill: false,
        is_shore: false,
    };

    /// A land cell with every other field unset.
    pub const LAND: Self = Self {
        land: true,
        ..Self::OCEAN
    };

    /// Returns true if this is ocean.
    #[inline]
    #[must_use]
    pub const fn is_ocean(&self) -> bool {
        !self.land
    }

    /// Returns true if the river passes mark this cell as a river.
    #[inline]
    #[must_use]
    pub const fn is_river(&self) -> bool {
        self.river_indicator == RIVER
    }

    /// Discrete class used by zoom and smoothing to decide whether two
    /// cells "agree". Continuous fields (height, climate) are ignored.
    #[inline]
    #[must_use]
    pub fn same_class(&self, other: &Self) -> bool {
        self.land == other.land
            && self.biome == other.biome
            && self.river_indicator == other.river_indicator
            && self.is_hill == other.is_hill
            && self.is_shore == other.is_shore
    }

    /// Packs the cell for storage.
    #[must_use]
    pub fn pack(&self) -> PackedCell {
        let mut flags = 0u8;
        if self.land {
            flags |= PackedCell::FLAG_LAND;
        }
        if self.is_hill {
            flags |= PackedCell::FLAG_HILL;
        }
        if self.is_shore {
            flags |= PackedCell::FLAG_SHORE;
        }
        PackedCell {
            height: self.height,
            temperature: self.temperature,
            precipitation: self.precipitation,
            biome_intensity: self.biome_intensity,
            river_indicator: self.river_indicator,
            biome: self.biome.id(),
            flags,
            _pad: [0; 2],
        }
    }
}

/// Fixed 24-byte storage layout of a cell.
///
/// Floats are stored as raw bits so a save/load round trip is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedCell {
    /// Terrain height.
    pub height: f32,
    /// Temperature.
    pub temperature: f32,
    /// Precipitation.
    pub precipitation: f32,
    /// Biome intensity.
    pub biome_intensity: f32,
    /// River indicator.
    pub river_indicator: i32,
    /// Biome id.
    pub biome: u8,
    /// Bit flags (`FLAG_*`).
    pub flags: u8,
    _pad: [u8; 2],
}

impl PackedCell {
    /// Land bit.
    pub const FLAG_LAND: u8 = 0b001;
    /// Hill bit.
    pub const FLAG_HILL: u8 = 0b010;
    /// Shore bit.
    pub const FLAG_SHORE: u8 = 0b100;

    /// Size of one packed cell in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Unpacks the cell. Returns `None` on an unknown biome id.
    #[must_use]
    pub fn unpack(&self) -> Option<CellAttributes> {
        Some(CellAttributes {
            height: self.height,
            land: self.flags & Self::FLAG_LAND != 0,
            temperature: self.temperature,
            precipitation: self.precipitation,
            biome: Biome::from_u8(self.biome)?,
            biome_intensity: self.biome_intensity,
            river_indicator: self.river_indicator,
            is_hill: self.flags & Self::FLAG_HILL != 0,
            is_shore: self.flags & Self::FLAG_SHORE != 0,
        })
    }
}
