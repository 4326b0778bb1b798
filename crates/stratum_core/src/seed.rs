//! # Seed Mixer
//!
//! Deterministic integer hashing for reproducible per-tile randomness.
//!
//! ## Derivation Chain
//!
//! ```text
//! base seed ──3 rounds──> LayerSeed
//! world seed + LayerSeed ──3 rounds──> world-layer seed
//! world-layer seed + (x, z, x, z) ──4 rounds──> tile seed ──> TileRng
//! ```
//!
//! One round is `s = s * (s * A + B) + addend` in wrapping 64-bit signed
//! arithmetic. The recurrence is part of the world format: changing it
//! changes every world ever generated.
//!
//! ## Determinism Guarantee
//!
//! A tile's random outcome depends only on `(world seed, layer, x, z)` and
//! on the order of draws made for that tile. Nothing is shared between
//! tiles, so cells may be computed in any order, on any thread.

/// LCG multiplier.
pub const MULTIPLIER: i64 = 6_364_136_223_846_793_005;

/// LCG increment.
pub const INCREMENT: i64 = 1_442_695_040_888_963_407;

/// One mixing round: `s * (s * A + B) + addend`.
#[inline]
#[must_use]
pub const fn mix_round(seed: i64, addend: i64) -> i64 {
    seed
        .wrapping_mul(seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT))
        .wrapping_add(addend)
}

/// Three rounds with the same addend.
#[inline]
#[must_use]
const fn mix3(seed: i64, addend: i64) -> i64 {
    mix_round(mix_round(mix_round(seed, addend), addend), addend)
}

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(i64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: i64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Seed owned by one layer, derived from the layer's fixed base seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerSeed(i64);

impl LayerSeed {
    /// Derives the layer seed from a base seed (three rounds adding `base`).
    #[must_use]
    pub const fn from_base(base: i64) -> Self {
        Self(mix3(base, base))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Combines with a world seed (three rounds adding the layer seed).
    #[must_use]
    pub const fn with_world(self, world: WorldSeed) -> WorldLayerSeed {
        WorldLayerSeed(mix3(world.0, self.0))
    }
}

/// A layer's seed combined with the world seed.
///
/// Computed once per stack initialization; every tile seed of the layer
/// starts from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldLayerSeed(i64);

impl WorldLayerSeed {
    /// Convenience: `LayerSeed::from_base(base).with_world(world)`.
    #[must_use]
    pub const fn derive(base: i64, world: WorldSeed) -> Self {
        LayerSeed::from_base(base).with_world(world)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Initial tile seed at `(x, z)`: rounds adding `x, z, x, z`.
    #[inline]
    #[must_use]
    pub const fn tile_seed(self, x: i32, z: i32) -> i64 {
        let (x, z) = (x as i64, z as i64);
        mix_round(mix_round(mix_round(mix_round(self.0, x), z), x), z)
    }

    /// Random source for the tile at `(x, z)`.
    #[inline]
    #[must_use]
    pub const fn tile(self, x: i32, z: i32) -> TileRng {
        TileRng {
            seed: self.tile_seed(x, z),
            world_layer: self.0,
        }
    }
}

/// Per-tile random stream.
///
/// Only obtainable through [`WorldLayerSeed::tile`], so a draw can never
/// happen on an uninitialized tile seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRng {
    seed: i64,
    world_layer: i64,
}

impl TileRng {
    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> i64 {
        self.seed
    }

    /// Uniform integer in `[0, bound)` from the high bits of the state, then
    /// advances the state by one round adding the world-layer seed.
    ///
    /// # Panics
    ///
    /// Panics if `bound <= 0`.
    #[inline]
    pub fn next_int(&mut self, bound: i32) -> i32 {
        assert!(bound > 0, "bound must be positive, got {bound}");
        let value = (self.seed >> 24).rem_euclid(i64::from(bound)) as i32;
        self.seed = mix_round(self.seed, self.world_layer);
        value
    }

    /// True with probability `1 / one_in`.
    #[inline]
    pub fn chance(&mut self, one_in: i32) -> bool {
        self.next_int(one_in) == 0
    }

    /// True with probability roughly `p` (`1 / round(1 / p)`).
    ///
    /// # Panics
    ///
    /// Panics if `p` is not in `(0, 1]`.
    pub fn coin_flip(&mut self, p: f64) -> bool {
        assert!(p > 0.0 && p <= 1.0, "probability must be in (0, 1], got {p}");
        self.chance((1.0 / p).round() as i32)
    }

    /// Picks one of two values.
    #[inline]
    pub fn pick2<T>(&mut self, a: T, b: T) -> T {
        if self.next_int(2) == 0 {
            a
        } else {
            b
        }
    }

    /// Picks one of four values.
    #[inline]
    pub fn pick4<T>(&mut self, a: T, b: T, c: T, d: T) -> T {
        match self.next_int(4) {
            0 => a,
            1 => b,
            2 => c,
            _ => d,
        }
    }
}
