//! # Value Noise
//!
//! Smooth, deterministic 2D noise for the climate fields.
//!
//! ## Why value noise?
//!
//! Temperature and precipitation only need a smooth, continuous field with
//! a single dominant frequency. Value noise (random lattice values with
//! smoothstep interpolation) gives exactly that, has a known [0, 1] output
//! range with no normalization constant, and is cheap.
//!
//! ## Determinism Guarantee
//!
//! Given the same seed, this implementation produces **exactly** the same
//! values on any platform: the lattice comes from an integer shuffle, and
//! interpolation uses only `f64` add/mul.

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: i64) -> Self {
        let mut perm = [0u8; 512];

        for (i, p) in perm.iter_mut().take(256).enumerate() {
            *p = i as u8;
        }

        // Fisher-Yates shuffle with xorshift64. A zero state would never
        // move, so it is nudged off zero.
        let mut rng_state = (seed as u64) | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    /// Lattice value in [0, 1] at integer coordinates.
    #[inline]
    fn lattice(&self, i: i32, j: i32) -> f64 {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        f64::from(self.get(ii + self.get(jj) as usize)) / 255.0
    }
}

/// 2D value noise generator.
///
/// Produces smooth, continuous values in the range [0, 1].
///
/// # Example
///
/// ```rust,ignore
/// let noise = ValueNoise::new(layer_seed.value());
///
/// let t = noise.sample(12.5, -3.25);
/// assert!((0.0..=1.0).contains(&t));
/// ```
pub struct ValueNoise {
    /// The permutation table.
    perm_table: PermutationTable,
}

impl ValueNoise {
    /// Creates a new value noise generator from a seed.
    #[must_use]
    pub fn new(seed: i64) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples noise at the given coordinates (one lattice cell per unit).
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let i = fast_floor(x);
        let j = fast_floor(y);
        let fx = smoothstep(x - f64::from(i));
        let fy = smoothstep(y - f64::from(j));

        let v00 = self.perm_table.lattice(i, j);
        let v10 = self.perm_table.lattice(i + 1, j);
        let v01 = self.perm_table.lattice(i, j + 1);
        let v11 = self.perm_table.lattice(i + 1, j + 1);

        let top = lerp(v00, v10, fx);
        let bottom = lerp(v01, v11, fx);
        lerp(top, bottom, fy).clamp(0.0, 1.0)
    }
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
