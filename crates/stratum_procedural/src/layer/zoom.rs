//! # Zoom
//!
//! Doubles the resolution of its parent. Each parent cell `a` at `(px, pz)`
//! becomes four cells:
//!
//! ```text
//! a  | pick(a, b)          a b   parent cells
//! ---+-----------          c d
//! pick(a, c) | diagonal(a, b, c, d)
//! ```
//!
//! All four come from the tile stream at `(2px, 2pz)`, drawn east, south,
//! diagonal, so every sub-cell is the same whichever of them is requested.

use stratum_core::{Area, CellAttributes, CellGrid, TileRng};

use super::{GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

/// How the diagonal sub-cell is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomMode {
    /// Majority vote over the four parents, coin flips on a tie.
    Majority,
    /// Always coin flips.
    Fuzzy,
}

/// Parent cells around a diagonal sub-cell, in order `a, b, c, d`.
type Quad<'a> = [&'a CellAttributes; 4];

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

/// One majority rule: all `same` pairs agree, the `differ` pair (if any)
/// disagrees, then the diagonal takes `pick`.
struct Rule {
    same: &'static [(usize, usize)],
    differ: Option<(usize, usize)>,
    pick: usize,
}

impl Rule {
    fn applies(&self, quad: &Quad<'_>) -> bool {
        let eq = |(i, j): (usize, usize)| quad[i].same_class(quad[j]);
        self.same.iter().all(|&pair| eq(pair)) && !self.differ.is_some_and(eq)
    }
}

/// Majority rules, first match wins.
const DIAGONAL_RULES: [Rule; 10] = [
    Rule { same: &[(B, C), (C, D)], differ: None, pick: B },
    Rule { same: &[(A, B), (A, C)], differ: None, pick: A },
    Rule { same: &[(A, B), (A, D)], differ: None, pick: A },
    Rule { same: &[(A, C), (A, D)], differ: None, pick: A },
    Rule { same: &[(A, B)], differ: Some((C, D)), pick: A },
    Rule { same: &[(A, C)], differ: Some((B, D)), pick: A },
    Rule { same: &[(A, D)], differ: Some((B, C)), pick: A },
    Rule { same: &[(B, C)], differ: Some((A, D)), pick: B },
    Rule { same: &[(B, D)], differ: Some((A, C)), pick: B },
    Rule { same: &[(C, D)], differ: Some((A, B)), pick: C },
];

fn majority(quad: &Quad<'_>) -> Option<CellAttributes> {
    DIAGONAL_RULES
        .iter()
        .find(|rule| rule.applies(quad))
        .map(|rule| *quad[rule.pick])
}

/// Nested coin flip: one flip per pair, then one between the winners.
fn flip(quad: &Quad<'_>, rng: &mut TileRng) -> CellAttributes {
    let top = rng.pick2(*quad[A], *quad[B]);
    let bottom = rng.pick2(*quad[C], *quad[D]);
    rng.pick2(top, bottom)
}

fn diagonal(quad: &Quad<'_>, mode: ZoomMode, rng: &mut TileRng) -> CellAttributes {
    match mode {
        ZoomMode::Majority => majority(quad).unwrap_or_else(|| flip(quad, rng)),
        ZoomMode::Fuzzy => flip(quad, rng),
    }
}

/// Resolution doubling layer.
pub struct Zoom {
    slot: LayerSlot,
    mode: ZoomMode,
    parent: LayerRef,
}

impl Zoom {
    /// Majority-vote zoom.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self {
            slot,
            mode: ZoomMode::Majority,
            parent,
        }
    }

    /// Zoom that always flips coins for the diagonal.
    #[must_use]
    pub fn fuzzy(slot: LayerSlot, parent: LayerRef) -> Self {
        Self {
            slot,
            mode: ZoomMode::Fuzzy,
            parent,
        }
    }
}

impl Layer for Zoom {
    fn name(&self) -> &'static str {
        match self.mode {
            ZoomMode::Majority => "zoom",
            ZoomMode::Fuzzy => "fuzzy_zoom",
        }
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let parent_area = area.coarsen(1, 1);
        let parent = self.parent.generate(ctx, parent_area)?;
        let mut out = ctx.alloc(area);

        // The halo row and column only serve as b, c and d.
        for pz in parent_area.z..parent_area.end_z() - 1 {
            for px in parent_area.x..parent_area.end_x() - 1 {
                let quad: Quad<'_> = [
                    parent.at(px, pz),
                    parent.at(px + 1, pz),
                    parent.at(px, pz + 1),
                    parent.at(px + 1, pz + 1),
                ];
                let (x, z) = (px << 1, pz << 1);
                let mut rng = seed.tile(x, z);
                let east = rng.pick2(*quad[A], *quad[B]);
                let south = rng.pick2(*quad[A], *quad[C]);
                let diag = diagonal(&quad, self.mode, &mut rng);

                out.set(x, z, *quad[A]);
                out.set(x + 1, z, east);
                out.set(x, z + 1, south);
                out.set(x + 1, z + 1, diag);
            }
        }

        ctx.recycle(parent);
        Ok(out)
    }
}
