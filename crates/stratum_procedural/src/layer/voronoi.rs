//! # Voronoi Zoom
//!
//! Final ×4 zoom. Each parent cell gets a jittered anchor point near its
//! north-west corner; every output tile copies the parent whose anchor is
//! nearest, among the four corners of the parent cell the tile lies in.
//!
//! An anchor's jitter is drawn from the tile stream at the anchor's own
//! corner, so the two cells sharing a corner always agree on where it is.

use stratum_core::{Area, CellGrid, WorldLayerSeed};

use super::{GenContext, Layer, LayerRef, LayerSlot};
use crate::error::GenResult;

const SHIFT: u32 = 2;
const SCALE: i32 = 1 << SHIFT;

/// Jitter spread, in output tiles.
const JITTER: f64 = 3.6;

/// Jittered anchor of the parent cell at `(px, pz)`, in output tiles.
fn anchor(seed: WorldLayerSeed, px: i32, pz: i32) -> (f64, f64) {
    let (x, z) = (px * SCALE, pz * SCALE);
    let mut rng = seed.tile(x, z);
    let jx = (f64::from(rng.next_int(1024)) / 1024.0 - 0.5) * JITTER;
    let jz = (f64::from(rng.next_int(1024)) / 1024.0 - 0.5) * JITTER;
    (f64::from(x) + jx, f64::from(z) + jz)
}

/// Jittered ×4 zoom.
pub struct VoronoiZoom {
    slot: LayerSlot,
    parent: LayerRef,
}

impl VoronoiZoom {
    /// Wraps `parent`.
    #[must_use]
    pub fn new(slot: LayerSlot, parent: LayerRef) -> Self {
        Self { slot, parent }
    }
}

impl Layer for VoronoiZoom {
    fn name(&self) -> &'static str {
        "voronoi_zoom"
    }

    fn generate(&self, ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        let seed = ctx.seed(self.name(), self.slot)?;
        let parent_area = area.coarsen(SHIFT, 1);
        let parent = self.parent.generate(ctx, parent_area)?;

        let anchors: Vec<(f64, f64)> = (parent_area.z..parent_area.end_z())
            .flat_map(|pz| (parent_area.x..parent_area.end_x()).map(move |px| (px, pz)))
            .map(|(px, pz)| anchor(seed, px, pz))
            .collect();
        let anchor_at = |px: i32, pz: i32| {
            let row = (pz - parent_area.z) as usize;
            anchors[row * parent_area.width + (px - parent_area.x) as usize]
        };

        let mut out = ctx.alloc(area);
        let cells = out.cells_mut();
        let mut i = 0;
        for z in area.z..area.end_z() {
            for x in area.x..area.end_x() {
                let (px, pz) = (x >> SHIFT, z >> SHIFT);
                let (fx, fz) = (f64::from(x), f64::from(z));

                let mut best = (px, pz);
                let mut best_dist = f64::INFINITY;
                for (cx, cz) in [(px, pz), (px + 1, pz), (px, pz + 1), (px + 1, pz + 1)] {
                    let (ax, az) = anchor_at(cx, cz);
                    let dist = (fx - ax).powi(2) + (fz - az).powi(2);
                    if dist < best_dist {
                        best_dist = dist;
                        best = (cx, cz);
                    }
                }

                cells[i] = *parent.at(best.0, best.1);
                i += 1;
            }
        }

        ctx.recycle(parent);
        Ok(out)
    }
}
