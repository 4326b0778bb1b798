//! # Terrain Properties Integration Test
//!
//! Determinism, tile-order independence and region slicing of the full
//! generation pipeline.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use stratum_core::{Area, Biome, CellAttributes, CellGrid, GridPool};
use stratum_procedural::layer::River;
use stratum_procedural::{
    decode_region, encode_region, open_in, ChunkCoord, GenContext, GenResult, GenerationStack,
    Layer, NullConsumer, RegionCoord, StackBuilder, WorldSeed, CHUNK_SIZE, DEFAULT_REGION_SIZE,
};

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("stratum_props_{tag}_{id}"))
}

fn assert_bit_identical(a: &CellGrid, b: &CellGrid) {
    assert_eq!(a.area(), b.area());
    for ((x, z, l), (_, _, r)) in a.iter().zip(b.iter()) {
        assert_eq!(l.height.to_bits(), r.height.to_bits(), "height at ({x}, {z})");
        assert_eq!(l.temperature.to_bits(), r.temperature.to_bits(), "temperature at ({x}, {z})");
        assert_eq!(l, r, "cell at ({x}, {z})");
    }
}

/// Test: two independent evaluations agree bit for bit.
#[test]
fn test_evaluate_is_deterministic() {
    for seed in [0, 42, -1, i64::MAX] {
        let a = GenerationStack::standard()
            .evaluate(WorldSeed::new(seed), -300, 1_000, 96, 80)
            .unwrap();
        let b = GenerationStack::standard()
            .evaluate(WorldSeed::new(seed), -300, 1_000, 96, 80)
            .unwrap();
        assert_bit_identical(&a, &b);
    }
}

/// Test: different seeds give different worlds.
#[test]
fn test_seeds_differ() {
    let stack = GenerationStack::standard();
    let a = stack.evaluate(WorldSeed::new(1), 0, 0, 128, 128).unwrap();
    let b = stack.evaluate(WorldSeed::new(2), 0, 0, 128, 128).unwrap();
    assert_ne!(a.cells(), b.cells());
}

/// Test: a rectangle generated whole equals its halves generated apart.
#[test]
fn test_tile_order_independence() {
    let stack = GenerationStack::standard();
    let world = WorldSeed::new(42);
    let whole = stack.evaluate(world, -77, 13, 150, 90).unwrap();
    let west = stack.evaluate(world, -77, 13, 61, 90).unwrap();
    let east = stack.evaluate(world, -16, 13, 89, 90).unwrap();
    let north = stack.evaluate(world, -77, 13, 150, 33).unwrap();

    let stitched = CellGrid::from_fn(whole.area(), |x, z| match west.get(x, z) {
        Some(cell) => *cell,
        None => *east.at(x, z),
    });
    assert_bit_identical(&whole, &stitched);
    assert_bit_identical(&whole.slice(north.area()).unwrap(), &north);
}

/// Test: the pipeline produces a plausible world.
#[test]
fn test_world_has_land_ocean_and_climate() {
    let stack = GenerationStack::standard();
    let ctx = stack.initialize(WorldSeed::new(42));
    let mut cells = Vec::new();
    for j in 0..9 {
        for i in 0..9 {
            let area = Area::new(i * 5_000 - 20_000, j * 5_000 - 20_000, 32, 32);
            cells.extend(stack.generate(&ctx, area).unwrap().into_cells());
        }
    }

    let land = cells.iter().filter(|c| c.land).count();
    assert!(land > 0, "no land at all");
    assert!(land < cells.len(), "no ocean at all");

    let biomes: HashSet<Biome> = cells.iter().map(|c| c.biome).collect();
    assert!(!biomes.contains(&Biome::Unset));
    assert!(biomes.len() >= 4, "only {biomes:?}");

    for cell in &cells {
        assert!((-10.0..=30.0).contains(&cell.temperature));
        assert!((0.0..=400.0).contains(&cell.precipitation));
        assert!((0.0..=1.0).contains(&cell.biome_intensity));
        assert_eq!(cell.land, !cell.biome.is_ocean());
    }
}

/// Labels two tile columns 2 and 3, everything else label 2.
struct TwoLabels;

impl Layer for TwoLabels {
    fn name(&self) -> &'static str {
        "two_labels"
    }

    fn generate(&self, _ctx: &GenContext, area: Area) -> GenResult<CellGrid> {
        Ok(CellGrid::from_fn(area, |x, _| CellAttributes {
            river_indicator: if x >= 1 { 3 } else { 2 },
            ..CellAttributes::LAND
        }))
    }
}

/// Test: differing folded labels meet at a river; equal labels never do.
#[test]
fn test_river_between_differing_labels() {
    let mut builder = StackBuilder::new();
    let slot = builder.slot(1);
    let stack = builder.finish(Arc::new(River::new(slot, Arc::new(TwoLabels))));
    let grid = stack.evaluate(WorldSeed::new(42), -3, 0, 8, 4).unwrap();

    for z in 0..4 {
        assert!(grid.at(0, z).is_river() || grid.at(1, z).is_river());
        assert!(!grid.at(-3, z).is_river());
        assert!(!grid.at(-2, z).is_river());
        assert!(!grid.at(3, z).is_river());
    }
}

/// Test: a region holds 32×32 chunks and neighbouring regions differ.
#[test]
fn test_adjacent_regions_slice_differently() {
    let per_side = (DEFAULT_REGION_SIZE / CHUNK_SIZE) as i32;
    let region = RegionCoord::new(0, 0);
    let mut count = 0;
    for z in -per_side..2 * per_side {
        for x in -per_side..2 * per_side {
            if ChunkCoord::new(x, z).region(DEFAULT_REGION_SIZE) == region {
                count += 1;
            }
        }
    }
    assert_eq!(count, 1024);

    let dir = temp_dir("adjacent");
    let manager = open_in(
        &dir,
        DEFAULT_REGION_SIZE,
        WorldSeed::new(42),
        Arc::new(NullConsumer),
        2,
    )
    .unwrap();
    let far = ChunkCoord::new(33, 0);
    let near = ChunkCoord::new(1, 0);
    manager.request_load(far).unwrap();
    manager.request_load(near).unwrap();
    manager.wait_idle();

    assert_eq!(manager.cache().resident().len(), 2);
    let a = manager.chunk_cells(far).unwrap();
    let b = manager.chunk_cells(near).unwrap();
    assert_ne!(a.cells(), b.cells());

    // Slices match a direct evaluation of the same tiles.
    let direct = GenerationStack::standard()
        .evaluate(WorldSeed::new(42), far.world_x(), far.world_z(), CHUNK_SIZE, CHUNK_SIZE)
        .unwrap();
    assert_bit_identical(&a, &direct);

    drop(manager);
    fs::remove_dir_all(&dir).ok();
}

/// Test: a generated region survives encode/decode exactly.
#[test]
fn test_generated_region_round_trip() {
    let coord = RegionCoord::new(-1, 2);
    let size = 128;
    let area = coord.area(size);
    let grid = GenerationStack::standard()
        .evaluate(WorldSeed::new(9), area.x, area.z, size, size)
        .unwrap();

    let bytes = encode_region(coord, &grid);
    let decoded = decode_region(&bytes, coord, size, &GridPool::new(0)).unwrap();
    assert_bit_identical(&grid, &decoded);
}
