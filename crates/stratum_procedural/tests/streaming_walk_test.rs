//! # Streaming Walk Integration Test
//!
//! Walks an observer through the world and checks that the window, the
//! region reference counts and the chunk consumer never disagree.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratum_core::CellGrid;
use stratum_procedural::{
    open_in, ChunkConsumer, ChunkCoord, ChunkEvent, ChunkWindow, RegionCoord, StratumConfig,
    TerrainStreamer, WorldSeed,
};

const REGION: usize = 64;

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("stratum_walk_{tag}_{id}"))
}

fn window_around(center: ChunkCoord, radius: u32) -> HashSet<ChunkCoord> {
    let r = radius as i32;
    (-r..=r)
        .flat_map(|dz| (-r..=r).map(move |dx| ChunkCoord::new(center.x + dx, center.z + dz)))
        .collect()
}

/// Active chunks as seen by the consumer.
///
/// Runs on worker threads, so violations are recorded rather than
/// asserted on the spot.
#[derive(Default)]
struct Tracker {
    active: Mutex<HashMap<ChunkCoord, CellGrid>>,
    ready_events: Mutex<usize>,
    violations: Mutex<Vec<String>>,
}

impl Tracker {
    fn assert_clean(&self) {
        let violations = self.violations.lock();
        assert!(violations.is_empty(), "{violations:?}");
    }
}

impl ChunkConsumer for Tracker {
    fn on_chunk_ready(&self, chunk: ChunkCoord, cells: CellGrid) {
        *self.ready_events.lock() += 1;
        if self.active.lock().insert(chunk, cells).is_some() {
            self.violations.lock().push(format!("duplicate load of {chunk:?}"));
        }
    }

    fn on_chunk_retired(&self, chunk: ChunkCoord) {
        if self.active.lock().remove(&chunk).is_none() {
            self.violations.lock().push(format!("unload of inactive {chunk:?}"));
        }
    }
}

/// Test: outstanding loads always equal the window, for random walks.
#[test]
fn test_window_invariant_random_walk() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut window = ChunkWindow::new(3);
    let mut outstanding: HashSet<ChunkCoord> = HashSet::new();
    let mut center = ChunkCoord::new(0, 0);

    for step in 0..2_000 {
        let events = if rng.gen_ratio(1, 10) {
            window.set_radius(rng.gen_range(1..=6))
        } else {
            center = if rng.gen_ratio(1, 50) {
                ChunkCoord::new(rng.gen_range(-500..500), rng.gen_range(-500..500))
            } else {
                ChunkCoord::new(
                    center.x + rng.gen_range(-2..=2),
                    center.z + rng.gen_range(-2..=2),
                )
            };
            window.set_position(center)
        };

        for event in events {
            match event {
                ChunkEvent::Load(c) => {
                    assert!(outstanding.insert(c), "step {step}: double load {c:?}");
                }
                ChunkEvent::Unload(c) => {
                    assert!(outstanding.remove(&c), "step {step}: stray unload {c:?}");
                }
            }
        }
        assert_eq!(outstanding, window_around(center, window.radius()), "step {step}");
        assert_eq!(window.loaded().collect::<HashSet<_>>(), outstanding);
    }
}

/// Test: radius 2 at the origin, then one step east.
#[test]
fn test_one_step_east_scenario() {
    let mut window = ChunkWindow::new(2);
    let first = window.set_position(ChunkCoord::new(0, 0));
    assert_eq!(first.len(), 25);
    assert!(first.iter().all(|e| matches!(e, ChunkEvent::Load(_))));
    assert_eq!(first.iter().collect::<HashSet<_>>().len(), 25);

    let second = window.set_position(ChunkCoord::new(1, 0));
    let unloads: HashSet<_> = second
        .iter()
        .filter(|e| matches!(e, ChunkEvent::Unload(_)))
        .collect();
    let loads: HashSet<_> = second
        .iter()
        .filter(|e| matches!(e, ChunkEvent::Load(_)))
        .collect();
    assert_eq!(second.len(), 10);
    assert_eq!(unloads.len(), 5);
    assert_eq!(loads.len(), 5);
}

/// Test: after walking, the consumer's active set, the window and the
/// region reference counts all agree, and no region with an active chunk
/// was evicted.
#[test]
fn test_walk_keeps_refcounts_consistent() {
    let dir = temp_dir("refcount");
    let tracker = Arc::new(Tracker::default());
    let manager = open_in(&dir, REGION, WorldSeed::new(42), tracker.clone(), 3).unwrap();
    let mut streamer = TerrainStreamer::new(manager, 2, 6);

    let mut rng = StdRng::seed_from_u64(7);
    let (mut x, mut z) = (0.0f64, 0.0f64);
    for step in 0..150 {
        x += rng.gen_range(-4.0..20.0);
        z += rng.gen_range(-12.0..12.0);
        streamer.set_observer(x, z).unwrap();
        streamer.tick().unwrap();

        if step % 25 == 24 {
            streamer.flush().unwrap();
            streamer.wait_idle();
            tracker.assert_clean();

            let center = streamer.window().center().unwrap();
            let expected = window_around(center, 2);
            let active: HashSet<ChunkCoord> = tracker.active.lock().keys().copied().collect();
            assert_eq!(active, expected, "step {step}");

            let mut per_region: HashMap<RegionCoord, usize> = HashMap::new();
            for chunk in &expected {
                *per_region.entry(chunk.region(REGION)).or_default() += 1;
            }
            let cache = streamer.manager().cache();
            for (region, count) in &per_region {
                assert_eq!(cache.refcount(*region), *count, "region {region:?}");
            }
            assert_eq!(cache.resident().len(), per_region.len());

            // Every delivered slice is still what the cache holds.
            for (chunk, cells) in tracker.active.lock().iter() {
                assert_eq!(&cache.chunk_cells(*chunk).unwrap(), cells);
            }
        }
    }

    streamer.clear().unwrap();
    streamer.wait_idle();
    tracker.assert_clean();
    assert!(tracker.active.lock().is_empty());
    assert!(streamer.manager().cache().resident().is_empty());

    let stats = streamer.manager().snapshot();
    assert_eq!(
        stats.loads_dispatched,
        stats.unloads_dispatched,
        "every dispatched load was unloaded"
    );
    assert_eq!(stats.loads_dispatched as usize, *tracker.ready_events.lock());
    assert!(stats.regions_evicted > 0);
    drop(streamer);
    fs::remove_dir_all(&dir).ok();
}

/// Test: a second session over the same directory reads regions back
/// instead of generating them, and sees the same cells.
#[test]
fn test_regions_persist_across_sessions() {
    let mut config = StratumConfig::test();
    config.region_size = REGION as u32;
    config.rendering_distance = 1;
    let target = ChunkCoord::new(9, -9);

    let first = Arc::new(Tracker::default());
    {
        let mut streamer =
            TerrainStreamer::from_config(&config, WorldSeed::new(5), first.clone()).unwrap();
        streamer.set_position(target).unwrap();
        streamer.flush().unwrap();
        streamer.wait_idle();
        assert!(streamer.manager().snapshot().regions_generated > 0);
        assert_eq!(streamer.manager().snapshot().regions_loaded, 0);
    }

    let second = Arc::new(Tracker::default());
    {
        let mut streamer =
            TerrainStreamer::from_config(&config, WorldSeed::new(5), second.clone()).unwrap();
        streamer.set_position(target).unwrap();
        streamer.flush().unwrap();
        streamer.wait_idle();
        let stats = streamer.manager().snapshot();
        assert_eq!(stats.regions_generated, 0);
        assert!(stats.regions_loaded > 0);
    }

    first.assert_clean();
    second.assert_clean();
    let a = first.active.lock();
    let b = second.active.lock();
    assert_eq!(a.len(), 9);
    assert_eq!(*a, *b);
    drop((a, b));
    fs::remove_dir_all(&config.storage_dir).ok();
}
