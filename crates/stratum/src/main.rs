//! # STRATUM Walk
//!
//! Walks an observer east through a world, ticking the streamer once per
//! step, and prints what was streamed.
//!
//! ```text
//! stratum_walk [--config FILE] [--seed N] [--steps N]
//! ```

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use stratum_core::{Biome, CellGrid};
use stratum_procedural::{
    ChunkConsumer, ChunkCoord, ConfigError, ConfigResult, StratumConfig, StratumResult,
    TerrainStreamer, WorldSeed, CHUNK_SIZE,
};
use tracing::info;

/// Observer speed in tiles per step.
const STEP_TILES: f64 = 4.0;

/// Counts tiles per biome over every chunk delivered.
#[derive(Default)]
struct BiomeCensus {
    tiles: Mutex<BTreeMap<u8, u64>>,
    chunks_ready: Mutex<u64>,
    chunks_retired: Mutex<u64>,
}

impl ChunkConsumer for BiomeCensus {
    fn on_chunk_ready(&self, _chunk: ChunkCoord, cells: CellGrid) {
        let mut tiles = self.tiles.lock();
        for cell in cells.cells() {
            *tiles.entry(cell.biome.id()).or_default() += 1;
        }
        *self.chunks_ready.lock() += 1;
    }

    fn on_chunk_retired(&self, _chunk: ChunkCoord) {
        *self.chunks_retired.lock() += 1;
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Walk(Args),
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<String>,
    seed: Option<i64>,
    steps: u32,
}

const USAGE: &str = "Usage: stratum_walk [--config FILE] [--seed N] [--steps N]";

/// Parses the arguments after the program name. Any malformed option is
/// fatal; nothing falls back to a default.
fn parse_args<I>(args: I) -> ConfigResult<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        config: None,
        seed: None,
        steps: 512,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => parsed.config = Some(value_of(&arg, args.next())?),
            "--seed" | "-s" => parsed.seed = Some(parse_value(&arg, args.next())?),
            "--steps" | "-n" => parsed.steps = parse_value(&arg, args.next())?,
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ConfigError::UnknownArgument(arg)),
        }
    }
    Ok(Command::Walk(parsed))
}

fn value_of(option: &str, value: Option<String>) -> ConfigResult<String> {
    value.ok_or_else(|| ConfigError::MissingValue(option.to_string()))
}

fn parse_value<T: FromStr>(option: &str, value: Option<String>) -> ConfigResult<T> {
    let value = value_of(option, value)?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value,
    })
}

fn run(args: &Args) -> StratumResult<()> {
    let mut config = match &args.config {
        Some(path) => StratumConfig::from_file(path)?,
        None => StratumConfig::default(),
    };
    if args.seed.is_some() {
        config.world_seed = args.seed;
    }
    let seed = config.world_seed.unwrap_or_else(rand::random);
    info!(seed, "starting walk");

    println!("STRATUM WALK");
    println!("  Seed:          {seed}");
    println!("  Radius:        {} chunks", config.rendering_distance);
    println!("  Region size:   {} tiles", config.region_size);
    println!("  Storage:       {}", config.storage_dir.display());
    println!("  Workers:       {}", config.worker_count);
    println!("  Steps:         {} x {STEP_TILES} tiles east", args.steps);
    println!();

    let census = Arc::new(BiomeCensus::default());
    let mut streamer = TerrainStreamer::from_config(&config, WorldSeed::new(seed), census.clone())?;

    let start = Instant::now();
    let mut x = 0.0;
    for _ in 0..args.steps {
        streamer.set_observer(x, 0.0)?;
        streamer.tick()?;
        x += STEP_TILES;
    }
    streamer.flush()?;
    streamer.wait_idle();
    let elapsed = start.elapsed();

    let stats = streamer.manager().snapshot();
    let resident = streamer.manager().cache().resident().len();
    drop(streamer);

    println!("Walked {:.0} tiles in {elapsed:?}", x);
    println!();
    println!("Chunks:");
    println!("  Loads dispatched:    {}", stats.loads_dispatched);
    println!("  Loads cancelled:     {}", stats.loads_cancelled);
    println!("  Unloads dispatched:  {}", stats.unloads_dispatched);
    println!(
        "  Ready / retired:     {} / {}",
        census.chunks_ready.lock(),
        census.chunks_retired.lock()
    );
    println!("Regions:");
    println!("  Generated:           {}", stats.regions_generated);
    println!("  Loaded from disk:    {}", stats.regions_loaded);
    println!("  Evicted:             {}", stats.regions_evicted);
    println!("  Resident at end:     {resident}");
    println!("  Save failures:       {}", stats.save_failures);
    println!();

    let tiles = census.tiles.lock();
    let total: u64 = tiles.values().sum();
    println!("Biomes ({} chunks of {CHUNK_SIZE}x{CHUNK_SIZE}):", census.chunks_ready.lock());
    for (&id, &count) in tiles.iter() {
        let name = Biome::from_u8(id).map_or_else(|| format!("#{id}"), |b| format!("{b:?}"));
        println!("  {name:<14} {:6.2}%", count as f64 * 100.0 / total.max(1) as f64);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Walk(args)) => args,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("stratum_walk: {err}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stratum_walk: {err}");
            ExitCode::FAILURE
        }
    }
}
