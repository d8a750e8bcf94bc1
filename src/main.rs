use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexsettle::{
    realtime::RealtimeRunner,
    scenario::{Scenario, ScenarioLoader},
    snapshot::load_snapshot,
    systems::production_rates,
    world::WorldState,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless hex settlement simulation")]
struct Cli {
    /// Path to the scenario YAML file (built-in defaults when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override map width in hexes
    #[arg(long)]
    width: Option<u32>,

    /// Override map height in hexes
    #[arg(long)]
    height: Option<u32>,

    /// Simulated seconds to run (uses scenario default when omitted)
    #[arg(long)]
    seconds: Option<f64>,

    /// Override snapshot interval in simulated milliseconds
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Resume from a snapshot file instead of generating a world
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Run against the wall clock until Ctrl+C (or --seconds)
    #[arg(long)]
    realtime: bool,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_scenario(cli: &Cli) -> Result<Scenario> {
    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default(),
    };
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    if let Some(width) = cli.width {
        scenario.map.width = width;
    }
    if let Some(height) = cli.height {
        scenario.map.height = height;
    }
    if let Some(interval) = cli.snapshot_interval {
        scenario.snapshot.interval_ms = interval;
    }
    if let Some(dir) = &cli.snapshot_dir {
        scenario.snapshot.output_dir = dir.clone();
    }
    Ok(scenario)
}

fn realtime_limit(seconds: f64) -> Result<Duration> {
    let clamped = if seconds < 0.0 { 0.0 } else { seconds };
    Duration::try_from_secs_f64(clamped)
        .with_context(|| format!("--seconds {seconds} is not a usable wall-clock limit"))
}

fn print_summary(scenario: &Scenario, world: &WorldState, elapsed_ms: u64) {
    let ledger = world.ledger();
    println!(
        "Scenario '{}' ran {:.1}s of simulated time on a {}x{} map.",
        scenario.name,
        elapsed_ms as f64 / 1_000.0,
        world.map_width(),
        world.map_height()
    );
    println!(
        "Food {:.0} | Wood {:.0} | Stone {:.0} | Iron {:.0} | Gold {:.1} | Population {} ({} villagers)",
        ledger.food,
        ledger.wood,
        ledger.stone,
        ledger.iron,
        ledger.gold,
        ledger.population,
        world.agents().len()
    );
    let rates = production_rates(world)
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(resource, amount)| format!("{resource} +{amount}"))
        .collect::<Vec<_>>();
    if !rates.is_empty() {
        println!("Production per economy tick: {}", rates.join(", "));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = load_scenario(&cli)?;
    init_tracing(&scenario.logging.level);

    let mut world = match &cli.restore {
        Some(path) => load_snapshot(path)
            .with_context(|| format!("Failed to restore snapshot {}", path.display()))?,
        None => scenario.build_world()?,
    };
    let mut engine = scenario.build_engine();

    if cli.realtime {
        let limit = cli.seconds.map(realtime_limit).transpose()?;
        let (runner, handle) = RealtimeRunner::new(engine, world);
        let runtime = Runtime::new()?;
        let (engine, stats) = runtime.block_on(runner.run(limit))?;
        info!(steps = stats.steps, stop = ?stats.stop, "realtime run finished");
        let world = handle
            .world
            .lock()
            .map_err(|_| anyhow::anyhow!("world lock poisoned"))?;
        print_summary(&scenario, &world, engine.elapsed_ms());
        return Ok(());
    }

    let duration_ms = scenario.duration_ms(cli.seconds);
    engine.run_for(&mut world, duration_ms)?;
    print_summary(&scenario, &world, engine.elapsed_ms());
    Ok(())
}
