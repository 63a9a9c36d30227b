use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use safari::{
    clock::GameSpeed,
    engine::{EngineBuilder, EngineSettings},
    persistence,
    scenario::ScenarioLoader,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpeedArg {
    Paused,
    Normal,
    Fast,
    Fastest,
}

impl From<SpeedArg> for GameSpeed {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Paused => GameSpeed::Paused,
            SpeedArg::Normal => GameSpeed::Normal,
            SpeedArg::Fast => GameSpeed::Fast,
            SpeedArg::Fastest => GameSpeed::Fastest,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless safari park simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/savanna.yaml")]
    scenario: PathBuf,

    /// Override frame count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Game speed applied to every frame
    #[arg(long, value_enum, default_value = "normal")]
    speed: SpeedArg,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Save the park here when the run ends
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Load a saved park before running
    #[arg(long)]
    load_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut world = scenario.build_world()?;
    if let Some(dir) = &cli.load_dir {
        persistence::load_park(&mut world, dir)?;
    }

    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
        speed: cli.speed.into(),
    };
    let mut engine = EngineBuilder::new(settings).with_park_systems().build();

    tracing::info!(scenario = %scenario.name, ticks, "starting run");
    engine.run(&mut world, ticks, scenario.frame_seconds)?;

    if let Some(dir) = &cli.save_dir {
        persistence::save_park(&world, dir)?;
    }

    let stats = world.stats();
    let ledger = world.ledger();
    println!(
        "Scenario '{}' completed for {} ticks: day {}, funds ${:.2}, ecosystem {:.1}, animals {}, tourists {}, outcome {}",
        scenario.name,
        ticks,
        ledger.day(),
        ledger.funds(),
        ledger.ecosystem_balance(),
        stats.animals,
        stats.tourists,
        world
            .outcome()
            .map_or_else(|| "undecided".to_string(), |o| format!("{o:?}")),
    );
    Ok(())
}
