use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::{
    animals::{AnimalPopulation, Species},
    economy::EconomyConfig,
    ledger::{Difficulty, Ledger},
    terrain::GridTerrain,
    world::World,
};

fn default_frame_seconds() -> f64 {
    1.0
}

fn default_snapshot_interval_ticks() -> u64 {
    60
}

fn default_tile_size() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Wall-clock seconds per frame before game speed is applied.
    #[serde(default = "default_frame_seconds")]
    pub frame_seconds: f64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub terrain: ScenarioTerrain,
    #[serde(default)]
    pub species: Vec<ScenarioSpecies>,
    #[serde(default)]
    pub starting_funds: Option<f64>,
    #[serde(default)]
    pub economy: EconomyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioTerrain {
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,
    /// One string per row of `W G R M P` symbols, north to south.
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpecies {
    pub species: Species,
    pub initial: usize,
    #[serde(default)]
    pub herd_size: Option<usize>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn terrain(&self) -> Result<GridTerrain> {
        GridTerrain::from_rows(&self.terrain.rows, self.terrain.tile_size)
            .with_context(|| format!("Invalid terrain in scenario '{}'", self.name))
    }

    /// Builds a fresh park with the initial herds placed. Herd placement draws
    /// from its own generator seeded by the scenario, so the same file always
    /// yields the same opening state.
    pub fn build_world(&self) -> Result<World> {
        self.validate()?;
        let terrain = self.terrain()?;
        let mut ledger = Ledger::new(self.difficulty);
        if let Some(funds) = self.starting_funds {
            ledger = ledger.with_funds(funds);
        }
        let mut animals = self
            .species
            .iter()
            .fold(AnimalPopulation::new(), |pop, entry| {
                pop.with_species(entry.species, entry.initial, entry.herd_size)
            });
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        animals.spawn_initial(&terrain, &mut rng);

        let mut world = World::new(Box::new(terrain), self.difficulty)
            .with_ledger(ledger)
            .with_economy(self.economy)
            .with_animals(animals);
        world.refresh_stats();
        Ok(world)
    }

    /// Rejects timing values the engine cannot advance with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frame_seconds.is_finite() && self.frame_seconds >= 0.0,
            "Scenario '{}': frame_seconds must be finite and non-negative, got {}",
            self.name,
            self.frame_seconds
        );
        self.economy
            .validate()
            .with_context(|| format!("Invalid economy in scenario '{}'", self.name))
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(600)
    }
}
