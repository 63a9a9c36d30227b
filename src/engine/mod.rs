use std::path::PathBuf;

use anyhow::Result;

use crate::{
    clock::{GameSpeed, SimulationClock},
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    systems::{AnimalSystem, BookkeepingSystem, BuildingSystem, EconomySystem},
    world::{ParkSnapshot, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
    pub speed: GameSpeed,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Animals, then buildings, then the economy, then bookkeeping.
    pub fn with_park_systems(self) -> Self {
        self.with_system(AnimalSystem::new())
            .with_system(BuildingSystem::new())
            .with_system(EconomySystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            clock: SimulationClock::new(self.settings.speed),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    clock: SimulationClock,
    settings: EngineSettings,
}

impl Engine {
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn set_speed(&mut self, speed: GameSpeed) -> GameSpeed {
        self.clock.set_speed(speed)
    }

    /// Advances the park by one frame. Returns the simulated seconds that
    /// elapsed, or `None` when paused and nothing ran.
    pub fn step(&mut self, world: &mut World, frame_dt: f64) -> Result<Option<f64>> {
        let Some(dt) = self.clock.effective_dt(frame_dt) else {
            return Ok(None);
        };
        let current_tick = world.tick();
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                dt,
                scenario_name: &self.settings.scenario_name,
            };
            system.run(&ctx, world, &mut rng_stream)?;
        }
        world.advance_time(dt);
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        Ok(Some(dt))
    }

    pub fn run(&mut self, world: &mut World, frames: u64, frame_dt: f64) -> Result<()> {
        self.run_with_hook(world, frames, frame_dt, |_| {})
    }

    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        frames: u64,
        frame_dt: f64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&ParkSnapshot),
    {
        for _ in 0..frames {
            if self.step(world, frame_dt)?.is_some() {
                hook(&world.snapshot(&self.settings.scenario_name));
            }
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    /// Simulated seconds for this tick, already scaled by game speed.
    pub dt: f64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
