use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

pub struct BuildingSystem;

impl BuildingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuildingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BuildingSystem {
    fn name(&self) -> &str {
        "buildings"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let broken = world
            .buildings
            .tick(ctx.dt, world.terrain.as_ref(), &mut world.ledger);
        if !broken.is_empty() {
            tracing::info!(tick = ctx.tick, count = broken.len(), "buildings lost to decay");
        }
        Ok(())
    }
}
