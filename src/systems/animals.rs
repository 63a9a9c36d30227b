use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Needs, movement, deaths, spawning and reproduction for every animal.
pub struct AnimalSystem;

impl AnimalSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnimalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AnimalSystem {
    fn name(&self) -> &str {
        "animals"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.animals.tick(
            ctx.dt,
            world.terrain.as_ref(),
            &world.buildings,
            &mut world.ledger,
            rng,
        );
        Ok(())
    }
}
