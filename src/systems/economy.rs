use anyhow::Result;

use crate::{
    economy::ParkParts,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Timers and settlements, then tourists and jeeps, then new arrivals.
pub struct EconomySystem;

impl EconomySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let parts = ParkParts {
            terrain: world.terrain.as_ref(),
            animals: &world.animals,
            buildings: &world.buildings,
            tourists: &mut world.tourists,
            jeeps: &mut world.jeeps,
        };
        let report = world.economy.tick(ctx.dt, parts, &mut world.ledger, rng);
        if let Some(expenses) = report.monthly_expenses {
            tracing::info!(
                tick = ctx.tick,
                scenario = ctx.scenario_name,
                expenses,
                funds = world.ledger.funds(),
                "month closed"
            );
        }
        Ok(())
    }
}
