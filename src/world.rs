use serde::{Deserialize, Serialize};

use crate::animals::{AnimalPopulation, Species};
use crate::buildings::{BuildingKind, BuildingRegistry};
use crate::components::{BuildingId, Position, VehicleId};
use crate::economy::{park_attractiveness, EconomyConfig, EconomyState};
use crate::error::ParkResult;
use crate::ledger::{Difficulty, Ledger, Notification, Outcome};
use crate::needs::BehaviorState;
use crate::terrain::TerrainQuery;
use crate::tourists::TouristPopulation;
use crate::vehicles::{JeepFleet, JeepState};

/// Aggregates recomputed by bookkeeping at the end of every tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkStats {
    pub animals: usize,
    pub herbivores: usize,
    pub carnivores: usize,
    pub buildings: usize,
    pub tourists: usize,
    pub jeeps: usize,
    pub review_average: f64,
    pub animal_appeal: f64,
    pub infrastructure: f64,
    pub attractiveness: f64,
    pub daily_income: f64,
    pub last_daily_revenue: f64,
    pub last_monthly_expenses: f64,
    pub total_visitors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalView {
    pub id: u64,
    pub species: Species,
    pub position: Position,
    pub health: f64,
    pub state: BehaviorState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingView {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    pub position: Position,
    pub health: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouristView {
    pub id: u64,
    pub position: Position,
    pub satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JeepView {
    pub id: u64,
    pub position: Position,
    pub state: JeepState,
    pub passengers: usize,
}

/// Read-only picture of the park handed to whatever renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub day: u32,
    pub time_of_day: f64,
    pub difficulty: Difficulty,
    pub funds: f64,
    pub ecosystem_balance: f64,
    pub average_review: f64,
    pub stats: ParkStats,
    pub outcome: Option<Outcome>,
    pub notifications: Vec<Notification>,
    pub animals: Vec<AnimalView>,
    pub buildings: Vec<BuildingView>,
    pub tourists: Vec<TouristView>,
    pub jeeps: Vec<JeepView>,
}

pub struct World {
    tick: u64,
    pub(crate) terrain: Box<dyn TerrainQuery>,
    pub(crate) ledger: Ledger,
    pub(crate) animals: AnimalPopulation,
    pub(crate) buildings: BuildingRegistry,
    pub(crate) tourists: TouristPopulation,
    pub(crate) jeeps: JeepFleet,
    pub(crate) economy: EconomyState,
    pub(crate) stats: ParkStats,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("ledger", &self.ledger)
            .field("animals", &self.animals)
            .field("buildings", &self.buildings)
            .field("tourists", &self.tourists)
            .field("jeeps", &self.jeeps)
            .field("economy", &self.economy)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new(terrain: Box<dyn TerrainQuery>, difficulty: Difficulty) -> Self {
        let tile_size = terrain.tile_size();
        Self {
            tick: 0,
            terrain,
            ledger: Ledger::new(difficulty),
            animals: AnimalPopulation::new(),
            buildings: BuildingRegistry::new(tile_size),
            tourists: TouristPopulation::new(),
            jeeps: JeepFleet::new(),
            economy: EconomyState::default(),
            stats: ParkStats::default(),
        }
    }

    pub fn with_animals(mut self, animals: AnimalPopulation) -> Self {
        self.animals = animals;
        self
    }

    pub fn with_economy(mut self, config: EconomyConfig) -> Self {
        self.economy = EconomyState::new(config);
        self
    }

    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_time(&mut self, dt: f64) {
        self.tick += 1;
        self.ledger.advance_time(dt);
    }

    pub fn terrain(&self) -> &dyn TerrainQuery {
        self.terrain.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn animals(&self) -> &AnimalPopulation {
        &self.animals
    }

    pub fn animals_mut(&mut self) -> &mut AnimalPopulation {
        &mut self.animals
    }

    pub fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    pub fn tourists(&self) -> &TouristPopulation {
        &self.tourists
    }

    pub fn jeeps(&self) -> &JeepFleet {
        &self.jeeps
    }

    pub fn economy(&self) -> &EconomyState {
        &self.economy
    }

    pub fn stats(&self) -> &ParkStats {
        &self.stats
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.ledger.outcome()
    }

    pub fn place_building(&mut self, kind: BuildingKind, position: Position) -> ParkResult<BuildingId> {
        self.buildings
            .place(kind, position, self.terrain.as_ref(), &mut self.ledger)
    }

    pub fn maintain_building(&mut self, id: BuildingId) -> ParkResult<f64> {
        self.buildings.maintain(id, &mut self.ledger)
    }

    pub fn purchase_jeep(&mut self) -> ParkResult<VehicleId> {
        self.jeeps.purchase(self.terrain.as_ref(), &mut self.ledger)
    }

    pub(crate) fn refresh_stats(&mut self) {
        let review_average = self.ledger.reviews().average();
        let animal_appeal = self.animals.tourist_appeal();
        let infrastructure = self.buildings.tourist_infrastructure_score();
        self.stats = ParkStats {
            animals: self.animals.len(),
            herbivores: self.animals.herbivores(),
            carnivores: self.animals.carnivores(),
            buildings: self.buildings.len(),
            tourists: self.tourists.len() + self.jeeps.passengers().count(),
            jeeps: self.jeeps.len(),
            review_average,
            animal_appeal,
            infrastructure,
            attractiveness: park_attractiveness(review_average, animal_appeal, infrastructure),
            daily_income: self.economy.daily_income(),
            last_daily_revenue: self.economy.last_daily_revenue(),
            last_monthly_expenses: self.economy.last_monthly_expenses(),
            total_visitors: self.economy.total_visitors(),
        };
    }

    pub fn snapshot(&self, scenario: &str) -> ParkSnapshot {
        ParkSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            day: self.ledger.day(),
            time_of_day: self.ledger.time_of_day(),
            difficulty: self.ledger.difficulty(),
            funds: self.ledger.funds(),
            ecosystem_balance: self.ledger.ecosystem_balance(),
            average_review: self.ledger.reviews().average(),
            stats: self.stats,
            outcome: self.ledger.outcome(),
            notifications: self.ledger.notifications().cloned().collect(),
            animals: self
                .animals
                .iter()
                .map(|a| AnimalView {
                    id: a.id.raw(),
                    species: a.species,
                    position: a.position,
                    health: a.needs.health,
                    state: a.state,
                })
                .collect(),
            buildings: self
                .buildings
                .iter()
                .map(|b| BuildingView {
                    id: b.id.raw(),
                    kind: b.kind,
                    position: b.position,
                    health: b.health,
                })
                .collect(),
            tourists: self
                .tourists
                .iter()
                .map(|t| TouristView {
                    id: t.id.raw(),
                    position: t.position,
                    satisfaction: t.satisfaction,
                })
                .collect(),
            jeeps: self
                .jeeps
                .iter()
                .map(|j| JeepView {
                    id: j.id.raw(),
                    position: j.position,
                    state: j.state,
                    passengers: j.passengers.len(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{GridTerrain, TerrainKind};

    fn world() -> World {
        let terrain = GridTerrain::filled(16, 1.0, TerrainKind::Grass);
        World::new(Box::new(terrain), Difficulty::Easy)
    }

    #[test]
    fn commands_go_through_the_ledger() {
        let mut world = world();
        let id = world
            .place_building(BuildingKind::ViewingPlatform, Position::new(2.0, 2.0))
            .expect("placed");
        assert_eq!(world.ledger().funds(), 10_000.0 - 700.0 * 0.8);
        world.purchase_jeep().expect("jeep");
        assert_eq!(world.jeeps().len(), 1);
        assert_eq!(world.maintain_building(id).expect("repair"), 0.0);
    }

    #[test]
    fn snapshot_lists_entities() {
        let mut world = world();
        world
            .place_building(BuildingKind::Path, Position::new(0.5, 0.5))
            .expect("placed");
        world.refresh_stats();
        let snapshot = world.snapshot("test");
        assert_eq!(snapshot.buildings.len(), 1);
        assert_eq!(snapshot.stats.buildings, 1);
        assert_eq!(snapshot.difficulty, Difficulty::Easy);
        let json = serde_json::to_value(&snapshot).expect("serialises");
        assert_eq!(json["buildings"][0]["type"], "path");
    }
}
