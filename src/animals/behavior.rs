use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingKind, BuildingRegistry};
use crate::components::{AnimalId, BuildingId, Position};
use crate::needs::{BehaviorState, Needs};
use crate::terrain::{TerrainKind, TerrainQuery};

use super::Species;

/// Arrival distance for stations and natural resources, in tiles.
pub const ARRIVAL_TILES: f64 = 2.0;
const WANDER_REACHED_TILES: f64 = 1.0;
const GROUP_JITTER_TILES: f64 = 3.0;
const SOLO_WANDER_TILES: f64 = 10.0;
const RESOURCE_SCAN_STEP_TILES: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Water,
}

impl Resource {
    pub fn station_kind(self) -> BuildingKind {
        match self {
            Resource::Food => BuildingKind::FeedingStation,
            Resource::Water => BuildingKind::WaterStation,
        }
    }

    fn terrain(self) -> TerrainKind {
        match self {
            Resource::Food => TerrainKind::Grass,
            Resource::Water => TerrainKind::Water,
        }
    }
}

/// Where an animal is heading. Stations are referenced by id so a removed
/// building invalidates the target on the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Station {
        building: BuildingId,
        resource: Resource,
        position: Position,
    },
    NaturalResource {
        resource: Resource,
        position: Position,
    },
    Roam(Position),
}

impl Target {
    pub fn position(&self) -> Position {
        match *self {
            Target::Station { position, .. }
            | Target::NaturalResource { position, .. }
            | Target::Roam(position) => position,
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        match *self {
            Target::Station { resource, .. } | Target::NaturalResource { resource, .. } => {
                Some(resource)
            }
            Target::Roam(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WanderCycle {
    pub active: bool,
    pub timer: f64,
    pub cooldown: f64,
}

/// Read-only view of the park handed to each animal during its update.
pub struct Surroundings<'a> {
    pub terrain: &'a dyn TerrainQuery,
    pub buildings: &'a BuildingRegistry,
    pub need_rate: f64,
    /// Centroid of the animal's herd this tick, if it has companions.
    pub group_center: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animal {
    pub id: AnimalId,
    pub species: Species,
    pub position: Position,
    pub age_factor: f64,
    pub speed: f64,
    pub group_id: u32,
    pub needs: Needs,
    pub state: BehaviorState,
    pub target: Option<Target>,
    pub wander: WanderCycle,
}

impl Animal {
    pub fn new(
        id: AnimalId,
        species: Species,
        position: Position,
        age_factor: f64,
        group_id: u32,
        needs: Needs,
        tile_size: f64,
    ) -> Self {
        let age_factor = age_factor.clamp(0.2, 1.0);
        Self {
            id,
            species,
            position,
            age_factor,
            speed: species.profile().speed * age_factor * tile_size,
            group_id,
            needs,
            state: BehaviorState::Idle,
            target: None,
            wander: WanderCycle::default(),
        }
    }

    /// A fresh individual with randomised age and starting needs.
    pub fn random<R: Rng + ?Sized>(
        id: AnimalId,
        species: Species,
        position: Position,
        group_id: u32,
        tile_size: f64,
        rng: &mut R,
    ) -> Self {
        let needs = Needs::new(
            rng.gen_range(50.0..80.0),
            rng.gen_range(50.0..80.0),
            rng.gen_range(70.0..100.0),
            rng.gen_range(70.0..100.0),
        );
        let age = rng.gen_range(0.2..=1.0);
        Self::new(id, species, position, age, group_id, needs, tile_size)
    }

    pub fn is_dead(&self) -> bool {
        self.needs.is_dead()
    }

    pub fn update<R: Rng + ?Sized>(&mut self, dt: f64, env: &Surroundings<'_>, rng: &mut R) {
        self.needs.drift(dt, env.need_rate);
        if self.needs.is_dead() {
            return;
        }

        self.state = self.needs.decide(self.wander.active);
        match self.state {
            BehaviorState::SeekingFood => self.seek(Resource::Food, dt, env, rng),
            BehaviorState::SeekingWater => self.seek(Resource::Water, dt, env, rng),
            BehaviorState::Resting => {
                self.wander.active = false;
                self.target = None;
                self.needs.rest(dt);
            }
            BehaviorState::Wandering | BehaviorState::Idle => self.roam(dt, env, rng),
        }
    }

    fn seek<R: Rng + ?Sized>(
        &mut self,
        resource: Resource,
        dt: f64,
        env: &Surroundings<'_>,
        rng: &mut R,
    ) {
        self.wander.active = false;
        let Some(target) = self.resolve_target(resource, env, rng) else {
            self.target = None;
            self.state = BehaviorState::Idle;
            return;
        };
        self.target = Some(target);

        let goal = target.position();
        let arrival = ARRIVAL_TILES * env.terrain.tile_size();
        if self.position.distance(goal) >= arrival {
            if !self.move_toward(goal, dt, env) {
                self.target = None;
                return;
            }
            if self.position.distance(goal) >= arrival {
                return;
            }
        }

        match resource {
            Resource::Food => self.needs.eat(),
            Resource::Water => self.needs.drink(),
        }
        self.state = BehaviorState::Idle;
        self.target = None;
    }

    /// Keeps a still-standing station target, otherwise prefers the nearest
    /// station, then a previously chosen natural spot, then a fresh scan.
    fn resolve_target<R: Rng + ?Sized>(
        &self,
        resource: Resource,
        env: &Surroundings<'_>,
        rng: &mut R,
    ) -> Option<Target> {
        if let Some(Target::Station { building, resource: held, .. }) = self.target {
            if held == resource && env.buildings.get(building).is_some() {
                return self.target;
            }
        }

        if let Some(station) = env.buildings.nearest(resource.station_kind(), self.position) {
            return Some(Target::Station {
                building: station.id,
                resource,
                position: station.position,
            });
        }

        if let Some(Target::NaturalResource { resource: held, .. }) = self.target {
            if held == resource {
                return self.target;
            }
        }

        self.natural_sources(resource, env)
            .choose(rng)
            .map(|position| Target::NaturalResource {
                resource,
                position: *position,
            })
    }

    fn natural_sources(&self, resource: Resource, env: &Surroundings<'_>) -> Vec<Position> {
        let profile = self.species.profile();
        let radius = match resource {
            Resource::Food => profile.forage_radius_tiles,
            Resource::Water => profile.water_radius_tiles,
        } as i32;
        let tile = env.terrain.tile_size();
        let wanted = resource.terrain();

        let mut found = Vec::new();
        for dx in (-radius..=radius).step_by(RESOURCE_SCAN_STEP_TILES as usize) {
            for dy in (-radius..=radius).step_by(RESOURCE_SCAN_STEP_TILES as usize) {
                let candidate = self.position.offset(dx as f64 * tile, dy as f64 * tile);
                if env.terrain.clamp(candidate) != candidate {
                    continue;
                }
                if env.terrain.terrain_at(candidate) == wanted {
                    found.push(candidate);
                }
            }
        }
        found
    }

    fn roam<R: Rng + ?Sized>(&mut self, dt: f64, env: &Surroundings<'_>, rng: &mut R) {
        let tile = env.terrain.tile_size();
        if !self.wander.active {
            self.target = None;
            self.state = BehaviorState::Idle;
            self.wander.cooldown -= dt;
            if self.wander.cooldown > 0.0 {
                return;
            }
            let (anchor, reach) = match env.group_center {
                Some(center) => (center, GROUP_JITTER_TILES * tile),
                None => (self.position, SOLO_WANDER_TILES * tile),
            };
            let goal = env.terrain.clamp(anchor.offset(
                rng.gen_range(-reach..=reach),
                rng.gen_range(-reach..=reach),
            ));
            self.target = Some(Target::Roam(goal));
            self.wander = WanderCycle {
                active: true,
                timer: rng.gen_range(5.0..=15.0),
                cooldown: 0.0,
            };
            self.state = BehaviorState::Wandering;
        }

        let Some(Target::Roam(goal)) = self.target else {
            self.finish_wander(rng);
            return;
        };
        self.move_toward(goal, dt, env);
        self.wander.timer -= dt;
        if self.position.distance(goal) < WANDER_REACHED_TILES * tile || self.wander.timer <= 0.0 {
            self.finish_wander(rng);
        }
    }

    fn finish_wander<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.wander = WanderCycle {
            active: false,
            timer: 0.0,
            cooldown: rng.gen_range(2.0..=5.0),
        };
        self.target = None;
        self.state = BehaviorState::Idle;
    }

    /// Returns false when the step was blocked by water.
    fn move_toward(&mut self, goal: Position, dt: f64, env: &Surroundings<'_>) -> bool {
        let next = self.position.step_toward(goal, self.speed * dt);
        if env.terrain.is_water_at(next)
            && !self.species.profile().amphibious
            && self.state != BehaviorState::SeekingWater
        {
            return false;
        }
        self.position = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Difficulty, Ledger};
    use crate::terrain::GridTerrain;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn animal(species: Species, position: Position, needs: Needs) -> Animal {
        Animal::new(AnimalId(0), species, position, 1.0, 0, needs, 1.0)
    }

    fn env<'a>(terrain: &'a GridTerrain, buildings: &'a BuildingRegistry) -> Surroundings<'a> {
        Surroundings {
            terrain,
            buildings,
            need_rate: 1.0,
            group_center: None,
        }
    }

    #[test]
    fn drinks_on_arrival_at_water_station() {
        let terrain = GridTerrain::filled(20, 1.0, TerrainKind::Grass);
        let mut buildings = BuildingRegistry::new(1.0);
        let mut ledger = Ledger::new(Difficulty::Medium);
        let station = buildings
            .place(BuildingKind::WaterStation, Position::new(1.5, 0.0), &terrain, &mut ledger)
            .expect("station placed");
        let mut zebra = animal(Species::Zebra, Position::ORIGIN, Needs::new(10.0, 80.0, 90.0, 90.0));
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        zebra.update(0.0, &env(&terrain, &buildings), &mut rng);
        assert!((zebra.needs.thirst - 40.0).abs() < 1e-9);
        assert_eq!(zebra.state, BehaviorState::Idle);
        assert!(zebra.target.is_none());
        assert!(buildings.get(station).is_some());
    }

    #[test]
    fn walks_toward_nearest_station() {
        let terrain = GridTerrain::filled(40, 1.0, TerrainKind::Grass);
        let mut buildings = BuildingRegistry::new(1.0);
        let mut ledger = Ledger::new(Difficulty::Medium);
        let near = buildings
            .place(BuildingKind::FeedingStation, Position::new(10.0, 0.0), &terrain, &mut ledger)
            .expect("near station");
        buildings
            .place(BuildingKind::FeedingStation, Position::new(-15.0, 0.0), &terrain, &mut ledger)
            .expect("far station");
        let mut lion = animal(Species::Lion, Position::ORIGIN, Needs::new(85.0, 10.0, 90.0, 90.0));
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        lion.update(1.0, &env(&terrain, &buildings), &mut rng);
        assert_eq!(lion.state, BehaviorState::SeekingFood);
        assert!(matches!(lion.target, Some(Target::Station { building, .. }) if building == near));
        assert!((lion.position.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_natural_water() {
        let mut terrain = GridTerrain::filled(40, 1.0, TerrainKind::Grass);
        let water_cell = terrain.world_to_grid(Position::new(5.0, 5.0));
        terrain.set(water_cell, TerrainKind::Water);
        let buildings = BuildingRegistry::new(1.0);
        let mut elephant =
            animal(Species::Elephant, Position::new(0.5, 0.5), Needs::new(10.0, 85.0, 90.0, 90.0));
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        elephant.update(0.1, &env(&terrain, &buildings), &mut rng);
        match elephant.target {
            Some(Target::NaturalResource { resource, position }) => {
                assert_eq!(resource, Resource::Water);
                assert!(terrain.is_water_at(position));
            }
            other => panic!("expected natural water target, got {other:?}"),
        }
    }

    #[test]
    fn nothing_to_eat_means_idle() {
        let terrain = GridTerrain::filled(10, 1.0, TerrainKind::Rocky);
        let buildings = BuildingRegistry::new(1.0);
        let mut zebra = animal(Species::Zebra, Position::ORIGIN, Needs::new(85.0, 10.0, 90.0, 90.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        zebra.update(0.1, &env(&terrain, &buildings), &mut rng);
        assert_eq!(zebra.state, BehaviorState::Idle);
        assert!(zebra.target.is_none());
    }

    #[test]
    fn water_blocks_land_animals_but_not_crocodiles() {
        let terrain = GridTerrain::from_rows(&["GGGG", "GGWG", "GGGG", "GGGG"], 1.0).expect("rows");
        let buildings = BuildingRegistry::new(1.0);
        let surroundings = env(&terrain, &buildings);
        let water = terrain.grid_to_world((2, 1));

        let mut lion = animal(Species::Lion, Position::new(-1.5, -0.5), Needs::default());
        assert!(!lion.move_toward(water, 1.0, &surroundings));
        assert_eq!(lion.position, Position::new(-1.5, -0.5));

        let mut croc = animal(Species::Crocodile, Position::new(-1.5, -0.5), Needs::default());
        assert!(croc.move_toward(water, 1.0, &surroundings));
        assert!(terrain.is_water_at(croc.position));
    }

    #[test]
    fn need_spike_interrupts_wander() {
        let terrain = GridTerrain::filled(40, 1.0, TerrainKind::Grass);
        let buildings = BuildingRegistry::new(1.0);
        let mut zebra = animal(Species::Zebra, Position::ORIGIN, Needs::new(10.0, 10.0, 90.0, 90.0));
        zebra.target = Some(Target::Roam(Position::new(15.0, 0.0)));
        zebra.wander = WanderCycle {
            active: true,
            timer: 10.0,
            cooldown: 0.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        zebra.update(0.1, &env(&terrain, &buildings), &mut rng);
        assert_eq!(zebra.state, BehaviorState::Wandering);
        assert!(zebra.wander.active);
        assert!((zebra.position.x - 0.4).abs() < 1e-9);

        zebra.needs.hunger = 95.0;
        zebra.update(0.1, &env(&terrain, &buildings), &mut rng);
        assert_eq!(zebra.state, BehaviorState::SeekingFood);
        assert!(!zebra.wander.active);
    }
}
