//! The animal population: species catalog, herd bookkeeping, spawning,
//! reproduction and the aggregates the economy reads.

mod behavior;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use behavior::{Animal, Resource, Surroundings, Target, WanderCycle, ARRIVAL_TILES};

use crate::buildings::BuildingRegistry;
use crate::components::{AnimalId, Position};
use crate::ledger::Ledger;
use crate::terrain::{TerrainKind, TerrainQuery};

pub const POPULATION_CAP: usize = 40;
const NATURAL_SPAWN_RATE: f64 = 0.005;
const NATURAL_SPAWN_HEADROOM: f64 = 1.5;
const BREEDING_AGE: f64 = 0.8;
const MIN_BREEDING_GROUP: usize = 3;
const REPRODUCTION_COOLDOWN: f64 = 30.0;
const NEWBORN_AGE: f64 = 0.2;
const SPAWN_ATTEMPTS: usize = 50;
const NEARBY_SPAWN_TILES: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Elephant,
    Lion,
    Zebra,
    Crocodile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diet {
    Herbivore,
    Carnivore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesProfile {
    /// Tiles per second at full age factor.
    pub speed: f64,
    pub food_consumption: f64,
    pub water_consumption: f64,
    pub tourist_appeal: f64,
    pub amphibious: bool,
    pub flagship: bool,
    pub diet: Diet,
    pub herd_size: usize,
    pub forage_radius_tiles: u32,
    pub water_radius_tiles: u32,
}

const ELEPHANT: SpeciesProfile = SpeciesProfile {
    speed: 3.0,
    food_consumption: 2.0,
    water_consumption: 3.0,
    tourist_appeal: 3.0,
    amphibious: false,
    flagship: true,
    diet: Diet::Herbivore,
    herd_size: 5,
    forage_radius_tiles: 20,
    water_radius_tiles: 30,
};

const LION: SpeciesProfile = SpeciesProfile {
    speed: 5.0,
    food_consumption: 1.5,
    water_consumption: 1.0,
    tourist_appeal: 3.5,
    amphibious: false,
    flagship: true,
    diet: Diet::Carnivore,
    herd_size: 5,
    forage_radius_tiles: 20,
    water_radius_tiles: 30,
};

const ZEBRA: SpeciesProfile = SpeciesProfile {
    speed: 4.0,
    food_consumption: 1.0,
    water_consumption: 1.0,
    tourist_appeal: 2.0,
    amphibious: false,
    flagship: false,
    diet: Diet::Herbivore,
    herd_size: 5,
    forage_radius_tiles: 20,
    water_radius_tiles: 30,
};

const CROCODILE: SpeciesProfile = SpeciesProfile {
    speed: 2.5,
    food_consumption: 1.5,
    water_consumption: 2.0,
    tourist_appeal: 2.5,
    amphibious: true,
    flagship: false,
    diet: Diet::Carnivore,
    herd_size: 3,
    forage_radius_tiles: 20,
    water_radius_tiles: 30,
};

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Elephant,
        Species::Lion,
        Species::Zebra,
        Species::Crocodile,
    ];

    pub fn profile(self) -> &'static SpeciesProfile {
        match self {
            Species::Elephant => &ELEPHANT,
            Species::Lion => &LION,
            Species::Zebra => &ZEBRA,
            Species::Crocodile => &CROCODILE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Species::Elephant => "elephant",
            Species::Lion => "lion",
            Species::Zebra => "zebra",
            Species::Crocodile => "crocodile",
        }
    }

    fn can_stand_on(self, kind: TerrainKind) -> bool {
        kind == TerrainKind::Grass || (kind == TerrainKind::Water && self.profile().amphibious)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-species aggregates recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub population: usize,
    pub avg_health: f64,
    pub avg_hunger: f64,
    pub avg_thirst: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterEntry {
    pub initial: usize,
    pub herd_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AnimalPopulation {
    animals: Vec<Animal>,
    roster: BTreeMap<Species, RosterEntry>,
    stats: BTreeMap<Species, SpeciesStats>,
    last_reproduction: HashMap<(Species, u32), f64>,
    elapsed: f64,
    next_id: u64,
    next_group: u32,
}

impl AnimalPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares how many of `species` the park starts with, in herds of
    /// `herd_size` (the species default when `None`).
    pub fn with_species(mut self, species: Species, initial: usize, herd_size: Option<usize>) -> Self {
        let herd_size = herd_size.unwrap_or(species.profile().herd_size).max(1);
        self.roster.insert(species, RosterEntry { initial, herd_size });
        self
    }

    pub fn roster(&self) -> &BTreeMap<Species, RosterEntry> {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animal> {
        self.animals.iter()
    }

    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.animals.iter_mut().find(|a| a.id == id)
    }

    pub fn stats(&self) -> &BTreeMap<Species, SpeciesStats> {
        &self.stats
    }

    pub fn count(&self, species: Species) -> usize {
        self.animals.iter().filter(|a| a.species == species).count()
    }

    pub fn count_diet(&self, diet: Diet) -> usize {
        self.animals
            .iter()
            .filter(|a| a.species.profile().diet == diet)
            .count()
    }

    pub fn herbivores(&self) -> usize {
        self.count_diet(Diet::Herbivore)
    }

    pub fn carnivores(&self) -> usize {
        self.count_diet(Diet::Carnivore)
    }

    pub fn spawn_initial<R: Rng + ?Sized>(&mut self, terrain: &dyn TerrainQuery, rng: &mut R) {
        let roster: Vec<(Species, RosterEntry)> =
            self.roster.iter().map(|(s, e)| (*s, *e)).collect();
        for (species, entry) in roster {
            let mut remaining = entry.initial;
            while remaining > 0 {
                let herd = remaining.min(entry.herd_size);
                let leader = self.spawn(species, None, None, terrain, rng);
                let (anchor, group) = match self.get(leader) {
                    Some(animal) => (animal.position, animal.group_id),
                    None => break,
                };
                for _ in 1..herd {
                    self.spawn(species, Some(anchor), Some(group), terrain, rng);
                }
                remaining -= herd;
            }
            tracing::debug!(%species, count = entry.initial, "spawned initial animals");
        }
        self.refresh_stats();
    }

    /// Places one animal. A `nearby` anchor restricts the search to a few
    /// tiles around it; exhausting the attempts falls back to the anchor or the
    /// origin.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        species: Species,
        nearby: Option<Position>,
        group: Option<u32>,
        terrain: &dyn TerrainQuery,
        rng: &mut R,
    ) -> AnimalId {
        let position = find_spawn_position(species, nearby, terrain, rng);
        let group_id = group.unwrap_or_else(|| self.allocate_group());
        let id = self.allocate_id();
        let animal = Animal::random(id, species, position, group_id, terrain.tile_size(), rng);
        tracing::debug!(id = id.raw(), %species, group = group_id, "animal spawned");
        self.animals.push(animal);
        id
    }

    pub fn insert(&mut self, mut animal: Animal) -> AnimalId {
        let id = self.allocate_id();
        animal.id = id;
        self.next_group = self.next_group.max(animal.group_id + 1);
        self.animals.push(animal);
        id
    }

    pub fn remove(&mut self, id: AnimalId) -> Option<Animal> {
        let index = self.animals.iter().position(|a| a.id == id)?;
        Some(self.animals.remove(index))
    }

    /// Swaps the whole population, as loading a save does.
    pub fn replace_all(&mut self, animals: Vec<Animal>) {
        self.animals.clear();
        self.last_reproduction.clear();
        for animal in animals {
            self.insert(animal);
        }
        self.refresh_stats();
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        terrain: &dyn TerrainQuery,
        buildings: &BuildingRegistry,
        ledger: &mut Ledger,
        rng: &mut R,
    ) {
        self.elapsed += dt;
        let centers = self.group_centers();
        let need_rate = ledger.settings().animal_need_rate;

        for animal in &mut self.animals {
            let env = Surroundings {
                terrain,
                buildings,
                need_rate,
                group_center: centers.get(&(animal.species, animal.group_id)).copied(),
            };
            animal.update(dt, &env, rng);
        }

        let (dead, alive): (Vec<Animal>, Vec<Animal>) =
            std::mem::take(&mut self.animals).into_iter().partition(Animal::is_dead);
        self.animals = alive;
        for animal in &dead {
            tracing::debug!(id = animal.id.raw(), species = %animal.species, "animal died");
            ledger.notify(format!("A {} has died", animal.species));
        }

        self.refresh_stats();
        ledger.update_ecosystem_balance(&self.stats);

        self.natural_spawning(dt, terrain, ledger, rng);
        self.reproduce(terrain, ledger, rng);
    }

    fn natural_spawning<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        terrain: &dyn TerrainQuery,
        ledger: &mut Ledger,
        rng: &mut R,
    ) {
        let roster: Vec<(Species, usize)> = self.roster.iter().map(|(s, e)| (*s, e.initial)).collect();
        for (species, initial) in roster {
            if self.animals.len() >= POPULATION_CAP {
                return;
            }
            let limit = initial as f64 * NATURAL_SPAWN_HEADROOM;
            if (self.count(species) as f64) < limit && rng.gen_bool((NATURAL_SPAWN_RATE * dt).clamp(0.0, 1.0)) {
                self.spawn(species, None, None, terrain, rng);
                ledger.notify(format!("A new {species} has appeared!"));
            }
        }
    }

    fn reproduce<R: Rng + ?Sized>(&mut self, terrain: &dyn TerrainQuery, ledger: &mut Ledger, rng: &mut R) {
        let mut buckets: BTreeMap<(Species, u32), Vec<Position>> = BTreeMap::new();
        for animal in self.animals.iter().filter(|a| a.age_factor >= BREEDING_AGE) {
            buckets
                .entry((animal.species, animal.group_id))
                .or_default()
                .push(animal.position);
        }

        for ((species, group), members) in buckets {
            if members.len() < MIN_BREEDING_GROUP || self.animals.len() >= POPULATION_CAP {
                continue;
            }
            let last = self.last_reproduction.get(&(species, group)).copied().unwrap_or(0.0);
            if self.elapsed - last < REPRODUCTION_COOLDOWN {
                continue;
            }
            let Some(parent) = members.choose(rng).copied() else {
                continue;
            };
            let id = self.spawn(species, Some(parent), Some(group), terrain, rng);
            if let Some(newborn) = self.get_mut(id) {
                newborn.age_factor = NEWBORN_AGE;
                newborn.speed = species.profile().speed * NEWBORN_AGE * terrain.tile_size();
            }
            self.last_reproduction.insert((species, group), self.elapsed);
            ledger.notify(format!("A baby {species} was born!"));
        }
    }

    /// Centroid of every herd with at least two members. Lone animals get
    /// no entry and wander around themselves.
    fn group_centers(&self) -> HashMap<(Species, u32), Position> {
        let mut groups: HashMap<(Species, u32), Vec<Position>> = HashMap::new();
        for animal in &self.animals {
            groups
                .entry((animal.species, animal.group_id))
                .or_default()
                .push(animal.position);
        }
        groups
            .into_iter()
            .filter(|(_, points)| points.len() >= 2)
            .filter_map(|(key, points)| Position::centroid(points).map(|c| (key, c)))
            .collect()
    }

    fn refresh_stats(&mut self) {
        let mut stats: BTreeMap<Species, SpeciesStats> = self
            .roster
            .keys()
            .map(|species| (*species, SpeciesStats::default()))
            .collect();
        for animal in &self.animals {
            let entry = stats.entry(animal.species).or_default();
            entry.population += 1;
            entry.avg_health += animal.needs.health;
            entry.avg_hunger += animal.needs.hunger;
            entry.avg_thirst += animal.needs.thirst;
        }
        for entry in stats.values_mut() {
            if entry.population > 0 {
                let n = entry.population as f64;
                entry.avg_health /= n;
                entry.avg_hunger /= n;
                entry.avg_thirst /= n;
            }
        }
        self.stats = stats;
    }

    /// 30 per species present plus ten times the health-weighted average
    /// species appeal, capped at 100.
    pub fn tourist_appeal(&self) -> f64 {
        if self.animals.is_empty() {
            return 0.0;
        }
        let mut present: Vec<Species> = self.animals.iter().map(|a| a.species).collect();
        present.sort();
        present.dedup();
        let base = present.len() as f64 * 30.0;
        let weighted: f64 = self
            .animals
            .iter()
            .map(|a| a.species.profile().tourist_appeal * a.needs.health / 100.0)
            .sum();
        let average = weighted / self.animals.len() as f64;
        (base + average * 10.0).min(100.0)
    }

    pub fn monthly_food_cost(&self) -> f64 {
        self.animals
            .iter()
            .map(|a| a.species.profile().food_consumption * 100.0)
            .sum()
    }

    fn allocate_id(&mut self) -> AnimalId {
        let id = AnimalId(self.next_id);
        self.next_id += 1;
        id
    }

    fn allocate_group(&mut self) -> u32 {
        let group = self.next_group;
        self.next_group += 1;
        group
    }
}

fn find_spawn_position<R: Rng + ?Sized>(
    species: Species,
    nearby: Option<Position>,
    terrain: &dyn TerrainQuery,
    rng: &mut R,
) -> Position {
    let extent = terrain.half_extent();
    let reach = NEARBY_SPAWN_TILES * terrain.tile_size();
    for _ in 0..SPAWN_ATTEMPTS {
        let candidate = match nearby {
            Some(anchor) => terrain.clamp(
                anchor.offset(rng.gen_range(-reach..=reach), rng.gen_range(-reach..=reach)),
            ),
            None => Position::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent)),
        };
        if species.can_stand_on(terrain.terrain_at(candidate)) {
            return candidate;
        }
    }
    nearby.unwrap_or(Position::ORIGIN)
}
