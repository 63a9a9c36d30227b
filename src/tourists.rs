//! Visitors: satisfaction, wandering between sights, spending and leaving.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::animals::AnimalPopulation;
use crate::buildings::{BuildingKind, BuildingRegistry};
use crate::components::{Position, TouristId};
use crate::ledger::Ledger;
use crate::terrain::{TerrainKind, TerrainQuery};

const SATISFACTION_DRIFT: f64 = 0.5;
const SPECIES_BONUS: f64 = 2.0;
const FLAGSHIP_BONUS: f64 = 1.0;
const PATH_BONUS: f64 = 0.2;
const OFF_PATH_PENALTY: f64 = 1.0;
const PLATFORM_BONUS: f64 = 2.0;
const ANIMAL_SIGHT_TILES: f64 = 10.0;
const BUILDING_SIGHT_TILES: f64 = 3.0;
const WAYPOINT_REACHED_TILES: f64 = 0.5;
const TARGET_REACHED_TILES: f64 = 1.0;
const SPEND_INTERVAL: f64 = 60.0;
const BASELINE_SATISFACTION: f64 = 50.0;
const RANDOM_POINT_ATTEMPTS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Tourist {
    pub id: TouristId,
    pub position: Position,
    pub speed: f64,
    pub satisfaction: f64,
    pub spending_rate: f64,
    /// Visit budget in simulated minutes.
    pub visit_duration: f64,
    /// Elapsed visit in simulated minutes.
    pub time_spent: f64,
    pub path: Vec<Position>,
    pub path_index: usize,
    pub target: Option<Position>,
    pub wait: f64,
    spend_clock: f64,
}

impl Tourist {
    pub fn new(
        id: TouristId,
        position: Position,
        speed: f64,
        satisfaction: f64,
        spending_rate: f64,
        visit_duration: f64,
    ) -> Self {
        Self {
            id,
            position,
            speed,
            satisfaction: satisfaction.clamp(0.0, 100.0),
            spending_rate,
            visit_duration,
            time_spent: 0.0,
            path: Vec::new(),
            path_index: 0,
            target: None,
            wait: 0.0,
            spend_clock: 0.0,
        }
    }

    pub fn random<R: Rng + ?Sized>(
        id: TouristId,
        position: Position,
        tile_size: f64,
        rng: &mut R,
    ) -> Self {
        Self::new(
            id,
            position,
            rng.gen_range(2.0..4.0) * tile_size,
            rng.gen_range(50.0..70.0),
            rng.gen_range(5.0..15.0),
            rng.gen_range(5.0..15.0),
        )
    }

    pub fn has_finished(&self) -> bool {
        self.time_spent >= self.visit_duration
    }

    /// Review score in 1..=5 derived from final satisfaction.
    pub fn review_score(&self) -> u8 {
        ((self.satisfaction / 20.0) as i64).clamp(1, 5) as u8
    }

    fn update_satisfaction(&mut self, dt: f64, env: &Sights<'_>) {
        let tile = env.terrain.tile_size();
        let minutes = dt / 60.0;
        let mut delta = -SATISFACTION_DRIFT;

        let mut species_seen = Vec::new();
        for animal in env.animals.iter() {
            if animal.position.distance(self.position) >= ANIMAL_SIGHT_TILES * tile {
                continue;
            }
            if !species_seen.contains(&animal.species) {
                species_seen.push(animal.species);
            }
            if animal.species.profile().flagship {
                delta += FLAGSHIP_BONUS;
            }
        }
        delta += species_seen.len() as f64 * SPECIES_BONUS;

        let mut on_path = env.terrain.terrain_at(self.position) == TerrainKind::Path;
        let mut at_platform = false;
        for building in env.buildings.iter() {
            if building.position.distance(self.position) >= BUILDING_SIGHT_TILES * tile {
                continue;
            }
            match building.kind {
                BuildingKind::Path => on_path = true,
                BuildingKind::ViewingPlatform => at_platform = true,
                _ => {}
            }
        }
        delta += if on_path { PATH_BONUS } else { -OFF_PATH_PENALTY };
        if at_platform {
            delta += PLATFORM_BONUS;
        }

        self.satisfaction = (self.satisfaction + delta * minutes).clamp(0.0, 100.0);
    }

    fn walk<R: Rng + ?Sized>(&mut self, dt: f64, env: &Sights<'_>, rng: &mut R) {
        if self.wait > 0.0 {
            self.wait -= dt;
            return;
        }
        let tile = env.terrain.tile_size();

        if self.path_index < self.path.len() {
            let waypoint = self.path[self.path_index];
            self.target = Some(waypoint);
            if self.position.distance(waypoint) < WAYPOINT_REACHED_TILES * tile {
                self.path_index += 1;
                if self.path_index >= self.path.len() {
                    self.path.clear();
                    self.path_index = 0;
                    self.target = None;
                    self.wait = rng.gen_range(5.0..20.0);
                    return;
                }
                self.target = Some(self.path[self.path_index]);
            }
        }

        let following = self.path_index < self.path.len();
        let goal = match self.target {
            Some(goal) if following || self.position.distance(goal) >= TARGET_REACHED_TILES * tile => {
                goal
            }
            _ => {
                self.choose_target(env, rng);
                self.wait = rng.gen_range(5.0..20.0);
                return;
            }
        };

        let next = self.position.step_toward(goal, self.speed * dt);
        if !env.terrain.is_water_at(next) {
            self.position = next;
        }
    }

    fn choose_target<R: Rng + ?Sized>(&mut self, env: &Sights<'_>, rng: &mut R) {
        if self.path.is_empty() {
            let start = env.terrain.world_to_grid(self.position);
            let route = env.terrain.find_path(start, env.terrain.exit_tile());
            if route.len() > 1 {
                self.path = route
                    .into_iter()
                    .map(|cell| env.terrain.grid_to_world(cell))
                    .collect();
                self.path_index = 0;
                self.target = self.path.first().copied();
                return;
            }
        }

        let paths: Vec<Position> = env
            .buildings
            .of_kind(BuildingKind::Path)
            .map(|b| b.position)
            .collect();
        let platforms: Vec<Position> = env
            .buildings
            .of_kind(BuildingKind::ViewingPlatform)
            .map(|b| b.position)
            .collect();
        let animals: Vec<Position> = env.animals.iter().map(|a| a.position).collect();

        self.target = if rng.gen_bool(0.7) && !paths.is_empty() {
            paths.choose(rng).copied()
        } else if rng.gen_bool(0.8) && !platforms.is_empty() {
            platforms.choose(rng).copied()
        } else if rng.gen_bool(0.9) && !animals.is_empty() {
            animals.choose(rng).copied()
        } else {
            Some(random_dry_point(env.terrain, rng).unwrap_or(self.position))
        };
    }
}

fn random_dry_point<R: Rng + ?Sized>(terrain: &dyn TerrainQuery, rng: &mut R) -> Option<Position> {
    let extent = terrain.half_extent();
    (0..RANDOM_POINT_ATTEMPTS)
        .map(|_| Position::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent)))
        .find(|candidate| !terrain.is_water_at(*candidate))
}

/// What a tourist can see and walk on this tick.
pub struct Sights<'a> {
    pub terrain: &'a dyn TerrainQuery,
    pub buildings: &'a BuildingRegistry,
    pub animals: &'a AnimalPopulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisitReport {
    pub departures: usize,
    pub spent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TouristPopulation {
    tourists: Vec<Tourist>,
    next_id: u64,
}

impl TouristPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tourists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tourists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tourist> {
        self.tourists.iter()
    }

    pub fn spawn_at<R: Rng + ?Sized>(
        &mut self,
        position: Position,
        tile_size: f64,
        rng: &mut R,
    ) -> TouristId {
        let id = self.allocate_id();
        self.tourists.push(Tourist::random(id, position, tile_size, rng));
        id
    }

    pub fn insert(&mut self, mut tourist: Tourist) -> TouristId {
        let id = self.allocate_id();
        tourist.id = id;
        self.tourists.push(tourist);
        id
    }

    pub fn replace_all(&mut self, tourists: Vec<Tourist>) {
        self.tourists.clear();
        for tourist in tourists {
            self.insert(tourist);
        }
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        env: &Sights<'_>,
        ledger: &mut Ledger,
        rng: &mut R,
    ) -> VisitReport {
        let mut report = VisitReport::default();
        for tourist in &mut self.tourists {
            tourist.time_spent += dt / 60.0;
            tourist.update_satisfaction(dt, env);
            tourist.walk(dt, env, rng);

            tourist.spend_clock += dt;
            while tourist.spend_clock >= SPEND_INTERVAL {
                tourist.spend_clock -= SPEND_INTERVAL;
                let amount = tourist.spending_rate * tourist.satisfaction / BASELINE_SATISFACTION;
                ledger.add_funds(amount);
                report.spent += amount;
            }
        }

        let (leaving, staying): (Vec<Tourist>, Vec<Tourist>) =
            std::mem::take(&mut self.tourists).into_iter().partition(Tourist::has_finished);
        self.tourists = staying;
        for tourist in &leaving {
            let score = tourist.review_score();
            tracing::debug!(id = tourist.id.raw(), score, "tourist left the park");
            ledger.record_review(score);
        }
        report.departures = leaving.len();
        report
    }

    /// Removes up to `max` tourists standing within `radius` of `at`, in
    /// arrival order. Everyone else stays in the park.
    pub fn board_near(&mut self, at: Position, radius: f64, max: usize) -> Vec<Tourist> {
        let mut boarded = Vec::new();
        let mut index = 0;
        while index < self.tourists.len() && boarded.len() < max {
            if self.tourists[index].position.distance(at) <= radius {
                boarded.push(self.tourists.remove(index));
            } else {
                index += 1;
            }
        }
        boarded
    }

    /// Puts a returning passenger back in the park with a satisfaction bonus.
    pub fn reinsert(&mut self, mut tourist: Tourist, at: Position, bonus: f64) {
        tourist.position = at;
        tourist.satisfaction = (tourist.satisfaction + bonus).clamp(0.0, 100.0);
        tourist.path.clear();
        tourist.path_index = 0;
        tourist.target = None;
        tourist.wait = 0.0;
        self.tourists.push(tourist);
    }

    fn allocate_id(&mut self) -> TouristId {
        let id = TouristId(self.next_id);
        self.next_id += 1;
        id
    }
}
