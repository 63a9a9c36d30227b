//! Placed structures: stations animals feed and drink at, tourist paths and
//! platforms, and decor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, Position};
use crate::error::{ParkError, ParkResult, PlacementIssue};
use crate::ledger::Ledger;
use crate::terrain::TerrainQuery;

const BASE_DECAY: f64 = 0.1;
const NEGLECT_DECAY: f64 = 0.2;
const NEGLECT_BELOW: f64 = 30.0;
const WATERLOGGED_DECAY: f64 = 0.3;
const REPAIR_COST_PER_POINT: f64 = 0.5;
const FULL_HEALTH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    FeedingStation,
    WaterStation,
    Path,
    ViewingPlatform,
    Tree,
    Bush,
    Flower,
    Pond,
    Road,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingSpec {
    /// Footprint in tiles (width, height), centred on the building position.
    pub footprint: (f64, f64),
    pub cost: f64,
    pub maintenance_cost: f64,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 9] = [
        BuildingKind::FeedingStation,
        BuildingKind::WaterStation,
        BuildingKind::Path,
        BuildingKind::ViewingPlatform,
        BuildingKind::Tree,
        BuildingKind::Bush,
        BuildingKind::Flower,
        BuildingKind::Pond,
        BuildingKind::Road,
    ];

    pub fn spec(self) -> BuildingSpec {
        let (footprint, cost, maintenance_cost) = match self {
            BuildingKind::FeedingStation => ((2.0, 2.0), 500.0, 50.0),
            BuildingKind::WaterStation => ((2.0, 2.0), 400.0, 40.0),
            BuildingKind::Path => ((1.0, 1.0), 100.0, 0.0),
            BuildingKind::ViewingPlatform => ((3.0, 3.0), 700.0, 50.0),
            BuildingKind::Tree => ((1.0, 2.0), 50.0, 0.0),
            BuildingKind::Bush => ((1.0, 0.5), 30.0, 0.0),
            BuildingKind::Flower => ((0.5, 0.5), 20.0, 0.0),
            BuildingKind::Pond => ((2.0, 2.0), 100.0, 0.0),
            BuildingKind::Road => ((1.0, 1.0), 100.0, 0.0),
        };
        BuildingSpec {
            footprint,
            cost,
            maintenance_cost,
        }
    }

    /// Operational structures wear out and cost upkeep; the rest are inert.
    pub fn is_operational(self) -> bool {
        matches!(
            self,
            BuildingKind::FeedingStation | BuildingKind::WaterStation | BuildingKind::ViewingPlatform
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildingKind::FeedingStation => "feeding_station",
            BuildingKind::WaterStation => "water_station",
            BuildingKind::Path => "path",
            BuildingKind::ViewingPlatform => "viewing_platform",
            BuildingKind::Tree => "tree",
            BuildingKind::Bush => "bush",
            BuildingKind::Flower => "flower",
            BuildingKind::Pond => "pond",
            BuildingKind::Road => "road",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub position: Position,
    pub health: f64,
}

impl Building {
    fn bounds(&self, tile_size: f64) -> Rect {
        Rect::around(self.position, self.kind.spec().footprint, tile_size)
    }

    pub fn damage(&self) -> f64 {
        (FULL_HEALTH - self.health).max(0.0)
    }

    pub fn repair_cost(&self) -> f64 {
        self.damage() * REPAIR_COST_PER_POINT
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rect {
    fn around(center: Position, footprint: (f64, f64), tile_size: f64) -> Self {
        let half_w = footprint.0 * tile_size / 2.0;
        let half_h = footprint.1 * tile_size / 2.0;
        Self {
            min_x: center.x - half_w,
            min_y: center.y - half_h,
            max_x: center.x + half_w,
            max_y: center.y + half_h,
        }
    }

    /// Strict overlap; shared edges do not count.
    fn overlaps(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        self.min_x < other.max_x - EPS
            && other.min_x < self.max_x - EPS
            && self.min_y < other.max_y - EPS
            && other.min_y < self.max_y - EPS
    }
}

#[derive(Debug, Default, Clone)]
pub struct BuildingRegistry {
    buildings: Vec<Building>,
    next_id: u64,
    tile_size: f64,
}

impl BuildingRegistry {
    pub fn new(tile_size: f64) -> Self {
        Self {
            buildings: Vec::new(),
            next_id: 0,
            tile_size,
        }
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    pub fn of_kind(&self, kind: BuildingKind) -> impl Iterator<Item = &Building> {
        self.buildings.iter().filter(move |b| b.kind == kind)
    }

    pub fn count(&self, kind: BuildingKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Nearest building of `kind`; the first of equally distant candidates wins.
    pub fn nearest(&self, kind: BuildingKind, from: Position) -> Option<&Building> {
        let mut best: Option<(&Building, f64)> = None;
        for building in self.of_kind(kind) {
            let dist = building.position.distance(from);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((building, dist)),
            }
        }
        best.map(|(building, _)| building)
    }

    pub fn placement_cost(&self, kind: BuildingKind, ledger: &Ledger) -> f64 {
        kind.spec().cost * ledger.settings().building_cost_multiplier
    }

    pub fn is_occupied(&self, kind: BuildingKind, position: Position) -> bool {
        let candidate = Rect::around(position, kind.spec().footprint, self.tile_size);
        self.buildings
            .iter()
            .any(|b| b.bounds(self.tile_size).overlaps(&candidate))
    }

    pub fn place(
        &mut self,
        kind: BuildingKind,
        position: Position,
        terrain: &dyn TerrainQuery,
        ledger: &mut Ledger,
    ) -> ParkResult<BuildingId> {
        let cost = self.placement_cost(kind, ledger);
        if !ledger.can_afford(cost) {
            ledger.notify(format!("Not enough funds to build {kind}"));
            return Err(ParkError::InsufficientFunds {
                needed: cost,
                available: ledger.funds(),
            });
        }
        if !terrain.is_buildable_at(position) {
            ledger.notify(format!("Cannot build {kind} on this terrain"));
            return Err(ParkError::InvalidPlacement {
                kind,
                issue: PlacementIssue::Terrain,
            });
        }
        if self.is_occupied(kind, position) {
            ledger.notify(format!("Cannot build {kind} here: space occupied"));
            return Err(ParkError::InvalidPlacement {
                kind,
                issue: PlacementIssue::Occupied,
            });
        }

        ledger.add_funds(-cost);
        ledger.notify(format!("Built {kind} for ${cost:.0}"));
        Ok(self.insert(kind, position, FULL_HEALTH))
    }

    /// Registers a building without charging for it (used when loading saves).
    pub(crate) fn insert(&mut self, kind: BuildingKind, position: Position, health: f64) -> BuildingId {
        let id = BuildingId(self.next_id);
        self.next_id += 1;
        self.buildings.push(Building {
            id,
            kind,
            position,
            health: health.clamp(0.0, FULL_HEALTH),
        });
        id
    }

    pub fn remove(&mut self, id: BuildingId) -> Option<Building> {
        let index = self.buildings.iter().position(|b| b.id == id)?;
        Some(self.buildings.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.buildings.clear();
    }

    /// Wears operational buildings down and removes those that break.
    pub fn tick(&mut self, dt: f64, terrain: &dyn TerrainQuery, ledger: &mut Ledger) -> Vec<Building> {
        for building in self.buildings.iter_mut().filter(|b| b.kind.is_operational()) {
            let mut decay = BASE_DECAY * dt;
            if building.kind == BuildingKind::FeedingStation && building.health < NEGLECT_BELOW {
                decay += NEGLECT_DECAY * dt;
            }
            if terrain.is_water_at(building.position) {
                decay += WATERLOGGED_DECAY * dt;
            }
            building.health = (building.health - decay).max(0.0);
        }

        let (broken, standing): (Vec<Building>, Vec<Building>) = std::mem::take(&mut self.buildings)
            .into_iter()
            .partition(|b| b.health <= 0.0);
        self.buildings = standing;
        for building in &broken {
            tracing::debug!(id = building.id.raw(), kind = %building.kind, "building broke down");
            ledger.notify(format!("{} has broken down completely", building.kind));
        }
        broken
    }

    pub fn maintain(&mut self, id: BuildingId, ledger: &mut Ledger) -> ParkResult<f64> {
        let building = self
            .buildings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ParkError::UnknownBuilding(id))?;
        let cost = building.repair_cost();
        if !ledger.can_afford(cost) {
            ledger.notify(format!("Not enough funds to repair {}", building.kind));
            return Err(ParkError::InsufficientFunds {
                needed: cost,
                available: ledger.funds(),
            });
        }
        building.health = FULL_HEALTH;
        let kind = building.kind;
        ledger.add_funds(-cost);
        ledger.notify(format!("Repaired {kind} for ${cost:.2}"));
        Ok(cost)
    }

    /// Upkeep grows with neglect: a building at half health costs 1.5x base.
    pub fn monthly_maintenance_cost(&self) -> f64 {
        self.buildings
            .iter()
            .filter(|b| b.kind.is_operational())
            .map(|b| b.kind.spec().maintenance_cost * (1.0 + (1.0 - b.health / FULL_HEALTH)))
            .sum()
    }

    pub fn tourist_infrastructure_score(&self) -> f64 {
        if self.buildings.is_empty() {
            return 0.0;
        }
        let paths = self.count(BuildingKind::Path) as f64;
        let platforms = self.count(BuildingKind::ViewingPlatform) as f64;
        let base = (paths * 5.0 + platforms * 15.0).min(80.0);
        let avg_health =
            self.buildings.iter().map(|b| b.health).sum::<f64>() / self.buildings.len() as f64;
        base * avg_health / FULL_HEALTH
    }
}
