//! Safari jeeps shuttling tourists from the entrance to the exit.

use serde::{Deserialize, Serialize};

use crate::components::{Position, VehicleId};
use crate::error::{ParkError, ParkResult};
use crate::ledger::Ledger;
use crate::terrain::{GridCell, TerrainQuery};
use crate::tourists::{Tourist, TouristPopulation};

pub const JEEP_COST: f64 = 1_000.0;
pub const JEEP_CAPACITY: usize = 6;
pub const RIDE_BONUS: f64 = 15.0;
const JEEP_SPEED_TILES: f64 = 8.0;
const BOARDING_RADIUS_TILES: f64 = 2.0;
/// Seconds a partly filled jeep waits at the entrance before leaving anyway.
const DEPARTURE_DWELL: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JeepState {
    #[default]
    Idle,
    ToExit,
    ToEntrance,
}

#[derive(Debug, Clone)]
pub struct Jeep {
    pub id: VehicleId,
    pub position: Position,
    pub capacity: usize,
    pub passengers: Vec<Tourist>,
    pub state: JeepState,
    route: Vec<Position>,
    route_index: usize,
    dwell: f64,
}

impl Jeep {
    fn new(id: VehicleId, position: Position) -> Self {
        Self {
            id,
            position,
            capacity: JEEP_CAPACITY,
            passengers: Vec::with_capacity(JEEP_CAPACITY),
            state: JeepState::Idle,
            route: Vec::new(),
            route_index: 0,
            dwell: 0.0,
        }
    }

    /// Advances along the route; true once the last waypoint is reached.
    fn drive(&mut self, dt: f64, tile_size: f64) -> bool {
        let mut budget = JEEP_SPEED_TILES * tile_size * dt;
        while self.route_index < self.route.len() {
            let waypoint = self.route[self.route_index];
            let gap = self.position.distance(waypoint);
            if gap > budget {
                self.position = self.position.step_toward(waypoint, budget);
                return false;
            }
            budget -= gap;
            self.position = waypoint;
            self.route_index += 1;
        }
        true
    }

    fn set_route(&mut self, route: Vec<Position>, state: JeepState) {
        self.route = route;
        self.route_index = 0;
        self.state = state;
        self.dwell = 0.0;
    }

    fn board(&mut self, dt: f64, tourists: &mut TouristPopulation, tile_size: f64) -> bool {
        let free = self.capacity.saturating_sub(self.passengers.len());
        if free > 0 {
            let riders = tourists.board_near(self.position, BOARDING_RADIUS_TILES * tile_size, free);
            self.passengers.extend(riders);
        }
        if self.passengers.is_empty() {
            self.dwell = 0.0;
            return false;
        }
        self.dwell += dt;
        self.passengers.len() >= self.capacity || self.dwell >= DEPARTURE_DWELL
    }
}

fn to_world(terrain: &dyn TerrainQuery, cells: Vec<GridCell>) -> Vec<Position> {
    cells.into_iter().map(|cell| terrain.grid_to_world(cell)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct JeepFleet {
    jeeps: Vec<Jeep>,
    next_id: u64,
}

impl JeepFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jeeps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jeeps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Jeep> {
        self.jeeps.iter()
    }

    pub fn passengers(&self) -> impl Iterator<Item = &Tourist> {
        self.jeeps.iter().flat_map(|j| j.passengers.iter())
    }

    pub fn purchase(
        &mut self,
        terrain: &dyn TerrainQuery,
        ledger: &mut Ledger,
    ) -> ParkResult<VehicleId> {
        if !ledger.can_afford(JEEP_COST) {
            ledger.notify("Not enough funds to purchase a jeep");
            return Err(ParkError::InsufficientFunds {
                needed: JEEP_COST,
                available: ledger.funds(),
            });
        }
        ledger.add_funds(-JEEP_COST);
        ledger.notify("Purchased a safari jeep!");
        Ok(self.add_at_entrance(terrain))
    }

    fn add_at_entrance(&mut self, terrain: &dyn TerrainQuery) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        let entrance = terrain.grid_to_world(terrain.entrance_tile());
        self.jeeps.push(Jeep::new(id, entrance));
        id
    }

    /// Rebuilds `count` idle jeeps at the entrance, as loading a save does.
    pub fn restore(&mut self, count: usize, terrain: &dyn TerrainQuery) {
        self.jeeps.clear();
        for _ in 0..count {
            self.add_at_entrance(terrain);
        }
    }

    pub fn tick(&mut self, dt: f64, terrain: &dyn TerrainQuery, tourists: &mut TouristPopulation) {
        let tile = terrain.tile_size();
        let entrance = terrain.entrance_tile();
        let exit = terrain.exit_tile();

        for jeep in &mut self.jeeps {
            match jeep.state {
                JeepState::Idle => {
                    let route = terrain.find_path(entrance, exit);
                    if route.is_empty() {
                        continue;
                    }
                    if jeep.board(dt, tourists, tile) {
                        tracing::debug!(
                            id = jeep.id.raw(),
                            riders = jeep.passengers.len(),
                            "jeep departing"
                        );
                        jeep.set_route(to_world(terrain, route), JeepState::ToExit);
                    }
                }
                JeepState::ToExit => {
                    if !jeep.drive(dt, tile) {
                        continue;
                    }
                    let drop_off = jeep.position;
                    for rider in jeep.passengers.drain(..) {
                        tourists.reinsert(rider, drop_off, RIDE_BONUS);
                    }
                    let mut back = to_world(terrain, terrain.find_path(exit, entrance));
                    if back.is_empty() {
                        back = jeep.route.iter().rev().copied().collect();
                    }
                    jeep.set_route(back, JeepState::ToEntrance);
                }
                JeepState::ToEntrance => {
                    if jeep.drive(dt, tile) {
                        jeep.set_route(Vec::new(), JeepState::Idle);
                    }
                }
            }
        }
    }
}
