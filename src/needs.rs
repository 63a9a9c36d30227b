//! Hunger, thirst, energy and health, and the priority rule that turns them
//! into a behavior each tick.

use serde::{Deserialize, Serialize};

pub const NEED_MAX: f64 = 100.0;
pub const NEED_THRESHOLD: f64 = 70.0;
pub const CRITICAL_NEED: f64 = 90.0;
pub const LOW_HEALTH: f64 = 20.0;
pub const LOW_ENERGY: f64 = 20.0;

const HUNGER_RATE: f64 = 0.5;
const THIRST_RATE: f64 = 0.7;
const ENERGY_DRAIN: f64 = 0.3;
const HEALTH_DECAY: f64 = 0.5;
const HEALTH_REGEN: f64 = 0.1;
const REST_RECOVERY: f64 = 1.0;

pub const FOOD_RELIEF: f64 = 30.0;
pub const WATER_RELIEF: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    #[default]
    Idle,
    SeekingFood,
    SeekingWater,
    Resting,
    Wandering,
}

impl BehaviorState {
    pub fn label(self) -> &'static str {
        match self {
            BehaviorState::Idle => "idle",
            BehaviorState::SeekingFood => "seeking_food",
            BehaviorState::SeekingWater => "seeking_water",
            BehaviorState::Resting => "resting",
            BehaviorState::Wandering => "wandering",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub hunger: f64,
    pub thirst: f64,
    pub energy: f64,
    pub health: f64,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 50.0,
            thirst: 50.0,
            energy: 100.0,
            health: 100.0,
        }
    }
}

impl Needs {
    pub fn new(hunger: f64, thirst: f64, energy: f64, health: f64) -> Self {
        let mut needs = Self {
            hunger,
            thirst,
            energy,
            health,
        };
        needs.clamp();
        needs
    }

    /// Per-tick drift. `need_rate` scales hunger and thirst growth.
    pub fn drift(&mut self, dt: f64, need_rate: f64) {
        self.hunger += HUNGER_RATE * dt * need_rate;
        self.thirst += THIRST_RATE * dt * need_rate;
        self.energy -= ENERGY_DRAIN * dt;
        self.clamp();

        if self.hunger > CRITICAL_NEED || self.thirst > CRITICAL_NEED {
            self.health -= HEALTH_DECAY * dt;
        } else {
            self.health += HEALTH_REGEN * dt;
        }
        self.clamp();
    }

    pub fn rest(&mut self, dt: f64) {
        self.energy = (self.energy + REST_RECOVERY * dt).clamp(0.0, NEED_MAX);
    }

    pub fn eat(&mut self) {
        self.hunger = (self.hunger - FOOD_RELIEF).max(0.0);
    }

    pub fn drink(&mut self) {
        self.thirst = (self.thirst - WATER_RELIEF).max(0.0);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn clamp(&mut self) {
        self.hunger = self.hunger.clamp(0.0, NEED_MAX);
        self.thirst = self.thirst.clamp(0.0, NEED_MAX);
        self.energy = self.energy.clamp(0.0, NEED_MAX);
        self.health = self.health.clamp(0.0, NEED_MAX);
    }

    /// Resolves the behavior for this tick in strict precedence order. Never
    /// cached, so a need spike interrupts a wander immediately.
    pub fn decide(&self, wandering: bool) -> BehaviorState {
        if self.health < LOW_HEALTH {
            if self.hunger > self.thirst {
                BehaviorState::SeekingFood
            } else {
                BehaviorState::SeekingWater
            }
        } else if self.energy < LOW_ENERGY {
            BehaviorState::Resting
        } else if self.hunger > NEED_THRESHOLD {
            BehaviorState::SeekingFood
        } else if self.thirst > NEED_THRESHOLD {
            BehaviorState::SeekingWater
        } else if wandering {
            BehaviorState::Wandering
        } else {
            BehaviorState::Idle
        }
    }
}
