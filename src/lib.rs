pub mod animals;
pub mod buildings;
pub mod clock;
pub mod components;
pub mod economy;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod needs;
pub mod persistence;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod terrain;
pub mod tourists;
pub mod vehicles;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use scenario::Scenario;
pub use world::{ParkSnapshot, World};
