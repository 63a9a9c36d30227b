//! Save and load of the whole park as a directory of JSON files.
//!
//! Loading parses and validates every file before the world is touched, so a
//! missing or corrupt save leaves the running park exactly as it was.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::animals::{Animal, Species};
use crate::buildings::BuildingKind;
use crate::components::{AnimalId, Position, TouristId};
use crate::error::PersistenceError;
use crate::ledger::Difficulty;
use crate::needs::{BehaviorState, Needs};
use crate::tourists::Tourist;
use crate::world::World;

pub const ANIMALS_FILE: &str = "animals.json";
pub const BUILDINGS_FILE: &str = "buildings.json";
pub const TOURISTS_FILE: &str = "tourists.json";
pub const GAME_STATE_FILE: &str = "game_state.json";

fn default_age_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub species: Species,
    pub position: Coordinates,
    pub hunger: f64,
    pub thirst: f64,
    pub health: f64,
    pub energy: f64,
    pub state: BehaviorState,
    #[serde(default)]
    pub group_id: Option<u32>,
    #[serde(default = "default_age_factor")]
    pub age_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    pub position: Coordinates,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouristRecord {
    pub position: Coordinates,
    pub speed: f64,
    pub satisfaction: f64,
    pub spending_rate: f64,
    pub visit_duration: f64,
    #[serde(default)]
    pub time_spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateRecord {
    pub difficulty: Difficulty,
    pub day: u32,
    pub time_of_day: f64,
    pub funds: f64,
    pub ecosystem_balance: f64,
    #[serde(default)]
    pub reviews: Vec<u8>,
    #[serde(default)]
    pub jeeps: usize,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Everything read from a save directory, already validated.
#[derive(Debug, Clone)]
pub struct SaveData {
    pub animals: Vec<AnimalRecord>,
    pub buildings: Vec<BuildingRecord>,
    pub tourists: Vec<TouristRecord>,
    pub game_state: GameStateRecord,
}

/// A stored point. Saves are written flat as `[x, y]`. Records written as
/// `[x, height, y]` are accepted and the height is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Flat([f64; 2]),
    Raised([f64; 3]),
}

impl Coordinates {
    pub fn position(self) -> Position {
        match self {
            Coordinates::Flat([x, y]) | Coordinates::Raised([x, _, y]) => Position::new(x, y),
        }
    }

    fn is_finite(self) -> bool {
        match self {
            Coordinates::Flat(values) => values.iter().all(|v| v.is_finite()),
            Coordinates::Raised(values) => values.iter().all(|v| v.is_finite()),
        }
    }
}

impl From<Position> for Coordinates {
    fn from(position: Position) -> Self {
        Coordinates::Flat([position.x, position.y])
    }
}

/// Writes the four save files into `dir`, creating it when needed. Tourists
/// riding a jeep are stored at the jeep's position.
pub fn save_park(world: &World, dir: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let animals: Vec<AnimalRecord> = world
        .animals()
        .iter()
        .map(|a| AnimalRecord {
            species: a.species,
            position: a.position.into(),
            hunger: a.needs.hunger,
            thirst: a.needs.thirst,
            health: a.needs.health,
            energy: a.needs.energy,
            state: a.state,
            group_id: Some(a.group_id),
            age_factor: a.age_factor,
        })
        .collect();

    let buildings: Vec<BuildingRecord> = world
        .buildings()
        .iter()
        .map(|b| BuildingRecord {
            kind: b.kind,
            position: b.position.into(),
            health: b.health,
        })
        .collect();

    let walking = world.tourists().iter().map(|t| (t, t.position));
    let riding = world
        .jeeps()
        .iter()
        .flat_map(|j| j.passengers.iter().map(move |t| (t, j.position)));
    let tourists: Vec<TouristRecord> = walking
        .chain(riding)
        .map(|(t, at)| TouristRecord {
            position: at.into(),
            speed: t.speed,
            satisfaction: t.satisfaction,
            spending_rate: t.spending_rate,
            visit_duration: t.visit_duration,
            time_spent: t.time_spent,
        })
        .collect();

    let ledger = world.ledger();
    let game_state = GameStateRecord {
        difficulty: ledger.difficulty(),
        day: ledger.day(),
        time_of_day: ledger.time_of_day(),
        funds: ledger.funds(),
        ecosystem_balance: ledger.ecosystem_balance(),
        reviews: ledger.reviews().scores().collect(),
        jeeps: world.jeeps().len(),
        saved_at: Some(Utc::now()),
    };

    write_json(&dir.join(ANIMALS_FILE), &animals)?;
    write_json(&dir.join(BUILDINGS_FILE), &buildings)?;
    write_json(&dir.join(TOURISTS_FILE), &tourists)?;
    write_json(&dir.join(GAME_STATE_FILE), &game_state)?;
    tracing::info!(
        dir = %dir.display(),
        animals = animals.len(),
        buildings = buildings.len(),
        tourists = tourists.len(),
        "park saved"
    );
    Ok(())
}

/// Reads and validates a save without applying it.
pub fn read_save(dir: impl AsRef<Path>) -> Result<SaveData, PersistenceError> {
    let dir = dir.as_ref();
    let data = SaveData {
        animals: read_json(&dir.join(ANIMALS_FILE))?,
        buildings: read_json(&dir.join(BUILDINGS_FILE))?,
        tourists: read_json(&dir.join(TOURISTS_FILE))?,
        game_state: read_json(&dir.join(GAME_STATE_FILE))?,
    };
    data.validate(dir)?;
    Ok(data)
}

/// Replaces every population and the ledger with the contents of `dir`. On
/// failure the world is left untouched apart from a notification.
pub fn load_park(world: &mut World, dir: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let dir = dir.as_ref();
    match read_save(dir) {
        Ok(data) => {
            apply(world, data);
            tracing::info!(dir = %dir.display(), "park loaded");
            world.ledger_mut().notify("Game loaded");
            Ok(())
        }
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to load park");
            world.ledger_mut().notify(format!("Load failed: {err}"));
            Err(err)
        }
    }
}

fn apply(world: &mut World, data: SaveData) {
    let tile_size = world.terrain.tile_size();

    let mut next_group = data
        .animals
        .iter()
        .filter_map(|r| r.group_id)
        .max()
        .map_or(0, |g| g + 1);
    let animals = data
        .animals
        .iter()
        .map(|r| {
            let group = r.group_id.unwrap_or_else(|| {
                next_group += 1;
                next_group - 1
            });
            let needs = Needs::new(r.hunger, r.thirst, r.energy, r.health);
            let mut animal = Animal::new(
                AnimalId(0),
                r.species,
                r.position.position(),
                r.age_factor,
                group,
                needs,
                tile_size,
            );
            animal.state = r.state;
            animal
        })
        .collect();
    world.animals.replace_all(animals);

    world.buildings.clear();
    for record in &data.buildings {
        world
            .buildings
            .insert(record.kind, record.position.position(), record.health);
    }

    let tourists = data
        .tourists
        .iter()
        .map(|r| {
            let mut tourist = Tourist::new(
                TouristId(0),
                r.position.position(),
                r.speed,
                r.satisfaction,
                r.spending_rate,
                r.visit_duration,
            );
            tourist.time_spent = r.time_spent;
            tourist
        })
        .collect();
    world.tourists.replace_all(tourists);
    world.jeeps.restore(data.game_state.jeeps, world.terrain.as_ref());

    let state = &data.game_state;
    world.ledger.restore(
        state.difficulty,
        state.day,
        state.time_of_day,
        state.funds,
        state.ecosystem_balance,
        &state.reviews,
    );
    world.refresh_stats();
}

impl SaveData {
    fn validate(&self, dir: &Path) -> Result<(), PersistenceError> {
        let invalid = |file: &str, reason: String| PersistenceError::Invalid {
            path: dir.join(file),
            reason,
        };

        for (i, a) in self.animals.iter().enumerate() {
            let values = [a.hunger, a.thirst, a.health, a.energy, a.age_factor];
            if !a.position.is_finite() || values.iter().any(|v| !v.is_finite()) {
                return Err(invalid(ANIMALS_FILE, format!("animal {i} has a non-finite field")));
            }
        }
        for (i, b) in self.buildings.iter().enumerate() {
            if !b.position.is_finite() || !b.health.is_finite() {
                return Err(invalid(BUILDINGS_FILE, format!("building {i} has a non-finite field")));
            }
        }
        for (i, t) in self.tourists.iter().enumerate() {
            let values = [t.speed, t.satisfaction, t.spending_rate, t.visit_duration, t.time_spent];
            if !t.position.is_finite() || values.iter().any(|v| !v.is_finite()) {
                return Err(invalid(TOURISTS_FILE, format!("tourist {i} has a non-finite field")));
            }
        }

        let state = &self.game_state;
        if !state.funds.is_finite() || !state.ecosystem_balance.is_finite() {
            return Err(invalid(GAME_STATE_FILE, "funds and ecosystem balance must be finite".into()));
        }
        if !(0.0..24.0).contains(&state.time_of_day) {
            return Err(invalid(
                GAME_STATE_FILE,
                format!("time of day {} outside [0, 24)", state.time_of_day),
            ));
        }
        if let Some(score) = state.reviews.iter().find(|s| !(1..=5).contains(*s)) {
            return Err(invalid(GAME_STATE_FILE, format!("review score {score} outside 1..=5")));
        }
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{GridTerrain, TerrainKind};

    #[test]
    fn optional_animal_fields_default() {
        let json = r#"{
            "species": "zebra",
            "position": [1.0, 2.0],
            "hunger": 10.0,
            "thirst": 20.0,
            "health": 90.0,
            "energy": 80.0,
            "state": "idle"
        }"#;
        let record: AnimalRecord = serde_json::from_str(json).expect("parses");
        assert_eq!(record.group_id, None);
        assert_eq!(record.age_factor, 1.0);
    }

    #[test]
    fn missing_save_is_reported_and_harmless() {
        let terrain = GridTerrain::filled(8, 1.0, TerrainKind::Grass);
        let mut world = World::new(Box::new(terrain), Difficulty::Medium);
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_park(&mut world, dir.path().join("nope")).expect_err("missing");
        assert!(matches!(err, PersistenceError::Io { .. }));
        assert_eq!(world.ledger().funds(), 7_000.0);
        assert!(world
            .ledger()
            .notifications()
            .any(|n| n.message.starts_with("Load failed")));
    }

    #[test]
    fn out_of_range_time_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let terrain = GridTerrain::filled(8, 1.0, TerrainKind::Grass);
        let world = World::new(Box::new(terrain), Difficulty::Easy);
        save_park(&world, dir.path()).expect("saved");

        let state = GameStateRecord {
            difficulty: Difficulty::Easy,
            day: 3,
            time_of_day: 30.0,
            funds: 1.0,
            ecosystem_balance: 50.0,
            reviews: Vec::new(),
            jeeps: 0,
            saved_at: None,
        };
        write_json(&dir.path().join(GAME_STATE_FILE), &state).expect("written");
        let err = read_save(dir.path()).expect_err("invalid");
        assert!(matches!(err, PersistenceError::Invalid { .. }));
    }
    #[test]
    fn height_coordinate_is_dropped_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let terrain = GridTerrain::filled(8, 1.0, TerrainKind::Grass);
        let mut world = World::new(Box::new(terrain), Difficulty::Medium);
        save_park(&world, dir.path()).expect("saved");

        let animals = r#"[{
            "species": "lion",
            "position": [1.5, 7.0, -2.5],
            "hunger": 10.0,
            "thirst": 20.0,
            "health": 90.0,
            "energy": 80.0,
            "state": "idle"
        }]"#;
        let buildings = r#"[{"type": "water_station", "position": [-2.0, 0.0, 3.0], "health": 75.0}]"#;
        let tourists = r#"[{
            "position": [0.5, 3.0, 0.5],
            "speed": 2.0,
            "satisfaction": 60.0,
            "spending_rate": 5.0,
            "visit_duration": 100.0
        }]"#;
        fs::write(dir.path().join(ANIMALS_FILE), animals).expect("animals");
        fs::write(dir.path().join(BUILDINGS_FILE), buildings).expect("buildings");
        fs::write(dir.path().join(TOURISTS_FILE), tourists).expect("tourists");

        load_park(&mut world, dir.path()).expect("loaded");
        let lion = world.animals().iter().next().expect("lion");
        assert_eq!(lion.position, Position::new(1.5, -2.5));
        let station = world.buildings().iter().next().expect("water station");
        assert_eq!(station.position, Position::new(-2.0, 3.0));
        let tourist = world.tourists().iter().next().expect("tourist");
        assert_eq!(tourist.position, Position::new(0.5, 0.5));
    }

    #[test]
    fn two_or_three_coordinates_only() {
        let record: BuildingRecord =
            serde_json::from_str(r#"{"type": "path", "position": [1.0, 1.0, 2.0], "health": 100.0}"#)
                .expect("parses");
        assert_eq!(record.position.position(), Position::new(1.0, 2.0));
        let short = r#"{"type": "path", "position": [1.0], "health": 100.0}"#;
        assert!(serde_json::from_str::<BuildingRecord>(short).is_err());
    }
}
