use safari::{
    buildings::BuildingKind,
    clock::GameSpeed,
    components::Position,
    engine::{EngineBuilder, EngineSettings},
    error::PersistenceError,
    persistence::{self, ANIMALS_FILE, GAME_STATE_FILE},
    scenario::{Scenario, ScenarioLoader},
    World,
};
use tempfile::tempdir;

const TOLERANCE: f64 = 1e-9;

fn savanna() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/savanna.yaml")
        .expect("scenario parses")
}

fn played_world(scenario: &Scenario, frames: u64) -> World {
    let mut world = scenario.build_world().expect("world builds");
    world
        .place_building(BuildingKind::FeedingStation, Position::new(-8.0, -8.0))
        .expect("feeding station");
    world
        .place_building(BuildingKind::WaterStation, Position::new(-4.0, 6.0))
        .expect("water station");
    let temp = tempdir().expect("tempdir");
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
        speed: GameSpeed::Fast,
    };
    let mut engine = EngineBuilder::new(settings).with_park_systems().build();
    engine.run(&mut world, frames, 1.0).expect("run succeeds");
    world
}

#[test]
fn save_and_load_round_trip() {
    let scenario = savanna();
    let original = played_world(&scenario, 120);
    let dir = tempdir().expect("tempdir");
    persistence::save_park(&original, dir.path()).expect("saved");

    let mut restored = scenario.build_world().expect("fresh world");
    persistence::load_park(&mut restored, dir.path()).expect("loaded");

    assert_eq!(restored.animals().len(), original.animals().len());
    for (a, b) in original.animals().iter().zip(restored.animals().iter()) {
        assert_eq!(a.species, b.species);
        assert!(a.position.distance(b.position) < TOLERANCE);
        assert!((a.needs.health - b.needs.health).abs() < TOLERANCE);
        assert!((a.needs.hunger - b.needs.hunger).abs() < TOLERANCE);
        assert_eq!(a.group_id, b.group_id);
    }

    assert_eq!(restored.buildings().len(), original.buildings().len());
    for (a, b) in original.buildings().iter().zip(restored.buildings().iter()) {
        assert_eq!(a.kind, b.kind);
        assert!(a.position.distance(b.position) < TOLERANCE);
        assert!((a.health - b.health).abs() < TOLERANCE);
    }

    assert_eq!(restored.tourists().len(), original.tourists().len());
    for (a, b) in original.tourists().iter().zip(restored.tourists().iter()) {
        assert!(a.position.distance(b.position) < TOLERANCE);
        assert!((a.satisfaction - b.satisfaction).abs() < TOLERANCE);
    }

    let (lo, ro) = (original.ledger(), restored.ledger());
    assert_eq!(ro.difficulty(), lo.difficulty());
    assert_eq!(ro.day(), lo.day());
    assert!((ro.time_of_day() - lo.time_of_day()).abs() < TOLERANCE);
    assert!((ro.funds() - lo.funds()).abs() < TOLERANCE);
    assert!((ro.ecosystem_balance() - lo.ecosystem_balance()).abs() < TOLERANCE);
    assert!((ro.reviews().average() - lo.reviews().average()).abs() < TOLERANCE);
}

#[test]
fn corrupt_save_leaves_world_untouched() {
    let scenario = savanna();
    let original = played_world(&scenario, 30);
    let dir = tempdir().expect("tempdir");
    persistence::save_park(&original, dir.path()).expect("saved");
    std::fs::write(dir.path().join(ANIMALS_FILE), "{ not json").expect("corrupted");

    let mut world = scenario.build_world().expect("fresh world");
    let animals_before = world.animals().len();
    let funds_before = world.ledger().funds();

    let err = persistence::load_park(&mut world, dir.path()).expect_err("corrupt save");
    assert!(matches!(err, PersistenceError::Parse { .. }));
    assert!(err.to_string().contains(ANIMALS_FILE));
    assert_eq!(world.animals().len(), animals_before);
    assert_eq!(world.ledger().funds(), funds_before);
    assert!(world.buildings().is_empty());
}

#[test]
fn invalid_values_are_rejected_before_applying() {
    let scenario = savanna();
    let original = played_world(&scenario, 10);
    let dir = tempdir().expect("tempdir");
    persistence::save_park(&original, dir.path()).expect("saved");

    let path = dir.path().join(GAME_STATE_FILE);
    let mut state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    state["reviews"] = serde_json::json!([4, 9]);
    std::fs::write(&path, serde_json::to_string(&state).unwrap()).unwrap();

    let mut world = scenario.build_world().expect("fresh world");
    let err = persistence::load_park(&mut world, dir.path()).expect_err("invalid review");
    assert!(matches!(err, PersistenceError::Invalid { .. }));
    assert!(world.buildings().is_empty());
    assert_eq!(world.ledger().funds(), 7_000.0);
}
