use safari::{
    buildings::BuildingKind,
    clock::GameSpeed,
    components::Position,
    economy::EconomyConfig,
    engine::{EngineBuilder, EngineSettings},
    error::{ParkError, PlacementIssue},
    ledger::Difficulty,
    scenario::ScenarioLoader,
    terrain::{GridTerrain, TerrainKind},
    World,
};
use tempfile::tempdir;

fn engine(dir: &std::path::Path) -> safari::Engine {
    let settings = EngineSettings {
        scenario_name: "economy".into(),
        seed: 11,
        snapshot_interval_ticks: 0,
        snapshot_dir: dir.to_path_buf(),
        speed: GameSpeed::Normal,
    };
    EngineBuilder::new(settings).with_park_systems().build()
}

#[test]
fn empty_park_pays_only_staff_each_month() {
    let terrain = GridTerrain::filled(16, 1.0, TerrainKind::Grass);
    let mut world = World::new(Box::new(terrain), Difficulty::Medium).with_economy(EconomyConfig {
        tourist_cap: 0,
        ..EconomyConfig::default()
    });
    let temp = tempdir().expect("tempdir");
    let mut engine = engine(temp.path());

    engine.run(&mut world, 59, 60.0).expect("run");
    assert_eq!(world.ledger().funds(), 7_000.0);

    engine.run(&mut world, 1, 60.0).expect("run");
    assert_eq!(world.ledger().funds(), 6_000.0);
    assert_eq!(world.stats().last_monthly_expenses, 1_000.0);
}

#[test]
fn placement_rules_on_the_savanna() {
    let scenario = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/savanna.yaml")
        .expect("scenario parses");
    let mut world = scenario.build_world().expect("world builds");
    let funds = world.ledger().funds();

    let pond = Position::new(5.5, -8.5);
    let err = world
        .place_building(BuildingKind::ViewingPlatform, pond)
        .expect_err("water is not buildable");
    assert!(matches!(
        err,
        ParkError::InvalidPlacement {
            issue: PlacementIssue::Terrain,
            ..
        }
    ));
    assert_eq!(world.ledger().funds(), funds);

    world
        .place_building(BuildingKind::ViewingPlatform, Position::new(-8.0, -8.0))
        .expect("first platform");
    let after_first = world.ledger().funds();
    assert_eq!(after_first, funds - 700.0);

    let err = world
        .place_building(BuildingKind::ViewingPlatform, Position::new(-7.0, -8.0))
        .expect_err("overlap");
    assert!(matches!(
        err,
        ParkError::InvalidPlacement {
            issue: PlacementIssue::Occupied,
            ..
        }
    ));
    assert_eq!(world.ledger().funds(), after_first);
    assert_eq!(world.buildings().len(), 1);

    world
        .place_building(BuildingKind::ViewingPlatform, Position::new(-5.0, -8.0))
        .expect("touching edges are fine");
    assert_eq!(world.buildings().len(), 2);
}

#[test]
fn spending_beyond_funds_fails_without_side_effects() {
    let terrain = GridTerrain::filled(16, 1.0, TerrainKind::Grass);
    let mut world = World::new(Box::new(terrain), Difficulty::Hard);
    world.ledger_mut().add_funds(-4_500.0);

    let err = world
        .place_building(BuildingKind::FeedingStation, Position::new(0.0, 0.0))
        .expect_err("too poor");
    assert!(matches!(err, ParkError::InsufficientFunds { .. }));
    assert!(world.purchase_jeep().is_err());
    assert!(world.jeeps().is_empty());
    assert!(world.buildings().is_empty());
    assert_eq!(world.ledger().funds(), 500.0);
}

#[test]
fn bankruptcy_is_decided_once() {
    let terrain = GridTerrain::filled(16, 1.0, TerrainKind::Grass);
    let mut world = World::new(Box::new(terrain), Difficulty::Easy).with_economy(EconomyConfig {
        tourist_cap: 0,
        ..EconomyConfig::default()
    });
    world.ledger_mut().add_funds(-10_500.0);
    let temp = tempdir().expect("tempdir");
    let mut engine = engine(temp.path());

    engine.run(&mut world, 3, 1.0).expect("run");
    assert_eq!(world.outcome(), Some(safari::ledger::Outcome::Bankrupt));
    let announcements = world
        .ledger()
        .notifications()
        .filter(|n| n.message == "The park has gone bankrupt")
        .count();
    assert_eq!(announcements, 1);
}
