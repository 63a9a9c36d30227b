//! Day and month timers, expenses, and tourist arrivals driven by how
//! attractive the park is.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::animals::AnimalPopulation;
use crate::buildings::BuildingRegistry;
use crate::error::ConfigError;
use crate::ledger::Ledger;
use crate::terrain::TerrainQuery;
use crate::tourists::{Sights, TouristPopulation};
use crate::vehicles::JeepFleet;

fn default_entrance_fee() -> f64 {
    20.0
}

fn default_staff_salary() -> f64 {
    1_000.0
}

fn default_day_length() -> f64 {
    120.0
}

fn default_month_length() -> f64 {
    120.0 * 30.0
}

fn default_tourist_cap() -> usize {
    30
}

fn default_day_spawn_rate() -> f64 {
    0.1
}

fn default_night_spawn_rate() -> f64 {
    0.01
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default = "default_entrance_fee")]
    pub entrance_fee: f64,
    #[serde(default = "default_staff_salary")]
    pub staff_salary: f64,
    /// Simulated seconds between daily revenue reports.
    #[serde(default = "default_day_length")]
    pub day_length: f64,
    /// Simulated seconds between monthly settlements.
    #[serde(default = "default_month_length")]
    pub month_length: f64,
    #[serde(default = "default_tourist_cap")]
    pub tourist_cap: usize,
    #[serde(default = "default_day_spawn_rate")]
    pub day_spawn_rate: f64,
    #[serde(default = "default_night_spawn_rate")]
    pub night_spawn_rate: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            entrance_fee: default_entrance_fee(),
            staff_salary: default_staff_salary(),
            day_length: default_day_length(),
            month_length: default_month_length(),
            tourist_cap: default_tourist_cap(),
            day_spawn_rate: default_day_spawn_rate(),
            night_spawn_rate: default_night_spawn_rate(),
        }
    }
}

impl EconomyConfig {
    /// Timer periods must be positive or the day and month loops never end.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("day_length", self.day_length), ("month_length", self.month_length)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("entrance_fee", self.entrance_fee),
            ("staff_salary", self.staff_salary),
            ("day_spawn_rate", self.day_spawn_rate),
            ("night_spawn_rate", self.night_spawn_rate),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Weighted blend of reputation, wildlife appeal and infrastructure.
pub fn park_attractiveness(average_review: f64, animal_appeal: f64, infrastructure: f64) -> f64 {
    (average_review / 3.0) * 0.3 + (animal_appeal / 100.0) * 0.5 + (infrastructure / 100.0) * 0.2
}

/// Everything the economy touches besides the ledger.
pub struct ParkParts<'a> {
    pub terrain: &'a dyn TerrainQuery,
    pub animals: &'a AnimalPopulation,
    pub buildings: &'a BuildingRegistry,
    pub tourists: &'a mut TouristPopulation,
    pub jeeps: &'a mut JeepFleet,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EconomyReport {
    pub arrivals: usize,
    pub departures: usize,
    pub monthly_expenses: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct EconomyState {
    config: EconomyConfig,
    day_timer: f64,
    month_timer: f64,
    daily_income: f64,
    last_daily_revenue: f64,
    last_monthly_expenses: f64,
    total_visitors: u64,
}

impl EconomyState {
    pub fn new(config: EconomyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn daily_income(&self) -> f64 {
        self.daily_income
    }

    pub fn last_daily_revenue(&self) -> f64 {
        self.last_daily_revenue
    }

    pub fn last_monthly_expenses(&self) -> f64 {
        self.last_monthly_expenses
    }

    pub fn total_visitors(&self) -> u64 {
        self.total_visitors
    }

    pub fn monthly_expenses(&self, buildings: &BuildingRegistry, animals: &AnimalPopulation) -> f64 {
        buildings.monthly_maintenance_cost() + animals.monthly_food_cost() + self.config.staff_salary
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        park: ParkParts<'_>,
        ledger: &mut Ledger,
        rng: &mut R,
    ) -> EconomyReport {
        let mut report = EconomyReport::default();

        self.day_timer += dt;
        while self.config.day_length > 0.0 && self.day_timer >= self.config.day_length {
            self.day_timer -= self.config.day_length;
            self.close_day(ledger);
        }

        self.month_timer += dt;
        while self.config.month_length > 0.0 && self.month_timer >= self.config.month_length {
            self.month_timer -= self.config.month_length;
            let visitors = park.tourists.len() + park.jeeps.passengers().count();
            let expenses = self.settle_month(park.buildings, park.animals, ledger);
            ledger.evaluate_monthly_goals(
                visitors,
                park.animals.herbivores(),
                park.animals.carnivores(),
            );
            report.monthly_expenses = Some(expenses);
        }

        let sights = Sights {
            terrain: park.terrain,
            buildings: park.buildings,
            animals: park.animals,
        };
        let visits = park.tourists.tick(dt, &sights, ledger, rng);
        self.daily_income += visits.spent;
        report.departures = visits.departures;

        park.jeeps.tick(dt, park.terrain, park.tourists);

        let present = park.tourists.len() + park.jeeps.passengers().count();
        let view = park_view(park.animals, park.buildings, ledger);
        if self.try_admit(dt, &view, present, rng) {
            let entrance = park.terrain.grid_to_world(park.terrain.entrance_tile());
            park.tourists.spawn_at(entrance, park.terrain.tile_size(), rng);
            ledger.add_funds(self.config.entrance_fee);
            self.daily_income += self.config.entrance_fee;
            self.total_visitors += 1;
            report.arrivals = 1;
        }

        report
    }

    fn close_day(&mut self, ledger: &mut Ledger) {
        self.last_daily_revenue = self.daily_income;
        self.daily_income = 0.0;
        ledger.notify(format!("Daily revenue: ${:.2}", self.last_daily_revenue));
    }

    /// Deducts maintenance, feed and salaries. Returns the total charged.
    pub fn settle_month(
        &mut self,
        buildings: &BuildingRegistry,
        animals: &AnimalPopulation,
        ledger: &mut Ledger,
    ) -> f64 {
        let expenses = self.monthly_expenses(buildings, animals);
        let funds = ledger.add_funds(-expenses);
        self.last_monthly_expenses = expenses;
        tracing::info!(expenses, funds, "monthly settlement");
        ledger.notify(format!("Monthly expenses: ${expenses:.2}"));
        ledger.notify(format!("Current funds: ${funds:.2}"));
        expenses
    }

    fn try_admit<R: Rng + ?Sized>(
        &self,
        dt: f64,
        view: &ParkView,
        present: usize,
        rng: &mut R,
    ) -> bool {
        if present >= self.config.tourist_cap {
            return false;
        }
        let base = if (8.0..=18.0).contains(&view.hour) {
            self.config.day_spawn_rate
        } else {
            self.config.night_spawn_rate
        };
        let chance = base * dt * view.attractiveness * view.tourist_rate;
        rng.gen_bool(chance.clamp(0.0, 1.0))
    }
}

struct ParkView {
    hour: f64,
    attractiveness: f64,
    tourist_rate: f64,
}

fn park_view(animals: &AnimalPopulation, buildings: &BuildingRegistry, ledger: &Ledger) -> ParkView {
    ParkView {
        hour: ledger.time_of_day() % 24.0,
        attractiveness: park_attractiveness(
            ledger.reviews().average(),
            animals.tourist_appeal(),
            buildings.tourist_infrastructure_score(),
        ),
        tourist_rate: ledger.settings().tourist_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Difficulty;
    use crate::terrain::{GridTerrain, TerrainKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_park_pays_only_salaries() {
        let mut economy = EconomyState::default();
        let mut ledger = Ledger::new(Difficulty::Medium);
        let buildings = BuildingRegistry::new(1.0);
        let animals = AnimalPopulation::new();
        let charged = economy.settle_month(&buildings, &animals, &mut ledger);
        assert_eq!(charged, 1_000.0);
        assert_eq!(ledger.funds(), 6_000.0);
    }

    #[test]
    fn attractiveness_blend() {
        assert!((park_attractiveness(3.0, 0.0, 0.0) - 0.3).abs() < 1e-12);
        assert!((park_attractiveness(5.0, 100.0, 50.0) - (0.5 + 0.5 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn timers_fire_day_and_month() {
        let terrain = GridTerrain::filled(10, 1.0, TerrainKind::Grass);
        let animals = AnimalPopulation::new();
        let buildings = BuildingRegistry::new(1.0);
        let mut tourists = TouristPopulation::new();
        let mut jeeps = JeepFleet::new();
        let mut ledger = Ledger::new(Difficulty::Medium);
        let mut economy = EconomyState::new(EconomyConfig {
            tourist_cap: 0,
            ..EconomyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for _ in 0..30 {
            let report = economy.tick(
                120.0,
                ParkParts {
                    terrain: &terrain,
                    animals: &animals,
                    buildings: &buildings,
                    tourists: &mut tourists,
                    jeeps: &mut jeeps,
                },
                &mut ledger,
                &mut rng,
            );
            assert_eq!(report.arrivals, 0);
        }
        assert_eq!(ledger.funds(), 6_000.0);
        assert_eq!(economy.last_monthly_expenses(), 1_000.0);
        assert!(!ledger.monthly_goals_met());
        assert!(ledger
            .notifications()
            .any(|n| n.message == "Monthly expenses: $1000.00"));
    }

    #[test]
    fn arrivals_pay_entrance_fee() {
        let terrain = GridTerrain::filled(10, 1.0, TerrainKind::Grass);
        let animals = AnimalPopulation::new();
        let buildings = BuildingRegistry::new(1.0);
        let mut tourists = TouristPopulation::new();
        let mut jeeps = JeepFleet::new();
        let mut ledger = Ledger::new(Difficulty::Medium);
        let mut economy = EconomyState::new(EconomyConfig {
            night_spawn_rate: 100.0,
            ..EconomyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let report = economy.tick(
            1.0,
            ParkParts {
                terrain: &terrain,
                animals: &animals,
                buildings: &buildings,
                tourists: &mut tourists,
                jeeps: &mut jeeps,
            },
            &mut ledger,
            &mut rng,
        );
        assert_eq!(report.arrivals, 1);
        assert_eq!(tourists.len(), 1);
        assert_eq!(ledger.funds(), 7_020.0);
        assert_eq!(economy.daily_income(), 20.0);
    }
    fn always_by_day() -> EconomyState {
        EconomyState::new(EconomyConfig {
            day_spawn_rate: 1.0,
            night_spawn_rate: 0.0,
            ..EconomyConfig::default()
        })
    }

    fn view(hour: f64, tourist_rate: f64) -> ParkView {
        ParkView {
            hour,
            attractiveness: 1.0,
            tourist_rate,
        }
    }

    #[test]
    fn daytime_window_is_eight_to_eighteen() {
        let economy = always_by_day();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for hour in [8.0, 12.0, 18.0] {
            assert!(economy.try_admit(1.0, &view(hour, 1.0), 0, &mut rng), "hour {hour}");
        }
        for hour in [0.0, 7.9, 18.1, 23.5] {
            assert!(!economy.try_admit(1.0, &view(hour, 1.0), 0, &mut rng), "hour {hour}");
        }
    }

    #[test]
    fn day_admits_more_than_night() {
        let economy = EconomyState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut admitted = |hour: f64| {
            (0..4_000)
                .filter(|_| economy.try_admit(1.0, &view(hour, 1.0), 0, &mut rng))
                .count()
        };
        let day = admitted(12.0);
        let night = admitted(2.0);
        assert!(day > night * 3, "day {day}, night {night}");
    }

    #[test]
    fn difficulty_scales_the_spawn_chance() {
        let animals = AnimalPopulation::new();
        let buildings = BuildingRegistry::new(1.0);
        let easy = park_view(&animals, &buildings, &Ledger::new(Difficulty::Easy));
        let hard = park_view(&animals, &buildings, &Ledger::new(Difficulty::Hard));
        assert_eq!(easy.tourist_rate, 1.3);
        assert_eq!(hard.tourist_rate, 0.7);

        let economy = EconomyState::new(EconomyConfig {
            day_spawn_rate: 0.5,
            ..EconomyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(economy.try_admit(1.0, &view(12.0, 2.0), 0, &mut rng));
        assert!(!economy.try_admit(1.0, &view(12.0, 0.0), 0, &mut rng));
    }

    #[test]
    fn cap_counts_jeep_passengers() {
        use crate::components::{Position, TouristId};
        use crate::tourists::Tourist;

        let mut rows = vec!["GGGGGGGGGG"; 10];
        rows[5] = "PPPPPPPPPP";
        let terrain = GridTerrain::from_rows(&rows, 1.0).expect("rows");
        let entrance = terrain.grid_to_world(terrain.entrance_tile());
        let animals = AnimalPopulation::new();
        let buildings = BuildingRegistry::new(1.0);
        let mut ledger = Ledger::new(Difficulty::Medium);
        let mut jeeps = JeepFleet::new();
        jeeps.purchase(&terrain, &mut ledger).expect("jeep");
        let mut tourists = TouristPopulation::new();
        for _ in 0..6 {
            tourists.insert(Tourist::new(TouristId(0), entrance, 3.0, 50.0, 10.0, 10.0));
        }
        for _ in 0..24 {
            let far = Position::new(3.5, -3.5);
            tourists.insert(Tourist::new(TouristId(0), far, 3.0, 50.0, 10.0, 10.0));
        }
        let mut economy = EconomyState::new(EconomyConfig {
            night_spawn_rate: 1_000.0,
            ..EconomyConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let report = economy.tick(
            0.01,
            ParkParts {
                terrain: &terrain,
                animals: &animals,
                buildings: &buildings,
                tourists: &mut tourists,
                jeeps: &mut jeeps,
            },
            &mut ledger,
            &mut rng,
        );
        assert_eq!(jeeps.passengers().count(), 6);
        assert_eq!(tourists.len(), 24);
        assert_eq!(report.arrivals, 0);
        assert_eq!(economy.total_visitors(), 0);
    }

    #[test]
    fn non_positive_periods_are_rejected_and_never_loop() {
        let broken = EconomyConfig {
            day_length: 0.0,
            month_length: -1.0,
            tourist_cap: 0,
            ..EconomyConfig::default()
        };
        assert_eq!(
            broken.validate(),
            Err(ConfigError::NotPositive {
                field: "day_length",
                value: 0.0
            })
        );
        assert!(EconomyConfig::default().validate().is_ok());

        let terrain = GridTerrain::filled(4, 1.0, TerrainKind::Grass);
        let animals = AnimalPopulation::new();
        let buildings = BuildingRegistry::new(1.0);
        let mut tourists = TouristPopulation::new();
        let mut jeeps = JeepFleet::new();
        let mut ledger = Ledger::new(Difficulty::Medium);
        let mut economy = EconomyState::new(broken);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = economy.tick(
            10.0,
            ParkParts {
                terrain: &terrain,
                animals: &animals,
                buildings: &buildings,
                tourists: &mut tourists,
                jeeps: &mut jeeps,
            },
            &mut ledger,
            &mut rng,
        );
        assert_eq!(report.monthly_expenses, None);
        assert_eq!(ledger.funds(), 7_000.0);
    }
}
