//! Park-wide shared state: funds, notifications, reviews, in-park time and
//! the win/lose verdict. Every system receives this explicitly.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::animals::{Species, SpeciesStats};

const NOTIFICATION_LIMIT: usize = 10;
const REVIEW_WINDOW: usize = 100;
const NEUTRAL_REVIEW: f64 = 3.0;
const HOURS_PER_SECOND: f64 = 0.2;

const LOSE_ECOSYSTEM_BELOW: f64 = 20.0;
const WIN_ECOSYSTEM_AT_LEAST: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    pub starting_funds: f64,
    pub animal_need_rate: f64,
    pub tourist_rate: f64,
    pub building_cost_multiplier: f64,
    pub profit_target: f64,
}

impl Difficulty {
    pub fn settings(self) -> DifficultySettings {
        match self {
            Difficulty::Easy => DifficultySettings {
                starting_funds: 10_000.0,
                animal_need_rate: 0.7,
                tourist_rate: 1.3,
                building_cost_multiplier: 0.8,
                profit_target: 20_000.0,
            },
            Difficulty::Medium => DifficultySettings {
                starting_funds: 7_000.0,
                animal_need_rate: 1.0,
                tourist_rate: 1.0,
                building_cost_multiplier: 1.0,
                profit_target: 25_000.0,
            },
            Difficulty::Hard => DifficultySettings {
                starting_funds: 5_000.0,
                animal_need_rate: 1.3,
                tourist_rate: 0.7,
                building_cost_multiplier: 1.2,
                profit_target: 30_000.0,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub day: u32,
    pub time_of_day: f64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Bankrupt,
    EcosystemCollapsed,
}

/// Thresholds checked at each monthly settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyGoals {
    pub min_visitors: usize,
    pub min_herbivores: usize,
    pub min_carnivores: usize,
}

impl Default for MonthlyGoals {
    fn default() -> Self {
        Self {
            min_visitors: 10,
            min_herbivores: 5,
            min_carnivores: 2,
        }
    }
}

/// Trailing window of the most recent review scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLog {
    scores: VecDeque<u8>,
    average: f64,
}

impl Default for ReviewLog {
    fn default() -> Self {
        Self {
            scores: VecDeque::with_capacity(REVIEW_WINDOW),
            average: NEUTRAL_REVIEW,
        }
    }
}

impl ReviewLog {
    pub fn record(&mut self, score: u8) {
        self.scores.push_back(score.clamp(1, 5));
        while self.scores.len() > REVIEW_WINDOW {
            self.scores.pop_front();
        }
        self.average = if self.scores.is_empty() {
            NEUTRAL_REVIEW
        } else {
            self.scores.iter().map(|s| *s as f64).sum::<f64>() / self.scores.len() as f64
        };
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> impl Iterator<Item = u8> + '_ {
        self.scores.iter().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    difficulty: Difficulty,
    settings: DifficultySettings,
    funds: f64,
    ecosystem_balance: f64,
    day: u32,
    time_of_day: f64,
    notifications: VecDeque<Notification>,
    reviews: ReviewLog,
    goals: MonthlyGoals,
    monthly_goals_met: bool,
    outcome: Option<Outcome>,
}

impl Ledger {
    pub fn new(difficulty: Difficulty) -> Self {
        let settings = difficulty.settings();
        Self {
            difficulty,
            settings,
            funds: settings.starting_funds,
            ecosystem_balance: 100.0,
            day: 1,
            time_of_day: 0.0,
            notifications: VecDeque::with_capacity(NOTIFICATION_LIMIT),
            reviews: ReviewLog::default(),
            goals: MonthlyGoals::default(),
            monthly_goals_met: false,
            outcome: None,
        }
    }

    pub fn with_funds(mut self, funds: f64) -> Self {
        self.funds = funds;
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn settings(&self) -> &DifficultySettings {
        &self.settings
    }

    pub fn funds(&self) -> f64 {
        self.funds
    }

    pub fn add_funds(&mut self, amount: f64) -> f64 {
        self.funds += amount;
        self.funds
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.funds >= cost
    }

    pub fn ecosystem_balance(&self) -> f64 {
        self.ecosystem_balance
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn time_of_day(&self) -> f64 {
        self.time_of_day
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(day = self.day, "{message}");
        self.notifications.push_back(Notification {
            day: self.day,
            time_of_day: self.time_of_day,
            message,
        });
        while self.notifications.len() > NOTIFICATION_LIMIT {
            self.notifications.pop_front();
        }
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn reviews(&self) -> &ReviewLog {
        &self.reviews
    }

    pub fn record_review(&mut self, score: u8) {
        self.reviews.record(score);
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn monthly_goals_met(&self) -> bool {
        self.monthly_goals_met
    }

    /// Advances in-park time; returns true when a new day began.
    pub fn advance_time(&mut self, dt: f64) -> bool {
        self.time_of_day += dt * HOURS_PER_SECOND;
        let mut rolled = false;
        while self.time_of_day >= 24.0 {
            self.time_of_day -= 24.0;
            self.day += 1;
            rolled = true;
        }
        if rolled {
            self.notify(format!("Day {} has begun", self.day));
        }
        rolled
    }

    /// Ecosystem balance from per-species aggregates: 70% average health,
    /// 30% share of catalogued species still present.
    pub fn update_ecosystem_balance(&mut self, stats: &BTreeMap<Species, SpeciesStats>) {
        let total: usize = stats.values().map(|s| s.population).sum();
        if stats.is_empty() || total == 0 {
            self.ecosystem_balance = 0.0;
            return;
        }
        let present = stats.values().filter(|s| s.population > 0).count();
        let weighted_health: f64 = stats
            .values()
            .map(|s| s.avg_health * s.population as f64)
            .sum();
        let avg_health = weighted_health / total as f64;
        let coverage = present as f64 / stats.len() as f64 * 100.0;
        self.ecosystem_balance = (avg_health * 0.7 + coverage * 0.3).min(100.0);
    }

    pub fn evaluate_monthly_goals(
        &mut self,
        visitors: usize,
        herbivores: usize,
        carnivores: usize,
    ) -> bool {
        let goals = self.goals;
        self.monthly_goals_met = visitors >= goals.min_visitors
            && herbivores >= goals.min_herbivores
            && carnivores >= goals.min_carnivores;
        if self.monthly_goals_met {
            self.notify("Monthly park goals met");
        } else {
            self.notify(format!(
                "Monthly goals missed: {visitors} visitors, {herbivores} herbivores, {carnivores} carnivores"
            ));
        }
        self.monthly_goals_met
    }

    /// Settles the verdict once; later calls keep the first outcome.
    pub fn check_outcome(&mut self) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let verdict = if self.funds < 0.0 {
            Some(Outcome::Bankrupt)
        } else if self.ecosystem_balance < LOSE_ECOSYSTEM_BELOW {
            Some(Outcome::EcosystemCollapsed)
        } else if self.funds >= self.settings.profit_target
            && self.ecosystem_balance >= WIN_ECOSYSTEM_AT_LEAST
            && self.monthly_goals_met
        {
            Some(Outcome::Won)
        } else {
            None
        };
        if let Some(outcome) = verdict {
            tracing::info!(?outcome, funds = self.funds, "park outcome decided");
            let message = match outcome {
                Outcome::Won => "The park is thriving. You win!",
                Outcome::Bankrupt => "The park has gone bankrupt",
                Outcome::EcosystemCollapsed => "The ecosystem has collapsed",
            };
            self.notify(message);
            self.outcome = Some(outcome);
        }
        self.outcome
    }

    pub(crate) fn restore(
        &mut self,
        difficulty: Difficulty,
        day: u32,
        time_of_day: f64,
        funds: f64,
        ecosystem_balance: f64,
        reviews: &[u8],
    ) {
        self.difficulty = difficulty;
        self.settings = difficulty.settings();
        self.day = day;
        self.time_of_day = time_of_day;
        self.funds = funds;
        self.ecosystem_balance = ecosystem_balance;
        self.reviews = ReviewLog::default();
        for score in reviews {
            self.reviews.record(*score);
        }
        self.outcome = None;
        self.monthly_goals_met = false;
    }
}
