use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    Paused,
    #[default]
    Normal,
    Fast,
    Fastest,
}

impl GameSpeed {
    pub fn multiplier(self) -> f64 {
        match self {
            GameSpeed::Paused => 0.0,
            GameSpeed::Normal => 1.0,
            GameSpeed::Fast => 6.0,
            GameSpeed::Fastest => 18.0,
        }
    }
}

/// Scales frame time into simulated time. Pausing twice resumes the speed
/// that was active before the pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    speed: GameSpeed,
    resume_speed: GameSpeed,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(GameSpeed::Normal)
    }
}

impl SimulationClock {
    pub fn new(speed: GameSpeed) -> Self {
        let resume_speed = if speed == GameSpeed::Paused {
            GameSpeed::Normal
        } else {
            speed
        };
        Self {
            speed,
            resume_speed,
        }
    }

    pub fn speed(&self) -> GameSpeed {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.speed == GameSpeed::Paused
    }

    pub fn set_speed(&mut self, speed: GameSpeed) -> GameSpeed {
        self.speed = match (self.speed, speed) {
            (GameSpeed::Paused, GameSpeed::Paused) => self.resume_speed,
            (_, GameSpeed::Paused) => GameSpeed::Paused,
            (_, running) => {
                self.resume_speed = running;
                running
            }
        };
        self.speed
    }

    /// Simulated seconds for a frame, or `None` while paused.
    pub fn effective_dt(&self, frame_dt: f64) -> Option<f64> {
        match self.speed {
            GameSpeed::Paused => None,
            speed => Some(frame_dt * speed.multiplier()),
        }
    }
}
