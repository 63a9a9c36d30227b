use serde::{Deserialize, Serialize};

/// A point on the park surface in world units. The origin sits at the centre
/// of the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Moves at most `max_step` toward `target`, landing on it instead of
    /// overshooting.
    pub fn step_toward(self, target: Position, max_step: f64) -> Position {
        let dist = self.distance(target);
        if dist <= max_step || dist <= f64::EPSILON {
            return target;
        }
        let scale = max_step / dist;
        Position {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
        }
    }

    pub fn centroid<I: IntoIterator<Item = Position>>(points: I) -> Option<Position> {
        let mut count = 0usize;
        let mut sum = Position::ORIGIN;
        for point in points {
            sum.x += point.x;
            sum.y += point.y;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(Position::new(sum.x / count as f64, sum.y / count as f64))
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Position {
    fn from(value: [f64; 2]) -> Self {
        Position::new(value[0], value[1])
    }
}

impl From<Position> for [f64; 2] {
    fn from(value: Position) -> Self {
        [value.x, value.y]
    }
}

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub(crate) u64);

        impl $name {
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

entity_id!(AnimalId);
entity_id!(BuildingId);
entity_id!(TouristId);
entity_id!(VehicleId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_does_not_overshoot() {
        let start = Position::new(0.0, 0.0);
        let target = Position::new(3.0, 4.0);
        assert_eq!(start.step_toward(target, 10.0), target);
        let partial = start.step_toward(target, 2.5);
        assert!((partial.distance(start) - 2.5).abs() < 1e-9);
        assert!((partial.distance(target) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert!(Position::centroid(Vec::new()).is_none());
        let center = Position::centroid(vec![Position::new(0.0, 0.0), Position::new(2.0, 4.0)])
            .expect("centroid");
        assert_eq!(center, Position::new(1.0, 2.0));
    }
}
