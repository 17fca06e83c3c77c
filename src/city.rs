use serde::{Deserialize, Serialize};
use std::fmt;

/// A point of the problem instance. Coordinates cannot change once created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    x: f64,
    y: f64,
}

impl City {
    pub fn new(x: f64, y: f64) -> City {
        City { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to another city
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}
