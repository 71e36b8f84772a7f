use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Altitudes at or above this encoded value are flight levels.
pub const FLIGHT_LEVEL_FLOOR: i32 = 180;

/// Highest encoded altitude accepted anywhere in the DSL.
pub const MAX_ENCODED: i32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum VerticalDirection {
    Climb,
    Descend,
}

impl VerticalDirection {
    /// Whether an aircraft at `current_feet` can move towards `target` in this direction.
    /// Re-issuing the current altitude is allowed.
    pub fn permits(self, target: Altitude, current_feet: i32) -> bool {
        match self {
            VerticalDirection::Climb => target.as_feet() >= current_feet,
            VerticalDirection::Descend => target.as_feet() <= current_feet,
        }
    }
}

/// Altitude in hundreds of feet, the encoding used by the command DSL
/// (`80` is 8,000 ft, `350` is FL350).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Altitude(i32);

impl Altitude {
    pub fn new(encoded: i32) -> Result<Self, Error> {
        if (1..=MAX_ENCODED).contains(&encoded) {
            Ok(Altitude(encoded))
        } else {
            Err(Error::InvalidAltitude(encoded))
        }
    }

    pub fn from_feet(feet: i32) -> Result<Self, Error> {
        Self::new(feet / 100)
    }

    pub fn encoded(self) -> i32 {
        self.0
    }

    pub fn as_feet(self) -> i32 {
        self.0 * 100
    }

    pub fn is_flight_level(self) -> bool {
        self.0 >= FLIGHT_LEVEL_FLOOR
    }
}

impl Display for Altitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
