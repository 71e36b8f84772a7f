use std::fmt::Display;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use crate::errors::Error;

/// Magnetic heading in whole degrees, `1..=360`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Heading(u16);

impl Heading {
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<i32> for Heading {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1..=360 => Ok(Heading(value as u16)),
            _ => Err(Error::InvalidHeading(value)),
        }
    }
}

impl From<Heading> for i32 {
    fn from(value: Heading) -> Self {
        value.0 as i32
    }
}

impl Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Deserialize, Serialize, StrumDisplay, EnumString,
)]
pub enum TurnDirection {
    #[strum(to_string = "L", serialize = "left")]
    Left,
    #[strum(to_string = "R", serialize = "right")]
    Right,
}

impl TurnDirection {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "left" => Some(TurnDirection::Left),
            "right" => Some(TurnDirection::Right),
            _ => None,
        }
    }
}
