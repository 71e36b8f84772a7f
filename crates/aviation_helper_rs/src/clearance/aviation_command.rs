//! Classification of emitted command-DSL strings.
//!
//! The decoder produces commands as strings (`D80`, `L270`, `DCAMRN`, ...).
//! [`AviationCommand`] parses them back into the handful of shapes that
//! validation and comparison care about; everything else stays `Other`.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

use crate::{
    errors::Error,
    types::{
        altitude::{Altitude, VerticalDirection},
        heading::{Heading, TurnDirection},
    },
};

/// Value a command keyword was heard for but could not be extracted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, StrumDisplay, EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SayAgainKind {
    Altitude,
    Heading,
    Speed,
    Approach,
    Squawk,
    Fix,
    Turn,
}

pub const SAY_AGAIN_PREFIX: &str = "SAYAGAIN/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AviationCommand {
    /// `C<alt>` / `D<alt>`.
    ChangeAltitude {
        direction: VerticalDirection,
        altitude: Altitude,
    },
    /// `A<alt>`.
    MaintainAltitude(Altitude),
    /// `A` alone: VFR altitude at pilot's discretion.
    AltitudeDiscretion,
    ExpediteClimb,
    ExpediteDescent,
    ClimbViaSid,
    CancelApproach,
    /// `L<nnn>` / `R<nnn>` / `H<nnn>`.
    FlyHeading {
        heading: Heading,
        turn_direction: Option<TurnDirection>,
    },
    /// `D<FIX>[/...]`.
    DirectFix(String),
    /// `E<APPR>` (not `EC`/`ED`).
    ExpectApproach(String),
    /// `C<APPR>` (not a climb, cross or special `C` command).
    ClearedApproach(String),
    ContactTower,
    GoAhead,
    SayAgain(SayAgainKind),
    /// Commands prefixed with `T` after "then".
    Sequenced(String),
    Other(String),
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_altitude(s: &str) -> Option<Altitude> {
    all_digits(s)
        .then(|| s.parse::<i32>().ok())
        .flatten()
        .and_then(|n| Altitude::new(n).ok())
}

impl FromStr for AviationCommand {
    type Err = Error;

    fn from_str(cmd: &str) -> Result<Self, Self::Err> {
        if cmd.is_empty() || !cmd.is_ascii() || cmd.contains(char::is_whitespace) {
            return Err(Error::InvalidCommand(cmd.to_owned()));
        }
        if let Some(kind) = cmd.strip_prefix(SAY_AGAIN_PREFIX) {
            return kind
                .parse()
                .map(AviationCommand::SayAgain)
                .map_err(|_| Error::InvalidCommand(cmd.to_owned()));
        }
        let command = match cmd {
            "A" => AviationCommand::AltitudeDiscretion,
            "EC" => AviationCommand::ExpediteClimb,
            "ED" => AviationCommand::ExpediteDescent,
            "CVS" => AviationCommand::ClimbViaSid,
            "CAC" => AviationCommand::CancelApproach,
            "TO" => AviationCommand::ContactTower,
            "GA" => AviationCommand::GoAhead,
            _ => {
                let (first, rest) = cmd.split_at(1);
                match first {
                    "D" => match parse_altitude(rest) {
                        Some(altitude) => AviationCommand::ChangeAltitude {
                            direction: VerticalDirection::Descend,
                            altitude,
                        },
                        None if all_digits(rest) => AviationCommand::Other(cmd.to_owned()),
                        None => AviationCommand::DirectFix(rest.to_owned()),
                    },
                    "C" => match parse_altitude(rest) {
                        Some(altitude) => AviationCommand::ChangeAltitude {
                            direction: VerticalDirection::Climb,
                            altitude,
                        },
                        None if all_digits(rest) || rest.contains('/') => {
                            AviationCommand::Other(cmd.to_owned())
                        }
                        None => AviationCommand::ClearedApproach(rest.to_owned()),
                    },
                    "A" => match parse_altitude(rest) {
                        Some(altitude) => AviationCommand::MaintainAltitude(altitude),
                        None => AviationCommand::Other(cmd.to_owned()),
                    },
                    "L" | "R" | "H" if all_digits(rest) => {
                        let heading = rest.parse::<i32>().ok().map(Heading::try_from);
                        let turn_direction = match first {
                            "L" => Some(TurnDirection::Left),
                            "R" => Some(TurnDirection::Right),
                            _ => None,
                        };
                        match heading {
                            Some(Ok(heading)) => AviationCommand::FlyHeading {
                                heading,
                                turn_direction,
                            },
                            _ => AviationCommand::Other(cmd.to_owned()),
                        }
                    }
                    "E" => AviationCommand::ExpectApproach(rest.to_owned()),
                    "T" if rest.starts_with(['C', 'D', 'S']) => {
                        AviationCommand::Sequenced(rest.to_owned())
                    }
                    _ => AviationCommand::Other(cmd.to_owned()),
                }
            }
        };
        Ok(command)
    }
}

impl Display for AviationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AviationCommand::ChangeAltitude {
                direction: VerticalDirection::Climb,
                altitude,
            } => write!(f, "C{altitude}"),
            AviationCommand::ChangeAltitude {
                direction: VerticalDirection::Descend,
                altitude,
            } => write!(f, "D{altitude}"),
            AviationCommand::MaintainAltitude(altitude) => write!(f, "A{altitude}"),
            AviationCommand::AltitudeDiscretion => write!(f, "A"),
            AviationCommand::ExpediteClimb => write!(f, "EC"),
            AviationCommand::ExpediteDescent => write!(f, "ED"),
            AviationCommand::ClimbViaSid => write!(f, "CVS"),
            AviationCommand::CancelApproach => write!(f, "CAC"),
            AviationCommand::FlyHeading {
                heading,
                turn_direction,
            } => match turn_direction {
                Some(direction) => write!(f, "{direction}{heading}"),
                None => write!(f, "H{heading}"),
            },
            AviationCommand::DirectFix(fix) => write!(f, "D{fix}"),
            AviationCommand::ExpectApproach(approach) => write!(f, "E{approach}"),
            AviationCommand::ClearedApproach(approach) => write!(f, "C{approach}"),
            AviationCommand::ContactTower => write!(f, "TO"),
            AviationCommand::GoAhead => write!(f, "GA"),
            AviationCommand::SayAgain(kind) => write!(f, "{SAY_AGAIN_PREFIX}{kind}"),
            AviationCommand::Sequenced(inner) => write!(f, "T{inner}"),
            AviationCommand::Other(raw) => write!(f, "{raw}"),
        }
    }
}

impl AviationCommand {
    pub fn is_heading(&self) -> bool {
        matches!(self, AviationCommand::FlyHeading { .. })
    }

    /// Direct-to-fix, or a say-again for a fix (which was going to be one).
    pub fn is_direct_fix(&self) -> bool {
        matches!(
            self,
            AviationCommand::DirectFix(_) | AviationCommand::SayAgain(SayAgainKind::Fix)
        )
    }

    /// Altitude target for `A`/`C`/`D` commands with a numeric altitude.
    pub fn altitude(&self) -> Option<Altitude> {
        match self {
            AviationCommand::ChangeAltitude { altitude, .. }
            | AviationCommand::MaintainAltitude(altitude) => Some(*altitude),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: &str) -> AviationCommand {
        cmd.parse().unwrap()
    }

    #[test]
    fn test_classify_altitude_commands() {
        match parse("D80") {
            AviationCommand::ChangeAltitude {
                direction: VerticalDirection::Descend,
                altitude,
            } => assert_eq!(altitude.encoded(), 80),
            other => panic!("Expected descend, got {other:?}"),
        }
        assert_eq!(parse("A100").altitude().map(Altitude::encoded), Some(100));
        assert_eq!(parse("A"), AviationCommand::AltitudeDiscretion);
        assert_eq!(parse("CVS"), AviationCommand::ClimbViaSid);
    }

    #[test]
    fn test_classify_navigation_commands() {
        assert_eq!(parse("DCAMRN"), AviationCommand::DirectFix("CAMRN".to_string()));
        assert!(parse("DDPK/H270").is_direct_fix());
        assert!(parse("L270").is_heading());
        assert!(parse("H050").is_heading());
        assert!(!parse("H").is_heading());
        assert!(!parse("HJIMEE/R090/L").is_heading());
        assert_eq!(parse("CI22L"), AviationCommand::ClearedApproach("I22L".to_string()));
        assert!(matches!(parse("CCAMRN/A80"), AviationCommand::Other(_)));
        assert_eq!(parse("EI22L"), AviationCommand::ExpectApproach("I22L".to_string()));
        assert_eq!(parse("TD100"), AviationCommand::Sequenced("D100".to_string()));
        assert!(matches!(parse("T20L"), AviationCommand::Other(_)));
        assert!(matches!(parse("TRAFFIC/2/5/40"), AviationCommand::Other(_)));
    }

    #[test]
    fn test_say_again_round_trip() {
        let cmd = parse("SAYAGAIN/HEADING");
        assert_eq!(cmd, AviationCommand::SayAgain(SayAgainKind::Heading));
        assert!(parse("SAYAGAIN/FIX").is_direct_fix());
        assert_eq!(cmd.to_string(), "SAYAGAIN/HEADING");
        assert_eq!(parse("L050").to_string(), "L050");
        assert!("SAYAGAIN/WEATHER".parse::<AviationCommand>().is_err());
        assert!("".parse::<AviationCommand>().is_err());
    }
}
