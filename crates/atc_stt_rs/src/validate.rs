//! Plausibility checks of parsed commands against the aircraft's state.

use std::collections::HashSet;

use aviation_helper_rs::{
    AircraftState, SttAircraft,
    clearance::aviation_command::{AviationCommand, SAY_AGAIN_PREFIX, SayAgainKind},
    types::altitude::VerticalDirection,
};
use log::debug;
use thiserror::Error;

/// Confidence lost per rejected command.
const REJECTION_PENALTY: f64 = 0.15;

/// Why a command was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("malformed command {0:?}")]
    Malformed(String),
    #[error("altitude {0:?} out of range")]
    AltitudeOutOfRange(String),
    #[error("climb target must be above current altitude")]
    ClimbBelowCurrent,
    #[error("descend target must be below current altitude")]
    DescendAboveCurrent,
    #[error("expedite climb unlikely for arrival/approach")]
    ExpediteClimbOnArrival,
    #[error("expedite descent unlikely for departure")]
    ExpediteDescentOnDeparture,
    #[error("departure aircraft cannot expect approach")]
    ExpectApproachOnDeparture,
    #[error("climb via SID only valid for departures")]
    ClimbViaSidNotDeparture,
    #[error("cancel approach only valid for aircraft cleared for approach")]
    CancelApproachNotCleared,
    #[error("altitude discretion only valid for VFR")]
    DiscretionNotVfr,
    #[error("heading command incompatible with direct-to-fix")]
    HeadingWithDirectFix,
}

impl Rejection {
    /// Altitude rejections most likely come from a misheard altitude and are
    /// answered with a say-again instead of being dropped.
    pub fn is_altitude(&self) -> bool {
        matches!(
            self,
            Rejection::AltitudeOutOfRange(_)
                | Rejection::ClimbBelowCurrent
                | Rejection::DescendAboveCurrent
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub commands: Vec<String>,
    pub confidence: f64,
    pub errors: Vec<Rejection>,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn check_command(cmd: &str, aircraft: &SttAircraft) -> Result<(), Rejection> {
    let command: AviationCommand = cmd
        .parse()
        .map_err(|_| Rejection::Malformed(cmd.to_string()))?;
    let state = aircraft.state;

    match command {
        AviationCommand::ChangeAltitude {
            direction,
            altitude,
        } => {
            if direction.permits(altitude, aircraft.altitude) {
                Ok(())
            } else if direction == VerticalDirection::Climb {
                Err(Rejection::ClimbBelowCurrent)
            } else {
                Err(Rejection::DescendAboveCurrent)
            }
        }
        AviationCommand::Other(raw)
            if raw.starts_with(['C', 'D']) && all_digits(&raw[1..]) =>
        {
            Err(Rejection::AltitudeOutOfRange(raw))
        }
        AviationCommand::ExpediteClimb
            if matches!(
                state,
                AircraftState::Arrival | AircraftState::ClearedApproach
            ) =>
        {
            Err(Rejection::ExpediteClimbOnArrival)
        }
        AviationCommand::ExpediteDescent if state == AircraftState::Departure => {
            Err(Rejection::ExpediteDescentOnDeparture)
        }
        AviationCommand::ExpectApproach(_) if state == AircraftState::Departure => {
            Err(Rejection::ExpectApproachOnDeparture)
        }
        AviationCommand::ClimbViaSid if state != AircraftState::Departure => {
            Err(Rejection::ClimbViaSidNotDeparture)
        }
        AviationCommand::CancelApproach if state != AircraftState::ClearedApproach => {
            Err(Rejection::CancelApproachNotCleared)
        }
        AviationCommand::AltitudeDiscretion if state != AircraftState::VfrFlightFollowing => {
            Err(Rejection::DiscretionNotVfr)
        }
        _ => Ok(()),
    }
}

fn classify(cmd: &str) -> Option<AviationCommand> {
    cmd.parse().ok()
}

/// A heading cannot stand next to a direct-to-fix clearance; the headings go.
fn drop_headings_with_direct_fix(commands: Vec<String>, errors: &mut Vec<Rejection>) -> Vec<String> {
    let has_direct_fix = commands
        .iter()
        .filter_map(|cmd| classify(cmd))
        .any(|cmd| cmd.is_direct_fix());
    if !has_direct_fix {
        return commands;
    }
    commands
        .into_iter()
        .filter(|cmd| {
            let is_heading = classify(cmd).is_some_and(|c| c.is_heading());
            if is_heading {
                debug!("Dropping {cmd}: direct-to-fix present");
                errors.push(Rejection::HeadingWithDirectFix);
            }
            !is_heading
        })
        .collect()
}

/// Keep only the first say-again of each kind.
fn dedup_say_again(commands: &mut Vec<String>) {
    let mut seen = HashSet::new();
    commands.retain(|cmd| !cmd.starts_with(SAY_AGAIN_PREFIX) || seen.insert(cmd.clone()));
}

/// Validate `commands` for `aircraft`. Implausible altitudes turn into
/// `SAYAGAIN/ALTITUDE`; other rejected commands are dropped. The confidence
/// is the share of surviving commands, reduced for every rejection.
pub fn validate_commands(commands: &[String], aircraft: &SttAircraft) -> ValidationResult {
    if commands.is_empty() {
        return ValidationResult::default();
    }

    let mut valid = Vec::with_capacity(commands.len());
    let mut errors = Vec::new();
    for cmd in commands {
        match check_command(cmd, aircraft) {
            Ok(()) => valid.push(cmd.clone()),
            Err(rejection) => {
                debug!("Rejected {cmd} for {}: {rejection}", aircraft.callsign);
                if rejection.is_altitude() {
                    valid.push(AviationCommand::SayAgain(SayAgainKind::Altitude).to_string());
                }
                errors.push(rejection);
            }
        }
    }

    let mut valid = drop_headings_with_direct_fix(valid, &mut errors);
    dedup_say_again(&mut valid);

    let valid_ratio = valid.len() as f64 / commands.len() as f64;
    let confidence = (valid_ratio * (1.0 - REJECTION_PENALTY * errors.len() as f64)).max(0.0);
    ValidationResult {
        commands: valid,
        confidence,
        errors,
    }
}

fn plausible_for_state(cmd: &str, state: AircraftState) -> bool {
    let Some(command) = classify(cmd) else {
        return false;
    };
    match state {
        AircraftState::Departure => !matches!(
            command,
            AviationCommand::ChangeAltitude {
                direction: VerticalDirection::Descend,
                ..
            } | AviationCommand::ContactTower
                | AviationCommand::ExpectApproach(_)
                | AviationCommand::ExpediteDescent
                | AviationCommand::ClearedApproach(_)
        ),
        AircraftState::Arrival => !matches!(
            command,
            AviationCommand::ChangeAltitude {
                direction: VerticalDirection::Climb,
                ..
            } | AviationCommand::ContactTower
        ),
        AircraftState::Overflight => command != AviationCommand::ContactTower,
        _ => true,
    }
}

/// Commands that are likely for an aircraft in `state`. Not applied by the
/// decoder.
pub fn filter_for_state(commands: &[String], state: AircraftState) -> Vec<String> {
    commands
        .iter()
        .filter(|cmd| plausible_for_state(cmd, state))
        .cloned()
        .collect()
}
