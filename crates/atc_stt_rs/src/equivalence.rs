//! Comparison of decoded lines that tolerates `A`/`C`/`D` for the same
//! altitude when the aircraft's altitude makes them mean the same thing.

use aviation_helper_rs::{
    AircraftMap, SttAircraft, clearance::aviation_command::AviationCommand,
    types::altitude::VerticalDirection,
};

/// Whether two decoded lines ask for the same thing. The callsign and the
/// number of commands must match exactly.
pub fn lines_equivalent(expected: &str, actual: &str, aircraft: &AircraftMap) -> bool {
    if expected == actual {
        return true;
    }
    let expected: Vec<&str> = expected.split_whitespace().collect();
    let actual: Vec<&str> = actual.split_whitespace().collect();
    if expected.len() != actual.len() {
        return false;
    }
    let (Some(callsign), Some(actual_callsign)) = (expected.first(), actual.first()) else {
        return true;
    };
    if callsign != actual_callsign {
        return false;
    }

    let context = aircraft.values().find(|ac| ac.callsign == *callsign);
    expected
        .iter()
        .zip(&actual)
        .skip(1)
        .all(|(e, a)| commands_equivalent(e, a, context))
}

/// `A<alt>` stands in for `D<alt>` above the target and for `C<alt>` below it.
pub fn commands_equivalent(expected: &str, actual: &str, aircraft: Option<&SttAircraft>) -> bool {
    if expected == actual {
        return true;
    }
    let Some(aircraft) = aircraft else {
        return false;
    };
    let (Ok(expected), Ok(actual)) = (
        expected.parse::<AviationCommand>(),
        actual.parse::<AviationCommand>(),
    ) else {
        return false;
    };

    let (maintain, direction) = match (expected, actual) {
        (AviationCommand::MaintainAltitude(maintain), AviationCommand::ChangeAltitude { direction, altitude })
        | (AviationCommand::ChangeAltitude { direction, altitude }, AviationCommand::MaintainAltitude(maintain))
            if maintain == altitude =>
        {
            (maintain, direction)
        }
        _ => return false,
    };
    match direction {
        VerticalDirection::Descend => aircraft.altitude > maintain.as_feet(),
        VerticalDirection::Climb => aircraft.altitude < maintain.as_feet(),
    }
}

#[cfg(test)]
mod tests {
    use aviation_helper_rs::AircraftState;

    use super::*;

    fn context(altitude: i32) -> AircraftMap {
        AircraftMap::from([(
            "American 5936".to_string(),
            SttAircraft {
                callsign: "AAL5936".to_string(),
                altitude,
                state: AircraftState::Arrival,
                ..Default::default()
            },
        )])
    }

    #[test]
    fn test_identical_lines() {
        assert!(lines_equivalent("", "", &AircraftMap::new()));
        assert!(lines_equivalent("AAL5936 D80", "AAL5936 D80", &AircraftMap::new()));
        assert!(!lines_equivalent("AAL5936 D80", "AAL5936 D80 S250", &context(12000)));
        assert!(!lines_equivalent("AAL5936 D80", "UAL5936 D80", &context(12000)));
    }

    #[test]
    fn test_maintain_matches_descend_above_target() {
        let ctx = context(12000);
        assert!(lines_equivalent("AAL5936 A80", "AAL5936 D80", &ctx));
        assert!(lines_equivalent("AAL5936 D80 L270", "AAL5936 A80 L270", &ctx));
        assert!(!lines_equivalent("AAL5936 A80", "AAL5936 C80", &ctx));
        assert!(!lines_equivalent("AAL5936 A80", "AAL5936 D70", &ctx));
    }

    #[test]
    fn test_maintain_matches_climb_below_target() {
        let ctx = context(5000);
        assert!(lines_equivalent("AAL5936 C80", "AAL5936 A80", &ctx));
        assert!(!lines_equivalent("AAL5936 D80", "AAL5936 A80", &ctx));
        // at the target neither direction applies
        assert!(!lines_equivalent("AAL5936 C50", "AAL5936 A50", &ctx));
    }

    #[test]
    fn test_needs_aircraft_context() {
        assert!(!lines_equivalent("AAL5936 A80", "AAL5936 D80", &AircraftMap::new()));
        assert!(!commands_equivalent("L270", "R270", None));
    }
}
