//! Altitudes, encoded in hundreds of feet.

use aviation_helper_rs::{
    SttAircraft, clearance::aviation_command::SayAgainKind, types::altitude::MAX_ENCODED,
};
use log::debug;

use super::ParseOutcome;
use crate::tokenize::{Token, TokenKind};

const SCAN_WINDOW: usize = 4;

pub fn parse_altitude(
    tokens: &[Token],
    pos: usize,
    aircraft: &SttAircraft,
    allow_flight_level: bool,
) -> ParseOutcome {
    let current = aircraft.altitude / 100;
    for i in pos..tokens.len().min(pos + SCAN_WINDOW) {
        let token = &tokens[i];
        let consumed = i - pos + 1;

        // "5 miles" is a distance
        if tokens
            .get(i + 1)
            .is_some_and(|next| matches!(next.text.as_str(), "mile" | "miles"))
        {
            continue;
        }

        if token.is_spoken_altitude() {
            if let Some(value) = token.value {
                return ParseOutcome::int(value, consumed);
            }
        }

        let Some(n) = token.raw_number() else {
            continue;
        };

        // "10 11000": garbled lead-in before the real altitude
        if n < 100 {
            if let Some(next) = tokens.get(i + 1).and_then(Token::raw_number) {
                if is_raw_feet(next) {
                    return ParseOutcome::int(next / 100, consumed + 1);
                }
            }
        }

        if (10..=MAX_ENCODED).contains(&n) && (n < 100 || n > 400 || allow_flight_level) {
            let mut altitude = n;
            if altitude < current && altitude * 10 <= MAX_ENCODED {
                debug!(
                    "Altitude correction: {altitude} -> {} (aircraft at {} ft)",
                    altitude * 10,
                    aircraft.altitude
                );
                altitude *= 10;
            }
            return ParseOutcome::int(altitude, consumed);
        }

        // "ten thousand" heard as "1000"
        if n == 1000 {
            return ParseOutcome::int(100, consumed);
        }
        if is_raw_feet(n) {
            return ParseOutcome::int(n / 100, consumed);
        }
        // extra zeros: "900000" for 9000
        if (100_000..=6_000_000).contains(&n) && n % 10_000 == 0 {
            let feet = n / 100;
            if is_raw_feet(feet) {
                return ParseOutcome::int(feet / 100, consumed);
            }
        }
        // "maintain niner" is 9000
        if (1..=9).contains(&n) {
            return ParseOutcome::int(n * 10, consumed);
        }
    }
    ParseOutcome::Failed(Some(SayAgainKind::Altitude))
}

/// Only "N thousand" / "flight level N" speech, never a bare number.
pub fn parse_standalone_altitude(tokens: &[Token], pos: usize) -> ParseOutcome {
    match &tokens[pos] {
        token if token.is_spoken_altitude() => match token.value {
            Some(value) => ParseOutcome::int(value, 1),
            None => ParseOutcome::Failed(None),
        },
        _ => ParseOutcome::Failed(None),
    }
}

fn is_raw_feet(n: i32) -> bool {
    (1000..=60_000).contains(&n) && n % 100 == 0
}

/// Encoded altitude of a token that can only be an altitude: altitude
/// tokens, 10..600 outside the speed range, or round raw feet.
pub fn altitude_token_value(token: &Token) -> Option<i32> {
    match (token.kind, token.value) {
        (TokenKind::Altitude, value) => value,
        (TokenKind::Number, Some(n)) if (10..=MAX_ENCODED).contains(&n) && !(100..=400).contains(&n) => {
            Some(n)
        }
        (TokenKind::Number, Some(n)) if is_raw_feet(n) => Some(n / 100),
        _ => None,
    }
}
