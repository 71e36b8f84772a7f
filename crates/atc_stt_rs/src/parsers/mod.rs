//! Typed value extraction for template holes.
//!
//! Every `{id}` in a command template names one [`TypeParser`]. A parser
//! looks at the tokens from a position on and either yields a [`Value`]
//! together with the number of tokens it used, or fails, optionally naming
//! the kind of value the controller should repeat.

use std::fmt::Display;

use aviation_helper_rs::{
    AviationData, SttAircraft,
    clearance::aviation_command::SayAgainKind,
    conversions::spoken_digits,
    types::heading::TurnDirection,
};

use crate::{
    normalize::is_digit,
    similarity::fuzzy_match,
    tokenize::{Token, TokenKind},
    vocabulary::vocabulary,
};

pub mod altitude;
pub mod approach;
pub mod fix;
pub mod heading;
pub mod misc;
pub mod procedure;
pub mod speed;
pub mod squawk;

/// What a parser sees besides the tokens.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub aircraft: &'a SttAircraft,
    pub data: &'a dyn AviationData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Text(String),
    Degrees {
        degrees: i32,
        direction: TurnDirection,
    },
    Traffic {
        oclock: i32,
        miles: i32,
        altitude: i32,
    },
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::Degrees { degrees, direction } => write!(f, "{degrees}{direction}"),
            Value::Traffic {
                oclock,
                miles,
                altitude,
            } => write!(f, "{oclock}/{miles}/{altitude}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed { value: Value, consumed: usize },
    /// `Some` when the value was clearly expected but unreadable.
    Failed(Option<SayAgainKind>),
}

impl ParseOutcome {
    pub fn int(value: i32, consumed: usize) -> Self {
        ParseOutcome::Parsed {
            value: Value::Int(value),
            consumed,
        }
    }

    pub fn text(value: impl Into<String>, consumed: usize) -> Self {
        ParseOutcome::Parsed {
            value: Value::Text(value.into()),
            consumed,
        }
    }

    pub fn consumed(&self) -> usize {
        match self {
            ParseOutcome::Parsed { consumed, .. } => *consumed,
            ParseOutcome::Failed(_) => 0,
        }
    }
}

/// Parsers addressable from templates, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParser {
    /// `altitude`, or `altitude_fl` where 100..400 count as flight levels.
    Altitude { allow_flight_level: bool },
    /// `standalone_altitude`: only altitudes spoken with "thousand" or "flight level".
    StandaloneAltitude,
    Heading,
    Speed,
    SpeedUntil,
    Mach,
    Fix,
    /// `approach`, or `approach_lahso` with an optional land-and-hold-short clause.
    Approach { allow_lahso: bool },
    Squawk,
    Degrees,
    Sid,
    Star,
    Hold,
    Traffic,
    Text,
    GarbledWord,
    AtisLetter,
    ContactFrequency,
    /// `num:min-max`
    Range { min: i32, max: i32 },
}

impl TypeParser {
    /// Parser for a template id. `None` for unknown ids and malformed ranges.
    pub fn from_id(id: &str) -> Option<Self> {
        let parser = match id {
            "altitude" => TypeParser::Altitude {
                allow_flight_level: false,
            },
            "altitude_fl" => TypeParser::Altitude {
                allow_flight_level: true,
            },
            "standalone_altitude" => TypeParser::StandaloneAltitude,
            "heading" => TypeParser::Heading,
            "speed" => TypeParser::Speed,
            "speed_until" => TypeParser::SpeedUntil,
            "mach" => TypeParser::Mach,
            "fix" => TypeParser::Fix,
            "approach" => TypeParser::Approach { allow_lahso: false },
            "approach_lahso" => TypeParser::Approach { allow_lahso: true },
            "squawk" => TypeParser::Squawk,
            "degrees" => TypeParser::Degrees,
            "sid" => TypeParser::Sid,
            "star" => TypeParser::Star,
            "hold" => TypeParser::Hold,
            "traffic" => TypeParser::Traffic,
            "text" => TypeParser::Text,
            "garbled_word" => TypeParser::GarbledWord,
            "atis_letter" => TypeParser::AtisLetter,
            "contact_frequency" => TypeParser::ContactFrequency,
            _ => {
                let (min, max) = id.strip_prefix("num:")?.split_once('-')?;
                let (min, max) = (min.parse().ok()?, max.parse().ok()?);
                if min > max {
                    return None;
                }
                TypeParser::Range { min, max }
            }
        };
        Some(parser)
    }

    pub fn parse(self, tokens: &[Token], pos: usize, ctx: &ParseContext) -> ParseOutcome {
        if pos >= tokens.len() {
            return ParseOutcome::Failed(self.say_again_kind());
        }
        match self {
            TypeParser::Altitude { allow_flight_level } => {
                altitude::parse_altitude(tokens, pos, ctx.aircraft, allow_flight_level)
            }
            TypeParser::StandaloneAltitude => altitude::parse_standalone_altitude(tokens, pos),
            TypeParser::Heading => heading::parse_heading(tokens, pos),
            TypeParser::Speed => speed::parse_speed(tokens, pos),
            TypeParser::SpeedUntil => speed::parse_speed_until(tokens, pos, ctx.aircraft),
            TypeParser::Mach => speed::parse_mach(tokens, pos),
            TypeParser::Fix => fix::parse_fix(tokens, pos, ctx.aircraft),
            TypeParser::Approach { allow_lahso } => {
                approach::parse_approach(tokens, pos, ctx.aircraft, allow_lahso)
            }
            TypeParser::Squawk => squawk::parse_squawk(tokens, pos),
            TypeParser::Degrees => heading::parse_degrees(tokens, pos),
            TypeParser::Sid => procedure::parse_procedure(tokens, pos, ctx, false),
            TypeParser::Star => procedure::parse_procedure(tokens, pos, ctx, true),
            TypeParser::Hold => fix::parse_hold(tokens, pos, ctx.aircraft),
            TypeParser::Traffic => misc::parse_traffic(tokens, pos),
            TypeParser::Text => misc::parse_text(tokens, pos),
            TypeParser::GarbledWord => misc::parse_garbled_word(tokens, pos),
            TypeParser::AtisLetter => misc::parse_atis_letter(tokens, pos),
            TypeParser::ContactFrequency => misc::parse_contact_frequency(tokens, pos),
            TypeParser::Range { min, max } => misc::parse_range(tokens, pos, min, max),
        }
    }

    /// What to ask for when this parser finds nothing at all.
    fn say_again_kind(self) -> Option<SayAgainKind> {
        match self {
            TypeParser::Altitude { .. } => Some(SayAgainKind::Altitude),
            TypeParser::Heading => Some(SayAgainKind::Heading),
            TypeParser::Speed => Some(SayAgainKind::Speed),
            TypeParser::Fix => Some(SayAgainKind::Fix),
            TypeParser::Approach { .. } => Some(SayAgainKind::Approach),
            TypeParser::Squawk => Some(SayAgainKind::Squawk),
            TypeParser::Degrees => Some(SayAgainKind::Turn),
            _ => None,
        }
    }
}

/// Whether a word starts (or fuzzily resembles the start of) another command.
pub fn is_command_keyword(word: &str) -> bool {
    vocabulary()
        .command_boundary_words
        .iter()
        .any(|keyword| fuzzy_match(word, keyword, 0.8))
}

/// Runway side for "left"/"l", "right"/"r", "center"/"c".
pub(crate) fn runway_side(word: &str) -> Option<&'static str> {
    match word {
        "left" | "l" => Some("left"),
        "right" | "r" => Some("right"),
        "center" | "c" => Some("center"),
        _ => None,
    }
}

/// The first `len` tokens as one phrase, numbers spoken digit by digit
/// ("22" → "two two") to line up with telephony.
pub(crate) fn spoken_phrase(tokens: &[Token], len: usize) -> String {
    tokens
        .iter()
        .take(len)
        .map(|t| match (t.kind, t.value) {
            (TokenKind::Number, Some(n)) if n >= 0 => spoken_digits(n as u32),
            _ => t.text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Position after an optional "expect further clearance [time]".
pub(crate) fn skip_expect_further_clearance(tokens: &[Token], start: usize) -> usize {
    let vocab = vocabulary();
    let mut i = start;
    while tokens.get(i).is_some_and(|t| vocab.is_filler(&t.text)) {
        i += 1;
    }
    let phrase = ["expect", "further", "clearance"];
    let matches = tokens
        .get(i..i + phrase.len())
        .is_some_and(|window| window.iter().zip(phrase).all(|(t, w)| t.is(w)));
    if !matches {
        return i;
    }
    i += phrase.len();
    while tokens
        .get(i)
        .is_some_and(|t| t.kind == TokenKind::Number || is_digit(&t.text))
    {
        i += 1;
    }
    i
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use aviation_helper_rs::{AircraftState, SttAircraft};

    use crate::{normalize::normalize, tokenize::Token, tokenize::tokenize};

    pub fn tokens(transcript: &str) -> Vec<Token> {
        tokenize(&normalize(transcript))
    }

    pub fn aircraft(altitude: i32) -> SttAircraft {
        SttAircraft {
            callsign: "AAL123".to_string(),
            altitude,
            state: AircraftState::Arrival,
            ..Default::default()
        }
    }

    pub fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
