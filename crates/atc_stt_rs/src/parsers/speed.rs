//! Airspeeds, speed restriction limits and mach numbers.

use aviation_helper_rs::{SttAircraft, clearance::aviation_command::SayAgainKind};
use log::debug;

use super::{ParseOutcome, fix::extract_fix, is_command_keyword};
use crate::tokenize::{Token, TokenKind};

const SCAN_WINDOW: usize = 4;

pub fn parse_speed(tokens: &[Token], pos: usize) -> ParseOutcome {
    for i in pos..tokens.len().min(pos + SCAN_WINDOW) {
        let token = &tokens[i];
        let consumed = i - pos + 1;
        if token.kind == TokenKind::Word && is_command_keyword(&token.text) {
            break;
        }
        let (TokenKind::Number, Some(v)) = (token.kind, token.value) else {
            continue;
        };

        // "21 0"
        if (10..40).contains(&v) && tokens.get(i + 1).is_some_and(|next| next.is("0")) {
            return ParseOutcome::int(v * 10, consumed + 1);
        }
        if (100..=400).contains(&v) {
            return ParseOutcome::int(v - v % 10, consumed);
        }
        // "to 170" heard as "2170"
        if (2000..=2999).contains(&v) && v % 10 == 0 && (100..=400).contains(&(v % 1000)) {
            debug!("Speed {v} read as {}", v % 1000);
            return ParseOutcome::int(v % 1000, consumed);
        }
        // extra trailing digit: "1709"
        if v > 400 && (100..=400).contains(&(v / 10)) {
            return ParseOutcome::int(v / 10, consumed);
        }
        // dropped leading digit: "30" for 230
        if (10..100).contains(&v) {
            if 200 + v <= 290 {
                return ParseOutcome::int(200 + v, consumed);
            }
            if (140..=190).contains(&(100 + v)) {
                return ParseOutcome::int(100 + v, consumed);
            }
        }
    }
    ParseOutcome::Failed(Some(SayAgainKind::Speed))
}

/// Limit of a speed restriction after "until": a fix, "N DME" or
/// "N mile final". "until advised" is left to the unconditional forms.
pub fn parse_speed_until(tokens: &[Token], pos: usize, aircraft: &SttAircraft) -> ParseOutcome {
    if !matches!(tokens[pos].text.as_str(), "until" | "unto" | "intel") {
        return ParseOutcome::Failed(None);
    }
    let mut start = pos + 1;
    if tokens.get(start).is_some_and(|t| t.is("the")) {
        start += 1;
    }
    let rest = &tokens[start.min(tokens.len())..];
    let word = |idx: usize| rest.get(idx).map(|t| t.text.as_str());

    if word(0) == Some("advised") || (word(0) == Some("for") && word(1) == Some("now")) {
        return ParseOutcome::Failed(None);
    }

    if let Some(n) = rest
        .first()
        .filter(|t| t.kind == TokenKind::Number)
        .and_then(|t| t.value)
    {
        if matches!(word(1), Some("mile" | "miles")) && word(2) == Some("final") {
            return ParseOutcome::text(n.to_string(), start - pos + 3);
        }
        if word(1) == Some("dme") {
            return ParseOutcome::text(format!("{n}DME"), start - pos + 2);
        }
        if word(1) == Some("d") && word(2) == Some("m") && word(3) == Some("e") {
            return ParseOutcome::text(format!("{n}DME"), start - pos + 4);
        }
    }

    match extract_fix(rest, &aircraft.fixes) {
        Some(found) => ParseOutcome::text(found.id, start - pos + found.consumed),
        None => ParseOutcome::Failed(None),
    }
}

/// "mach point seven eight" → 78, "mach point 8" → 80.
pub fn parse_mach(tokens: &[Token], pos: usize) -> ParseOutcome {
    match (tokens[pos].kind, tokens[pos].value) {
        (TokenKind::Number, Some(n)) if (1..10).contains(&n) => ParseOutcome::int(n * 10, 1),
        (TokenKind::Number, Some(n)) if (10..100).contains(&n) => ParseOutcome::int(n, 1),
        _ => ParseOutcome::Failed(None),
    }
}
