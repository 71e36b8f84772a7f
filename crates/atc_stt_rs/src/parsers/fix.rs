//! Fix names and holding instructions.
//!
//! Fixes are matched against the aircraft's own fix table (spoken name →
//! identifier): exact phrases first, then Jaro-Winkler, phonetic, vowel
//! normalized and consonant skeleton comparisons. A NATO spelling after the
//! name ("deer park, that's delta papa kilo") confirms or overrides it.

use std::collections::BTreeMap;

use aviation_helper_rs::{
    SttAircraft, clearance::aviation_command::SayAgainKind, types::heading::TurnDirection,
};
use log::debug;

use super::{ParseOutcome, skip_expect_further_clearance};
use crate::{
    normalize::nato_spelling,
    similarity::{consonants, jaro_winkler, normalize_vowels, phonetic_match},
    tokenize::{Token, TokenKind},
    vocabulary::vocabulary,
};

const MAX_PHRASE_LEN: usize = 3;
const FUZZY_THRESHOLD: f64 = 0.78;
const PHONETIC_SCORE: f64 = 0.80;
const CONSONANT_SCORE: f64 = 0.78;
const SPELLED_SCORE: f64 = 0.95;
/// "pucky heading 180" must not match "pucky".
const MAX_LENGTH_RATIO: f64 = 1.5;

const RADIAL_WINDOW: usize = 10;
const LEG_WINDOW: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct FixMatch {
    pub id: String,
    pub score: f64,
    pub consumed: usize,
}

/// Keep the higher score; equal scores go to the smaller identifier.
fn offer(best: &mut Option<FixMatch>, id: &str, score: f64, consumed: usize) {
    let wins = best
        .as_ref()
        .is_none_or(|b| score > b.score || (score == b.score && id < b.id.as_str()));
    if wins {
        *best = Some(FixMatch {
            id: id.to_string(),
            score,
            consumed,
        });
    }
}

pub fn extract_fix(tokens: &[Token], fixes: &BTreeMap<String, String>) -> Option<FixMatch> {
    if tokens.is_empty() || fixes.is_empty() {
        return None;
    }

    let best = spoken_fix(tokens, fixes);
    let search_start = best.as_ref().map_or(1, |b| b.consumed);
    if search_start < tokens.len() {
        if let Some(spelled) = extract_spelled_fix(&tokens[search_start..], fixes) {
            let consumed = search_start + spelled.consumed;
            return Some(match best {
                Some(spoken) if spoken.id == spelled.id => {
                    debug!("Spelling confirms fix {}", spoken.id);
                    FixMatch {
                        score: spoken.score.max(0.98),
                        consumed,
                        ..spoken
                    }
                }
                spoken => {
                    if let Some(spoken) = spoken {
                        debug!("Spelling {} overrides spoken fix {}", spelled.id, spoken.id);
                    }
                    FixMatch {
                        consumed,
                        ..spelled
                    }
                }
            });
        }
    }
    if let Some(found) = &best {
        debug!(
            "Fix {:?} -> {} ({:.2})",
            tokens[0].text, found.id, found.score
        );
    }
    best
}

fn spoken_fix(tokens: &[Token], fixes: &BTreeMap<String, String>) -> Option<FixMatch> {
    let mut best = None;
    for len in (1..=tokens.len().min(MAX_PHRASE_LEN)).rev() {
        let phrase = tokens[..len]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(id) = fixes
            .iter()
            .find_map(|(spoken, id)| phrase.eq_ignore_ascii_case(spoken).then_some(id))
        {
            return Some(FixMatch {
                id: id.clone(),
                score: 1.0,
                consumed: len,
            });
        }

        for (spoken, id) in fixes {
            if phrase.len() as f64 / spoken.len() as f64 > MAX_LENGTH_RATIO {
                continue;
            }
            let score = jaro_winkler(&phrase, spoken);
            if score >= FUZZY_THRESHOLD {
                offer(&mut best, id, score, len);
            }
            if phonetic_match(&phrase, spoken) {
                offer(&mut best, id, PHONETIC_SCORE, len);
            }
            // "gail" for "gayel"
            let (norm_phrase, norm_spoken) = (normalize_vowels(&phrase), normalize_vowels(spoken));
            if norm_phrase != phrase || norm_spoken != *spoken {
                let score = jaro_winkler(&norm_phrase, &norm_spoken);
                if score >= FUZZY_THRESHOLD {
                    offer(&mut best, id, score * 0.95, len);
                }
            }
            // "zizou" for "zzooo"
            if phrase.len() >= 3 && spoken.len() >= 3 {
                let skeleton = consonants(&phrase);
                if skeleton.len() >= 2 && skeleton == consonants(spoken) {
                    offer(&mut best, id, CONSONANT_SCORE, len);
                }
            }
        }
    }
    best
}

/// A fix identifier spelled with NATO words, optionally after "that's".
pub fn extract_spelled_fix(tokens: &[Token], fixes: &BTreeMap<String, String>) -> Option<FixMatch> {
    let start = match tokens.first() {
        Some(first) if vocabulary().is_spelling_trigger(&first.text) => 1,
        Some(_) => 0,
        None => return None,
    };
    let (spelled, consumed) = nato_spelling(tokens.get(start..)?.iter().map(|t| t.text.as_str()));
    if spelled.len() < 2 {
        return None;
    }
    let id = fixes.values().find(|id| id.eq_ignore_ascii_case(&spelled))?;
    Some(FixMatch {
        id: id.clone(),
        score: SPELLED_SCORE,
        consumed: start + consumed,
    })
}

pub fn parse_fix(tokens: &[Token], pos: usize, aircraft: &SttAircraft) -> ParseOutcome {
    match extract_fix(&tokens[pos..], &aircraft.fixes) {
        Some(found) => ParseOutcome::text(found.id, found.consumed),
        None => ParseOutcome::Failed(Some(SayAgainKind::Fix)),
    }
}

/// "H<FIX>/R<radial>[/<min>M]/<L|R>", or "H<FIX>" for a published hold.
pub fn parse_hold(tokens: &[Token], pos: usize, aircraft: &SttAircraft) -> ParseOutcome {
    let Some(fix) = extract_fix(&tokens[pos..], &aircraft.fixes) else {
        return ParseOutcome::Failed(None);
    };
    match extract_hold_params(&tokens[pos + fix.consumed..], &fix.id) {
        Some((hold, consumed)) => ParseOutcome::text(hold, fix.consumed + consumed),
        None => ParseOutcome::text(format!("H{}", fix.id), fix.consumed),
    }
}

/// "on the 090 radial inbound, 10 minute legs, left turns".
fn extract_hold_params(tokens: &[Token], fix: &str) -> Option<(String, usize)> {
    let vocab = vocabulary();
    let skip_fillers = |mut i: usize| {
        while tokens.get(i).is_some_and(|t| {
            matches!(t.text.as_str(), "on" | "the" | "inbound") || vocab.is_filler(&t.text)
        }) {
            i += 1;
        }
        i
    };
    let number_in = |t: &Token, min: i32, max: i32| match (t.kind, t.value) {
        (TokenKind::Number, Some(n)) if (min..=max).contains(&n) => Some(n),
        _ => None,
    };

    let i = skip_fillers(0);
    let (radial_at, radial) = (i..tokens.len().min(i + RADIAL_WINDOW)).find_map(|j| {
        let radial = number_in(&tokens[j], 1, 360)?;
        tokens
            .get(j + 1)
            .is_some_and(|t| t.is("radial") || t.is("bearing"))
            .then_some((j, radial))
    })?;
    let mut i = skip_fillers(radial_at + 2);

    let mut hold = format!("H{fix}/R{radial}");
    if let Some((at, minutes)) = (i..tokens.len().min(i + LEG_WINDOW)).find_map(|j| {
        let minutes = number_in(&tokens[j], 1, 10)?;
        tokens
            .get(j + 1)
            .is_some_and(|t| t.is("minute") || t.is("minutes"))
            .then_some((j, minutes))
    }) {
        hold.push_str(&format!("/{minutes}M"));
        i = at + 2;
        if tokens.get(i).is_some_and(|t| t.is("legs")) {
            i += 1;
        }
    }

    let mut turns = TurnDirection::Right;
    if let Some((at, direction)) = (i..tokens.len().min(i + LEG_WINDOW))
        .find_map(|j| TurnDirection::from_word(&tokens[j].text).map(|d| (j, d)))
    {
        turns = direction;
        i = at + 1;
        if tokens.get(i).is_some_and(|t| t.is("turns")) {
            i += 1;
        }
    }
    hold.push_str(&format!("/{turns}"));

    Some((hold, skip_expect_further_clearance(tokens, i)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsers::test_support::*, tokenize::tokenize};

    fn words(transcript: &str) -> Vec<Token> {
        let words: Vec<&str> = transcript.split(' ').collect();
        tokenize(&words)
    }

    fn fixes() -> BTreeMap<String, String> {
        map(&[("camrn", "CAMRN"), ("deer park", "DPK")])
    }

    #[test]
    fn test_exact_and_fuzzy_fix() {
        let found = extract_fix(&words("deer park heading 180"), &fixes()).unwrap();
        assert_eq!((found.id.as_str(), found.score, found.consumed), ("DPK", 1.0, 2));

        let found = extract_fix(&words("camron heading 180"), &fixes()).unwrap();
        assert_eq!((found.id.as_str(), found.consumed), ("CAMRN", 1));
        assert!(found.score > 0.9 && found.score < 1.0);

        assert_eq!(extract_fix(&words("camrn"), &BTreeMap::new()), None);
    }

    #[test]
    fn test_spelled_fix() {
        let found = extract_fix(&words("deer park thats delta papa kilo"), &fixes()).unwrap();
        assert_eq!((found.id.as_str(), found.score, found.consumed), ("DPK", 1.0, 6));

        let found = extract_fix(&words("blark delta papa kilo"), &fixes()).unwrap();
        assert_eq!((found.id.as_str(), found.score, found.consumed), ("DPK", 0.95, 4));

        let found = extract_fix(&words("camrn thats delta papa kilo"), &fixes()).unwrap();
        assert_eq!((found.id.as_str(), found.consumed), ("DPK", 5));

        assert_eq!(extract_spelled_fix(&words("delta"), &fixes()), None);
    }

    #[test]
    fn test_parse_fix() {
        let mut ac = aircraft(8000);
        assert_eq!(
            parse_fix(&words("camrn"), 0, &ac),
            ParseOutcome::Failed(Some(SayAgainKind::Fix))
        );
        ac.fixes = fixes();
        assert_eq!(parse_fix(&words("camrn"), 0, &ac), ParseOutcome::text("CAMRN", 1));
    }

    #[test]
    fn test_hold() {
        let mut ac = aircraft(8000);
        ac.fixes = fixes();
        let hold = |transcript: &str| parse_hold(&words(transcript), 0, &ac);

        assert_eq!(
            hold("camrn on the 090 radial 10 minute legs left turns"),
            ParseOutcome::text("HCAMRN/R90/10M/L", 10)
        );
        assert_eq!(hold("camrn 270 radial"), ParseOutcome::text("HCAMRN/R270/R", 3));
        assert_eq!(hold("camrn as published"), ParseOutcome::text("HCAMRN", 1));
        assert_eq!(
            hold("camrn 270 radial expect further clearance 1 2 3 0"),
            ParseOutcome::text("HCAMRN/R270/R", 7)
        );
        assert_eq!(hold("blark"), ParseOutcome::Failed(None));
    }
}
