//! Approach names and land-and-hold-short clauses.
//!
//! Approaches are matched against the aircraft's candidate table (spoken
//! telephony → code). The approach type and runway are looked for first,
//! tolerating garbage between them ("ils front of a niner"); a phrase-level
//! Jaro-Winkler comparison is the fallback.

use std::collections::BTreeMap;

use aviation_helper_rs::{
    SttAircraft,
    clearance::aviation_command::SayAgainKind,
    conversions::{spoken_digits, spoken_runway},
};
use log::debug;

use super::{ParseOutcome, runway_side, spoken_phrase};
use crate::{
    similarity::{fuzzy_match, jaro_winkler, phonetic_match},
    tokenize::{Token, TokenKind},
    vocabulary::vocabulary,
};

const MAX_PHRASE_LEN: usize = 7;
const FUZZY_THRESHOLD: f64 = 0.80;
const TYPE_AND_RUNWAY_SCORE: f64 = 0.95;
/// "land and hold short" has to open the clause.
const LAHSO_MAX_START: usize = 3;

const TYPE_PREFIXES: [&str; 9] = [
    "i l s ",
    "ils ",
    "visual ",
    "rnav ",
    "r-nav ",
    "v o r ",
    "vor ",
    "localizer ",
    "loc ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApproachType {
    Ils,
    Rnav,
    Visual,
    Vor,
    Localizer,
}

impl ApproachType {
    /// Type named at the start of the tokens, with the tokens it took.
    fn extract(tokens: &[Token]) -> Option<(Self, usize)> {
        let text = |i: usize| tokens.get(i).map(|t| t.text.as_str());
        let kind = match text(0)? {
            "ils" | "alice" | "dallas" | "als" | "atlas" | "dialogues" | "dial" => ApproachType::Ils,
            "rnav" => ApproachType::Rnav,
            "visual" => ApproachType::Visual,
            "vor" => ApproachType::Vor,
            "localizer" | "loc" => ApproachType::Localizer,
            "i" if text(1) == Some("l") && text(2) == Some("s") => return Some((ApproachType::Ils, 3)),
            "r" if text(1) == Some("nav") => return Some((ApproachType::Rnav, 2)),
            _ => return None,
        };
        Some((kind, 1))
    }

    fn named_in(self, telephony: &str) -> bool {
        let forms: &[&str] = match self {
            ApproachType::Ils => &["i l s", "ils"],
            ApproachType::Rnav => &["r-nav", "rnav", "r nav"],
            ApproachType::Visual => &["visual"],
            ApproachType::Vor => &["v o r", "vor"],
            ApproachType::Localizer => &["localizer", "loc"],
        };
        forms.iter().any(|form| telephony.contains(form))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApproachMatch {
    pub id: String,
    pub score: f64,
    pub consumed: usize,
}

/// Best approach for the tokens. `assigned` breaks ties between equally
/// good type-and-runway matches.
pub fn extract_approach(
    tokens: &[Token],
    approaches: &BTreeMap<String, String>,
    assigned: &str,
) -> Option<ApproachMatch> {
    if tokens.is_empty() || approaches.is_empty() {
        return None;
    }
    match_by_type_and_runway(tokens, approaches, assigned).or_else(|| fuzzy_approach(tokens, approaches))
}

/// Runway number with an optional side, as spoken in telephony
/// ("two two left"), and its token index.
fn extract_runway(tokens: &[Token]) -> Option<(String, Option<&'static str>, usize)> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let number = match token.kind {
            TokenKind::Number => token.value,
            // "t7" for a garbled "twenty seven"
            TokenKind::Word => match token.text.as_bytes() {
                [b't', digit @ b'0'..=b'9'] => Some(20 + i32::from(digit - b'0')),
                _ => None,
            },
            _ => None,
        }
        .filter(|n| (1..=36).contains(n))?;

        // a side before the number wins: "ils right runway 30"
        let side = i
            .checked_sub(1)
            .and_then(|prev| runway_side(&tokens[prev].text))
            .or_else(|| tokens.get(i + 1).and_then(|next| runway_side(&next.text)));
        Some((spoken_digits(number as u32), side, i))
    })
}

/// The runway in the telephony, after "runway ", starts with `runway` and
/// is followed by nothing or a side.
fn runway_matches(telephony: &str, runway: &str) -> bool {
    let Some((_, after)) = telephony.split_once("runway ") else {
        return false;
    };
    let Some(rest) = after.strip_prefix(runway) else {
        return false;
    };
    match rest.strip_prefix(' ') {
        None => rest.is_empty(),
        Some(side) => {
            side.is_empty()
                || side.starts_with("left")
                || side.starts_with("right")
                || side.starts_with("center")
        }
    }
}

fn match_by_type_and_runway(
    tokens: &[Token],
    approaches: &BTreeMap<String, String>,
    assigned: &str,
) -> Option<ApproachMatch> {
    let (kind, type_consumed) = ApproachType::extract(tokens)?;
    let rest = &tokens[type_consumed..];
    let (number, side, at) = extract_runway(rest)?;

    let after = at + 1 + usize::from(side.is_some());
    if let Some(word) = rest.get(after).map(|t| t.text.as_str()) {
        let allowed = matches!(
            word,
            "approach" | "for" | "and" | "the" | "a" | "maintain" | "speed" | "until" | "cleared" | "our"
        );
        if !allowed && !vocabulary().is_filler(word) {
            debug!("Approach runway followed by {word:?}, not a type-and-runway match");
            return None;
        }
    }

    let runway = match side {
        Some(side) => format!("{number} {side}"),
        None => number,
    };
    let mut found: Vec<&String> = approaches
        .iter()
        .filter(|(telephony, _)| {
            let telephony = telephony.to_lowercase();
            kind.named_in(&telephony) && runway_matches(&telephony, &runway)
        })
        .map(|(_, id)| id)
        .collect();
    found.sort();
    let id = found
        .iter()
        .find(|id| id.as_str() == assigned)
        .or(found.first())?;

    let consumed = type_consumed + after;
    debug!("Approach {kind:?} runway {runway:?} -> {id} (consumed {consumed})");
    Some(ApproachMatch {
        id: id.to_string(),
        score: TYPE_AND_RUNWAY_SCORE,
        consumed,
    })
}

/// Spellings of an approach phrase as recognizers tend to mangle them
/// ("l s" for "i l s", "runway" left out).
fn phrase_variants(phrase: &str) -> Vec<String> {
    let mut variants = vec![phrase.to_string()];
    if phrase.contains("l s ") {
        variants.push(phrase.replacen("l s ", "i l s ", 1));
    }
    if let Some(rest) = phrase.strip_prefix("ls ") {
        variants.push(format!("ils {rest}"));
    }
    if let Some(rest) = phrase.strip_prefix("ils ") {
        variants.push(format!("i l s {rest}"));
    }
    if let Some(rest) = phrase.strip_prefix("rnav ") {
        variants.push(format!("r-nav {rest}"));
    }

    let with_runway: Vec<String> = variants
        .iter()
        .filter(|variant| !variant.contains("runway"))
        .filter_map(|variant| {
            TYPE_PREFIXES.iter().find_map(|prefix| {
                variant
                    .strip_prefix(prefix)
                    .map(|rest| format!("{prefix}runway {rest}"))
            })
        })
        .collect();
    variants.extend(with_runway);
    variants
}

fn fuzzy_approach(tokens: &[Token], approaches: &BTreeMap<String, String>) -> Option<ApproachMatch> {
    let mut best: Option<ApproachMatch> = None;
    for len in (1..=tokens.len().min(MAX_PHRASE_LEN)).rev() {
        for variant in phrase_variants(&spoken_phrase(tokens, len)) {
            if let Some(id) = approaches
                .iter()
                .find_map(|(telephony, id)| variant.eq_ignore_ascii_case(telephony).then_some(id))
            {
                return Some(ApproachMatch {
                    id: id.clone(),
                    score: 1.0,
                    consumed: len,
                });
            }
            for (telephony, id) in approaches {
                let score = jaro_winkler(&variant, telephony);
                let wins = score >= FUZZY_THRESHOLD
                    && best
                        .as_ref()
                        .is_none_or(|b| score > b.score || (score == b.score && *id < b.id));
                if wins {
                    best = Some(ApproachMatch {
                        id: id.clone(),
                        score,
                        consumed: len,
                    });
                }
            }
        }
    }
    if let Some(found) = &best {
        debug!("Approach fuzzy -> {} ({:.2})", found.id, found.score);
    }
    best
}

/// "[land and] hold short [of runway] 4": the runway and the tokens used,
/// counted from the start of `tokens`.
pub fn extract_lahso(tokens: &[Token], runways: &[String]) -> Option<(String, usize)> {
    if tokens.is_empty() || runways.is_empty() {
        return None;
    }
    let find = |word: &str| {
        tokens
            .iter()
            .position(|t| t.text == word || fuzzy_match(&t.text, word, 0.8))
    };
    let hold = find("hold")?;
    let short = find("short").filter(|&short| short > hold)?;
    // "and" is too close to "land" for the fuzzy comparison
    let land = tokens
        .iter()
        .position(|t| t.text == "land" || (t.text != "and" && fuzzy_match(&t.text, "land", 0.8)));
    let start = land.filter(|&land| land < hold).unwrap_or(hold);
    if start >= LAHSO_MAX_START {
        return None;
    }

    let mut i = short + 1;
    while tokens
        .get(i)
        .is_some_and(|t| matches!(t.text.as_str(), "of" | "runway" | "the" | "and"))
    {
        i += 1;
    }
    let (runway, consumed) = lahso_runway(tokens.get(i..)?, runways)?;
    Some((runway, i + consumed))
}

fn side_suffix(word: &str) -> Option<char> {
    runway_side(word).and_then(|side| side.chars().next()).map(|c| c.to_ascii_uppercase())
}

fn lahso_runway(tokens: &[Token], runways: &[String]) -> Option<(String, usize)> {
    let first = tokens.first()?;

    if let (TokenKind::Number, Some(n)) = (first.kind, first.value) {
        if (1..=36).contains(&n) {
            let mut consumed = 1;
            let mut suffix = None;
            while consumed < tokens.len().min(3) {
                if tokens[consumed].is("and") {
                    consumed += 1;
                    continue;
                }
                suffix = side_suffix(&tokens[consumed].text);
                if suffix.is_some() {
                    consumed += 1;
                }
                break;
            }
            let exact = match suffix {
                Some(side) => format!("{n}{side}"),
                None => n.to_string(),
            };
            let number = n.to_string();
            let found = runways
                .iter()
                .find(|rwy| **rwy == exact)
                .or_else(|| {
                    runways
                        .iter()
                        .find(|rwy| rwy.trim_end_matches(['L', 'R', 'C']) == number)
                });
            if let Some(rwy) = found {
                debug!("Hold short runway {exact} -> {rwy}");
                return Some((rwy.clone(), consumed));
            }
        }
    }

    // Garbled runway: narrow by a side word, then compare spoken forms.
    let consumed = tokens.len().min(4);
    let suffix = tokens[..consumed]
        .iter()
        .filter_map(|t| side_suffix(&t.text))
        .last();
    let candidates: Vec<&String> = runways
        .iter()
        .filter(|rwy| suffix.is_none_or(|side| rwy.ends_with(side)))
        .collect();
    if let [only] = candidates.as_slice() {
        return Some(((*only).clone(), consumed));
    }
    let heard = first.text.to_lowercase();
    candidates
        .iter()
        .find(|rwy| {
            spoken_runway(rwy).contains(&heard)
                || phonetic_match(&heard, rwy.trim_end_matches(['L', 'R', 'C']))
        })
        .or_else(|| suffix.and(candidates.first()))
        .map(|rwy| ((*rwy).clone(), consumed))
}

pub fn parse_approach(
    tokens: &[Token],
    pos: usize,
    aircraft: &SttAircraft,
    allow_lahso: bool,
) -> ParseOutcome {
    if aircraft.candidate_approaches.is_empty() {
        return ParseOutcome::Failed(Some(SayAgainKind::Approach));
    }
    let rest = &tokens[pos..];
    let Some(found) = extract_approach(rest, &aircraft.candidate_approaches, &aircraft.assigned_approach)
    else {
        return ParseOutcome::Failed(Some(SayAgainKind::Approach));
    };

    if allow_lahso {
        if let Some((runway, consumed)) = extract_lahso(&rest[found.consumed..], &aircraft.lahso_runways) {
            return ParseOutcome::text(format!("{}/LAHSO{runway}", found.id), found.consumed + consumed);
        }
    }
    ParseOutcome::text(found.id, found.consumed)
}

/// An approach named without a clearance verb ("ils runway two two left").
/// `C<APPR>` when it is the assigned approach, `E<APPR>` otherwise.
pub fn implicit_approach(tokens: &[Token], aircraft: &SttAircraft) -> Option<(String, usize)> {
    if aircraft.candidate_approaches.is_empty() {
        return None;
    }
    let found = match_by_type_and_runway(
        tokens,
        &aircraft.candidate_approaches,
        &aircraft.assigned_approach,
    )?;
    let mut consumed = found.consumed;
    if tokens.get(consumed).is_some_and(|t| t.is("approach")) {
        consumed += 1;
    }
    let prefix = if found.id == aircraft.assigned_approach {
        'C'
    } else {
        'E'
    };
    Some((format!("{prefix}{}", found.id), consumed))
}
