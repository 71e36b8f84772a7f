//! Departure (SID) and arrival (STAR) procedure names.

use log::debug;

use super::{ParseContext, ParseOutcome, spoken_phrase};
use crate::{
    similarity::{jaro_winkler, phonetic_match},
    tokenize::Token,
};

const MAX_PHRASE_LEN: usize = 4;
const FUZZY_THRESHOLD: f64 = 0.80;

/// The aircraft's assigned SID or STAR by its telephony, or the generic
/// word ("climb via the sid", "descend via the star").
pub fn parse_procedure(tokens: &[Token], pos: usize, ctx: &ParseContext, is_star: bool) -> ParseOutcome {
    let (assigned, generic) = if is_star {
        (ctx.aircraft.star.as_str(), &["star", "stars", "start"][..])
    } else {
        (ctx.aircraft.sid.as_str(), &["sid"][..])
    };
    let rest = &tokens[pos..];

    if generic.iter().any(|word| rest[0].text.eq_ignore_ascii_case(word)) {
        return ParseOutcome::text(assigned, 1);
    }
    if assigned.is_empty() {
        return ParseOutcome::Failed(None);
    }

    let telephony = ctx.data.procedure_telephony(assigned);
    let phrases: Vec<(usize, String)> = (1..=rest.len().min(MAX_PHRASE_LEN))
        .rev()
        .map(|len| (len, spoken_phrase(rest, len)))
        .collect();

    if let Some((len, _)) = phrases
        .iter()
        .find(|(_, phrase)| phrase.eq_ignore_ascii_case(&telephony))
    {
        return ParseOutcome::text(assigned, *len);
    }
    // Best score rather than longest phrase, so "camrn for arrival" does not
    // swallow "arrival". Ties go to the shorter phrase.
    let fuzzy = phrases
        .iter()
        .map(|(len, phrase)| (*len, jaro_winkler(phrase, &telephony)))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .fold(None, |best: Option<(usize, f64)>, (len, score)| match best {
            Some((_, best_score)) if best_score > score => best,
            _ => Some((len, score)),
        });
    let found = fuzzy.map(|(len, _)| len).or_else(|| {
        phrases
            .iter()
            .find(|(_, phrase)| phonetic_match(phrase, &telephony))
            .map(|(len, _)| *len)
    });
    match found {
        Some(len) => {
            debug!("Procedure {:?} -> {assigned}", spoken_phrase(rest, len));
            ParseOutcome::text(assigned, len)
        }
        None => ParseOutcome::Failed(None),
    }
}
