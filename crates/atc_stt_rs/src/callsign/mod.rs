//! Callsign recognition.
//!
//! Every pattern proposes at most one candidate from the aircraft on
//! frequency; the candidate with the highest confidence wins, ties going to
//! the higher priority pattern, then to fewer skipped tokens, then to the
//! longer match.

use aviation_helper_rs::{AddressingForm, AircraftMap};
use log::debug;

use crate::{errors::Error, tokenize::Token, tokenize::tokens_to_string};

mod matchers;
pub mod pattern;

use matchers::{Candidate, Entry, MatchContext, collect_digits, flight_number};
pub use pattern::{CallsignPattern, CompiledPattern, Condition, Scoring, default_patterns};

/// Tokens searched for "heavy"/"super" at the start of a transmission.
const WEIGHT_CLASS_WINDOW: usize = 7;
/// Tokens after a candidate searched for a disambiguating flight number.
const FLIGHT_HINT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CallsignMatch {
    /// ICAO callsign as found in the context, possibly with `/T` baked in.
    pub callsign: String,
    /// Key of the aircraft in the context map.
    pub spoken_key: String,
    pub confidence: f64,
    /// Tokens up to and including the callsign.
    pub consumed: usize,
    pub addressing_form: AddressingForm,
}

impl CallsignMatch {
    /// Callsign for the output line, `/T` marking type-trailing-3 addressing.
    pub fn addressed_callsign(&self) -> String {
        if self.addressing_form == AddressingForm::TypeTrailing3 && !self.callsign.ends_with("/T") {
            format!("{}/T", self.callsign)
        } else {
            self.callsign.clone()
        }
    }
}

/// Compiles patterns and orders them by descending priority. Equal
/// priorities keep their registration order.
pub fn compile_patterns(patterns: Vec<CallsignPattern>) -> Result<Vec<CompiledPattern>, Error> {
    let mut compiled = patterns
        .into_iter()
        .map(CallsignPattern::compile)
        .collect::<Result<Vec<_>, _>>()?;
    compiled.sort_by_key(|pattern| std::cmp::Reverse(pattern.priority()));
    Ok(compiled)
}

fn is_weight_class(token: &Token) -> bool {
    token.is("heavy") || token.is("super")
}

/// Finds the aircraft addressed at the start of `tokens`.
pub fn match_callsign(
    tokens: &[Token],
    aircraft: &AircraftMap,
    patterns: &[CompiledPattern],
) -> Option<CallsignMatch> {
    if tokens.is_empty() || aircraft.is_empty() {
        return None;
    }
    let entries: Vec<Entry> = aircraft
        .iter()
        .map(|(key, ac)| Entry::new(key, ac))
        .collect();
    let all: Vec<&Entry> = entries.iter().collect();

    // "heavy"/"super" narrows the field to aircraft of that weight class
    if let Some(idx) = tokens
        .iter()
        .take(WEIGHT_CLASS_WINDOW)
        .position(is_weight_class)
    {
        let weight_class = tokens[idx].text.as_str();
        let filtered: Vec<&Entry> = all
            .iter()
            .copied()
            .filter(|entry| entry.key.to_lowercase().ends_with(weight_class))
            .collect();
        if !filtered.is_empty() && filtered.len() < all.len() {
            debug!(
                "{weight_class:?} in callsign region, {} of {} aircraft left",
                filtered.len(),
                all.len()
            );
            return match_with_patterns(&tokens[..=idx], &filtered, patterns).map(|m| {
                CallsignMatch {
                    consumed: idx + 1,
                    ..m
                }
            });
        }
    }

    match_with_patterns(tokens, &all, patterns)
}

struct PatternMatch {
    result: CallsignMatch,
    priority: i32,
    skip: usize,
}

impl PatternMatch {
    fn beats(&self, other: &PatternMatch) -> bool {
        if self.result.confidence != other.result.confidence {
            return self.result.confidence > other.result.confidence;
        }
        if self.priority != other.priority {
            return self.priority > other.priority;
        }
        if self.skip != other.skip {
            return self.skip < other.skip;
        }
        self.result.consumed > other.result.consumed
    }
}

fn match_with_patterns(
    tokens: &[Token],
    entries: &[&Entry],
    patterns: &[CompiledPattern],
) -> Option<CallsignMatch> {
    let mut best: Option<PatternMatch> = None;

    for pattern in patterns {
        let definition = &pattern.definition;
        let admitted: Vec<&Entry> = entries
            .iter()
            .copied()
            .filter(|entry| definition.condition.admits(entry.aircraft))
            .collect();
        if admitted.is_empty() {
            continue;
        }

        let candidates = run_pattern(pattern, tokens, &admitted);
        if candidates.is_empty() {
            continue;
        }
        let Some(mut selected) = select_candidate(candidates, definition.require_unique, tokens)
        else {
            continue;
        };

        let Some(scored) = definition.scoring.score(&mut selected.score) else {
            debug!("{}: scoring rejected {:?}", pattern.name(), selected.entry.key);
            continue;
        };
        if let Some(min_score) = definition.min_score {
            if selected.score.total() < min_score {
                debug!(
                    "{}: {:?} below minimum score ({:.2} < {min_score:.2})",
                    pattern.name(),
                    selected.entry.key,
                    selected.score.total()
                );
                continue;
            }
        }

        let mut confidence = definition.fixed_confidence.unwrap_or(scored);
        if selected.skip > 0 {
            confidence *= 1.0 - 0.1 * selected.skip as f64;
        }
        let mut consumed = selected.consumed;
        if tokens.get(consumed).is_some_and(is_weight_class) {
            consumed += 1;
        }

        let found = PatternMatch {
            result: CallsignMatch {
                callsign: selected.entry.aircraft.callsign.clone(),
                spoken_key: selected.entry.key.to_string(),
                confidence,
                consumed,
                addressing_form: selected.entry.aircraft.addressing_form,
            },
            priority: pattern.priority(),
            skip: selected.skip,
        };
        debug!(
            "{}: {:?} -> {} (confidence {:.2}, consumed {})",
            pattern.name(),
            found.result.spoken_key,
            found.result.callsign,
            confidence,
            consumed
        );
        if best.as_ref().is_none_or(|b| found.beats(b)) {
            best = Some(found);
        }
    }

    best.map(|b| b.result)
}

/// Candidates from the first number of skipped tokens that yields any.
fn run_pattern<'a>(
    pattern: &CompiledPattern,
    tokens: &[Token],
    entries: &[&'a Entry<'a>],
) -> Vec<Candidate<'a>> {
    for skip in 0..=pattern.max_skip.min(tokens.len().saturating_sub(1)) {
        let ctx = MatchContext {
            tokens,
            entries,
            skip,
        };
        let mut candidates = Vec::new();
        for placeholder in &pattern.placeholders {
            candidates = ctx.run(*placeholder, candidates);
            if candidates.is_empty() {
                break;
            }
        }
        if !candidates.is_empty() {
            return candidates;
        }
    }
    Vec::new()
}

fn select_candidate<'a>(
    mut candidates: Vec<Candidate<'a>>,
    require_unique: bool,
    tokens: &[Token],
) -> Option<Candidate<'a>> {
    if require_unique && candidates.len() > 1 {
        return exact_key_match(&candidates, tokens).cloned();
    }
    if candidates.len() == 1 {
        return candidates.pop();
    }
    exact_key_match(&candidates, tokens)
        .or_else(|| flight_hint_match(&candidates, tokens))
        .or_else(|| best_by_score(&candidates))
        .cloned()
}

/// The only candidate whose spoken form the matched tokens spell out exactly.
fn exact_key_match<'c, 'a>(candidates: &'c [Candidate<'a>], tokens: &[Token]) -> Option<&'c Candidate<'a>> {
    let mut exact = candidates.iter().filter(|c| {
        tokens
            .get(c.skip..c.consumed)
            .is_some_and(|spoken| tokens_to_string(spoken).eq_ignore_ascii_case(&c.entry.phrase))
    });
    let first = exact.next()?;
    exact.next().is_none().then_some(first)
}

/// A number right after the candidates that names one of their flights.
fn flight_hint_match<'c, 'a>(
    candidates: &'c [Candidate<'a>],
    tokens: &[Token],
) -> Option<&'c Candidate<'a>> {
    let start = candidates.iter().map(|c| c.consumed).max()?;
    let window = tokens.get(start..)?;
    let window = &window[..window.len().min(FLIGHT_HINT_WINDOW)];
    let first_number = window.iter().position(|t| t.raw_number().is_some())?;
    let (hint, _) = collect_digits(&window[first_number..]);

    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates {
        let flight = flight_number(candidate.entry.aircraft.base_callsign());
        if flight.is_empty() {
            continue;
        }
        let score = if flight == hint {
            1.0
        } else if flight.ends_with(&hint) {
            0.9
        } else if hint.contains(flight) {
            0.85
        } else {
            continue;
        };
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Highest airline + flight score; ties go to full addressing, then to the
/// alphabetically first callsign.
fn best_by_score<'c, 'a>(candidates: &'c [Candidate<'a>]) -> Option<&'c Candidate<'a>> {
    let mut iter = candidates.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        let (score, best_score) = (candidate.score.total(), best.score.total());
        let better = if score != best_score {
            score > best_score
        } else {
            let full = candidate.entry.aircraft.addressing_form == AddressingForm::Full;
            let best_full = best.entry.aircraft.addressing_form == AddressingForm::Full;
            if full != best_full {
                full
            } else {
                candidate.entry.aircraft.callsign < best.entry.aircraft.callsign
            }
        };
        if better {
            best = candidate;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use aviation_helper_rs::SttAircraft;

    use super::*;
    use crate::parsers::test_support::tokens;

    static PATTERNS: LazyLock<Vec<CompiledPattern>> =
        LazyLock::new(|| compile_patterns(default_patterns()).unwrap());

    fn aircraft(entries: &[(&str, &str)]) -> AircraftMap {
        entries
            .iter()
            .map(|(key, callsign)| {
                let ac = SttAircraft {
                    callsign: callsign.to_string(),
                    ..Default::default()
                };
                (key.to_string(), ac)
            })
            .collect()
    }

    fn matched(transcript: &str, aircraft: &AircraftMap) -> CallsignMatch {
        match match_callsign(&tokens(transcript), aircraft, &PATTERNS) {
            Some(m) => m,
            None => panic!("Expected a callsign in {transcript:?}"),
        }
    }

    #[test]
    fn test_patterns_sorted() {
        let priorities: Vec<i32> = PATTERNS.iter().map(CompiledPattern::priority).collect();
        assert_eq!(priorities, vec![100, 95, 80, 60, 55, 50]);
    }

    #[test]
    fn test_exact_phrase() {
        let map = aircraft(&[("American 5936", "AAL5936"), ("Delta 456", "DAL456")]);
        let m = matched("american 5936 descend and maintain 8000", &map);
        assert_eq!(m.callsign, "AAL5936");
        assert_eq!(m.spoken_key, "American 5936");
        assert_eq!(m.consumed, 2);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_skipped_garbage_lowers_confidence() {
        let map = aircraft(&[("American 5936", "AAL5936")]);
        let m = matched("uh american 5936 descend", &map);
        assert_eq!(m.callsign, "AAL5936");
        assert_eq!(m.consumed, 3);
        assert!((m.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_garbled_airline_resolved_by_flight_number() {
        let map = aircraft(&[("Delta 2991", "DAL2991"), ("Endeavor 5778", "EDV5778")]);
        let m = matched("detva 5778 turn 10 degrees left", &map);
        assert_eq!(m.callsign, "EDV5778");
        assert_eq!(m.consumed, 2);
    }

    #[test]
    fn test_weight_class_filter() {
        let map = aircraft(&[("American 12 heavy", "AAL12"), ("American 21", "AAL21")]);
        let m = matched("american heavy descend and maintain 5000", &map);
        assert_eq!(m.callsign, "AAL12");
        assert_eq!(m.consumed, 2);
        assert!((m.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_type_trailing_addressing() {
        let mut map = aircraft(&[
            ("november 1 2 3 alpha bravo", "N123AB"),
            ("skyhawk 3 alpha bravo", "N123AB/T"),
        ]);
        if let Some(ac) = map.get_mut("skyhawk 3 alpha bravo") {
            ac.addressing_form = AddressingForm::TypeTrailing3;
        }

        let m = matched("skyhawk 3 alpha bravo turn left heading 270", &map);
        assert_eq!(m.addressed_callsign(), "N123AB/T");
        assert_eq!(m.consumed, 4);

        let m = matched("3 alpha bravo turn left heading 270", &map);
        assert_eq!(m.addressed_callsign(), "N123AB");
        assert_eq!(m.confidence, 0.95);
        assert_eq!(m.consumed, 3);
    }

    #[test]
    fn test_ga_november() {
        let map = aircraft(&[("november 9 9 1 0 zulu", "N9910Z")]);
        let m = matched("november 1 0 0 descend", &map);
        assert_eq!(m.callsign, "N9910Z");
        assert_eq!(m.consumed, 2);
        assert_eq!(m.confidence, 0.75);
    }

    #[test]
    fn test_no_match() {
        let map = aircraft(&[("American 5936", "AAL5936")]);
        assert_eq!(match_callsign(&tokens(""), &map, &PATTERNS), None);
        assert_eq!(
            match_callsign(&tokens("american 5936"), &AircraftMap::new(), &PATTERNS),
            None
        );
        assert_eq!(match_callsign(&tokens("american 5936"), &map, &[]), None);
    }
}
