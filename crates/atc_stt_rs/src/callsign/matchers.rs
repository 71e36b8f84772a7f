//! The placeholder matchers a callsign pattern is built from.
//!
//! Generators (`airline`, `exact_phrase`, `suffix_phrase`, `ga_november`,
//! `flight_only`) propose candidates from the aircraft on frequency;
//! `flight` narrows the candidates of a preceding generator.

use aviation_helper_rs::SttAircraft;

use crate::{
    normalize::{is_digit, normalize},
    similarity::{jaro_winkler, phonetic_match},
    tokenize::{Token, TokenKind, tokenize, tokens_to_string},
    vocabulary::vocabulary,
};

use super::pattern::Placeholder;

/// Longest phrase compared against a spoken callsign.
const MAX_PHRASE_TOKENS: usize = 8;
/// The flight-number-only fallback only looks at the start of a transmission.
const FLIGHT_ONLY_SCAN: usize = 3;

/// One spoken variant of an aircraft on frequency.
#[derive(Debug)]
pub(crate) struct Entry<'a> {
    pub key: &'a str,
    pub aircraft: &'a SttAircraft,
    /// The key run through the normalizer and tokenizer, so it compares
    /// equal to transcript tokens ("American 5936" → "american 5936").
    pub phrase: String,
}

impl<'a> Entry<'a> {
    pub fn new(key: &'a str, aircraft: &'a SttAircraft) -> Self {
        Self {
            key,
            aircraft,
            phrase: tokens_to_string(&tokenize(&normalize(key))),
        }
    }

    fn flight_number(&self) -> &'a str {
        flight_number(self.aircraft.base_callsign())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CandidateScore {
    pub airline: f64,
    pub flight: f64,
}

impl CandidateScore {
    pub fn total(&self) -> f64 {
        self.airline + self.flight
    }

    pub fn default_confidence(&self) -> f64 {
        0.6 + 0.4 * self.total() / 2.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub entry: &'a Entry<'a>,
    /// Tokens consumed from the start of the transmission, skipped ones included.
    pub consumed: usize,
    pub skip: usize,
    pub score: CandidateScore,
}

pub(crate) struct MatchContext<'t, 'a> {
    pub tokens: &'t [Token],
    pub entries: &'t [&'a Entry<'a>],
    pub skip: usize,
}

impl<'a> MatchContext<'_, 'a> {
    fn candidate(&self, entry: &'a Entry<'a>, consumed: usize, airline: f64, flight: f64) -> Candidate<'a> {
        Candidate {
            entry,
            consumed,
            skip: self.skip,
            score: CandidateScore { airline, flight },
        }
    }

    /// Runs one placeholder. An empty result fails the whole pattern.
    pub fn run(&self, placeholder: Placeholder, candidates: Vec<Candidate<'a>>) -> Vec<Candidate<'a>> {
        match placeholder {
            Placeholder::Airline => self.airline(),
            Placeholder::Flight => self.flight(candidates),
            Placeholder::FlightOnly => self.flight_only(),
            Placeholder::ExactPhrase => self.exact_phrase(),
            Placeholder::SuffixPhrase => self.suffix_phrase(),
            Placeholder::GaNovember => self.ga_november(),
        }
    }

    fn rest(&self) -> &[Token] {
        self.tokens.get(self.skip..).unwrap_or_default()
    }

    fn airline(&self) -> Vec<Candidate<'a>> {
        let rest = self.rest();
        self.entries
            .iter()
            .filter_map(|entry| {
                let (used, score) = match_airline(rest, entry.key)?;
                Some(self.candidate(*entry, self.skip + used, score, 0.0))
            })
            .collect()
    }

    fn flight(&self, candidates: Vec<Candidate<'a>>) -> Vec<Candidate<'a>> {
        candidates
            .into_iter()
            .filter_map(|mut candidate| {
                let expected = candidate.entry.flight_number();
                if expected.is_empty() {
                    return None;
                }
                let remaining = self.tokens.get(candidate.consumed..)?;
                let (used, score) = match_flight_number(remaining, expected)?;
                candidate.consumed += used;
                candidate.score.flight = score;
                Some(candidate)
            })
            .collect()
    }

    /// Longest run of tokens spelling out a spoken callsign.
    fn exact_phrase(&self) -> Vec<Candidate<'a>> {
        self.longest_phrase(1, |entry, phrase| entry.phrase.eq_ignore_ascii_case(phrase), 1.0)
    }

    /// Trailing part of a GA callsign ("3 alpha bravo" for "november 1 2 3 alpha bravo").
    fn suffix_phrase(&self) -> Vec<Candidate<'a>> {
        self.longest_phrase(
            3,
            |entry, phrase| {
                entry.aircraft.is_ga()
                    && entry
                        .phrase
                        .to_lowercase()
                        .ends_with(&phrase.to_lowercase())
            },
            0.95,
        )
    }

    fn longest_phrase<F>(&self, min_len: usize, accept: F, score: f64) -> Vec<Candidate<'a>>
    where
        F: Fn(&Entry, &str) -> bool,
    {
        let rest = self.rest();
        for len in (min_len..=rest.len().min(MAX_PHRASE_TOKENS)).rev() {
            let phrase = tokens_to_string(&rest[..len]);
            let found: Vec<_> = self
                .entries
                .iter()
                .filter(|entry| accept(entry, &phrase))
                .map(|entry| self.candidate(*entry, self.skip + len, score, score))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// "november" plus a number, for abbreviated N-numbers
    /// ("november one zero zero" for N9910Z).
    fn ga_november(&self) -> Vec<Candidate<'a>> {
        let rest = self.rest();
        let (Some(first), Some(second)) = (rest.first(), rest.get(1)) else {
            return Vec::new();
        };
        if !first.is("november") || !(second.kind == TokenKind::Number || is_digit(&second.text)) {
            return Vec::new();
        }
        let spoken = second.text.as_str();

        self.entries
            .iter()
            .filter(|entry| entry.aircraft.is_ga() && entry.key.to_lowercase().starts_with("november"))
            .filter_map(|entry| {
                let digits = entry.flight_number();
                if digits.is_empty() {
                    return None;
                }
                let score = ga_digits_score(spoken, digits)?;
                Some(self.candidate(*entry, self.skip + 2, 0.8, score))
            })
            .collect()
    }

    /// Flight number alone, matched against every aircraft, for airline
    /// names the recognizer garbled.
    fn flight_only(&self) -> Vec<Candidate<'a>> {
        let rest = self.rest();
        let scan = rest.len().min(FLIGHT_ONLY_SCAN);
        for start in 0..scan {
            let (built, used) = collect_digits(&rest[start..scan]);
            if built.is_empty() {
                continue;
            }
            let found: Vec<_> = self
                .entries
                .iter()
                .filter_map(|entry| {
                    let score = flight_only_score(&built, entry.flight_number())?;
                    Some(self.candidate(*entry, self.skip + start + used, 0.5, score))
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

/// Everything from the first digit on: "AAL5936" → "5936", "N123AB" → "123AB".
pub(crate) fn flight_number(callsign: &str) -> &str {
    callsign
        .find(|c: char| c.is_ascii_digit())
        .map_or("", |i| &callsign[i..])
}

/// 1.0 for equal words, Jaro-Winkler otherwise, at least 0.85 when the
/// words sound alike.
pub(crate) fn match_word(word: &str, target: &str) -> f64 {
    if word.eq_ignore_ascii_case(target) {
        return 1.0;
    }
    let score = jaro_winkler(word, target);
    if score < 0.85 && phonetic_match(word, target) {
        0.85
    } else {
        score
    }
}

/// Airline words of a spoken callsign: "china southern 940" → ["china", "southern"].
pub(crate) fn airline_parts(key: &str) -> Vec<String> {
    key.to_lowercase()
        .split_whitespace()
        .take_while(|part| {
            !part.starts_with(|c: char| c.is_ascii_digit()) && *part != "heavy" && *part != "super"
        })
        .map(str::to_string)
        .collect()
}

/// Tokens used and score of the airline telephony of `key` at the start of `tokens`.
pub(crate) fn match_airline(tokens: &[Token], key: &str) -> Option<(usize, f64)> {
    let parts = airline_parts(key);
    let first = tokens.first()?.text.to_lowercase();

    if let [part] = parts.as_slice() {
        let score = match_word(&first, part);
        // "jet blue" for "jetblue", but not "uh american" for "american"
        if let Some(second) = tokens.get(1) {
            let second = second.text.to_lowercase();
            let joined = match_word(&format!("{first}{second}"), part);
            if joined >= 0.85 && joined > score && joined > match_word(&second, part) {
                return Some((2, joined));
            }
        }
        return (score >= 0.35).then_some((1, score));
    }
    if parts.is_empty() {
        return None;
    }

    if tokens.len() >= parts.len() {
        let scores: Vec<f64> = parts
            .iter()
            .zip(tokens)
            .map(|(part, token)| match_word(&token.text.to_lowercase(), part))
            .collect();
        if scores.iter().all(|s| *s >= 0.85) {
            return Some((parts.len(), scores.iter().sum::<f64>() / parts.len() as f64));
        }
    }

    // "southwest seven 95": first word alone
    let score = match_word(&first, &parts[0]);
    if score >= 0.4 {
        return Some((1, score));
    }

    // "airfrance" for "air france"
    let score = match_word(&first, &parts.concat());
    (score >= 0.85).then_some((1, score))
}

/// Characters a token contributes to a flight number, if any.
fn flight_chars(token: &Token) -> Option<String> {
    if is_digit(&token.text) {
        return Some(token.text.clone());
    }
    if let Some(n) = token.raw_number().filter(|n| *n >= 0) {
        return Some(n.to_string());
    }
    if token.kind != TokenKind::Word {
        return None;
    }
    let text = &token.text;
    if text.len() == 1 && text.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(text.to_uppercase());
    }
    if let Some(letter) = vocabulary().nato_letter(text) {
        return Some(letter.to_ascii_uppercase().to_string());
    }
    // "4wj"
    let alphanumeric = text.len() >= 2
        && text.chars().all(|c| c.is_ascii_alphanumeric())
        && text.chars().any(|c| c.is_ascii_alphabetic())
        && text.chars().any(|c| c.is_ascii_digit());
    alphanumeric.then(|| text.to_uppercase())
}

/// Tokens used and score of a flight number at the start of `tokens`.
pub(crate) fn match_flight_number(tokens: &[Token], expected: &str) -> Option<(usize, f64)> {
    let mut built = String::new();
    let mut used = 0;
    for chars in tokens.iter().map_while(flight_chars) {
        built.push_str(&chars);
        used += 1;
    }
    if used == 0 || expected.is_empty() {
        return None;
    }

    let score = if built == expected {
        1.0
    } else if expected.ends_with(&built) {
        0.85
    } else if built.ends_with(expected) {
        0.8
    } else {
        let jw = jaro_winkler(&built, expected);
        if jw >= 0.7 {
            jw
        } else if built.len() == 2 && expected.len() == 2 && built.as_bytes()[1] == expected.as_bytes()[1] {
            // controllers often disambiguate by the trailing digit
            0.7
        } else {
            return None;
        }
    };
    Some((used, score))
}

/// Digits of the leading numeric tokens.
pub(crate) fn collect_digits(tokens: &[Token]) -> (String, usize) {
    let mut built = String::new();
    let mut used = 0;
    for n in tokens.iter().map_while(Token::raw_number) {
        built.push_str(&n.to_string());
        used += 1;
    }
    (built, used)
}

fn ga_digits_score(spoken: &str, digits: &str) -> Option<f64> {
    let score = if digits == spoken {
        1.0
    } else if digits.ends_with(spoken) {
        0.85
    } else if digits.contains(spoken) {
        0.75
    } else if spoken.len() >= 2 && digits.len() >= 2 {
        if digits.contains(&spoken[..spoken.len() - 1]) {
            0.7
        } else {
            let jw = jaro_winkler(spoken, digits);
            if jw < 0.65 {
                return None;
            }
            jw * 0.9
        }
    } else {
        return None;
    };
    Some(score)
}

fn flight_only_score(built: &str, flight: &str) -> Option<f64> {
    if flight.is_empty() {
        return None;
    }
    if flight == built {
        Some(1.0)
    } else if flight.len() >= 2 && built.ends_with(flight) {
        // garbled leading digit: "922" for "22"
        Some(0.75)
    } else if flight.len() >= 2 && built.contains(flight) {
        Some(0.65)
    } else if built.len() >= 3 && flight.len() >= 3 {
        let jw = jaro_winkler(built, flight);
        (jw >= 0.8).then_some(jw)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::tokens;

    #[test]
    fn test_flight_number() {
        assert_eq!(flight_number("AAL5936"), "5936");
        assert_eq!(flight_number("N123AB"), "123AB");
        assert_eq!(flight_number("EGF"), "");
    }

    #[test]
    fn test_airline_parts() {
        assert_eq!(airline_parts("American 5936"), vec!["american"]);
        assert_eq!(airline_parts("China Southern 940 heavy"), vec!["china", "southern"]);
        assert_eq!(airline_parts("speedbird 12 heavy"), vec!["speedbird"]);
        assert!(airline_parts("123").is_empty());
    }

    #[test]
    fn test_match_airline() {
        assert_eq!(match_airline(&tokens("american 5936"), "American 5936"), Some((1, 1.0)));
        assert_eq!(match_airline(&tokens("jet blue 789"), "JetBlue 789"), Some((2, 1.0)));
        assert_eq!(
            match_airline(&tokens("china southern 940"), "China Southern 940"),
            Some((2, 1.0))
        );
        let (used, score) = match_airline(&tokens("detva 5778"), "Delta 2991").unwrap();
        assert_eq!(used, 1);
        assert!(score > 0.85);
        assert_eq!(match_airline(&tokens("xyz 123"), "American 5936"), None);
        // a word in front of the airline is not part of it
        assert_eq!(match_airline(&tokens("uh american 5936"), "American 5936"), None);
        assert_eq!(match_airline(&tokens("american 5936"), "American 5936"), Some((1, 1.0)));
    }

    #[test]
    fn test_match_flight_number() {
        assert_eq!(match_flight_number(&tokens("5936 descend"), "5936"), Some((1, 1.0)));
        assert_eq!(match_flight_number(&tokens("1 2 3 alpha bravo"), "123AB"), Some((3, 1.0)));
        assert_eq!(match_flight_number(&tokens("36 turn"), "5936"), Some((1, 0.85)));
        assert_eq!(match_flight_number(&tokens("5778"), "2991"), None);
        assert_eq!(match_flight_number(&tokens("descend"), "5936"), None);
    }

    #[test]
    fn test_collect_digits() {
        assert_eq!(collect_digits(&tokens("5778 turn")), ("5778".to_string(), 1));
        assert_eq!(collect_digits(&tokens("turn 5778")), (String::new(), 0));
    }

    #[test]
    fn test_scores() {
        assert_eq!(ga_digits_score("9910", "9910"), Some(1.0));
        assert_eq!(ga_digits_score("10", "9910"), Some(0.85));
        assert_eq!(ga_digits_score("99", "9910"), Some(0.75));
        assert_eq!(ga_digits_score("100", "9910"), Some(0.7));
        assert_eq!(flight_only_score("5778", "5778"), Some(1.0));
        assert_eq!(flight_only_score("922", "22"), Some(0.75));
        assert_eq!(flight_only_score("5778", "2991"), None);
    }
}
