//! Transcript normalization.
//!
//! Turns the raw STT text into a lowercase word list where spoken digits are
//! digits, command keywords are canonical, and the usual STT garbling (merged
//! words, doubled digits, "niner" fragments) is repaired. NATO words are left
//! as words: "delta" may be an airline.

use std::sync::LazyLock;

use aviation_helper_rs::conversions::nato_word;
use log::debug;
use regex::Regex;

use crate::{
    similarity::{clean_word, jaro_winkler, phonetic_encode, phonetic_match},
    vocabulary::vocabulary,
};

static NINER_DOUBLED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d)(\d)er$").unwrap());
static NINER_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d)r(\d*)$").unwrap());
static TRAILING_S: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)s$").unwrap());
static TEXT_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\D{2,})(\d+)$").unwrap());
static RUNWAY_SIDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([lrc])$").unwrap());

pub fn is_digit(s: &str) -> bool {
    s.len() == 1 && s.as_bytes()[0].is_ascii_digit()
}

pub fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Value of an all-digit word. Overlong runs saturate instead of failing.
pub fn parse_number(s: &str) -> Option<i32> {
    if !is_number(s) {
        return None;
    }
    Some(s.bytes().fold(0i32, |n, b| {
        n.saturating_mul(10).saturating_add((b - b'0') as i32)
    }))
}

/// Uppercase letters spelled by the leading NATO words, and how many words
/// they took.
pub fn nato_spelling<'a, I>(words: I) -> (String, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let vocab = vocabulary();
    let mut spelled = String::new();
    for word in words {
        match vocab.nato_letter(word) {
            Some(letter) => spelled.push(letter.to_ascii_uppercase()),
            None => break,
        }
    }
    let consumed = spelled.len();
    (spelled, consumed)
}

/// Normalize a raw transcript into words. Empty input gives no words.
pub fn normalize(transcript: &str) -> Vec<String> {
    let transcript = transcript.trim().to_lowercase();
    if transcript.is_empty() {
        return Vec::new();
    }
    let transcript = transcript.replace(['-', '–', '—'], " ");
    let mut words: Vec<String> = transcript.split_whitespace().map(str::to_string).collect();

    let vocab = vocabulary();
    let mut result: Vec<String> = Vec::with_capacity(words.len());
    for i in 0..words.len() {
        let w = clean_word(&words[i]);
        if w.is_empty() {
            continue;
        }
        let w = fix_trailing_s(&fix_garbled_niner(&w));

        if let Some((text, number)) = split_text_number(&w) {
            result.push(text);
            result.push(number);
            continue;
        }
        if let Some(digit) = vocab.digit_words.get(&w) {
            result.push(digit.clone());
            continue;
        }
        if let Some(number) = vocab.number_words.get(&w) {
            result.push(number.clone());
            continue;
        }
        if let Some(keyword) = vocab.command_keywords.get(&w) {
            result.push(keyword.clone());
            continue;
        }
        if let Some(expansion) = vocab.phrase_expansions.get(&w) {
            result.extend(expansion.iter().cloned());
            continue;
        }
        if let Some(split) = split_merged_nato(&w) {
            result.extend(split);
            continue;
        }
        if let Some(split) = split_merged_command(&w) {
            result.extend(split);
            continue;
        }
        if let Some(keyword) = phonetic_command_match(&w) {
            result.push(keyword);
            continue;
        }
        if is_localizer_pattern(&w) {
            result.push("intercept".to_string());
            result.push("localizer".to_string());
            continue;
        }

        // "or" is STT noise between digits ("two nine or zero") and between
        // "turn" and a direction.
        if w == "or" && i + 1 < words.len() {
            if let Some(prev) = result.last() {
                let next = clean_word(&words[i + 1]);
                let next_is_digit = is_number(&next) || vocab.digit_words.contains_key(&next);
                if is_number(prev) && next_is_digit {
                    // "niner or thousand" heard as "9 or 1000"
                    if next == "1000" {
                        words[i + 1] = "thousand".to_string();
                    }
                    continue;
                }
                if prev == "turn"
                    && (next == "left"
                        || next == "right"
                        || phonetic_match(&next, "left")
                        || phonetic_match(&next, "right"))
                {
                    continue;
                }
            }
        }

        result.push(w);
    }

    let result = post_process(result);
    debug!("Normalized {transcript:?} -> {result:?}");
    result
}

/// "99er" → "9", "9r" → "9", "9r000" → "9000".
fn fix_garbled_niner(w: &str) -> String {
    if let Some(caps) = NINER_DOUBLED.captures(w) {
        if caps[1] == caps[2] {
            return caps[1].to_string();
        }
    }
    if let Some(caps) = NINER_TAIL.captures(w) {
        return format!("{}{}", &caps[1], &caps[2]);
    }
    w.to_string()
}

/// "4s" → "40" ("forty"), "23s" → "23".
fn fix_trailing_s(w: &str) -> String {
    match TRAILING_S.captures(w) {
        Some(caps) if caps[1].len() == 1 => format!("{}0", &caps[1]),
        Some(caps) => caps[1].to_string(),
        None => w.to_string(),
    }
}

/// "alaska8383" → ("alaska", "8383"). Only a single text-to-digits
/// transition is split.
fn split_text_number(w: &str) -> Option<(String, String)> {
    TEXT_NUMBER
        .captures(w)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// "echogolf" → ["echo", "golf"].
fn split_merged_nato(word: &str) -> Option<Vec<String>> {
    let wlen = word.len();
    if wlen < 8 || !word.is_ascii() || vocabulary().nato_alphabet.contains_key(word) {
        return None;
    }
    let canonical: Vec<&str> = ('a'..='z').filter_map(nato_word).collect();
    for first in &canonical {
        let min_split = (first.len() - 1).max(3);
        let max_split = (first.len() + 1).min(wlen - 3);
        for split_at in min_split..=max_split {
            let (prefix, suffix) = word.split_at(split_at);
            if jaro_winkler(prefix, first) < 0.85 || suffix.len() < 3 {
                continue;
            }
            if let Some(second) = canonical.iter().find(|n| jaro_winkler(suffix, n) >= 0.80) {
                return Some(vec![first.to_string(), second.to_string()]);
            }
        }
    }
    None
}

/// "turnwright" → ["turn", "right"], "cleardered" → ["cleared", "direct"].
fn split_merged_command(word: &str) -> Option<Vec<String>> {
    let vocab = vocabulary();
    let wlen = word.len();
    if wlen < 7 || !word.is_ascii() || vocab.command_keywords.contains_key(word) {
        return None;
    }

    let mut best: Option<(&str, &str, f64)> = None;

    for prefix in &vocab.merged_command_prefixes {
        let min_split = prefix.len().saturating_sub(2).max(3);
        let max_split = (prefix.len() + 2).min(wlen - 1);
        let allowed = vocab.prefix_suffix_compatibility.get(prefix);
        let is_allowed = |suffix: &str| allowed.is_none_or(|a| a.iter().any(|s| s == suffix));

        for split_at in min_split..=max_split {
            let (word_prefix, word_suffix) = word.split_at(split_at);
            let prefix_score = if phonetic_match(word_prefix, prefix) {
                1.0
            } else {
                let jw = jaro_winkler(word_prefix, prefix);
                if jw >= 0.85 { jw } else { 0.0 }
            };
            if prefix_score == 0.0 || word_suffix.len() < 2 {
                continue;
            }

            if let Some(canonical) = vocab.garbled_suffixes.get(word_suffix) {
                let total = prefix_score + 2.0;
                if is_allowed(canonical) && best.is_none_or(|(_, _, score)| total > score) {
                    best = Some((prefix.as_str(), canonical.as_str(), total));
                }
            }
            for canonical in &vocab.canonical_suffixes {
                if !is_allowed(canonical) {
                    continue;
                }
                let suffix_score = score_suffix_match(word_suffix, canonical);
                let total = prefix_score + suffix_score;
                if suffix_score > 0.0 && best.is_none_or(|(_, _, score)| total > score) {
                    best = Some((prefix.as_str(), canonical.as_str(), total));
                }
            }
        }
    }
    best.map(|(prefix, suffix, _)| vec![prefix.to_string(), suffix.to_string()])
}

/// Score of a merged-word suffix against a command word, 0 when unrelated.
/// Phonetic matches outrank plain similarity and prefer longer targets.
fn score_suffix_match(suffix: &str, target: &str) -> f64 {
    if suffix.len() < 2 {
        return 0.0;
    }
    let jw = jaro_winkler(suffix, target);
    if phonetic_match(suffix, target) {
        return 1.0 + target.len() as f64 / 10.0 + jw / 100.0;
    }
    if jw >= 0.80 {
        return jw;
    }
    // Truncated suffix: "der" (TR) against "direct" (TRKT).
    let (suffix_code, _) = phonetic_encode(suffix);
    let (target_code, _) = phonetic_encode(target);
    if suffix_code.len() >= 2 && target_code.starts_with(&suffix_code) {
        return suffix_code.len() as f64 / target_code.len() as f64;
    }
    0.0
}

/// Canonical command keyword an unknown word sounds like ("hitting" →
/// "heading").
fn phonetic_command_match(word: &str) -> Option<String> {
    if word.len() < 3 {
        return None;
    }
    let vocab = vocabulary();
    let is_blocked = |keyword: &str| {
        [&vocab.phonetic_command_blocklist, &vocab.fuzzy_blocklist]
            .iter()
            .filter_map(|list| list.get(word))
            .any(|blocked| blocked.iter().any(|b| b == keyword))
    };
    vocab
        .phonetic_command_keywords
        .iter()
        .find(|keyword| !is_blocked(keyword) && phonetic_match(word, keyword))
        .cloned()
}

/// Garbled "intercept localizer" such as "zapulokwizer".
fn is_localizer_pattern(w: &str) -> bool {
    (w.contains("lok") || w.contains("lawk"))
        && vocabulary()
            .localizer_prefixes
            .iter()
            .any(|prefix| w.starts_with(prefix.as_str()))
}

/// Multi-word repairs that need neighbouring words.
fn post_process(tokens: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();

        if let Some((replacement, consumed)) = match_multi_token(&tokens[i..]) {
            result.extend(replacement.iter().cloned());
            i += consumed;
            continue;
        }

        // "l s" is "ils" with the "i" dropped, but only before a runway.
        if token == "l"
            && tokens.get(i + 1).is_some_and(|t| t == "s")
            && tokens
                .get(i + 2)
                .is_some_and(|t| t == "runway" || is_number(t))
        {
            result.push("ils".to_string());
            i += 2;
            continue;
        }

        // "10270": "heading" heard as "10".
        if token.len() == 5 && token.starts_with("10") && is_number(token) {
            let heading = &token[2..];
            if parse_number(heading).is_some_and(|h| (1..=360).contains(&h)) {
                result.push("heading".to_string());
                result.push(heading.to_string());
                i += 1;
                continue;
            }
        }

        if let Some(caps) = RUNWAY_SIDE.captures(token) {
            result.push(caps[1].to_string());
            result.push(
                match &caps[2] {
                    "l" => "left",
                    "r" => "right",
                    _ => "center",
                }
                .to_string(),
            );
            i += 1;
            continue;
        }

        if let Some(corrected) = fix_large_number(token) {
            result.push(corrected);
            i += 1;
            continue;
        }

        // "20 degrees to the right" without "turn".
        if result.last().is_none_or(|prev: &String| prev != "turn")
            && parse_number(token).is_some_and(|n| (1..=45).contains(&n))
            && tokens.get(i + 1).is_some_and(|t| t == "degrees")
            && tokens
                .iter()
                .skip(i + 2)
                .take(4)
                .any(|t| t == "left" || t == "right")
        {
            result.push("turn".to_string());
        }

        // "for [a] thousand": "four" heard as "for".
        if token == "for" {
            let mut next = i + 1;
            if tokens.get(next).is_some_and(|t| t == "a") && next + 1 < tokens.len() {
                next += 1;
            }
            if tokens
                .get(next)
                .is_some_and(|t| t == "thousand" || t == "hundred")
            {
                result.push("4".to_string());
                i += 1;
                continue;
            }
        }

        result.push(token.to_string());
        i += 1;
    }
    result
}

/// Longest (3, then 2 word) multi-token replacement at the start of `tokens`.
fn match_multi_token(tokens: &[String]) -> Option<(&'static Vec<String>, usize)> {
    let replacements = &vocabulary().multi_token_replacements;
    (2..=tokens.len().min(3)).rev().find_map(|len| {
        replacements
            .get(&tokens[..len].join(" "))
            .map(|replacement| (replacement, len))
    })
}

/// Repair an implausibly large altitude (100000..=1000000 ft): drop a
/// spurious "0" after the first digit, then a doubled digit, then a trailing
/// zero. Only results in 1000..=60000 are accepted.
fn fix_large_number(s: &str) -> Option<String> {
    let n = parse_number(s)?;
    if !(100_000..=1_000_000).contains(&n) {
        return None;
    }
    let plausible =
        |candidate: &str| parse_number(candidate).is_some_and(|cn| (1000..=60_000).contains(&cn));
    let bytes = s.as_bytes();

    if bytes.len() >= 3 && bytes[1] == b'0' && bytes[2] != b'0' {
        let corrected = format!("{}{}", &s[..1], &s[2..]);
        if plausible(&corrected) {
            return Some(corrected);
        }
    }
    for j in 1..bytes.len() {
        if bytes[j] == bytes[j - 1] {
            let corrected = format!("{}{}", &s[..j], &s[j + 1..]);
            if plausible(&corrected) {
                return Some(corrected);
            }
        }
    }
    if s.ends_with('0') && (1000..=60_000).contains(&(n / 10)) {
        return Some((n / 10).to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> Vec<String> {
        normalize(s)
    }

    #[test]
    fn test_empty_transcript() {
        assert!(norm("").is_empty());
        assert!(norm("   ").is_empty());
    }

    #[test]
    fn test_digit_words() {
        assert_eq!(norm("two nine zero"), ["2", "9", "0"]);
        assert_eq!(norm("niner tree fife"), ["9", "3", "5"]);
        // prepositions stay words
        assert_eq!(norm("to"), ["to"]);
        assert_eq!(norm("for"), ["for"]);
        assert_eq!(norm("Twenty, thirty."), ["20", "30"]);
    }

    #[test]
    fn test_or_between_digits() {
        assert_eq!(norm("two nine or zero"), ["2", "9", "0"]);
        assert_eq!(norm("9 or 1000"), ["9", "thousand"]);
    }

    #[test]
    fn test_garbled_digits() {
        assert_eq!(fix_garbled_niner("9r000"), "9000");
        assert_eq!(fix_garbled_niner("99er"), "9");
        assert_eq!(fix_garbled_niner("9r"), "9");
        assert_eq!(fix_garbled_niner("98er"), "98er");
        assert_eq!(fix_trailing_s("4s"), "40");
        assert_eq!(fix_trailing_s("23s"), "23");
        assert_eq!(fix_trailing_s("bus"), "bus");
    }

    #[test]
    fn test_split_text_number() {
        assert_eq!(norm("alaska8383"), ["alaska", "8383"]);
        assert_eq!(split_text_number("8383alaska"), None);
        assert_eq!(split_text_number("a1"), None);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(norm("descending"), ["descend"]);
        assert_eq!(norm("ten degree"), ["10", "degrees"]);
        assert_eq!(norm("flighting"), ["fly", "heading"]);
    }

    #[test]
    fn test_merged_words() {
        assert_eq!(
            split_merged_nato("echogolf"),
            Some(vec!["echo".to_string(), "golf".to_string()])
        );
        assert_eq!(split_merged_nato("november"), None);
        assert_eq!(
            split_merged_command("turnright"),
            Some(vec!["turn".to_string(), "right".to_string()])
        );
        assert_eq!(
            split_merged_command("cleardered"),
            Some(vec!["cleared".to_string(), "direct".to_string()])
        );
        assert!(is_localizer_pattern("zapulokwizer"));
        assert!(!is_localizer_pattern("localizer"));
    }

    #[test]
    fn test_post_process() {
        assert_eq!(norm("i l s runway 4"), ["ils", "runway", "4"]);
        assert_eq!(norm("runway 13l"), ["runway", "13", "left"]);
        assert_eq!(norm("10270"), ["heading", "270"]);
        assert_eq!(norm("20 degrees left"), ["turn", "20", "degrees", "left"]);
        assert_eq!(norm("turn 20 degrees left"), ["turn", "20", "degrees", "left"]);
        assert_eq!(norm("for thousand"), ["4", "thousand"]);
    }

    #[test]
    fn test_fix_large_number() {
        assert_eq!(fix_large_number("104000").as_deref(), Some("14000"));
        assert_eq!(fix_large_number("144000").as_deref(), Some("14000"));
        assert_eq!(fix_large_number("120000").as_deref(), Some("12000"));
        assert_eq!(fix_large_number("12000"), None);
    }

    #[test]
    fn test_nato_spelling() {
        assert_eq!(nato_spelling(["delta", "papa", "kilo", "runway"]), ("DPK".to_string(), 3));
        assert_eq!(nato_spelling(["runway"]), (String::new(), 0));
    }
}
