//! String similarity used everywhere a transcript word is compared to a
//! known word: Jaro-Winkler, a Double-Metaphone style phonetic code and
//! the combined [`fuzzy_match`] predicate.

use crate::vocabulary::vocabulary;

const MAX_CODE_LEN: usize = 8;

/// Jaro similarity with the Winkler prefix boost (prefix capped at 4,
/// scaling 0.1). Case-insensitive.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let jaro = strsim::jaro(&a, &b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + prefix as f64 * 0.1 * (1.0 - jaro)
}

fn emit(primary: &mut String, alternate: &mut String, p: &str, a: &str) {
    primary.push_str(p);
    alternate.push_str(a);
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'A' | b'E' | b'I' | b'O' | b'U')
}

/// Phonetic code of a word, `(primary, alternate)`. Non-letters are ignored,
/// so a purely numeric word encodes to empty strings.
pub fn phonetic_encode(word: &str) -> (String, String) {
    let word = word.to_uppercase();
    let w = word.as_bytes();
    let at = |idx: usize| w.get(idx).copied();
    let followed_by = |idx: usize, set: &[u8]| at(idx + 1).is_some_and(|c| set.contains(&c));
    let next_is_vowel = |idx: usize| at(idx + 1).is_some_and(is_vowel);
    // Step over a doubled consonant.
    let step = |idx: usize| if at(idx + 1) == Some(w[idx]) { 2 } else { 1 };

    let mut primary = String::new();
    let mut alternate = String::new();

    let mut i = 0;
    if ["GN", "KN", "PN", "WR", "PS"]
        .iter()
        .any(|prefix| word.starts_with(prefix))
    {
        i = 1;
    }

    while i < w.len() && primary.len() < MAX_CODE_LEN {
        let c = w[i];
        match c {
            b'A' | b'E' | b'I' | b'O' | b'U' => {
                if i == 0 {
                    emit(&mut primary, &mut alternate, "A", "A");
                }
                i += 1;
            }
            b'B' => {
                emit(&mut primary, &mut alternate, "P", "P");
                i += step(i);
            }
            b'C' => {
                if followed_by(i, b"H") {
                    emit(&mut primary, &mut alternate, "X", "X");
                    i += 2;
                } else if followed_by(i, b"IEY") {
                    emit(&mut primary, &mut alternate, "S", "S");
                    i += 1;
                } else {
                    emit(&mut primary, &mut alternate, "K", "K");
                    i += 1;
                }
            }
            b'D' => {
                if followed_by(i, b"G") {
                    if at(i + 2).is_some_and(|n| matches!(n, b'I' | b'E' | b'Y')) {
                        emit(&mut primary, &mut alternate, "J", "J");
                    } else {
                        emit(&mut primary, &mut alternate, "TK", "TK");
                    }
                    i += 2;
                } else {
                    emit(&mut primary, &mut alternate, "T", "T");
                    i += 1;
                }
            }
            b'F' => {
                emit(&mut primary, &mut alternate, "F", "F");
                i += step(i);
            }
            b'G' => {
                if followed_by(i, b"H") {
                    if i > 0 && !is_vowel(w[i - 1]) {
                        emit(&mut primary, &mut alternate, "K", "K");
                    }
                    i += 2;
                } else if followed_by(i, b"N") {
                    emit(&mut primary, &mut alternate, "N", "KN");
                    i += 2;
                } else if followed_by(i, b"IEY") {
                    emit(&mut primary, &mut alternate, "J", "K");
                    i += 1;
                } else {
                    emit(&mut primary, &mut alternate, "K", "K");
                    i += 1;
                }
            }
            b'H' => {
                if (i == 0 || is_vowel(w[i - 1])) && next_is_vowel(i) {
                    emit(&mut primary, &mut alternate, "H", "H");
                }
                i += 1;
            }
            b'J' => {
                emit(&mut primary, &mut alternate, "J", "J");
                i += 1;
            }
            b'K' | b'L' | b'M' | b'N' | b'R' => {
                let code = (c as char).to_string();
                emit(&mut primary, &mut alternate, &code, &code);
                i += step(i);
            }
            b'P' => {
                if followed_by(i, b"H") {
                    emit(&mut primary, &mut alternate, "F", "F");
                    i += 2;
                } else {
                    emit(&mut primary, &mut alternate, "P", "P");
                    i += step(i);
                }
            }
            b'Q' => {
                emit(&mut primary, &mut alternate, "K", "K");
                i += 1;
            }
            b'S' => {
                if followed_by(i, b"H") {
                    emit(&mut primary, &mut alternate, "X", "X");
                    i += 2;
                } else if followed_by(i, b"I") && at(i + 2).is_some_and(|n| matches!(n, b'O' | b'A')) {
                    emit(&mut primary, &mut alternate, "X", "S");
                    i += 3;
                } else {
                    emit(&mut primary, &mut alternate, "S", "S");
                    i += step(i);
                }
            }
            b'T' => {
                if followed_by(i, b"H") {
                    emit(&mut primary, &mut alternate, "0", "T");
                    i += 2;
                } else if followed_by(i, b"I") && at(i + 2).is_some_and(|n| matches!(n, b'O' | b'A')) {
                    emit(&mut primary, &mut alternate, "X", "X");
                    i += 3;
                } else {
                    emit(&mut primary, &mut alternate, "T", "T");
                    i += step(i);
                }
            }
            b'V' => {
                emit(&mut primary, &mut alternate, "F", "F");
                i += 1;
            }
            b'W' | b'Y' => {
                if next_is_vowel(i) {
                    let code = (c as char).to_string();
                    emit(&mut primary, &mut alternate, &code, &code);
                }
                i += 1;
            }
            b'X' => {
                emit(&mut primary, &mut alternate, "KS", "KS");
                i += 1;
            }
            b'Z' => {
                emit(&mut primary, &mut alternate, "S", "S");
                i += step(i);
            }
            _ => i += 1,
        }
    }

    (primary, alternate)
}

/// Whether two words sound alike: any pairing of their codes is equal, or
/// (for codes of 3+ symbols) one code ends the other or both share a
/// 3-symbol ending, which catches dropped leading sounds.
pub fn phonetic_match(a: &str, b: &str) -> bool {
    let (p1, a1) = phonetic_encode(a);
    let (p2, a2) = phonetic_encode(b);
    if p1.is_empty() || p2.is_empty() {
        return false;
    }
    if p1 == p2 || p1 == a2 || a1 == p2 || (!a1.is_empty() && a1 == a2) {
        return true;
    }
    if p1.len() >= 3 && p2.len() >= 3 {
        if p1.ends_with(&p2) || p2.ends_with(&p1) {
            return true;
        }
        return p1[p1.len() - 3..] == p2[p2.len() - 3..];
    }
    false
}

/// Tolerant word comparison: equal ignoring case, similar enough by
/// Jaro-Winkler, or alike phonetically. Known false positives are refused,
/// as are words shorter than 3 letters against longer targets.
pub fn fuzzy_match(word: &str, target: &str, threshold: f64) -> bool {
    if word.eq_ignore_ascii_case(target) {
        return true;
    }
    let word_lower = word.to_lowercase();
    let target_lower = target.to_lowercase();
    if vocabulary().is_fuzzy_blocked(&word_lower, &target_lower) {
        return false;
    }
    if word.len() < 3 && target.len() > word.len() {
        return false;
    }
    jaro_winkler(word, target) >= threshold || phonetic_match(word, target)
}

/// Highest-scoring candidate at or above `threshold`; phonetic matches
/// score at least 0.85.
pub fn best_match<'a, I>(word: &str, candidates: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let mut score = jaro_winkler(word, candidate);
        if phonetic_match(word, candidate) {
            score = score.max(0.85);
        }
        if score >= threshold && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best
}

/// Collapse common spelling variants of the same vowel sound
/// ("gayel" → "gail").
pub fn normalize_vowels(s: &str) -> String {
    s.to_lowercase()
        .replace("aye", "ai")
        .replace("eye", "i")
        .replace("oye", "oi")
        .replace("uye", "ui")
}

/// Letters and digits only, lowercased.
pub fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Consonant skeleton of a word ("camrn" → "cmrn").
pub fn consonants(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphabetic() && !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaro_winkler() {
        assert_eq!(jaro_winkler("", ""), 1.0);
        assert_eq!(jaro_winkler("delta", "DELTA"), 1.0);
        assert_eq!(jaro_winkler("delta", ""), 0.0);
        assert!(jaro_winkler("detva", "delta") > 0.85);
        assert!(jaro_winkler("detva", "endeavor") < 0.7);
    }

    #[test]
    fn test_phonetic_encode() {
        assert_eq!(phonetic_encode("tree").0, "TR");
        assert_eq!(phonetic_encode("three"), ("0R".to_string(), "TR".to_string()));
        assert_eq!(phonetic_encode("depart").0, phonetic_encode("tepart").0);
        assert_eq!(phonetic_encode("knot").0, "NT");
        assert_eq!(phonetic_encode("phone").0, "FN");
        assert_eq!(phonetic_encode("heading").0, "HTNK");
        assert_eq!(phonetic_encode("9000"), (String::new(), String::new()));
        assert!(phonetic_encode("supercalifragilistic").0.len() <= MAX_CODE_LEN + 1);
    }

    #[test]
    fn test_phonetic_match() {
        assert!(phonetic_match("tree", "three"));
        assert!(phonetic_match("tepart", "depart"));
        assert!(phonetic_match("delta", "deltta"));
        assert!(!phonetic_match("american", "heading"));
        assert!(!phonetic_match("5", "6"));
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("Maintain", "maintain", 1.0));
        assert!(fuzzy_match("maintane", "maintain", 0.8));
        assert!(!fuzzy_match("intercept", "increase", 0.5));
        assert!(!fuzzy_match("flight", "right", 0.8));
        assert!(!fuzzy_match("united", "descended", 0.8));
        assert!(!fuzzy_match("united", "descend", 0.8));
        assert!(!fuzzy_match("fl", "fly", 0.5));
        assert!(!fuzzy_match("blark", "heading", 0.8));
    }

    #[test]
    fn test_best_match() {
        let candidates = ["speed", "heading", "descend"];
        assert_eq!(
            best_match("hedding", candidates, 0.8).map(|(c, _)| c),
            Some("heading")
        );
        assert_eq!(best_match("xyzzy", candidates, 0.8), None);
    }

    #[test]
    fn test_word_helpers() {
        assert_eq!(normalize_vowels("Gayel"), "gail");
        assert_eq!(clean_word("That's,"), "thats");
        assert_eq!(consonants("CAMRN"), "cmrn");
    }
}
