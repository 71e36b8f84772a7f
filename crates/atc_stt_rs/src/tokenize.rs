//! Folding normalized words into typed tokens.

use log::debug;
use serde::Serialize;
use strum::Display;

use crate::normalize::{is_digit, is_number, parse_number};

/// Upper bound when gluing digits into one number.
const MAX_MERGED_NUMBER: i32 = 100_000;
/// Encoded altitude from which only explicit "flight level" speech counts.
const FLIGHT_LEVEL_FLOOR: i32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum TokenKind {
    Word,
    Number,
    Altitude,
    Fix,
    Approach,
    Callsign,
    Icao,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Words the token was built from, space separated.
    pub original: String,
    /// Normalized text. Number tokens keep their digits ("020").
    pub text: String,
    pub kind: TokenKind,
    /// Numeric payload; altitudes are in hundreds of feet.
    pub value: Option<i32>,
    /// Index of the first word in the normalized word list.
    pub pos: usize,
}

impl Token {
    pub fn word(text: &str, pos: usize) -> Self {
        Self {
            original: text.to_string(),
            text: text.to_string(),
            kind: TokenKind::Word,
            value: None,
            pos,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TokenKind::Number | TokenKind::Altitude)
    }

    /// Value of a Number token, or of a word that is all digits.
    pub fn number(&self) -> Option<i32> {
        match self.kind {
            TokenKind::Number => self.value,
            TokenKind::Word => parse_number(&self.text),
            _ => None,
        }
    }

    /// Altitude built from "thousand"/"hundred"/"flight level" speech rather
    /// than a promoted stand-alone number.
    pub fn is_spoken_altitude(&self) -> bool {
        self.kind == TokenKind::Altitude && self.original.contains(' ')
    }

    /// The number as heard: a Number token's value, or the digits of a
    /// stand-alone altitude ("8000", not the encoded 80).
    pub fn raw_number(&self) -> Option<i32> {
        match self.kind {
            TokenKind::Number => self.value,
            TokenKind::Altitude if !self.is_spoken_altitude() => parse_number(&self.text),
            _ => None,
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

pub fn tokens_to_string(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fold words into tokens: "flight level N N N" and "N thousand [M hundred]"
/// become Altitude tokens, digit runs become a single Number token.
pub fn tokenize<S: AsRef<str>>(words: &[S]) -> Vec<Token> {
    let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
    let mut tokens = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let w = words[i];
        let joined = |consumed: usize| words[i..i + consumed].join(" ");

        if w == "flight" && words.get(i + 1) == Some(&"level") {
            if let Some((level, consumed)) = parse_flight_level(&words[i + 2..]) {
                tokens.push(Token {
                    original: joined(consumed + 2),
                    text: format!("FL{level}"),
                    kind: TokenKind::Altitude,
                    value: Some(level),
                    pos: i,
                });
                i += consumed + 2;
                continue;
            }
        }

        if is_number(w) {
            if let Some((altitude, consumed)) = parse_altitude_pattern(&words[i..]) {
                tokens.push(Token {
                    original: joined(consumed),
                    text: altitude.to_string(),
                    kind: TokenKind::Altitude,
                    value: Some(altitude),
                    pos: i,
                });
                i += consumed;
                continue;
            }

            let (number, text, consumed) = parse_digit_sequence(&words[i..]);
            let mut token = Token {
                original: joined(consumed),
                text,
                kind: TokenKind::Number,
                value: Some(number),
                pos: i,
            };
            if consumed == 1 {
                promote_standalone_altitude(&mut token);
            }
            tokens.push(token);
            i += consumed;
            continue;
        }

        if w.len() == 3 && w.bytes().all(|b| b.is_ascii_uppercase()) {
            tokens.push(Token {
                kind: TokenKind::Icao,
                ..Token::word(w, i)
            });
            i += 1;
            continue;
        }

        tokens.push(Token::word(w, i));
        i += 1;
    }
    debug!("Tokens: {}", tokens_to_string(&tokens));
    tokens
}

/// A lone "8000" is an altitude below the flight levels; "800000" is the
/// same altitude with STT-added zeros.
fn promote_standalone_altitude(token: &mut Token) {
    let Some(n) = token.value else {
        return;
    };
    let encoded = if n >= 1000 && n % 100 == 0 && n / 100 < FLIGHT_LEVEL_FLOOR {
        n / 100
    } else if n >= 100_000 && n % 10_000 == 0 && n / 10_000 < FLIGHT_LEVEL_FLOOR {
        n / 10_000
    } else {
        return;
    };
    token.kind = TokenKind::Altitude;
    token.value = Some(encoded);
}

/// Digits after "flight level": up to three single digits, or one number.
fn parse_flight_level(words: &[&str]) -> Option<(i32, usize)> {
    let mut level = 0;
    let mut consumed = 0;
    for w in words.iter().take(3) {
        if is_digit(w) {
            level = level * 10 + parse_number(w)?;
            consumed += 1;
        } else if consumed == 0 && is_number(w) {
            return Some((parse_number(w)?, 1));
        } else {
            break;
        }
    }
    (consumed > 0).then_some((level, consumed))
}

/// "8 thousand" → 80, "1 1 thousand" → 110, "8 thousand 5 hundred" → 85.
fn parse_altitude_pattern(words: &[&str]) -> Option<(i32, usize)> {
    let mut thousands: i32 = 0;
    let mut consumed = 0;
    while let Some(w) = words.get(consumed) {
        if is_digit(w) {
            thousands = thousands.saturating_mul(10).saturating_add(parse_number(w)?);
            consumed += 1;
        } else if let Some(n) = parse_number(w).filter(|n| *n < 100) {
            thousands = n;
            consumed += 1;
            break;
        } else {
            break;
        }
    }
    if consumed == 0 || words.get(consumed) != Some(&"thousand") {
        return None;
    }
    consumed += 1;
    let mut altitude = thousands.saturating_mul(10);

    let hundreds_start = consumed;
    let mut hundreds: i32 = 0;
    while let Some(w) = words.get(consumed) {
        if is_digit(w) {
            hundreds = hundreds.saturating_mul(10).saturating_add(parse_number(w)?);
            consumed += 1;
        } else if let Some(n) = parse_number(w).filter(|n| *n < 10) {
            hundreds = n;
            consumed += 1;
            break;
        } else {
            break;
        }
    }
    if words.get(consumed) == Some(&"hundred") {
        altitude = altitude.saturating_add(hundreds);
        consumed += 1;
    } else {
        consumed = hundreds_start;
    }
    Some((altitude, consumed))
}

/// Glue consecutive digit words into one number, keeping the text so
/// leading zeros survive. Two multi-digit words are never glued ("210 210"),
/// and a digit before a number ≥ 1000 starts a new run ("10 1 2000").
fn parse_digit_sequence(words: &[&str]) -> (i32, String, usize) {
    let mut number: i32 = 0;
    let mut text = String::new();
    let mut consumed = 0;
    let mut last_was_multi_digit = false;

    while let Some(w) = words.get(consumed) {
        if is_digit(w) {
            let Some(candidate) = parse_number(w)
                .and_then(|d| number.checked_mul(10).and_then(|shifted| shifted.checked_add(d)))
            else {
                break;
            };
            if candidate > MAX_MERGED_NUMBER {
                break;
            }
            if last_was_multi_digit
                && words
                    .get(consumed + 1)
                    .and_then(|next| parse_number(next))
                    .is_some_and(|next| next >= 1000)
            {
                break;
            }
            number = candidate;
            last_was_multi_digit = false;
        } else if let Some(n) = parse_number(w) {
            if last_was_multi_digit {
                break;
            }
            if number > 0 {
                let candidate = 10i32
                    .checked_pow(w.len() as u32)
                    .and_then(|scale| number.checked_mul(scale))
                    .and_then(|shifted| shifted.checked_add(n));
                match candidate {
                    Some(candidate) if candidate <= MAX_MERGED_NUMBER => number = candidate,
                    _ => break,
                }
            } else if consumed > 0 && n > MAX_MERGED_NUMBER {
                break;
            } else {
                number = n;
            }
            last_was_multi_digit = w.len() > 1;
        } else {
            break;
        }
        text.push_str(w);
        consumed += 1;
    }
    (number, text, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn tok(s: &str) -> Vec<Token> {
        tokenize(&normalize(s))
    }

    #[test]
    fn test_flight_level() {
        let tokens = tok("climb flight level three five zero");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Altitude);
        assert_eq!(tokens[1].value, Some(350));
        assert_eq!(tokens[1].text, "FL350");
        assert_eq!(tok("flight level 240")[0].value, Some(240));
        // no digits: plain words
        assert_eq!(tok("flight level")[0].kind, TokenKind::Word);
    }

    #[test]
    fn test_thousand_hundred() {
        let tokens = tok("descend and maintain one zero thousand");
        let last = tokens.last().unwrap();
        assert_eq!((last.kind, last.value), (TokenKind::Altitude, Some(100)));

        let tokens = tok("eight thousand five hundred");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, Some(85));

        let tokens = tok("eleven thousand");
        assert_eq!(tokens[0].value, Some(110));

        // a digit without "hundred" is not part of the altitude
        let tokens = tok("5 thousand 2 miles");
        assert_eq!(tokens[0].value, Some(50));
        assert_eq!(tokens[1].text, "2");
    }

    #[test]
    fn test_digit_sequences() {
        let tokens = tok("heading zero two zero");
        assert_eq!(tokens[1].text, "020");
        assert_eq!(tokens[1].value, Some(20));
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].original, "0 2 0");

        let tokens = tok("two fifty");
        assert_eq!(tokens[0].value, Some(250));

        let tokens = tok("210 210");
        assert_eq!(tokens.len(), 2);

        let tokens = tok("10 1 2000");
        assert_eq!(tokens[0].value, Some(10));
        assert_eq!(tokens[1].value, Some(12000));
    }

    #[test]
    fn test_standalone_altitudes() {
        let tokens = tok("maintain 8000");
        assert_eq!((tokens[1].kind, tokens[1].value), (TokenKind::Altitude, Some(80)));
        assert_eq!(tokens[1].text, "8000");
        assert_eq!(tokens[1].raw_number(), Some(8000));
        assert!(!tokens[1].is_spoken_altitude());
        assert!(tok("8 thousand")[0].is_spoken_altitude());
        assert_eq!(tok("8 thousand")[0].raw_number(), None);
        // flight levels need "flight level"
        let tokens = tok("maintain 24000");
        assert_eq!((tokens[1].kind, tokens[1].value), (TokenKind::Number, Some(24000)));
        assert_eq!(tok("5936")[0].kind, TokenKind::Number);
    }

    #[test]
    fn test_icao_and_words() {
        let tokens = tokenize(&["AAL", "turn"]);
        assert_eq!(tokens[0].kind, TokenKind::Icao);
        assert_eq!(tokens[1].kind, TokenKind::Word);
        assert_eq!(tokens[1].value, None);
        assert!(tokenize::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_oversized_number_before_digit() {
        let tokens = tokenize(&["squawk", "2147483648", "1"]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].value, Some(i32::MAX));
        assert_eq!(tokens[2].value, Some(1));

        let tokens = tokenize(&["7", "99999999", "9"]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].value, Some(7));
        assert_eq!(tokens[1].value, Some(99999999));
    }

    #[test]
    fn test_deterministic() {
        let transcript = "united 452 climb and maintain flight level three five zero";
        assert_eq!(tok(transcript), tok(transcript));
    }
}
