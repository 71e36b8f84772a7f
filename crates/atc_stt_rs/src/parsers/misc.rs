//! Small parsers for handoffs, traffic calls and ATIS.

use super::{ParseOutcome, Value, is_command_keyword};
use crate::{
    tokenize::{Token, TokenKind},
    vocabulary::vocabulary,
};

const FREQUENCY_LEAD_WORDS: usize = 4;
const TRAFFIC_WINDOW: usize = 8;

pub fn parse_range(tokens: &[Token], pos: usize, min: i32, max: i32) -> ParseOutcome {
    match (tokens[pos].kind, tokens[pos].value) {
        (TokenKind::Number, Some(n)) if (min..=max).contains(&n) => ParseOutcome::int(n, 1),
        _ => ParseOutcome::Failed(None),
    }
}

pub fn parse_text(tokens: &[Token], pos: usize) -> ParseOutcome {
    match &tokens[pos] {
        t if t.kind == TokenKind::Word => ParseOutcome::text(t.text.clone(), 1),
        _ => ParseOutcome::Failed(None),
    }
}

/// A word that could be a misheard facility name ("boston" as "bustin").
pub fn parse_garbled_word(tokens: &[Token], pos: usize) -> ParseOutcome {
    let token = &tokens[pos];
    if token.kind != TokenKind::Word
        || token.text.len() < 2
        || is_command_keyword(&token.text)
        || vocabulary().is_filler(&token.text)
    {
        return ParseOutcome::Failed(None);
    }
    ParseOutcome::text(token.text.clone(), 1)
}

/// "information kilo" or "information k".
pub fn parse_atis_letter(tokens: &[Token], pos: usize) -> ParseOutcome {
    let text = tokens[pos].text.as_str();
    let letter = vocabulary().nato_letter(text).or_else(|| {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => Some(c),
            _ => None,
        }
    });
    match letter {
        Some(letter) => ParseOutcome::text(letter.to_ascii_uppercase().to_string(), 1),
        None => ParseOutcome::Failed(None),
    }
}

/// "boston center one two seven point two five" → "127.25". A few
/// facility words may precede the frequency.
pub fn parse_contact_frequency(tokens: &[Token], pos: usize) -> ParseOutcome {
    let end = tokens.len().min(pos + FREQUENCY_LEAD_WORDS + 1);
    for i in pos..end {
        let token = &tokens[i];
        if token.kind == TokenKind::Word {
            continue;
        }
        let consumed = i - pos + 1;
        match token.raw_number() {
            Some(mhz) if (118..=136).contains(&mhz) => {
                let separator = tokens.get(i + 1).map(|t| t.text.as_str());
                let decimals = tokens.get(i + 2).filter(|t| t.kind == TokenKind::Number);
                if let (Some("point" | "decimal"), Some(decimals)) = (separator, decimals) {
                    return ParseOutcome::text(format!("{mhz}.{}", decimals.text), consumed + 2);
                }
            }
            // "one two seven two five" glued into one number
            Some(n) if (11_800..=13_699).contains(&n) || (118_000..=136_999).contains(&n) => {
                let digits = n.to_string();
                return ParseOutcome::text(format!("{}.{}", &digits[..3], &digits[3..]), consumed);
            }
            _ => {}
        }
        break;
    }
    ParseOutcome::Failed(None)
}

/// "2 o'clock, 5 miles, 4 thousand": o'clock position required, distance
/// and altitude optional (0 when not said).
pub fn parse_traffic(tokens: &[Token], pos: usize) -> ParseOutcome {
    let is_oclock = |i: usize| {
        tokens.get(i).is_some_and(|t| t.is("oclock"))
            || (tokens.get(i).is_some_and(|t| t.is("o"))
                && tokens.get(i + 1).is_some_and(|t| t.is("clock")))
    };

    let end = tokens.len().min(pos + TRAFFIC_WINDOW);
    let Some((oclock_at, oclock)) = (pos..end.min(pos + 3)).find_map(|i| match tokens[i].number() {
        Some(n) if (1..=12).contains(&n) && is_oclock(i + 1) => Some((i, n)),
        _ => None,
    }) else {
        return ParseOutcome::Failed(None);
    };
    let mut last = if tokens[oclock_at + 1].is("o") {
        oclock_at + 2
    } else {
        oclock_at + 1
    };

    let mut miles = 0;
    let mut altitude = 0;
    for i in last + 1..end {
        let token = &tokens[i];
        if token.kind == TokenKind::Word && is_command_keyword(&token.text) {
            break;
        }
        if miles == 0 {
            if let (TokenKind::Number, Some(n)) = (token.kind, token.value) {
                if tokens
                    .get(i + 1)
                    .is_some_and(|t| t.is("mile") || t.is("miles"))
                {
                    miles = n;
                    last = i + 1;
                    continue;
                }
            }
        }
        if altitude == 0 {
            let spoken = token.is_spoken_altitude().then_some(token.value).flatten();
            let raw = token
                .raw_number()
                .filter(|n| (1000..=60_000).contains(n) && n % 100 == 0)
                .map(|n| n / 100);
            if let Some(value) = spoken.or(raw) {
                altitude = value;
                last = i;
            }
        }
    }

    ParseOutcome::Parsed {
        value: Value::Traffic {
            oclock,
            miles,
            altitude,
        },
        consumed: last - pos + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsers::test_support::tokens, tokenize::tokenize};

    fn words(transcript: &str) -> Vec<Token> {
        let words: Vec<&str> = transcript.split(' ').collect();
        tokenize(&words)
    }

    #[test]
    fn test_range_and_text() {
        let tokens = tokens("2 7 left");
        assert_eq!(parse_range(&tokens, 0, 1, 36), ParseOutcome::int(27, 1));
        assert_eq!(parse_range(&tokens, 0, 1, 20), ParseOutcome::Failed(None));
        assert_eq!(parse_text(&tokens, 1), ParseOutcome::text("left", 1));
        assert_eq!(parse_text(&tokens, 0), ParseOutcome::Failed(None));
    }

    #[test]
    fn test_garbled_word() {
        let tokens = words("bustin descend uh");
        assert_eq!(parse_garbled_word(&tokens, 0), ParseOutcome::text("bustin", 1));
        assert_eq!(parse_garbled_word(&tokens, 1), ParseOutcome::Failed(None));
        assert_eq!(parse_garbled_word(&tokens, 2), ParseOutcome::Failed(None));
    }

    #[test]
    fn test_atis_letter() {
        let tokens = words("kilo k 5");
        assert_eq!(parse_atis_letter(&tokens, 0), ParseOutcome::text("K", 1));
        assert_eq!(parse_atis_letter(&tokens, 1), ParseOutcome::text("K", 1));
        assert_eq!(parse_atis_letter(&tokens, 2), ParseOutcome::Failed(None));
    }

    #[test]
    fn test_contact_frequency() {
        let frequency = |transcript: &str| parse_contact_frequency(&words(transcript), 0);
        assert_eq!(
            frequency("boston center 1 2 7 point 2 5"),
            ParseOutcome::text("127.25", 5)
        );
        assert_eq!(frequency("1 2 7 2 5"), ParseOutcome::text("127.25", 1));
        assert_eq!(frequency("12700"), ParseOutcome::text("127.00", 1));
        assert_eq!(frequency("tower"), ParseOutcome::Failed(None));
        assert_eq!(frequency("5 thousand"), ParseOutcome::Failed(None));
    }

    #[test]
    fn test_traffic() {
        let traffic = |transcript: &str| parse_traffic(&words(transcript), 0);
        let expected = |oclock, miles, altitude, consumed| ParseOutcome::Parsed {
            value: Value::Traffic {
                oclock,
                miles,
                altitude,
            },
            consumed,
        };
        assert_eq!(traffic("2 oclock 5 miles 4 thousand"), expected(2, 5, 40, 5));
        assert_eq!(
            parse_traffic(&tokens("two o'clock one zero miles"), 0),
            expected(2, 10, 0, 4)
        );
        assert_eq!(traffic("12 o clock 3 miles"), expected(12, 3, 0, 5));
        assert_eq!(traffic("10 oclock descend"), expected(10, 0, 0, 2));
        assert_eq!(traffic("5 miles"), ParseOutcome::Failed(None));
    }
}
