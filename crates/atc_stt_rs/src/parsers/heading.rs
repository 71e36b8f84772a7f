use aviation_helper_rs::{
    clearance::aviation_command::SayAgainKind, types::heading::TurnDirection,
};
use log::debug;

use super::{ParseOutcome, Value, is_command_keyword};
use crate::tokenize::{Token, TokenKind};

/// Headings sit right after their keyword; a wider window picks up the
/// numbers of the next command.
const HEADING_WINDOW: usize = 2;
const DEGREES_WINDOW: usize = 5;

pub fn parse_heading(tokens: &[Token], pos: usize) -> ParseOutcome {
    for i in pos..tokens.len().min(pos + HEADING_WINDOW) {
        let token = &tokens[i];
        let consumed = i - pos + 1;

        if token.kind == TokenKind::Word && is_command_keyword(&token.text) {
            return ParseOutcome::Failed(None);
        }
        let (TokenKind::Number, Some(n)) = (token.kind, token.value) else {
            continue;
        };
        // "121 point 5" is a frequency
        if tokens.get(i + 1).is_some_and(|next| next.is("point")) {
            return ParseOutcome::Failed(None);
        }

        // an extra trailing digit: "2705" is 270, and "361" is taken as 036
        // since no heading exceeds 360
        if (361..10_000).contains(&n) {
            let heading = n / 10;
            if (1..=360).contains(&heading) {
                return ParseOutcome::int(heading, consumed);
            }
        }

        if (1..=360).contains(&n) {
            // "20 to 270"
            if n < 100 && tokens.get(i + 1).is_some_and(|next| next.is("to")) {
                if let Some(heading) = tokens
                    .get(i + 2)
                    .filter(|t| t.kind == TokenKind::Number)
                    .and_then(|t| t.value)
                    .filter(|h| (100..=360).contains(h))
                {
                    return ParseOutcome::int(heading, consumed + 2);
                }
            }

            let heading = if token.text.starts_with('0') {
                if n < 10 { n * 10 } else { n }
            } else if token.text.len() == 2 && (10..=36).contains(&n) && n % 10 != 0 {
                debug!("Heading {n} read as {}", n * 10);
                n * 10
            } else if n < 10 {
                n * 10
            } else {
                n
            };
            return ParseOutcome::int(heading, consumed);
        }
    }
    ParseOutcome::Failed(Some(SayAgainKind::Heading))
}

/// "20 degrees left", "20 left". A direction before the number is a
/// heading ("left 20") unless "degrees" is said.
pub fn parse_degrees(tokens: &[Token], pos: usize) -> ParseOutcome {
    let mut degrees = None;
    let mut direction = None;
    let mut degrees_at = 0;
    let mut direction_at = 0;
    let mut degrees_keyword = false;
    let is_degrees_word = |t: &Token| t.is("degrees") || t.is("degree");

    let end = tokens.len().min(pos + DEGREES_WINDOW);
    let mut i = pos;
    while i < end {
        let token = &tokens[i];
        i += 1;
        match (token.kind, token.value) {
            (TokenKind::Number, Some(n)) if (1..=45).contains(&n) && degrees.is_none() => {
                degrees = Some(n);
                degrees_at = i;
            }
            _ => {
                if let Some(dir) = TurnDirection::from_word(&token.text) {
                    if direction.is_none() {
                        direction = Some(dir);
                        direction_at = i;
                    }
                } else if is_degrees_word(token) {
                    degrees_keyword = true;
                }
            }
        }

        if degrees.is_some() && direction.is_some() {
            if !degrees_keyword {
                if let Some(offset) = tokens[i..]
                    .iter()
                    .take(2)
                    .position(|t| is_degrees_word(t))
                {
                    degrees_keyword = true;
                    i += offset + 1;
                }
            }
            break;
        }
    }

    match (degrees, direction) {
        (Some(degrees), Some(direction)) if degrees_at < direction_at || degrees_keyword => {
            let snapped = (((degrees + 2) / 5) * 5).max(5);
            ParseOutcome::Parsed {
                value: Value::Degrees {
                    degrees: snapped,
                    direction,
                },
                consumed: i - pos,
            }
        }
        _ => ParseOutcome::Failed(Some(SayAgainKind::Turn)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsers::test_support::tokens, tokenize::tokenize};

    fn heading(transcript: &str) -> ParseOutcome {
        parse_heading(&tokens(transcript), 0)
    }

    // Raw words: the normalizer would put "turn" in front of "N degrees".
    fn degrees(transcript: &str) -> ParseOutcome {
        let words: Vec<&str> = transcript.split(' ').collect();
        parse_degrees(&tokenize(&words), 0)
    }

    #[test]
    fn test_heading_values() {
        assert_eq!(heading("two seven zero"), ParseOutcome::int(270, 1));
        assert_eq!(heading("zero two zero"), ParseOutcome::int(20, 1));
        assert_eq!(heading("zero five"), ParseOutcome::int(50, 1));
        assert_eq!(heading("27"), ParseOutcome::int(270, 1));
        assert_eq!(heading("30"), ParseOutcome::int(30, 1));
        assert_eq!(heading("5"), ParseOutcome::int(50, 1));
        assert_eq!(heading("2705"), ParseOutcome::int(270, 1));
        assert_eq!(heading("361"), ParseOutcome::int(36, 1));
        assert_eq!(heading("20 to 270"), ParseOutcome::int(270, 3));
    }

    #[test]
    fn test_heading_rejections() {
        assert_eq!(heading("blark bling"), ParseOutcome::Failed(Some(SayAgainKind::Heading)));
        assert_eq!(heading("descend and maintain"), ParseOutcome::Failed(None));
        assert_eq!(heading("121 point 5"), ParseOutcome::Failed(None));
        // too far away
        assert_eq!(heading("uh uh 270"), ParseOutcome::Failed(Some(SayAgainKind::Heading)));
    }

    #[test]
    fn test_degrees() {
        let expected = |degrees, direction, consumed| ParseOutcome::Parsed {
            value: Value::Degrees { degrees, direction },
            consumed,
        };
        assert_eq!(degrees("20 degrees left"), expected(20, TurnDirection::Left, 3));
        assert_eq!(degrees("10 left"), expected(10, TurnDirection::Left, 2));
        assert_eq!(degrees("23 right"), expected(25, TurnDirection::Right, 2));
        assert_eq!(degrees("2 right"), expected(5, TurnDirection::Right, 2));
        assert_eq!(degrees("right 20 degrees"), expected(20, TurnDirection::Right, 3));
        // direction first is a heading
        assert_eq!(degrees("left 20"), ParseOutcome::Failed(Some(SayAgainKind::Turn)));
        assert_eq!(degrees("50 left"), ParseOutcome::Failed(Some(SayAgainKind::Turn)));
    }

    #[test]
    fn test_degrees_stop_at_next_command() {
        let tokens = tokens("turn 20 degrees right descend and maintain 5 thousand");
        assert_eq!(parse_degrees(&tokens, 1).consumed(), 3);
        assert_eq!(tokens[4].text, "descend");
    }
}
