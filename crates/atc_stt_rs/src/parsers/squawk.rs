use aviation_helper_rs::clearance::aviation_command::SayAgainKind;

use super::ParseOutcome;
use crate::{normalize::is_digit, tokenize::Token};

const CODE_LEN: usize = 4;
const MAX_CODE: i32 = 7777;

/// Four digit beacon code, from single digits or one number.
pub fn parse_squawk(tokens: &[Token], pos: usize) -> ParseOutcome {
    let mut code = String::new();
    let mut i = pos;
    while code.len() < CODE_LEN {
        let Some(token) = tokens.get(i) else {
            break;
        };
        if is_digit(&token.text) {
            code.push_str(&token.text);
            i += 1;
        } else if let Some(n) = token.raw_number().filter(|n| (0..=MAX_CODE).contains(n)) {
            code.push_str(&format!("{n:04}"));
            i += 1;
            break;
        } else {
            break;
        }
    }
    if code.len() == CODE_LEN {
        ParseOutcome::text(code, i - pos)
    } else {
        ParseOutcome::Failed(Some(SayAgainKind::Squawk))
    }
}
