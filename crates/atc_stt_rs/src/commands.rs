//! Command parsing: walks the tokens after the callsign and asks the
//! template registry for the best command at each position.

use aviation_helper_rs::{AviationData, SttAircraft};
use log::debug;

use crate::{
    parsers::{
        ParseContext, altitude::altitude_token_value, approach::implicit_approach,
        skip_expect_further_clearance,
    },
    registry::Registry,
    similarity::fuzzy_match,
    template::TemplateMatch,
    tokenize::{Token, TokenKind},
    vocabulary::vocabulary,
};

/// Words after "<altitude> until established" that belong to the phrase.
const ESTABLISHED_ON: [&str; 6] = ["on", "the", "localizer", "glide", "slope", "glideslope"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommands {
    pub commands: Vec<String>,
    /// Mean confidence of the commands, 0 when there are none.
    pub confidence: f64,
}

/// Best template match at `pos`: the highest priority full match, the
/// longer one on equal priority. A say-again is only used when nothing
/// matched in full.
pub fn resolve(
    registry: &Registry,
    tokens: &[Token],
    pos: usize,
    ctx: &ParseContext,
    is_then: bool,
) -> Option<TemplateMatch> {
    let mut best: Option<(i32, TemplateMatch)> = None;
    let mut best_say_again: Option<(i32, TemplateMatch)> = None;

    for template in registry.templates() {
        let Some(found) = template.try_match(tokens, pos, ctx, is_then) else {
            continue;
        };
        if found.consumed == 0 {
            continue;
        }
        let slot = if found.is_say_again {
            &mut best_say_again
        } else {
            &mut best
        };
        let priority = template.priority();
        let better = slot.as_ref().is_none_or(|(best_priority, best_match)| {
            priority > *best_priority
                || (priority == *best_priority && found.consumed > best_match.consumed)
        });
        if better {
            *slot = Some((priority, found));
        }
    }

    best.or(best_say_again).map(|(_, found)| found)
}

/// A plausible altitude after "at": anything tokenized as an altitude, a
/// number in 100..600, or round raw feet.
fn is_at_altitude(token: &Token) -> bool {
    match (token.kind, token.value) {
        (TokenKind::Altitude, _) => true,
        (TokenKind::Number, Some(n)) => {
            (100..=600).contains(&n) || ((1000..=60_000).contains(&n) && n % 100 == 0)
        }
        _ => false,
    }
}

/// "<altitude> until established [on the localizer]" → `A<alt>` and the
/// position after the phrase.
fn until_established(tokens: &[Token], pos: usize) -> Option<(String, usize)> {
    let altitude = altitude_token_value(&tokens[pos]).filter(|alt| *alt > 0)?;
    let until = tokens.get(pos + 1)?;
    let established = tokens.get(pos + 2)?;
    if !until.is("until") || !fuzzy_match(&established.text, "established", 0.8) {
        return None;
    }
    let mut end = pos + 3;
    while tokens
        .get(end)
        .is_some_and(|t| ESTABLISHED_ON.contains(&t.text.as_str()))
    {
        end += 1;
    }
    Some((format!("A{altitude}"), end))
}

/// Approach named in an `E<APPR>` command, without a LAHSO suffix.
fn expected_approach(command: &str) -> Option<&str> {
    let approach = command.strip_prefix('E').filter(|rest| !rest.is_empty())?;
    Some(approach.split("/LAHSO").next().unwrap_or(approach))
}

/// "three thousand knots" is a speed: with "knots" heard and no speed
/// command parsed, bare `A<n>` commands become `S<n>`.
fn altitudes_to_speeds_if_knots(tokens: &[Token], commands: &mut [String]) {
    if !tokens.iter().any(|t| t.is("knots")) || commands.iter().any(|c| c.starts_with('S')) {
        return;
    }
    for command in commands.iter_mut() {
        let Some(value) = command.strip_prefix('A') else {
            continue;
        };
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            debug!("'knots' heard, {command} is a speed");
            *command = format!("S{value}");
        }
    }
}

/// Parse every command in `tokens`.
pub fn parse_commands(
    registry: &Registry,
    tokens: &[Token],
    aircraft: &SttAircraft,
    data: &dyn AviationData,
) -> ParsedCommands {
    let vocab = vocabulary();
    // Fixes of an approach the controller says to expect become usable for
    // the rest of the transmission.
    let mut aircraft = aircraft.clone();
    let mut commands: Vec<String> = Vec::new();
    let mut total_confidence = 0.0;
    let mut is_then = false;
    let mut pos = 0;

    while pos < tokens.len() {
        let token = &tokens[pos];

        if token.is("then") {
            is_then = true;
            pos += 1;
            continue;
        }
        // "the descend" is usually a clipped "then descend"
        if !commands.is_empty()
            && token.is("the")
            && tokens
                .get(pos + 1)
                .is_some_and(|next| next.is("descend") || next.is("climb") || next.is("maintain"))
        {
            is_then = true;
            pos += 1;
            continue;
        }
        if vocab.is_filler(&token.text) {
            pos += 1;
            continue;
        }
        if token.is("radar") && tokens.get(pos + 1).is_some_and(|next| next.is("contact")) {
            pos += 2;
            continue;
        }
        if token.is("at") && tokens.get(pos + 1).is_some_and(is_at_altitude) {
            debug!("'at <altitude>' at {pos}, sequencing what follows");
            is_then = true;
            pos += 2;
            continue;
        }
        if let Some((command, end)) = until_established(tokens, pos) {
            debug!("'until established' at {pos}: {command}");
            commands.push(command);
            total_confidence += 1.0;
            pos = end;
            continue;
        }
        if token.is("expect") {
            let end = skip_expect_further_clearance(tokens, pos);
            if end > pos {
                pos = end;
                continue;
            }
        }

        let ctx = ParseContext {
            aircraft: &aircraft,
            data,
        };
        if let Some(found) = resolve(registry, tokens, pos, &ctx, is_then) {
            debug!(
                "Matched {:?} at {pos} (confidence {:.2}, consumed {}, then {is_then})",
                found.command, found.confidence, found.consumed
            );
            pos += found.consumed;
            is_then = false;
            if found.command.is_empty() {
                continue;
            }
            if let Some(approach) = expected_approach(&found.command) {
                if let Some(fixes) = aircraft.approach_fixes.get(approach).cloned() {
                    for (spoken, fix) in fixes {
                        aircraft.fixes.entry(spoken).or_insert(fix);
                    }
                }
            }
            commands.push(found.command);
            total_confidence += found.confidence;
            continue;
        }

        if let Some((command, consumed)) = implicit_approach(&tokens[pos..], &aircraft) {
            debug!("Implicit approach at {pos}: {command}");
            commands.push(command);
            total_confidence += 1.0;
            pos += consumed;
            continue;
        }
        debug!("No command at {pos} ({:?}), skipping", token.text);
        pos += 1;
    }

    if commands.is_empty() {
        return ParsedCommands::default();
    }
    altitudes_to_speeds_if_knots(tokens, &mut commands);
    let confidence = total_confidence / commands.len() as f64;
    ParsedCommands {
        commands,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::LazyLock};

    use aviation_helper_rs::StaticAviationData;

    use super::*;
    use crate::{
        parsers::test_support::{aircraft, map, tokens},
        registry::default_registry,
        template::CommandTemplate,
    };

    static DATA: LazyLock<StaticAviationData> = LazyLock::new(StaticAviationData::default);

    fn parse(transcript: &str, ac: &SttAircraft) -> Vec<String> {
        parse_commands(default_registry(), &tokens(transcript), ac, &*DATA).commands
    }

    #[test]
    fn test_single_commands() {
        assert_eq!(parse("descend and maintain 8000", &aircraft(12000)), vec!["D80"]);
        assert_eq!(
            parse("climb and maintain flight level three five zero", &aircraft(28000)),
            vec!["C350"]
        );
        assert_eq!(parse("turn twenty degrees left", &aircraft(5000)), vec!["T20L"]);
    }

    #[test]
    fn test_then_sequencing() {
        assert_eq!(
            parse(
                "reduce speed to two five zero then descend and maintain one zero thousand",
                &aircraft(15000)
            ),
            vec!["S250", "TD100"]
        );
    }

    #[test]
    fn test_say_again_for_unreadable_value() {
        assert_eq!(
            parse("descend and maintain five thousand fly heading blark bling", &aircraft(10000)),
            vec!["D50", "SAYAGAIN/HEADING"]
        );
    }

    #[test]
    fn test_until_established() {
        assert_eq!(
            parse("3000 until established on the localizer", &aircraft(5000)),
            vec!["A30"]
        );
    }

    #[test]
    fn test_knots_turn_altitude_into_speed() {
        let mut commands = vec!["A30".to_string(), "L270".to_string()];
        altitudes_to_speeds_if_knots(&tokens("maintain three zero knots"), &mut commands);
        assert_eq!(commands, vec!["S30", "L270"]);

        let mut commands = vec!["A30".to_string(), "S210".to_string()];
        altitudes_to_speeds_if_knots(&tokens("knots"), &mut commands);
        assert_eq!(commands, vec!["A30", "S210"]);
    }

    #[test]
    fn test_expected_approach() {
        assert_eq!(expected_approach("EI22L"), Some("I22L"));
        assert_eq!(expected_approach("EI22L/LAHSO4"), Some("I22L"));
        assert_eq!(expected_approach("E"), None);
        assert_eq!(expected_approach("D80"), None);
    }

    #[test]
    fn test_expected_approach_fixes_become_available() {
        let mut ac = aircraft(6000);
        ac.candidate_approaches = map(&[("i l s runway two two left", "I22L")]);
        ac.approach_fixes = BTreeMap::from([("I22L".to_string(), map(&[("zulab", "ZULAB")]))]);
        assert_eq!(
            parse("expect ils runway two two left and direct zulab", &ac),
            vec!["EI22L", "DZULAB"]
        );
    }

    #[test]
    fn test_resolver_prefers_priority_then_length() {
        let registry = Registry::builder()
            .template(CommandTemplate::new("short", "fly heading {heading}", "H{0:03}"))
            .template(CommandTemplate::new("long", "fly heading {heading} degrees", "X{0:03}"))
            .template(CommandTemplate::new("low", "fly {text}", "F{0}").priority(1))
            .build()
            .unwrap();
        let ac = aircraft(5000);
        let ctx = ParseContext {
            aircraft: &ac,
            data: &*DATA,
        };
        let found = resolve(&registry, &tokens("fly heading 270 degrees"), 0, &ctx, false).unwrap();
        assert_eq!(found.command, "X270");
        assert_eq!(found.consumed, 4);
    }

    #[test]
    fn test_nothing_parsed() {
        let parsed = parse_commands(default_registry(), &tokens("blark bling"), &aircraft(5000), &*DATA);
        assert!(parsed.commands.is_empty());
        assert_eq!(parsed.confidence, 0.0);
    }
}
