//! Transcript decoding: normalize, tokenize, find the callsign, parse and
//! validate the commands, and format the response line.

use std::{borrow::Cow, fmt::Display};

use aviation_helper_rs::{AircraftMap, AviationData, SttAircraft};
use log::{debug, info, warn};

use crate::{
    callsign::{CallsignMatch, CompiledPattern, match_callsign},
    commands::{ParsedCommands, parse_commands},
    normalize::normalize,
    parsers::is_command_keyword,
    registry::{Registry, default_registry},
    similarity::{fuzzy_match, jaro_winkler, phonetic_match},
    tokenize::{Token, TokenKind, tokenize, tokens_to_string},
    validate::{ValidationResult, validate_commands},
    vocabulary::vocabulary,
};

/// Tokens searched for "negative, that was for".
const NEGATIVE_WINDOW: usize = 3;
/// Tokens after the callsign searched for "not for you" / "correction".
const NOT_FOR_YOU_WINDOW: usize = 4;
/// Tokens after the callsign that may hold a position identification.
const POSITION_ID_WINDOW: usize = 5;
/// Similarity needed between a heard facility name and the radio name.
const RADIO_NAME_THRESHOLD: f64 = 0.8;
/// Match confidence needed to treat the words after a callsign as the
/// callsign said again.
const REPEAT_CONFIDENCE: f64 = 0.9;

/// What the aircraft should do with a transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutput {
    /// Nothing to answer: no callsign, acknowledgment, disregard, ...
    Ignored,
    /// Undo the previous command, optionally followed by the commands meant
    /// for the right aircraft.
    Rollback(Option<(String, Vec<String>)>),
    Commands {
        callsign: String,
        commands: Vec<String>,
    },
    /// The aircraft was called but nothing usable followed.
    SayAgain { callsign: String },
}

impl Display for DecodeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeOutput::Ignored => Ok(()),
            DecodeOutput::Rollback(None) => write!(f, "ROLLBACK"),
            DecodeOutput::Rollback(Some((callsign, commands))) => {
                write!(f, "ROLLBACK {callsign} {}", commands.join(" "))
            }
            DecodeOutput::Commands { callsign, commands } => {
                write!(f, "{callsign} {}", commands.join(" "))
            }
            DecodeOutput::SayAgain { callsign } => write!(f, "{callsign} AGAIN"),
        }
    }
}

/// Every stage's result for one transcript, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DecodeDetails {
    pub tokens: Vec<Token>,
    pub callsign: Option<CallsignMatch>,
    /// Commands as parsed, before validation.
    pub parsed: Vec<String>,
    pub command_confidence: f64,
    pub validation: ValidationResult,
    /// Callsign, parse and validation confidence multiplied.
    pub confidence: f64,
}

pub struct TranscriptDecoder {
    registry: Cow<'static, Registry>,
    data: Box<dyn AviationData>,
}

impl TranscriptDecoder {
    /// Decoder over the built-in templates and callsign patterns.
    pub fn new(data: impl AviationData + 'static) -> Self {
        Self {
            registry: Cow::Borrowed(default_registry()),
            data: Box::new(data),
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Cow::Owned(registry);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode one transmission to `<CALLSIGN> <CMD>...`, `<CALLSIGN> AGAIN`,
    /// a `ROLLBACK` line, or an empty string when no answer is needed.
    pub fn decode(&self, aircraft: &AircraftMap, transcript: &str, radio_name: &str) -> String {
        let output = self.decode_transmission(aircraft, transcript, radio_name);
        let line = output.to_string();
        info!("{transcript:?} -> {line:?}");
        line
    }

    pub fn decode_transmission(
        &self,
        aircraft: &AircraftMap,
        transcript: &str,
        radio_name: &str,
    ) -> DecodeOutput {
        let Some(tokens) = self.tokens(transcript) else {
            return DecodeOutput::Ignored;
        };
        if aircraft.is_empty() {
            debug!("No aircraft on frequency");
            return DecodeOutput::Ignored;
        }
        let patterns = self.registry.patterns();

        if let Some(after) = after_negative_that_was_for(&tokens) {
            debug!("'negative, that was for' at the start, rolling back");
            let Some(found) = match_callsign(after, aircraft, patterns) else {
                return DecodeOutput::Rollback(None);
            };
            let ac = aircraft.get(&found.spoken_key).cloned().unwrap_or_default();
            let remaining = skip_repeated_callsign(after, &found, aircraft, patterns);
            let validated = self.parse_and_validate(remaining, &ac).1;
            if validated.commands.is_empty() {
                return DecodeOutput::Rollback(None);
            }
            return DecodeOutput::Rollback(Some((
                found.addressed_callsign(),
                validated.commands,
            )));
        }

        let Some(mut found) = match_callsign(&tokens, aircraft, patterns) else {
            debug!("No callsign in {transcript:?}");
            return DecodeOutput::Ignored;
        };
        debug!(
            "Callsign {} ({:?}, confidence {:.2}, consumed {})",
            found.callsign, found.spoken_key, found.confidence, found.consumed
        );
        let mut remaining = skip_repeated_callsign(&tokens, &found, aircraft, patterns);

        if let Some(after) = after_not_for_you(remaining) {
            debug!("'not for you' after {}, matching again", found.callsign);
            if let Some(corrected) = match_callsign(after, aircraft, patterns) {
                remaining = skip_repeated_callsign(after, &corrected, aircraft, patterns);
                found = corrected;
            }
        }

        let callsign = found.addressed_callsign();
        let ac = aircraft.get(&found.spoken_key).cloned().unwrap_or_default();
        debug!(
            "Context for {callsign}: state {:?}, altitude {}, {} fixes, {} approaches, assigned {:?}",
            ac.state.to_string(),
            ac.altitude,
            ac.fixes.len(),
            ac.candidate_approaches.len(),
            ac.assigned_approach
        );

        if is_disregard_only(remaining) {
            debug!("Disregard only");
            return DecodeOutput::Ignored;
        }
        let command_tokens = apply_disregard(remaining);
        if is_acknowledgment_only(&command_tokens) {
            debug!("Acknowledgment only");
            return DecodeOutput::Ignored;
        }
        if is_position_identification(&command_tokens, radio_name) {
            debug!("Position identification for {radio_name:?}");
            return DecodeOutput::Ignored;
        }
        let command_tokens = strip_altimeter_suffix(strip_radar_contact_prefix(
            strip_position_id_prefix(&command_tokens),
        ));
        if command_tokens.is_empty() {
            debug!("Nothing left after position identification");
            return DecodeOutput::Ignored;
        }
        if is_radar_contact_only(command_tokens) || is_acknowledgment_only(command_tokens) {
            debug!("Radar contact or acknowledgment only");
            return DecodeOutput::Ignored;
        }

        let (parsed, validated) = self.parse_and_validate(command_tokens, &ac);
        debug!(
            "Overall confidence {:.2}",
            found.confidence * parsed.confidence * validated.confidence
        );
        if validated.commands.is_empty() {
            DecodeOutput::SayAgain { callsign }
        } else {
            DecodeOutput::Commands {
                callsign,
                commands: validated.commands,
            }
        }
    }

    /// Parse a transmission repeated without callsign for the aircraft that
    /// answered `AGAIN`. Returns the commands alone, `AGAIN`, or an empty
    /// string for an empty transcript.
    pub fn decode_for_callsign(
        &self,
        aircraft: &AircraftMap,
        transcript: &str,
        callsign: &str,
    ) -> String {
        let Some(tokens) = self.tokens(transcript) else {
            return String::new();
        };
        let Some(ac) = find_by_callsign(aircraft, callsign) else {
            warn!("No context for fallback callsign {callsign:?}");
            return "AGAIN".to_string();
        };
        let validated = self.parse_and_validate(&tokens, ac).1;
        let line = if validated.commands.is_empty() {
            "AGAIN".to_string()
        } else {
            validated.commands.join(" ")
        };
        info!("{transcript:?} for {callsign} -> {line:?}");
        line
    }

    /// Run the pipeline without the correction and acknowledgment handling
    /// and keep every intermediate result.
    pub fn decode_details(&self, aircraft: &AircraftMap, transcript: &str) -> DecodeDetails {
        let Some(tokens) = self.tokens(transcript) else {
            return DecodeDetails::default();
        };
        let patterns = self.registry.patterns();
        let Some(found) = match_callsign(&tokens, aircraft, patterns) else {
            return DecodeDetails {
                tokens,
                ..Default::default()
            };
        };
        let ac = aircraft.get(&found.spoken_key).cloned().unwrap_or_default();
        let remaining = skip_repeated_callsign(&tokens, &found, aircraft, patterns);
        let (parsed, validation) = self.parse_and_validate(remaining, &ac);
        DecodeDetails {
            confidence: found.confidence * parsed.confidence * validation.confidence,
            command_confidence: parsed.confidence,
            parsed: parsed.commands,
            callsign: Some(found),
            validation,
            tokens,
        }
    }

    fn tokens(&self, transcript: &str) -> Option<Vec<Token>> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return None;
        }
        let words = normalize(transcript);
        debug!("Normalized: {words:?}");
        let tokens = tokenize(&words);
        debug!("Tokens: {}", tokens_to_string(&tokens));
        (!tokens.is_empty()).then_some(tokens)
    }

    fn parse_and_validate(
        &self,
        tokens: &[Token],
        aircraft: &SttAircraft,
    ) -> (ParsedCommands, ValidationResult) {
        let parsed = parse_commands(&self.registry, tokens, aircraft, self.data.as_ref());
        let validated = validate_commands(&parsed.commands, aircraft);
        debug!(
            "Parsed {:?} ({:.2}), validated {:?} ({:.2})",
            parsed.commands, parsed.confidence, validated.commands, validated.confidence
        );
        if !validated.errors.is_empty() {
            let errors: Vec<String> = validated.errors.iter().map(ToString::to_string).collect();
            debug!("Validation errors: {errors:?}");
        }
        (parsed, validated)
    }
}

/// Context of the aircraft with this callsign, by map key or callsign.
fn find_by_callsign<'a>(aircraft: &'a AircraftMap, callsign: &str) -> Option<&'a SttAircraft> {
    aircraft.get(callsign).or_else(|| {
        aircraft
            .values()
            .find(|ac| ac.callsign == callsign || ac.base_callsign() == callsign)
    })
}

/// Tokens after "negative|no [that] was for" near the start.
/// The tokens after `found`, without an immediate repeat of the same
/// callsign ("united 123, united 123, turn left").
fn skip_repeated_callsign<'t>(
    tokens: &'t [Token],
    found: &CallsignMatch,
    aircraft: &AircraftMap,
    patterns: &[CompiledPattern],
) -> &'t [Token] {
    let remaining = tokens.get(found.consumed..).unwrap_or_default();
    match match_callsign(remaining, aircraft, patterns) {
        Some(repeat)
            if repeat.spoken_key == found.spoken_key && repeat.confidence >= REPEAT_CONFIDENCE =>
        {
            debug!("{} said twice", found.callsign);
            remaining.get(repeat.consumed..).unwrap_or_default()
        }
        _ => remaining,
    }
}

fn after_negative_that_was_for(tokens: &[Token]) -> Option<&[Token]> {
    (0..tokens.len().min(NEGATIVE_WINDOW)).find_map(|i| {
        if !tokens[i].is("negative") && !tokens[i].is("no") {
            return None;
        }
        let rest = &tokens[i + 1..];
        let starts_with = |phrase: &[&str]| {
            rest.len() >= phrase.len() && rest.iter().zip(phrase).all(|(t, w)| t.is(w))
        };
        if starts_with(&["that", "was", "for"]) {
            Some(&rest[3..])
        } else if starts_with(&["was", "for"]) {
            Some(&rest[2..])
        } else {
            None
        }
    })
}

fn is_correction(token: &Token) -> bool {
    token.is("correction")
        || jaro_winkler(&token.text, "correction") > 0.9
        || phonetic_match(&token.text, "correction")
}

/// Tokens after "not for you" or "correction" right behind the callsign.
fn after_not_for_you(tokens: &[Token]) -> Option<&[Token]> {
    (0..tokens.len().min(NOT_FOR_YOU_WINDOW)).find_map(|i| {
        let not_for_you = tokens
            .get(i..i + 3)
            .is_some_and(|w| w[0].is("not") && w[1].is("for") && w[2].is("you"));
        if not_for_you {
            Some(&tokens[i + 3..])
        } else if is_correction(&tokens[i]) {
            Some(&tokens[i + 1..])
        } else {
            None
        }
    })
}

fn is_disregard_only(tokens: &[Token]) -> bool {
    let vocab = vocabulary();
    tokens.iter().any(|t| t.is("disregard"))
        && tokens
            .iter()
            .all(|t| t.is("disregard") || vocab.is_filler(&t.text))
}

/// Command keyword the corrected value belongs to, looking back from the
/// correction ("fly heading 270 correction 290" → "heading").
fn corrected_keyword(tokens: &[Token]) -> Option<&'static str> {
    let mut altitude_keyword = None;
    for (i, token) in tokens.iter().enumerate().rev() {
        let w = token.text.as_str();
        if fuzzy_match(w, "heading", 0.85)
            || fuzzy_match(w, "fly", 0.8)
            || fuzzy_match(w, "flight", 0.8)
            || w == "turn"
        {
            return Some("heading");
        }
        if fuzzy_match(w, "speed", 0.85)
            || matches!(w, "reduce" | "slow" | "increase")
            || fuzzy_match(w, "knots", 0.85)
        {
            return Some("speed");
        }
        if fuzzy_match(w, "descend", 0.85) {
            return Some("descend");
        }
        if fuzzy_match(w, "climb", 0.85) {
            return Some("climb");
        }
        if w == "altitude" {
            return Some("maintain");
        }
        if w == "maintain" && altitude_keyword.is_none() {
            let speed_follows = tokens[i + 1..]
                .iter()
                .take_while(|t| !matches!(t.text.as_str(), "thousand" | "hundred" | "feet" | "level"))
                .any(|t| t.is("speed") || t.is("knots"));
            if speed_follows {
                return Some("speed");
            }
            altitude_keyword = Some("maintain");
        }
    }
    altitude_keyword
}

/// Drop what a "disregard" or "correction" takes back. A correction
/// followed by a command replaces everything before it; one followed by
/// bare numbers only replaces the numbers before it.
fn apply_disregard(tokens: &[Token]) -> Vec<Token> {
    for i in (0..tokens.len()).rev() {
        if tokens[i].is("disregard") {
            return tokens[i + 1..].to_vec();
        }
        if !tokens[i].is("correction") {
            continue;
        }
        let after = &tokens[i + 1..];
        let has_command = after.iter().enumerate().any(|(j, t)| {
            // "two two left" is a runway, not a turn
            let runway_side = (t.is("left") || t.is("right"))
                && j > 0
                && after[j - 1].kind == TokenKind::Number;
            !runway_side && is_command_keyword(&t.text)
        });
        if has_command {
            let starts_with_value = after
                .first()
                .is_some_and(|t| matches!(t.kind, TokenKind::Number | TokenKind::Altitude));
            if starts_with_value {
                if let Some(keyword) = corrected_keyword(&tokens[..i]) {
                    debug!("Correction keeps keyword {keyword:?}");
                    let mut corrected = vec![Token::word(keyword, tokens[i].pos)];
                    corrected.extend_from_slice(after);
                    return corrected;
                }
            }
            return after.to_vec();
        }

        // "contact departure 12, correction 126.8"
        let mut start = i;
        while start > 0
            && (tokens[start - 1].kind == TokenKind::Number || tokens[start - 1].is("point"))
        {
            start -= 1;
        }
        let mut corrected = tokens[..start].to_vec();
        corrected.extend_from_slice(after);
        return corrected;
    }
    tokens.to_vec()
}

fn is_acknowledgment_only(tokens: &[Token]) -> bool {
    let vocab = vocabulary();
    tokens
        .iter()
        .any(|t| vocab.acknowledgment_words.contains(&t.text))
        && tokens.iter().all(|t| {
            vocab.acknowledgment_words.contains(&t.text) || vocab.is_filler(&t.text)
        })
}

fn is_radar_contact_only(tokens: &[Token]) -> bool {
    let has_radar_contact = tokens
        .windows(2)
        .any(|w| w[0].is("radar") && w[1].is("contact"));
    has_radar_contact
        && tokens
            .iter()
            .filter(|t| !t.is("radar") && !t.is("contact"))
            .all(|t| !is_command_keyword(&t.text))
}

/// Name part and facility of a radio name ("new york departure" →
/// ("new york", "departure")).
fn split_facility<'a>(words: &[&'a str]) -> Option<(Vec<&'a str>, &'a str)> {
    let facilities = &vocabulary().radio_facilities;
    let idx = words
        .iter()
        .position(|w| facilities.iter().any(|f| f == w))?;
    Some((words[..idx].to_vec(), words[idx]))
}

/// The controller naming their own position ("New York approach") with
/// nothing else to say. The facility may differ from the radio name's.
fn is_position_identification(tokens: &[Token], radio_name: &str) -> bool {
    let radio_name = radio_name.trim().to_lowercase();
    if radio_name.is_empty() {
        return false;
    }
    let vocab = vocabulary();
    let radio_words: Vec<&str> = radio_name.split_whitespace().collect();
    let Some((radio_stem, _)) = split_facility(&radio_words) else {
        return false;
    };
    let words: Vec<&str> = tokens
        .iter()
        .map(|t| t.text.as_str())
        .filter(|w| !vocab.is_filler(w))
        .collect();
    if words.iter().any(|w| vocab.position_command_words.contains(*w)) {
        return false;
    }
    let Some((heard_stem, facility)) = split_facility(&words) else {
        return false;
    };
    let after_facility = words
        .iter()
        .skip_while(|w| **w != facility)
        .skip(1)
        .all(|w| vocab.acknowledgment_words.contains(*w) || vocab.goodbye_words.contains(*w));
    !heard_stem.is_empty()
        && after_facility
        && jaro_winkler(&heard_stem.join(" "), &radio_stem.join(" ")) >= RADIO_NAME_THRESHOLD
}

/// Drop "<name> departure|approach|center" right after the callsign.
fn strip_position_id_prefix(tokens: &[Token]) -> &[Token] {
    let vocab = vocabulary();
    for (i, token) in tokens.iter().take(POSITION_ID_WINDOW).enumerate() {
        if vocab.position_command_words.contains(&token.text) {
            return tokens;
        }
        if vocab.position_suffixes.contains(&token.text) {
            debug!("Stripped position identification ({} tokens)", i + 1);
            return &tokens[i + 1..];
        }
    }
    tokens
}

fn strip_radar_contact_prefix(tokens: &[Token]) -> &[Token] {
    match tokens {
        [radar, contact, rest @ ..] if radar.is("radar") && contact.is("contact") => rest,
        _ => tokens,
    }
}

/// Drop a trailing "[airport] altimeter <setting>".
fn strip_altimeter_suffix(tokens: &[Token]) -> &[Token] {
    let n = tokens.len();
    if n < 2 || !tokens[n - 2].is("altimeter") || tokens[n - 1].kind != TokenKind::Number {
        return tokens;
    }
    let mut start = n - 2;
    if start > 0
        && tokens[start - 1].kind == TokenKind::Word
        && !is_command_keyword(&tokens[start - 1].text)
    {
        start -= 1;
    }
    debug!("Stripped altimeter setting ({} tokens)", n - start);
    &tokens[..start]
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use aviation_helper_rs::{AddressingForm, AircraftState, StaticAviationData};

    use super::*;
    use crate::{
        callsign::CallsignPattern, parsers::test_support::tokens, template::CommandTemplate,
    };

    static DECODER: LazyLock<TranscriptDecoder> =
        LazyLock::new(|| TranscriptDecoder::new(StaticAviationData::default()));

    fn aircraft(callsign: &str, altitude: i32, state: AircraftState) -> SttAircraft {
        SttAircraft {
            callsign: callsign.to_string(),
            altitude,
            state,
            ..Default::default()
        }
    }

    fn context(entries: &[(&str, SttAircraft)]) -> AircraftMap {
        entries
            .iter()
            .map(|(key, ac)| (key.to_string(), ac.clone()))
            .collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_decode_commands() {
        let ctx = context(&[(
            "American 5936",
            aircraft("AAL5936", 12000, AircraftState::Arrival),
        )]);
        assert_eq!(
            DECODER.decode(&ctx, "American 5936 descend and maintain 8000", ""),
            "AAL5936 D80"
        );

        let ctx = context(&[(
            "JetBlue 789",
            aircraft("JBU789", 15000, AircraftState::Arrival),
        )]);
        assert_eq!(
            DECODER.decode(
                &ctx,
                "JetBlue 789 reduce speed to two five zero then descend and maintain one zero thousand",
                ""
            ),
            "JBU789 S250 TD100"
        );
    }

    #[test]
    fn test_decode_say_again_and_ignored() {
        let ctx = context(&[(
            "American 123",
            aircraft("AAL123", 10000, AircraftState::Arrival),
        )]);
        assert_eq!(
            DECODER.decode(
                &ctx,
                "American 123 descend and maintain five thousand fly heading blark bling",
                ""
            ),
            "AAL123 D50 SAYAGAIN/HEADING"
        );
        assert_eq!(DECODER.decode(&ctx, "American 123 blark bling", ""), "AAL123 AGAIN");
        assert_eq!(DECODER.decode(&ctx, "   ", ""), "");
        assert_eq!(DECODER.decode(&ctx, "blark bling", ""), "");
        assert_eq!(DECODER.decode(&ctx, "American 123 roger", ""), "");
        assert_eq!(DECODER.decode(&ctx, "American 123 disregard", ""), "");
        assert_eq!(DECODER.decode(&ctx, "American 123 radar contact", ""), "");
        assert_eq!(
            DECODER.decode(&AircraftMap::new(), "American 123 descend and maintain 8000", ""),
            ""
        );
    }

    #[test]
    fn test_decode_rollback() {
        let ctx = context(&[
            ("Delta 456", aircraft("DAL456", 9000, AircraftState::Arrival)),
            ("United 123", aircraft("UAL123", 9000, AircraftState::Arrival)),
        ]);
        assert_eq!(
            DECODER.decode(
                &ctx,
                "Negative that was for United 123. United 123, turn left heading 270",
                ""
            ),
            "ROLLBACK UAL123 L270"
        );
        assert_eq!(DECODER.decode(&ctx, "negative that was for blark", ""), "ROLLBACK");
    }

    #[test]
    fn test_repeated_callsign_is_not_a_command() {
        let ctx = context(&[
            ("Delta 456", aircraft("DAL456", 9000, AircraftState::Arrival)),
            ("United 123", aircraft("UAL123", 9000, AircraftState::Arrival)),
        ]);
        assert_eq!(
            DECODER.decode(&ctx, "United 123 United 123 turn left heading 270", ""),
            "UAL123 L270"
        );
        let details = DECODER.decode_details(&ctx, "United 123, United 123, turn left heading 270");
        assert_eq!(details.parsed, vec!["L270"]);

        let patterns = DECODER.registry().patterns();
        let toks = tokens("united 123 united 123 turn left heading 270");
        let Some(found) = match_callsign(&toks, &ctx, patterns) else {
            panic!("Expected a callsign");
        };
        let rest = skip_repeated_callsign(&toks, &found, &ctx, patterns);
        assert_eq!(texts(rest), vec!["turn", "left", "heading", "270"]);
        // another aircraft's callsign is left alone
        let toks = tokens("united 123 delta 456 turn left heading 270");
        let Some(found) = match_callsign(&toks, &ctx, patterns) else {
            panic!("Expected a callsign");
        };
        assert_eq!(skip_repeated_callsign(&toks, &found, &ctx, patterns).len(), 6);
    }

    #[test]
    fn test_decode_type_trailing_callsign() {
        let ctx = context(&[(
            "skyhawk 3 alpha bravo",
            SttAircraft {
                addressing_form: AddressingForm::TypeTrailing3,
                ..aircraft("N123AB", 4500, AircraftState::VfrFlightFollowing)
            },
        )]);
        assert_eq!(
            DECODER.decode(&ctx, "skyhawk 3 alpha bravo turn left heading 270", ""),
            "N123AB/T L270"
        );
    }

    #[test]
    fn test_decode_for_callsign() {
        let ctx = context(&[(
            "American 5936",
            aircraft("AAL5936", 12000, AircraftState::Arrival),
        )]);
        assert_eq!(
            DECODER.decode_for_callsign(&ctx, "descend and maintain 8000", "AAL5936"),
            "D80"
        );
        assert_eq!(DECODER.decode_for_callsign(&ctx, "blark bling", "AAL5936"), "AGAIN");
        assert_eq!(
            DECODER.decode_for_callsign(&ctx, "descend and maintain 8000", "UAL1"),
            "AGAIN"
        );
        assert_eq!(DECODER.decode_for_callsign(&ctx, "", "AAL5936"), "");
    }

    #[test]
    fn test_decode_with_custom_registry() {
        let registry = Registry::builder()
            .template(CommandTemplate::new("squawk", "squawk {squawk}", "SQ{0}"))
            .callsign_pattern(CallsignPattern::new("exact", "{exact_phrase}"))
            .build()
            .unwrap();
        let decoder = TranscriptDecoder::new(StaticAviationData::default()).with_registry(registry);
        let ctx = context(&[(
            "American 5936",
            aircraft("AAL5936", 12000, AircraftState::Arrival),
        )]);
        assert_eq!(
            decoder.decode(&ctx, "American 5936 descend and maintain 8000", ""),
            "AAL5936 AGAIN"
        );
        assert_eq!(decoder.decode(&ctx, "uh American 5936 descend", ""), "");

        let empty = TranscriptDecoder::new(StaticAviationData::default()).with_registry(Registry::empty());
        assert_eq!(empty.decode(&ctx, "American 5936 descend and maintain 8000", ""), "");
    }

    #[test]
    fn test_decode_details() {
        let ctx = context(&[(
            "American 5936",
            aircraft("AAL5936", 5000, AircraftState::Arrival),
        )]);
        let details = DECODER.decode_details(&ctx, "American 5936 descend and maintain 8000");
        assert_eq!(details.callsign.map(|c| c.callsign).as_deref(), Some("AAL5936"));
        assert_eq!(details.parsed, vec!["D80"]);
        assert_eq!(details.validation.commands, vec!["SAYAGAIN/ALTITUDE"]);
        assert_eq!(details.validation.errors.len(), 1);
        assert!(details.confidence < 1.0);
    }

    #[test]
    fn test_negative_that_was_for() {
        let toks = tokens("negative was for united 1");
        assert_eq!(after_negative_that_was_for(&toks).map(texts), Some(vec!["united", "1"]));
        assert!(after_negative_that_was_for(&tokens("descend that was for")).is_none());
    }

    #[test]
    fn test_not_for_you() {
        let toks = tokens("that was not for you virgin 47");
        assert_eq!(after_not_for_you(&toks).map(texts), Some(vec!["virgin", "47"]));
        assert!(after_not_for_you(&tokens("descend and maintain 8000")).is_none());
    }

    #[test]
    fn test_apply_disregard() {
        let result = apply_disregard(&tokens("turn left disregard descend and maintain 8000"));
        assert_eq!(texts(&result)[0], "descend");

        // a bare number only replaces the number before it
        let result = apply_disregard(&tokens("fly heading 270 correction 290"));
        assert_eq!(texts(&result), vec!["fly", "heading", "290"]);

        let result = apply_disregard(&tokens(
            "descend and maintain 5000 correction 6000 then reduce speed to 210",
        ));
        assert_eq!(texts(&result)[0], "descend");
        assert_eq!(result[1].kind, TokenKind::Altitude);

        let result = apply_disregard(&tokens("fly heading 270 correction climb and maintain 9000"));
        assert_eq!(texts(&result)[0], "climb");
    }

    #[test]
    fn test_corrected_keyword() {
        assert_eq!(corrected_keyword(&tokens("descend and maintain")), Some("descend"));
        assert_eq!(corrected_keyword(&tokens("reduce speed to")), Some("speed"));
        assert_eq!(corrected_keyword(&tokens("maintain")), Some("maintain"));
        assert_eq!(corrected_keyword(&tokens("squawk")), None);
    }

    #[test]
    fn test_acknowledgment_and_radar_contact() {
        assert!(is_acknowledgment_only(&tokens("roger")));
        assert!(!is_acknowledgment_only(&tokens("roger descend")));
        assert!(!is_acknowledgment_only(&[]));
        assert!(is_radar_contact_only(&tokens("in radar contact")));
        assert!(!is_radar_contact_only(&tokens("radar contact descend and maintain 8000")));
    }

    #[test]
    fn test_position_identification() {
        assert!(is_position_identification(
            &tokens("new york approach"),
            "New York Departure"
        ));
        assert!(!is_position_identification(
            &tokens("new york approach descend and maintain 8000"),
            "New York Departure"
        ));
        assert!(!is_position_identification(&tokens("boston center"), "New York Departure"));
        assert!(!is_position_identification(&tokens("new york approach"), ""));
    }

    #[test]
    fn test_prefix_and_suffix_stripping() {
        let toks = tokens("new york departure radar contact climb and maintain 9000");
        let stripped = strip_radar_contact_prefix(strip_position_id_prefix(&toks));
        assert_eq!(texts(stripped)[0], "climb");

        let toks = tokens("descend and maintain 8000 altimeter 2992");
        assert_eq!(strip_altimeter_suffix(&toks).len(), toks.len() - 2);
    }
}
