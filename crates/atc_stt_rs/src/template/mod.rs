//! Declarative command templates.
//!
//! A [`CommandTemplate`] pairs a template string ("descend [and] maintain
//! {altitude_fl}") with an output format ("D{0}"). Compiling it resolves the
//! typed holes to [`TypeParser`]s; matching walks the compiled matchers over
//! the tokens and renders the output from the extracted values.

use aviation_helper_rs::clearance::aviation_command::{SAY_AGAIN_PREFIX, SayAgainKind};
use log::debug;

use crate::{
    errors::Error,
    parsers::{ParseContext, ParseOutcome, TypeParser, Value, is_command_keyword},
    similarity::fuzzy_match,
    tokenize::Token,
    vocabulary::vocabulary,
};

pub mod element;
pub mod output;

use element::{Element, parse_elements};
pub use output::OutputFormat;

pub const DEFAULT_PRIORITY: i32 = 5;
/// Garbage tokens a literal may skip when it is not the first matcher.
const MAX_SLACK: usize = 3;
const LITERAL_THRESHOLD: f64 = 0.80;
/// Literal threshold in front of an altitude spoken with "thousand" or
/// "flight level", so "claimed" does not pass for "climbed".
const STRICT_LITERAL_THRESHOLD: f64 = 0.95;
const SAY_AGAIN_CONFIDENCE: f64 = 0.5;

/// A command template as registered, before compilation.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    pub name: String,
    pub template: String,
    pub output: String,
    pub priority: i32,
    /// Output used after "then"; `None` means the command is never sequenced.
    pub then_variant: Option<String>,
    /// Ask the controller to repeat when the value after the keywords is unreadable.
    pub say_again_on_fail: bool,
}

impl CommandTemplate {
    pub fn new(name: &str, template: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            output: output.to_string(),
            priority: DEFAULT_PRIORITY,
            then_variant: None,
            say_again_on_fail: false,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn then_variant(mut self, output: &str) -> Self {
        self.then_variant = Some(output.to_string());
        self
    }

    pub fn say_again_on_fail(mut self) -> Self {
        self.say_again_on_fail = true;
        self
    }

    pub fn compile(self) -> Result<Template, Error> {
        let matchers = parse_elements(&self.template)?
            .iter()
            .map(|element| Matcher::compile(element, &self.template))
            .collect::<Result<Vec<_>, _>>()?;

        let values = matchers.iter().map(Matcher::value_count).sum::<usize>();
        let output = OutputFormat::parse(&self.output)?;
        let then_variant = self
            .then_variant
            .as_deref()
            .map(OutputFormat::parse)
            .transpose()?;
        let widest = output
            .arity()
            .max(then_variant.as_ref().map_or(0, OutputFormat::arity));
        if widest > values {
            return Err(Error::TemplateSyntax {
                template: self.template,
                reason: format!("output uses {widest} values, template extracts {values}"),
            });
        }

        Ok(Template {
            definition: self,
            matchers,
            output,
            then_variant,
        })
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(Vec<String>),
    OptionalLiteral(Vec<String>),
    Typed(TypeParser),
    OptionalGroup(Vec<Matcher>),
}

/// Outcome of one matcher: the position after it, or why it failed.
enum Step {
    Matched { end: usize, values: Vec<Option<Value>> },
    Failed(Option<SayAgainKind>),
}

impl Matcher {
    fn compile(element: &Element, template: &str) -> Result<Self, Error> {
        Ok(match element {
            Element::Literal(words) => Matcher::Literal(words.clone()),
            Element::OptionalLiteral(words) => Matcher::OptionalLiteral(words.clone()),
            Element::Typed(type_id) => {
                Matcher::Typed(TypeParser::from_id(type_id).ok_or_else(|| Error::UnknownTypeParser {
                    template: template.to_string(),
                    type_id: type_id.clone(),
                })?)
            }
            Element::OptionalGroup(inner) => Matcher::OptionalGroup(
                inner
                    .iter()
                    .map(|element| Matcher::compile(element, template))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn value_count(&self) -> usize {
        match self {
            Matcher::Typed(_) => 1,
            Matcher::OptionalGroup(inner) => inner.iter().map(Matcher::value_count).sum(),
            Matcher::Literal(_) | Matcher::OptionalLiteral(_) => 0,
        }
    }

    fn is_optional(&self) -> bool {
        matches!(self, Matcher::OptionalLiteral(_) | Matcher::OptionalGroup(_))
    }

    fn apply(&self, tokens: &[Token], pos: usize, ctx: &ParseContext, allow_slack: bool) -> Step {
        match self {
            Matcher::Literal(keywords) => match match_literal(tokens, pos, keywords, allow_slack) {
                Some(end) => Step::Matched {
                    end,
                    values: Vec::new(),
                },
                None => Step::Failed(None),
            },
            Matcher::OptionalLiteral(keywords) => Step::Matched {
                end: pos + usize::from(match_optional_literal(tokens, pos, keywords)),
                values: Vec::new(),
            },
            Matcher::Typed(parser) => {
                let pos = skip_fillers(tokens, pos);
                if pos >= tokens.len() {
                    return Step::Failed(None);
                }
                match parser.parse(tokens, pos, ctx) {
                    ParseOutcome::Parsed { value, consumed } if consumed > 0 => Step::Matched {
                        end: pos + consumed,
                        values: vec![Some(value)],
                    },
                    ParseOutcome::Parsed { .. } => Step::Failed(None),
                    ParseOutcome::Failed(kind) => Step::Failed(kind),
                }
            }
            Matcher::OptionalGroup(inner) => {
                let mut end = pos;
                let mut values = Vec::new();
                for (i, matcher) in inner.iter().enumerate() {
                    match matcher.apply(tokens, end, ctx, allow_slack && i > 0) {
                        Step::Matched {
                            end: next,
                            values: found,
                        } => {
                            end = next;
                            values.extend(found);
                        }
                        Step::Failed(_) => {
                            return Step::Matched {
                                end: pos,
                                values: vec![None; self.value_count()],
                            };
                        }
                    }
                }
                Step::Matched { end, values }
            }
        }
    }
}

fn skip_fillers(tokens: &[Token], mut pos: usize) -> usize {
    let vocab = vocabulary();
    while tokens.get(pos).is_some_and(|t| vocab.is_filler(&t.text)) {
        pos += 1;
    }
    pos
}

fn matches_any(text: &str, keywords: &[String], threshold: f64) -> bool {
    keywords
        .iter()
        .any(|keyword| fuzzy_match(text, keyword, threshold))
}

/// Position after the literal, if it matches at `pos` (after fillers) or,
/// with slack, a few garbage tokens later.
fn match_literal(tokens: &[Token], pos: usize, keywords: &[String], allow_slack: bool) -> Option<usize> {
    let pos = skip_fillers(tokens, pos);
    let token = tokens.get(pos)?;
    let threshold = if tokens.get(pos + 1).is_some_and(Token::is_spoken_altitude) {
        STRICT_LITERAL_THRESHOLD
    } else {
        LITERAL_THRESHOLD
    };
    if matches_any(&token.text.to_lowercase(), keywords, threshold) {
        return Some(pos + 1);
    }
    if !allow_slack {
        return None;
    }

    let vocab = vocabulary();
    for at in pos + 1..tokens.len().min(pos + MAX_SLACK + 1) {
        let text = tokens[at].text.to_lowercase();
        if vocab.is_filler(&text) {
            continue;
        }
        let ours = matches_any(&text, keywords, LITERAL_THRESHOLD);
        if ours {
            return Some(at + 1);
        }
        // another command starts here
        if is_command_keyword(&text) {
            break;
        }
    }
    None
}

/// Optional words never skip fillers. Short ones ("to", "at") must be
/// exact; longer ones must be of comparable length.
fn match_optional_literal(tokens: &[Token], pos: usize, keywords: &[String]) -> bool {
    let Some(token) = tokens.get(pos) else {
        return false;
    };
    let text = token.text.to_lowercase();
    keywords.iter().any(|keyword| {
        if keyword.len() <= 2 {
            return text == *keyword;
        }
        if text.len() > 2 * keyword.len() || keyword.len() > 2 * text.len() {
            return false;
        }
        fuzzy_match(&text, keyword, LITERAL_THRESHOLD)
    })
}

/// Whether a failed value is worth a say-again: something follows the
/// keywords and it is not another command, a facility name, an
/// informational word or a goodbye.
pub fn should_generate_say_again(tokens: &[Token], pos: usize) -> bool {
    let Some(next) = tokens.get(pos) else {
        return false;
    };
    let vocab = vocabulary();
    let text = next.text.to_lowercase();
    if is_command_keyword(&text) || vocab.facility_words.contains(&text) || vocab.info_words.contains(&text) {
        return false;
    }
    if text == "for"
        && tokens
            .get(pos + 1)
            .is_some_and(|after| vocab.info_words.contains(&after.text.to_lowercase()))
    {
        return false;
    }
    !vocab.goodbye_words.contains(&text)
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    pub definition: CommandTemplate,
    matchers: Vec<Matcher>,
    output: OutputFormat,
    then_variant: Option<OutputFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    /// Empty for informational phrases ("radar contact").
    pub command: String,
    pub confidence: f64,
    pub consumed: usize,
    pub is_say_again: bool,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn priority(&self) -> i32 {
        self.definition.priority
    }

    /// Match at `start`. The first matcher must line up with `start` (after
    /// fillers); later literals may skip a little garbage.
    pub fn try_match(
        &self,
        tokens: &[Token],
        start: usize,
        ctx: &ParseContext,
        is_then: bool,
    ) -> Option<TemplateMatch> {
        let mut pos = start;
        let mut values = Vec::new();

        for (i, matcher) in self.matchers.iter().enumerate() {
            match matcher.apply(tokens, pos, ctx, i > 0) {
                Step::Matched { end, values: found } => {
                    pos = end;
                    values.extend(found);
                }
                Step::Failed(kind) if !matcher.is_optional() => {
                    let kind = kind.filter(|_| {
                        i > 0 && self.definition.say_again_on_fail && should_generate_say_again(tokens, pos)
                    })?;
                    debug!("Template {} wants {kind} at {pos}", self.name());
                    return Some(TemplateMatch {
                        command: format!("{SAY_AGAIN_PREFIX}{kind}"),
                        confidence: SAY_AGAIN_CONFIDENCE,
                        consumed: pos - start,
                        is_say_again: true,
                    });
                }
                Step::Failed(_) => {}
            }
        }

        let command = match (&self.then_variant, is_then) {
            (Some(then_variant), true) => then_variant.render(&values),
            _ => self.output.render(&values),
        };
        Some(TemplateMatch {
            command,
            confidence: 1.0,
            consumed: pos - start,
            is_say_again: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use aviation_helper_rs::StaticAviationData;

    use super::*;
    use crate::parsers::test_support::*;

    fn compile(template: CommandTemplate) -> Template {
        template.compile().unwrap()
    }

    fn descend() -> Template {
        compile(
            CommandTemplate::new("descend_maintain", "descend [and] maintain {altitude_fl}", "D{0}")
                .priority(10)
                .then_variant("TD{0}")
                .say_again_on_fail(),
        )
    }

    #[test]
    fn test_compile_errors() {
        match CommandTemplate::new("bad", "descend {runway}", "D{0}").compile() {
            Err(Error::UnknownTypeParser { type_id, .. }) => assert_eq!(type_id, "runway"),
            other => panic!("Expected unknown type parser, got {other:?}"),
        }
        match CommandTemplate::new("bad", "descend", "D{0}").compile() {
            Err(Error::TemplateSyntax { .. }) => {}
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_match_and_then_variant() {
        let data = StaticAviationData::default();
        let ac = aircraft(12000);
        let ctx = ParseContext {
            aircraft: &ac,
            data: &data,
        };
        let tokens = tokens("descend and maintain 8000");
        let found = descend().try_match(&tokens, 0, &ctx, false).unwrap();
        assert_eq!(found.command, "D80");
        assert_eq!(found.consumed, 4);
        assert_eq!(found.confidence, 1.0);

        let found = descend().try_match(&tokens, 0, &ctx, true).unwrap();
        assert_eq!(found.command, "TD80");

        assert_eq!(descend().try_match(&tokens, 1, &ctx, false), None);
    }

    #[test]
    fn test_say_again() {
        let data = StaticAviationData::default();
        let ac = aircraft(12000);
        let ctx = ParseContext {
            aircraft: &ac,
            data: &data,
        };
        let heading = compile(
            CommandTemplate::new("fly_heading", "fly heading {heading}", "H{0:03}")
                .priority(9)
                .say_again_on_fail(),
        );
        let words: Vec<&str> = "fly heading blark bling".split(' ').collect();
        let tokens = crate::tokenize::tokenize(&words);
        let found = heading.try_match(&tokens, 0, &ctx, false).unwrap();
        assert_eq!(found.command, "SAYAGAIN/HEADING");
        assert_eq!(found.consumed, 2);
        assert!(found.is_say_again);

        // nothing after the keywords: not garbled, just cut off
        let words = ["fly", "heading"];
        let tokens = crate::tokenize::tokenize(&words);
        assert_eq!(heading.try_match(&tokens, 0, &ctx, false), None);
    }

    #[test]
    fn test_optional_group_values() {
        let data = StaticAviationData::default();
        let mut ac = aircraft(12000);
        ac.fixes = map(&[("camrn", "CAMRN")]);
        let ctx = ParseContext {
            aircraft: &ac,
            data: &data,
        };
        let cross = compile(CommandTemplate::new("cross", "cross {fix} [at {altitude}]", "C{0}/A{1}"));

        let toks = tokens("cross camrn at 8000");
        assert_eq!(cross.try_match(&toks, 0, &ctx, false).unwrap().command, "CCAMRN/A80");
        let toks = tokens("cross camrn");
        let found = cross.try_match(&toks, 0, &ctx, false).unwrap();
        assert_eq!((found.command.as_str(), found.consumed), ("CCAMRN/A", 2));
    }

    #[test]
    fn test_literal_slack() {
        let words: Vec<&str> = "intercept work the localizer".split(' ').collect();
        let tokens = crate::tokenize::tokenize(&words);
        let keywords = vec!["localizer".to_string()];
        assert_eq!(match_literal(&tokens, 1, &keywords, true), Some(4));
        assert_eq!(match_literal(&tokens, 1, &keywords, false), None);

        let words: Vec<&str> = "left approach speed localizer".split(' ').collect();
        let tokens = crate::tokenize::tokenize(&words);
        assert_eq!(match_literal(&tokens, 1, &keywords, true), None);
    }

    #[test]
    fn test_optional_literal() {
        let words: Vec<&str> = "torch direct".split(' ').collect();
        let tokens = crate::tokenize::tokenize(&words);
        assert!(!match_optional_literal(&tokens, 0, &["to".to_string()]));
        assert!(match_optional_literal(&tokens, 1, &["direct".to_string()]));
        assert!(!match_optional_literal(&tokens, 2, &["direct".to_string()]));
    }

    #[test]
    fn test_should_generate_say_again() {
        let words: Vec<&str> = "blark descend approach for sequence good".split(' ').collect();
        let tokens = crate::tokenize::tokenize(&words);
        assert!(should_generate_say_again(&tokens, 0));
        assert!(!should_generate_say_again(&tokens, 1));
        assert!(!should_generate_say_again(&tokens, 2));
        assert!(!should_generate_say_again(&tokens, 3));
        assert!(!should_generate_say_again(&tokens, 5));
        assert!(!should_generate_say_again(&tokens, 6));
    }
}
