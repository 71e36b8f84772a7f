//! Template grammar.
//!
//! - `word` and `word|alt`: literal, fuzzy matched
//! - `[words]`: optional literals, one per word
//! - `{type}`: typed hole, filled by a [`TypeParser`](crate::parsers::TypeParser)
//! - `[word {type}]`: optional group, all or nothing

use crate::errors::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Literal(Vec<String>),
    OptionalLiteral(Vec<String>),
    Typed(String),
    OptionalGroup(Vec<Element>),
}

fn syntax_error(template: &str, reason: impl Into<String>) -> Error {
    Error::TemplateSyntax {
        template: template.to_string(),
        reason: reason.into(),
    }
}

fn alternatives(word: &str) -> Vec<String> {
    word.split('|').map(str::to_string).collect()
}

/// Index of the `]` closing the `[` at `open`.
fn matching_bracket(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, b) in s.bytes().enumerate().skip(open) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn parse_elements(template: &str) -> Result<Vec<Element>, Error> {
    let source = template.trim();
    let mut elements = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        match rest.as_bytes()[0] {
            b' ' => pos += 1,
            b'[' => {
                let end = matching_bracket(source, pos)
                    .ok_or_else(|| syntax_error(template, format!("unmatched '[' at {pos}")))?;
                let inner = &source[pos + 1..end];
                if inner.contains('{') {
                    let group = parse_elements(inner)?;
                    elements.push(Element::OptionalGroup(group));
                } else {
                    elements.extend(
                        inner
                            .split_whitespace()
                            .map(|word| Element::OptionalLiteral(alternatives(word))),
                    );
                }
                pos = end + 1;
            }
            b'{' => {
                let end = rest
                    .find('}')
                    .ok_or_else(|| syntax_error(template, format!("unmatched '{{' at {pos}")))?;
                let type_id = rest[1..end].trim();
                if type_id.is_empty() {
                    return Err(syntax_error(template, "empty type parser id"));
                }
                elements.push(Element::Typed(type_id.to_string()));
                pos += end + 1;
            }
            b']' | b'}' => {
                return Err(syntax_error(template, format!("unexpected '{}' at {pos}", &rest[..1])));
            }
            _ => {
                let end = rest.find([' ', '[', '{']).unwrap_or(rest.len());
                elements.push(Element::Literal(alternatives(&rest[..end])));
                pos += end;
            }
        }
    }

    if elements.is_empty() {
        return Err(syntax_error(template, "empty template"));
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_elements() {
        let elements = parse_elements("descend|descending [and] maintain {altitude_fl}").unwrap();
        assert_eq!(
            elements,
            vec![
                Element::Literal(words(&["descend", "descending"])),
                Element::OptionalLiteral(words(&["and"])),
                Element::Literal(words(&["maintain"])),
                Element::Typed("altitude_fl".to_string()),
            ]
        );
    }

    #[test]
    fn test_optional_group() {
        let elements = parse_elements("cross {fix} [at {altitude}] [or] above").unwrap();
        assert_eq!(elements.len(), 5);
        assert_eq!(
            elements[2],
            Element::OptionalGroup(vec![
                Element::Literal(words(&["at"])),
                Element::Typed("altitude".to_string()),
            ])
        );
        assert_eq!(elements[3], Element::OptionalLiteral(words(&["or"])));
    }

    #[test]
    fn test_syntax_errors() {
        for template in ["climb [and maintain", "{altitude", "", "  ", "climb ]", "heading {}"] {
            match parse_elements(template) {
                Err(Error::TemplateSyntax { .. }) => {}
                other => panic!("Expected syntax error for {template:?}, got {other:?}"),
            }
        }
    }
}
