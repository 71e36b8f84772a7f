//! Command output formats: literal text with `{n}` placeholders for the
//! template's n-th extracted value, `{n:03}` for zero padded integers.

use crate::{errors::Error, parsers::Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Value { index: usize, width: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pieces: Vec<Piece>,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self, Error> {
        let error = |reason: String| Error::TemplateSyntax {
            template: format.to_string(),
            reason,
        };
        let mut pieces = Vec::new();
        let mut rest = format;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                pieces.push(Piece::Text(rest[..open].to_string()));
            }
            let close = rest[open..]
                .find('}')
                .ok_or_else(|| error("unmatched '{' in output".to_string()))?
                + open;
            let placeholder = &rest[open + 1..close];
            let (index, width) = match placeholder.split_once(':') {
                Some((index, width)) => (index, width),
                None => (placeholder, "0"),
            };
            let index = index
                .parse()
                .map_err(|_| error(format!("bad output placeholder {{{placeholder}}}")))?;
            let width = width
                .parse()
                .map_err(|_| error(format!("bad output width {{{placeholder}}}")))?;
            pieces.push(Piece::Value { index, width });
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Text(rest.to_string()));
        }
        Ok(Self { pieces })
    }

    /// Number of values the format expects.
    pub fn arity(&self) -> usize {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Value { index, .. } => Some(index + 1),
                Piece::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Values left out by an optional group render as nothing.
    pub fn render(&self, values: &[Option<Value>]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Value { index, width } => match values.get(*index).and_then(Option::as_ref) {
                    Some(Value::Int(n)) => out.push_str(&format!("{n:0width$}", width = *width)),
                    Some(value) => out.push_str(&value.to_string()),
                    None => {}
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let heading = OutputFormat::parse("L{0:03}").unwrap();
        assert_eq!(heading.arity(), 1);
        assert_eq!(heading.render(&[Some(Value::Int(90))]), "L090");

        let cross = OutputFormat::parse("C{0}/A{1}+").unwrap();
        let values = [Some(Value::Text("CAMRN".to_string())), Some(Value::Int(80))];
        assert_eq!(cross.render(&values), "CCAMRN/A80+");

        let fixed = OutputFormat::parse("SMIN").unwrap();
        assert_eq!(fixed.arity(), 0);
        assert_eq!(fixed.render(&[]), "SMIN");

        assert_eq!(OutputFormat::parse("").unwrap().render(&[]), "");
        assert_eq!(OutputFormat::parse("D{0}").unwrap().render(&[None]), "D");
    }

    #[test]
    fn test_bad_formats() {
        assert!(OutputFormat::parse("L{0").is_err());
        assert!(OutputFormat::parse("L{x}").is_err());
        assert!(OutputFormat::parse("L{0:x}").is_err());
    }
}
