//! Declarative callsign patterns.
//!
//! A pattern is a short template of placeholders, e.g. `{skip:3} {airline}
//! {flight}`, plus how its candidates are scored and which aircraft it may
//! consider at all.

use aviation_helper_rs::SttAircraft;

use crate::{
    errors::Error,
    template::element::{Element, parse_elements},
};

use super::matchers::CandidateScore;

pub const DEFAULT_CALLSIGN_PRIORITY: i32 = 50;

/// Which aircraft a pattern may match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Condition {
    #[default]
    Any,
    /// N-numbered general aviation.
    Ga,
    NotGa,
}

impl Condition {
    pub fn admits(self, aircraft: &SttAircraft) -> bool {
        match self {
            Condition::Any => true,
            Condition::Ga => aircraft.is_ga(),
            Condition::NotGa => !aircraft.is_ga(),
        }
    }
}

/// How a selected candidate turns into a confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scoring {
    /// `0.6 + 0.4 * mean(airline, flight)`.
    #[default]
    Default,
    /// Airline heard clearly but no flight number: needs an airline score of
    /// at least 0.7 and credits the flight with 0.5.
    AirlineOnly,
    /// Flight number alone, nominal airline credit.
    FlightOnly,
}

impl Scoring {
    /// `None` rejects the candidate. May adjust the candidate's scores.
    pub(crate) fn score(self, candidate: &mut CandidateScore) -> Option<f64> {
        match self {
            Scoring::Default => Some(candidate.default_confidence()),
            Scoring::AirlineOnly => {
                if candidate.airline < 0.7 {
                    return None;
                }
                candidate.flight = 0.5;
                Some(candidate.default_confidence())
            }
            Scoring::FlightOnly => {
                candidate.airline = 0.5;
                Some(0.7)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Airline,
    Flight,
    FlightOnly,
    ExactPhrase,
    SuffixPhrase,
    GaNovember,
}

impl Placeholder {
    fn from_id(id: &str) -> Option<Self> {
        match id {
            "airline" => Some(Placeholder::Airline),
            "flight" => Some(Placeholder::Flight),
            "flight_only" => Some(Placeholder::FlightOnly),
            "exact_phrase" => Some(Placeholder::ExactPhrase),
            "suffix_phrase" => Some(Placeholder::SuffixPhrase),
            "ga_november" => Some(Placeholder::GaNovember),
            _ => None,
        }
    }
}

/// A callsign pattern as registered.
#[derive(Debug, Clone)]
pub struct CallsignPattern {
    pub name: String,
    pub template: String,
    pub priority: i32,
    /// Minimum airline + flight score (0..2) after scoring.
    pub min_score: Option<f64>,
    pub fixed_confidence: Option<f64>,
    pub scoring: Scoring,
    pub condition: Condition,
    /// Give up instead of guessing when several aircraft match.
    pub require_unique: bool,
}

impl CallsignPattern {
    pub fn new(name: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            priority: DEFAULT_CALLSIGN_PRIORITY,
            min_score: None,
            fixed_confidence: None,
            scoring: Scoring::Default,
            condition: Condition::Any,
            require_unique: false,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn fixed_confidence(mut self, confidence: f64) -> Self {
        self.fixed_confidence = Some(confidence);
        self
    }

    pub fn scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn require_unique(mut self) -> Self {
        self.require_unique = true;
        self
    }

    pub fn compile(self) -> Result<CompiledPattern, Error> {
        let unknown = |placeholder: String| Error::UnknownCallsignPlaceholder {
            template: self.template.clone(),
            placeholder,
        };

        let mut max_skip = 0;
        let mut placeholders = Vec::new();
        for element in parse_elements(&self.template)? {
            let id = match element {
                Element::Typed(id) => id,
                Element::Literal(words) | Element::OptionalLiteral(words) => {
                    return Err(unknown(words.join("|")));
                }
                Element::OptionalGroup(_) => return Err(unknown("[...]".to_string())),
            };
            if let Some(count) = id.strip_prefix("skip:") {
                max_skip = count.parse().map_err(|_| unknown(id.clone()))?;
                continue;
            }
            placeholders.push(Placeholder::from_id(&id).ok_or_else(|| unknown(id.clone()))?);
        }
        if placeholders.is_empty() {
            return Err(unknown(self.template.clone()));
        }

        Ok(CompiledPattern {
            definition: self,
            max_skip,
            placeholders,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub definition: CallsignPattern,
    pub(crate) max_skip: usize,
    pub(crate) placeholders: Vec<Placeholder>,
}

impl CompiledPattern {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn priority(&self) -> i32 {
        self.definition.priority
    }
}

/// The built-in patterns, from most to least specific.
pub fn default_patterns() -> Vec<CallsignPattern> {
    vec![
        CallsignPattern::new("exact_phrase", "{skip:2} {exact_phrase}")
            .priority(100)
            .fixed_confidence(1.0),
        CallsignPattern::new("ga_suffix", "{skip:2} {suffix_phrase}")
            .priority(95)
            .fixed_confidence(0.95)
            .condition(Condition::Ga),
        CallsignPattern::new("airline_flight", "{skip:3} {airline} {flight}").priority(80),
        CallsignPattern::new("airline_only", "{skip:3} {airline}")
            .priority(60)
            .min_score(1.3)
            .scoring(Scoring::AirlineOnly)
            .condition(Condition::NotGa),
        CallsignPattern::new("ga_november", "{skip:2} {ga_november}")
            .priority(55)
            .fixed_confidence(0.75)
            .condition(Condition::Ga),
        CallsignPattern::new("flight_only", "{skip:2} {flight_only}").scoring(Scoring::FlightOnly),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile() {
        let pattern = CallsignPattern::new("airline_flight", "{skip:3} {airline} {flight}")
            .compile()
            .unwrap();
        assert_eq!(pattern.max_skip, 3);
        assert_eq!(
            pattern.placeholders,
            vec![Placeholder::Airline, Placeholder::Flight]
        );
        assert_eq!(pattern.priority(), DEFAULT_CALLSIGN_PRIORITY);
    }

    #[test]
    fn test_default_patterns_compile() {
        for pattern in default_patterns() {
            let name = pattern.name.clone();
            if let Err(e) = pattern.compile() {
                panic!("Expected {name} to compile, got {e}");
            }
        }
    }

    #[test]
    fn test_unknown_placeholders() {
        for template in ["{skip:2} {operator}", "{skip:x} {airline}", "{airline} cleared", "{skip:2}"] {
            match CallsignPattern::new("bad", template).compile() {
                Err(Error::UnknownCallsignPlaceholder { .. }) => {}
                other => panic!("Expected unknown placeholder for {template:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_scoring() {
        let mut candidate = CandidateScore {
            airline: 0.9,
            flight: 0.0,
        };
        let confidence = Scoring::AirlineOnly.score(&mut candidate).unwrap();
        assert_eq!(candidate.flight, 0.5);
        assert!((confidence - (0.6 + 0.4 * 0.7)).abs() < 1e-9);

        let mut weak = CandidateScore {
            airline: 0.6,
            flight: 0.0,
        };
        assert_eq!(Scoring::AirlineOnly.score(&mut weak), None);

        let mut number = CandidateScore {
            airline: 0.0,
            flight: 1.0,
        };
        assert_eq!(Scoring::FlightOnly.score(&mut number), Some(0.7));
        assert_eq!(number.airline, 0.5);
    }
}
