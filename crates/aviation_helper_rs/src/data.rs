//! Aviation reference data consumed by the decoder.
//!
//! The decoder only needs a handful of lookups (airline telephony, fix and
//! approach pronunciations, the spoken form of a callsign). [`AviationData`]
//! is that capability surface; [`StaticAviationData`] is a table-backed
//! implementation built from the airline database plus optional overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    clearance::airlines::Airlines,
    conversions::{spoken_characters, spoken_procedure, spoken_runway},
};

/// Wake category as far as radio telephony is concerned.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    #[default]
    Normal,
    Heavy,
    Super,
}

impl WeightClass {
    /// Word appended to the spoken callsign, if any.
    pub fn spoken_suffix(self) -> Option<&'static str> {
        match self {
            WeightClass::Normal => None,
            WeightClass::Heavy => Some("heavy"),
            WeightClass::Super => Some("super"),
        }
    }
}

pub trait AviationData: Send + Sync {
    /// ICAO airline designator for a spoken telephony ("speedbird" → "BAW").
    fn airline_telephony_to_icao(&self, spoken: &str) -> Option<String>;

    /// Spoken form of a fix identifier.
    fn fix_telephony(&self, fix: &str) -> String {
        fix.to_lowercase()
    }

    /// Spoken form of an approach full name ("ILS Runway 22L" → "i l s runway two two left").
    fn approach_telephony(&self, full_name: &str) -> String {
        approach_name_telephony(full_name)
    }

    /// Spoken form of a SID or STAR name.
    fn procedure_telephony(&self, name: &str) -> String {
        spoken_procedure(name)
    }

    /// Canonical spoken key for a callsign ("AAL5936" → "American 5936").
    fn callsign_spoken(&self, callsign: &str, weight: WeightClass) -> String;

    /// Spoken variants of an aircraft type ("C172" → ["skyhawk", "cessna"]).
    fn ac_type_pronunciations(&self, aircraft_type: &str) -> Vec<String>;

    /// Last three characters of a callsign, spoken ("N123AB" → "three alpha bravo").
    fn trailing3_spoken(&self, callsign: &str) -> String {
        let chars: Vec<char> = callsign.chars().collect();
        if chars.len() < 3 {
            return String::new();
        }
        let trailing: String = chars[chars.len() - 3..].iter().collect();
        spoken_characters(&trailing)
    }
}

fn approach_name_telephony(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .enumerate()
        .map(|(idx, word)| {
            let lower = word.to_lowercase();
            match lower.as_str() {
                "ils" => "i l s".to_string(),
                "vor" => "v o r".to_string(),
                "rnav" => "r-nav".to_string(),
                _ if idx > 0 && word.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
                    spoken_runway(word)
                }
                _ => lower,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const DEFAULT_TYPE_PRONUNCIATIONS: &[(&str, &[&str])] = &[
    ("C152", &["cessna"]),
    ("C172", &["skyhawk", "cessna"]),
    ("C182", &["skylane", "cessna"]),
    ("C208", &["caravan", "cessna"]),
    ("C210", &["centurion", "cessna"]),
    ("PA28", &["cherokee", "piper"]),
    ("P28A", &["cherokee", "piper"]),
    ("PA32", &["saratoga", "piper"]),
    ("PA44", &["seminole", "piper"]),
    ("BE35", &["bonanza", "beech"]),
    ("BE36", &["bonanza", "beech"]),
    ("BE58", &["baron", "beech"]),
    ("SR20", &["cirrus"]),
    ("SR22", &["cirrus"]),
    ("DA40", &["diamond star", "diamond"]),
    ("M20P", &["mooney"]),
    ("TBM9", &["t b m"]),
];

/// Table-backed [`AviationData`].
#[derive(Debug, Clone, Default)]
pub struct StaticAviationData {
    telephony_to_icao: BTreeMap<String, String>,
    icao_to_telephony: BTreeMap<String, String>,
    fix_telephony: BTreeMap<String, String>,
    approach_telephony: BTreeMap<String, String>,
    procedure_telephony: BTreeMap<String, String>,
    type_pronunciations: BTreeMap<String, Vec<String>>,
}

impl StaticAviationData {
    pub fn new(airlines: &Airlines) -> Self {
        let type_pronunciations = DEFAULT_TYPE_PRONUNCIATIONS
            .iter()
            .map(|(ty, names)| {
                (
                    ty.to_string(),
                    names.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect();
        Self {
            telephony_to_icao: airlines.telephony_to_icao(),
            icao_to_telephony: airlines.icao_to_telephony(),
            type_pronunciations,
            ..Default::default()
        }
    }

    pub fn with_fix_telephony(mut self, fix: &str, spoken: &str) -> Self {
        self.fix_telephony
            .insert(fix.to_string(), spoken.to_lowercase());
        self
    }

    pub fn with_approach_telephony(mut self, full_name: &str, spoken: &str) -> Self {
        self.approach_telephony
            .insert(full_name.to_string(), spoken.to_lowercase());
        self
    }

    pub fn with_procedure_telephony(mut self, name: &str, spoken: &str) -> Self {
        self.procedure_telephony
            .insert(name.to_string(), spoken.to_lowercase());
        self
    }

    pub fn with_type_pronunciations(mut self, aircraft_type: &str, spoken: &[&str]) -> Self {
        self.type_pronunciations.insert(
            aircraft_type.to_string(),
            spoken.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl AviationData for StaticAviationData {
    fn airline_telephony_to_icao(&self, spoken: &str) -> Option<String> {
        let key = spoken.split_whitespace().collect::<Vec<_>>().join(" ");
        self.telephony_to_icao
            .get(&key.to_lowercase())
            .cloned()
    }

    fn fix_telephony(&self, fix: &str) -> String {
        self.fix_telephony
            .get(fix)
            .cloned()
            .unwrap_or_else(|| fix.to_lowercase())
    }

    fn approach_telephony(&self, full_name: &str) -> String {
        self.approach_telephony
            .get(full_name)
            .cloned()
            .unwrap_or_else(|| approach_name_telephony(full_name))
    }

    fn procedure_telephony(&self, name: &str) -> String {
        self.procedure_telephony
            .get(name)
            .cloned()
            .unwrap_or_else(|| spoken_procedure(name))
    }

    fn callsign_spoken(&self, callsign: &str, weight: WeightClass) -> String {
        let base = callsign.strip_suffix("/T").unwrap_or(callsign);
        let spoken = match base.strip_prefix('N') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                format!("November {rest}")
            }
            _ => {
                let split = base
                    .find(|c: char| c.is_ascii_digit())
                    .unwrap_or(base.len());
                let (prefix, flight) = base.split_at(split);
                match self.icao_to_telephony.get(prefix) {
                    Some(telephony) if !flight.is_empty() => {
                        format!("{} {flight}", title_case(telephony))
                    }
                    _ => base.to_string(),
                }
            }
        };
        match weight.spoken_suffix() {
            Some(suffix) => format!("{spoken} {suffix}"),
            None => spoken,
        }
    }

    fn ac_type_pronunciations(&self, aircraft_type: &str) -> Vec<String> {
        self.type_pronunciations
            .get(aircraft_type)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;

    static DATA: LazyLock<StaticAviationData> = LazyLock::new(|| {
        StaticAviationData::new(&Airlines::load_airlines_from_file().unwrap())
            .with_fix_telephony("DPK", "Deer Park")
    });

    #[test]
    fn test_callsign_spoken() {
        assert_eq!(
            DATA.callsign_spoken("AAL5936", WeightClass::Normal),
            "American 5936"
        );
        assert_eq!(
            DATA.callsign_spoken("BAW12", WeightClass::Heavy),
            "Speedbird 12 heavy"
        );
        assert_eq!(
            DATA.callsign_spoken("N123AB", WeightClass::Normal),
            "November 123AB"
        );
        assert_eq!(DATA.callsign_spoken("XYZ1", WeightClass::Normal), "XYZ1");
    }

    #[test]
    fn test_telephony_lookups() {
        assert_eq!(
            DATA.airline_telephony_to_icao("Frontier  Flight"),
            Some("FFT".to_string())
        );
        assert_eq!(DATA.airline_telephony_to_icao("nonesuch"), None);
        assert_eq!(DATA.fix_telephony("DPK"), "deer park");
        assert_eq!(DATA.fix_telephony("CAMRN"), "camrn");
        assert_eq!(
            DATA.approach_telephony("ILS Runway 22L"),
            "i l s runway two two left"
        );
        assert_eq!(DATA.procedure_telephony("KENNEDY5"), "kennedy five");
    }

    #[test]
    fn test_ga_helpers() {
        assert_eq!(DATA.ac_type_pronunciations("C172"), vec!["skyhawk", "cessna"]);
        assert!(DATA.ac_type_pronunciations("B738").is_empty());
        assert_eq!(DATA.trailing3_spoken("N123AB"), "three alpha bravo");
        assert_eq!(DATA.trailing3_spoken("N1"), "");
    }
}
