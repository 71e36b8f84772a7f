use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::errors::Error;

/// Aircraft on frequency, keyed by spoken callsign variant. The same
/// aircraft may appear under several keys.
pub type AircraftMap = BTreeMap<String, SttAircraft>;

/// Flight phase of an aircraft, as far as command plausibility is concerned.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString,
)]
pub enum AircraftState {
    #[default]
    #[serde(rename = "", alias = "unknown")]
    #[strum(serialize = "")]
    Unknown,
    #[serde(rename = "departure")]
    #[strum(serialize = "departure")]
    Departure,
    #[serde(rename = "arrival")]
    #[strum(serialize = "arrival")]
    Arrival,
    #[serde(rename = "cleared approach", alias = "on approach")]
    #[strum(to_string = "cleared approach", serialize = "on approach")]
    ClearedApproach,
    #[serde(rename = "overflight")]
    #[strum(serialize = "overflight")]
    Overflight,
    #[serde(rename = "vfr flight following")]
    #[strum(serialize = "vfr flight following")]
    VfrFlightFollowing,
}

/// How the controller addressed the aircraft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressingForm {
    /// Full callsign ("November 123AB", "American 5936").
    #[default]
    Full,
    /// Aircraft type plus the last three characters ("skyhawk 3 alpha bravo").
    TypeTrailing3,
}

impl TryFrom<u8> for AddressingForm {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AddressingForm::Full),
            1 => Ok(AddressingForm::TypeTrailing3),
            _ => Err(Error::InvalidAddressingForm(value)),
        }
    }
}

impl Serialize for AddressingForm {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(match self {
            AddressingForm::Full => 0,
            AddressingForm::TypeTrailing3 => 1,
        })
    }
}

impl<'de> Deserialize<'de> for AddressingForm {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value: u8 = Deserialize::deserialize(d)?;
        AddressingForm::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Read-only snapshot of one aircraft for a single decode call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SttAircraft {
    /// Canonical ICAO callsign ("AAL5936", "N123AB"), possibly with `/T` baked in.
    pub callsign: String,
    pub aircraft_type: String,
    /// Current altitude in feet.
    pub altitude: i32,
    pub state: AircraftState,
    /// Spoken fix name → fix identifier.
    #[serde(deserialize_with = "deserialize_null_as_default")]
    pub fixes: BTreeMap<String, String>,
    /// Spoken approach telephony → approach code.
    #[serde(deserialize_with = "deserialize_null_as_default")]
    pub candidate_approaches: BTreeMap<String, String>,
    /// Approach code → spoken fix name → fix identifier.
    #[serde(deserialize_with = "deserialize_null_as_default")]
    pub approach_fixes: BTreeMap<String, BTreeMap<String, String>>,
    pub assigned_approach: String,
    #[serde(rename = "SID")]
    pub sid: String,
    #[serde(rename = "STAR")]
    pub star: String,
    pub controller_frequency: String,
    pub tracking_controller: String,
    pub addressing_form: AddressingForm,
    #[serde(rename = "LAHSORunways", deserialize_with = "deserialize_null_as_default")]
    pub lahso_runways: Vec<String>,
}

impl SttAircraft {
    pub fn is_ga(&self) -> bool {
        self.callsign.starts_with('N')
    }

    /// Callsign as emitted in decode output, with `/T` for type-trailing-3 addressing.
    pub fn addressed_callsign(&self) -> String {
        if self.addressing_form == AddressingForm::TypeTrailing3 && !self.callsign.ends_with("/T")
        {
            format!("{}/T", self.callsign)
        } else {
            self.callsign.clone()
        }
    }

    /// Callsign without any `/T` suffix.
    pub fn base_callsign(&self) -> &str {
        self.callsign.strip_suffix("/T").unwrap_or(&self.callsign)
    }

    /// Fixes of the assigned approach merged into the general fix map,
    /// existing spoken names win.
    pub fn merge_assigned_approach_fixes(&mut self) {
        if let Some(approach_fixes) = self.approach_fixes.get(&self.assigned_approach) {
            for (spoken, fix) in approach_fixes {
                self.fixes
                    .entry(spoken.clone())
                    .or_insert_with(|| fix.clone());
            }
        }
    }
}

fn deserialize_null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Deserialize::deserialize(d)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_context_record() {
        let json = r#"{
            "Callsign": "N123AB",
            "AircraftType": "C172",
            "Altitude": 3500,
            "State": "vfr flight following",
            "Fixes": {"deer park": "DPK"},
            "CandidateApproaches": null,
            "AddressingForm": 1,
            "LAHSORunways": null
        }"#;
        let ac: SttAircraft = serde_json::from_str(json).unwrap();
        assert_eq!(ac.callsign, "N123AB");
        assert_eq!(ac.state, AircraftState::VfrFlightFollowing);
        assert_eq!(ac.fixes["deer park"], "DPK");
        assert_eq!(ac.addressing_form, AddressingForm::TypeTrailing3);
        assert!(ac.lahso_runways.is_empty());
        assert!(ac.candidate_approaches.is_empty());
        assert!(ac.is_ga());
        assert_eq!(ac.addressed_callsign(), "N123AB/T");
    }

    #[test]
    fn test_state_aliases() {
        let state: AircraftState = serde_json::from_str(r#""on approach""#).unwrap();
        assert_eq!(state, AircraftState::ClearedApproach);
        assert_eq!(state.to_string(), "cleared approach");
        assert_eq!(
            "overflight".parse::<AircraftState>().unwrap(),
            AircraftState::Overflight
        );
    }

    #[test]
    fn test_merge_assigned_approach_fixes() {
        let mut ac = SttAircraft {
            assigned_approach: "I22L".to_string(),
            fixes: BTreeMap::from([("camrn".to_string(), "CAMRN".to_string())]),
            approach_fixes: BTreeMap::from([(
                "I22L".to_string(),
                BTreeMap::from([
                    ("camrn".to_string(), "XXXXX".to_string()),
                    ("zulab".to_string(), "ZULAB".to_string()),
                ]),
            )]),
            ..Default::default()
        };
        ac.merge_assigned_approach_fixes();
        assert_eq!(ac.fixes["camrn"], "CAMRN");
        assert_eq!(ac.fixes["zulab"], "ZULAB");
    }
}
