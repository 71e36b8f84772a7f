use std::{collections::BTreeMap, io::Read};

use serde::{Deserialize, Deserializer, de};

use crate::errors::Error;
#[cfg(feature = "fs")]
use std::{fs::File, io::BufReader};

/// One row of the OpenFlights airline database.
#[derive(Debug, Clone, Deserialize)]
pub struct AirlineEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i32,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub iata: Option<String>,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub icao: Option<String>,
    /// Radio telephony designator ("SPEEDBIRD" for BAW).
    #[serde(default, deserialize_with = "deserialize_field")]
    pub callsign: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub active: bool,
}

impl AirlineEntry {
    /// ICAO code and lowercase telephony, for active entries that have both.
    fn telephony(&self) -> Option<(&str, String)> {
        let icao = self.icao.as_deref()?;
        let callsign = self.callsign.as_deref()?;
        self.active.then(|| (icao, callsign.to_lowercase()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Airlines(pub Vec<AirlineEntry>);

impl Airlines {
    pub fn load_airlines<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    #[cfg(feature = "fs")]
    pub fn load_airlines_from_file() -> Result<Self, Error> {
        let file = File::open(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/known-strings/airlines.json"
        ))?;
        Self::load_airlines(BufReader::new(file))
    }

    /// Lowercase telephony → ICAO code. The first active entry wins when
    /// several airlines share a telephony.
    pub fn telephony_to_icao(&self) -> BTreeMap<String, String> {
        let mut index = BTreeMap::new();
        for (icao, telephony) in self.0.iter().filter_map(AirlineEntry::telephony) {
            index.entry(telephony).or_insert_with(|| icao.to_string());
        }
        index
    }

    /// ICAO code → lowercase telephony.
    pub fn icao_to_telephony(&self) -> BTreeMap<String, String> {
        let mut index = BTreeMap::new();
        for (icao, telephony) in self.0.iter().filter_map(AirlineEntry::telephony) {
            index.entry(icao.to_string()).or_insert(telephony);
        }
        index
    }
}

/// The database marks missing values with `\N`, an empty string or `N/A`.
fn present(value: &str) -> bool {
    !matches!(value, "" | "\\N" | "N/A")
}

fn deserialize_id<'de, D>(d: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    raw.trim()
        .parse()
        .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&raw), &"a numeric id"))
}

fn deserialize_field<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw
        .map(|value| value.trim().to_string())
        .filter(|value| present(value)))
}

fn deserialize_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    if raw.eq_ignore_ascii_case("y") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("n") {
        Ok(false)
    } else {
        Err(de::Error::invalid_value(
            de::Unexpected::Str(&raw),
            &r#""Y" or "N""#,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;

    static AIRLINES: LazyLock<Airlines> =
        LazyLock::new(|| Airlines::load_airlines_from_file().unwrap());

    #[test]
    fn test_load_airlines_from_file() {
        let index = AIRLINES.telephony_to_icao();
        assert_eq!(index["american"], "AAL");
        assert_eq!(index["speedbird"], "BAW");
        assert!(!index.contains_key("defunct air"));
    }

    #[test]
    fn test_parse_entry() {
        let json = r#"[{"id": "24", "name": "American Airlines", "alias": "\\N", "iata": "AA",
            "icao": "AAL", "callsign": "AMERICAN", "country": "United States", "active": "Y"}]"#;
        let airlines = Airlines::load_airlines(json.as_bytes()).unwrap();
        let entry = &airlines.0[0];
        assert_eq!(entry.id, 24);
        assert_eq!(entry.alias, None);
        assert!(entry.active);
        assert_eq!(airlines.icao_to_telephony()["AAL"], "american");
    }

    #[test]
    fn test_missing_values() {
        let json = r#"[{"id": "7", "name": "Placeholder", "icao": "N/A", "callsign": "",
            "active": "n"}]"#;
        let airlines = Airlines::load_airlines(json.as_bytes()).unwrap();
        let entry = &airlines.0[0];
        assert_eq!(entry.icao, None);
        assert_eq!(entry.callsign, None);
        assert!(!entry.active);
        assert!(airlines.telephony_to_icao().is_empty());
    }

    #[test]
    fn test_rejects_bad_flag() {
        let json = r#"[{"id": "7", "name": "Placeholder", "active": "maybe"}]"#;
        assert!(Airlines::load_airlines(json.as_bytes()).is_err());
    }
}
