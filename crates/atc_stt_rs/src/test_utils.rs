//! Transcript fixtures: a transcript, the aircraft on frequency when it was
//! heard, and the line it should decode to.
//! Available for tests and with the `test-utils` feature.

use std::{collections::BTreeMap, path::Path};

use aviation_helper_rs::AircraftMap;
use serde::Deserialize;

use crate::errors::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptFixture {
    pub transcript: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub command: String,
    #[serde(rename = "stt_aircraft", default)]
    pub aircraft: AircraftMap,
}

impl TranscriptFixture {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// `"<callsign> <command>"`, or empty when the transmission should be
    /// ignored.
    pub fn expected(&self) -> String {
        format!("{} {}", self.callsign, self.command).trim().to_string()
    }
}

/// Fixtures by test name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TranscriptFixtures {
    pub entries: BTreeMap<String, TranscriptFixture>,
}

impl TranscriptFixtures {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The fixture index shipped with the crate.
    pub fn load_default() -> Result<Self, Error> {
        Self::load_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/test-transcripts/index.json"
        ))
    }
}
