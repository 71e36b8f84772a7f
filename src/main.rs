use std::{
    env,
    io::{self, BufRead},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::LazyLock,
};

use anyhow::Context;
use atc_stt_rs::{TranscriptDecoder, equivalence::lines_equivalent, test_utils::TranscriptFixture};
use aviation_helper_rs::{AircraftMap, StaticAviationData, clearance::airlines::Airlines};
use log::{debug, warn};
use serde::Deserialize;

pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::from_env);

#[derive(Debug, Clone)]
pub struct AppConfig {
    context_path: Option<PathBuf>,
    radio_name: String,
    fallback_callsign: Option<String>,
    check: bool,
}

impl AppConfig {
    fn from_env() -> Self {
        let context_path = env::var("ATC_STT_CONTEXT").ok().map(PathBuf::from);
        let radio_name = env::var("ATC_STT_RADIO_NAME").unwrap_or_default();
        let fallback_callsign = env::var("ATC_STT_FALLBACK_CALLSIGN")
            .ok()
            .filter(|callsign| !callsign.trim().is_empty());
        let check = env::var("ATC_STT_CHECK").as_deref() == Ok("1");
        Self {
            context_path,
            radio_name,
            fallback_callsign,
            check,
        }
    }
}

/// A context file holds either a full fixture or just the aircraft map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContextFile {
    Fixture(TranscriptFixture),
    Aircraft(AircraftMap),
}

impl ContextFile {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse context file {}", path.display()))
    }

    fn aircraft(&self) -> &AircraftMap {
        match self {
            ContextFile::Fixture(fixture) => &fixture.aircraft,
            ContextFile::Aircraft(aircraft) => aircraft,
        }
    }
}

fn decode(decoder: &TranscriptDecoder, aircraft: &AircraftMap, transcript: &str) -> String {
    match &APP_CONFIG.fallback_callsign {
        Some(callsign) => decoder.decode_for_callsign(aircraft, transcript, callsign),
        None => decoder.decode(aircraft, transcript, &APP_CONFIG.radio_name),
    }
}

/// Decode the fixture's transcript and report whether it gives the
/// expected line.
fn check(decoder: &TranscriptDecoder, path: &Path, context: &ContextFile) -> anyhow::Result<bool> {
    let ContextFile::Fixture(fixture) = context else {
        anyhow::bail!("{} is not a transcript fixture", path.display());
    };
    let expected = fixture.expected();
    let actual = decode(decoder, &fixture.aircraft, &fixture.transcript);
    let passed = lines_equivalent(&expected, &actual, &fixture.aircraft);

    println!("File:       {}", path.display());
    println!("Transcript: {}", fixture.transcript);
    println!("Expected:   {expected}");
    println!("Actual:     {actual}");
    println!("{}", if passed { "PASS" } else { "FAIL" });
    Ok(passed)
}

fn main() -> anyhow::Result<ExitCode> {
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let context_path = args
        .next()
        .map(PathBuf::from)
        .or_else(|| APP_CONFIG.context_path.clone())
        .context("No context file: pass one or set ATC_STT_CONTEXT")?;
    let transcripts: Vec<String> = args.collect();
    debug!("{APP_CONFIG:?}, context {}", context_path.display());

    let context = ContextFile::load(&context_path)?;
    let airlines = Airlines::load_airlines_from_file().context("Failed to load airlines")?;
    atc_stt_rs::init();
    let decoder = TranscriptDecoder::new(StaticAviationData::new(&airlines));

    if APP_CONFIG.check {
        if !transcripts.is_empty() {
            warn!("Check mode decodes the fixture's own transcript, ignoring arguments");
        }
        let passed = check(&decoder, &context_path, &context)?;
        return Ok(if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let aircraft = context.aircraft();
    if aircraft.is_empty() {
        warn!("No aircraft in {}", context_path.display());
    }
    if transcripts.is_empty() {
        for line in io::stdin().lock().lines() {
            println!("{}", decode(&decoder, aircraft, &line?));
        }
    } else {
        for transcript in &transcripts {
            println!("{}", decode(&decoder, aircraft, transcript));
        }
    }
    Ok(ExitCode::SUCCESS)
}
