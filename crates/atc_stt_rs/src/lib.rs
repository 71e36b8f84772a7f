//! ATC Transcript Decoding Library
//!
//! Turns controller speech, as transcribed by a general speech-to-text
//! engine, into the command strings understood by the simulated aircraft.
//! The transcript is normalized, tokenized, matched against the callsigns
//! on frequency, parsed with a registry of command templates and finally
//! validated against the addressed aircraft's state.

pub mod callsign;
pub mod catalogue;
pub mod commands;
pub mod decoder;
pub mod equivalence;
pub mod errors;
pub mod normalize;
pub mod parsers;
pub mod registry;
pub mod similarity;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod tokenize;
pub mod validate;
pub mod vocabulary;

pub use callsign::CallsignMatch;
pub use decoder::{DecodeDetails, DecodeOutput, TranscriptDecoder};
pub use errors::Error;
pub use registry::{Registry, RegistryBuilder, default_registry};
pub use validate::ValidationResult;

/// Build the default vocabulary and registry now instead of on the first
/// decode. Safe to call from any thread, any number of times.
pub fn init() {
    vocabulary::vocabulary();
    registry::init();
}
