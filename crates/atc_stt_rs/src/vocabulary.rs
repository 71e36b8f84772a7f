//! Word tables shared by the normalizer, tokenizer and matchers.
//!
//! The tables live in `resources/parser/vocabulary.ron`. The embedded copy is
//! the process-wide default; [`install`] swaps in a custom one before first use.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
    sync::OnceLock,
};

use serde::Deserialize;

use crate::errors::Error;

const DEFAULT_VOCABULARY: &str = include_str!("../resources/parser/vocabulary.ron");

#[derive(Clone, Debug, Deserialize)]
pub struct Vocabulary {
    pub digit_words: BTreeMap<String, String>,
    pub number_words: BTreeMap<String, String>,
    /// Spoken variant → lowercase letter.
    pub nato_alphabet: BTreeMap<String, String>,
    pub spelling_triggers: BTreeSet<String>,
    pub merged_command_prefixes: Vec<String>,
    pub canonical_suffixes: Vec<String>,
    pub garbled_suffixes: BTreeMap<String, String>,
    pub prefix_suffix_compatibility: BTreeMap<String, Vec<String>>,
    pub phonetic_command_keywords: Vec<String>,
    pub phonetic_command_blocklist: BTreeMap<String, Vec<String>>,
    pub command_keywords: BTreeMap<String, String>,
    pub phrase_expansions: BTreeMap<String, Vec<String>>,
    pub multi_token_replacements: BTreeMap<String, Vec<String>>,
    pub localizer_prefixes: Vec<String>,
    pub filler_words: BTreeSet<String>,
    pub fuzzy_blocklist: BTreeMap<String, Vec<String>>,
    pub command_boundary_words: Vec<String>,
    pub acknowledgment_words: BTreeSet<String>,
    pub position_suffixes: BTreeSet<String>,
    pub radio_facilities: Vec<String>,
    pub position_command_words: BTreeSet<String>,
    pub facility_words: BTreeSet<String>,
    pub info_words: BTreeSet<String>,
    pub goodbye_words: BTreeSet<String>,
}

impl Vocabulary {
    /// Load a vocabulary from a RON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Parse the vocabulary embedded in the crate
    pub fn load_default() -> Result<Self, Error> {
        Self::load_from_str(DEFAULT_VOCABULARY)
    }

    pub fn load_from_str(contents: &str) -> Result<Self, Error> {
        let vocabulary: Vocabulary = ron::from_str(contents)?;
        Ok(vocabulary)
    }

    pub fn is_filler(&self, word: &str) -> bool {
        self.filler_words.contains(&word.to_lowercase())
    }

    /// Letter for any accepted spelling of a NATO word (`"deltta"` → `'d'`).
    pub fn nato_letter(&self, word: &str) -> Option<char> {
        self.nato_alphabet
            .get(&word.to_lowercase())
            .and_then(|letter| letter.chars().next())
    }

    pub fn is_spelling_trigger(&self, word: &str) -> bool {
        self.spelling_triggers.contains(&word.to_lowercase())
    }

    /// Whether `word` is listed as a known false positive for `target`.
    pub fn is_fuzzy_blocked(&self, word: &str, target: &str) -> bool {
        self.fuzzy_blocklist
            .get(word)
            .is_some_and(|blocked| blocked.iter().any(|b| b == target))
    }
}

static VOCABULARY: OnceLock<Vocabulary> = OnceLock::new();

/// Replace the default vocabulary. Only succeeds before the first decode;
/// otherwise the rejected vocabulary is handed back.
pub fn install(vocabulary: Vocabulary) -> Result<(), Vocabulary> {
    VOCABULARY.set(vocabulary)
}

/// The process-wide vocabulary.
pub fn vocabulary() -> &'static Vocabulary {
    VOCABULARY.get_or_init(|| match Vocabulary::load_default() {
        Ok(vocabulary) => vocabulary,
        Err(err) => panic!("embedded vocabulary is invalid: {err:?}"),
    })
}
