//! Lookup tables shared by every extraction in the process.
//!
//! Tables are loaded once, either from the copies compiled into the binary
//! or from a directory, and never change afterwards. Components borrow the
//! [`Lexicon`] they are given; tests build small ones with
//! [`Lexicon::from_parts`].

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use tracing::info;

use crate::error::ConfigError;
use crate::logging::LEXICON;
use crate::services::AbbreviationLookup;

const UNWANTED_ABBREVIATIONS_FILE: &str = "unwanted_abbreviations.txt";
const WORD_FILTER_FILE: &str = "word_filter.txt";
const ABBREVIATIONS_FILE: &str = "abbreviations.json";

const BUILTIN_UNWANTED: &str = include_str!("../resources/unwanted_abbreviations.txt");
const BUILTIN_WORDS: &str = include_str!("../resources/word_filter.txt");
const BUILTIN_ABBREVIATIONS: &str = include_str!("../resources/abbreviations.json");

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    unwanted_abbreviations: HashSet<String>,
    filtered_words: HashSet<String>,
    abbreviations: IndexMap<String, String>,
}

impl Lexicon {
    /// Tables shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(
            BUILTIN_UNWANTED,
            BUILTIN_WORDS,
            BUILTIN_ABBREVIATIONS,
            "builtin abbreviations",
        )
    }

    /// Reads the three tables from `dir`. Any missing file is an error.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
        };

        let unwanted = read(UNWANTED_ABBREVIATIONS_FILE)?;
        let words = read(WORD_FILTER_FILE)?;
        let abbreviations = read(ABBREVIATIONS_FILE)?;
        let what = dir.join(ABBREVIATIONS_FILE).display().to_string();

        Self::parse(&unwanted, &words, &abbreviations, &what)
    }

    pub fn from_parts<U, W, A>(unwanted: U, words: W, abbreviations: A) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
        A: IntoIterator<Item = (String, String)>,
    {
        Self {
            unwanted_abbreviations: unwanted.into_iter().map(Into::into).collect(),
            filtered_words: words
                .into_iter()
                .map(|w| Into::<String>::into(w).to_lowercase())
                .collect(),
            abbreviations: abbreviations.into_iter().collect(),
        }
    }

    fn parse(
        unwanted: &str,
        words: &str,
        abbreviations: &str,
        what: &str,
    ) -> Result<Self, ConfigError> {
        let abbreviations: IndexMap<String, String> =
            serde_json::from_str(abbreviations).map_err(|source| ConfigError::Json {
                what: what.to_string(),
                source,
            })?;

        let lexicon = Self::from_parts(list_entries(unwanted), list_entries(words), abbreviations);

        info!(
            target: LEXICON,
            unwanted = lexicon.unwanted_abbreviations.len(),
            words = lexicon.filtered_words.len(),
            abbreviations = lexicon.abbreviations.len(),
            "Loaded lookup tables"
        );

        Ok(lexicon)
    }

    /// Labels that look like abbreviations but are annotations, not
    /// substituents.
    pub fn is_unwanted_abbreviation(&self, label: &str) -> bool {
        self.unwanted_abbreviations.contains(label.trim())
    }

    /// Case-insensitive general word filter.
    pub fn is_filtered_word(&self, word: &str) -> bool {
        self.filtered_words.contains(&word.trim().to_lowercase())
    }
}

impl AbbreviationLookup for Lexicon {
    fn lookup(&self, label: &str) -> Option<&str> {
        self.abbreviations.get(label.trim()).map(String::as_str)
    }
}

/// One entry per line; blank lines and `#` comments are skipped.
fn list_entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
