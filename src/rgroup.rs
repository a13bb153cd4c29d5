//! R-group definitions written as free text next to a structure, such as
//! `R = (a) H, (b) F, (c) Cl` or `X = CH3, Cl`.
//!
//! Only this narrow grammar is understood. Text that does not fit yields no
//! definition rather than an error.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use crate::document::{Page, Text};
use crate::lexicon::Lexicon;
use crate::logging::RGROUP;
use crate::visit::{walk_page, DocumentVisitor};

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z]?[0-9]{0,2}'{0,3})\s*=\s*(.+?)\s*$")
        .expect("definition pattern is valid")
});

static TAGGED_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*([a-z])\s*\)\s*([^,]+)").expect("tagged label pattern is valid")
});

static RGROUP_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:R|X|Y|Z|Ar)[0-9]{0,2}'{0,3}$").expect("label pattern is valid")
});

/// Whether an atom label names a variable substituent position (`R`,
/// `R1`, `R'`, `X`, `Ar`, ...).
pub fn is_rgroup_label(label: &str) -> bool {
    RGROUP_LABEL.is_match(&normalize(label))
}

/// Identifier to substituent labels, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RGroupDefinitions(IndexMap<String, Vec<String>>);

impl RGroupDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the existing definition when `identifier` is already present.
    pub fn insert_if_absent(&mut self, identifier: String, labels: Vec<String>) -> bool {
        match self.0.entry(identifier) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(labels);
                true
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&[String]> {
        self.0.get(identifier).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Only the identifiers in `wanted`, keeping this map's order.
    pub fn restricted_to<'a, I>(&self, wanted: I) -> RGroupDefinitions
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<&str> = wanted.into_iter().collect();
        RGroupDefinitions(
            self.0
                .iter()
                .filter(|(k, _)| wanted.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Number of concrete structures a full expansion produces.
    pub fn combinations(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.0
    }
}

fn normalize(text: &str) -> String {
    text.nfkc()
        .map(|c| match c {
            '\u{2019}' | '\u{2032}' | '`' => '\'',
            '\u{2033}' => '"',
            other => other,
        })
        .collect()
}

/// Parses the first line of `text` that reads `identifier = labels`.
pub fn parse_definition(text: &str) -> Option<(String, Vec<String>)> {
    let text = normalize(text);
    text.lines().find_map(|line| {
        let caps = DEFINITION.captures(line)?;
        let identifier = caps.get(1)?.as_str().to_string();
        let labels = split_labels(caps.get(2)?.as_str());
        if labels.is_empty() {
            return None;
        }
        Some((identifier, labels))
    })
}

/// Map form of [`parse_definition`]: one entry, or none.
pub fn parse_rgroup_text(text: &str) -> RGroupDefinitions {
    let mut definitions = RGroupDefinitions::new();
    if let Some((identifier, labels)) = parse_definition(text) {
        definitions.insert_if_absent(identifier, labels);
    }
    definitions
}

fn split_labels(rhs: &str) -> Vec<String> {
    let mut tagged: Vec<(char, String)> = TAGGED_LABEL
        .captures_iter(rhs)
        .filter_map(|caps| {
            let tag = caps.get(1)?.as_str().chars().next()?;
            Some((tag, clean_label(caps.get(2)?.as_str())))
        })
        .filter(|(_, label)| !label.is_empty())
        .collect();

    if !tagged.is_empty() {
        tagged.sort_by_key(|(tag, _)| *tag);
        return tagged.into_iter().map(|(_, label)| label).collect();
    }

    rhs.split(',')
        .map(clean_label)
        .filter(|label| !label.is_empty())
        .collect()
}

fn clean_label(raw: &str) -> String {
    raw.trim().trim_end_matches(['.', ';']).trim().to_string()
}

struct RGroupTextCollector<'a> {
    lexicon: &'a Lexicon,
    definitions: RGroupDefinitions,
}

impl<'doc> DocumentVisitor<'doc> for RGroupTextCollector<'_> {
    fn visit_text(&mut self, text: &'doc Text) {
        let Some((identifier, labels)) = parse_definition(&text.content) else {
            return;
        };
        let labels: Vec<String> = labels
            .into_iter()
            .filter(|label| !self.lexicon.is_filtered_word(label))
            .collect();
        if labels.is_empty() {
            return;
        }
        trace!(target: RGROUP, text = %text.id, %identifier, ?labels, "R-group definition");
        self.definitions.insert_if_absent(identifier, labels);
    }
}

/// Definitions from every text node on `page`; the first text defining an
/// identifier wins.
pub fn collect_definitions(page: &Page, lexicon: &Lexicon) -> RGroupDefinitions {
    let mut collector = RGroupTextCollector {
        lexicon,
        definitions: RGroupDefinitions::new(),
    };
    walk_page(&mut collector, 0, page);
    collector.definitions
}
