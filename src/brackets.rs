use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::document::{Bracket, BracketUsage, BracketedObject, Fragment, ObjectId, Page};
use crate::visit::{walk_page, DocumentVisitor};

static REPEAT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("repeat count pattern is valid"));

/// Atoms of one fragment enclosed by a multiple-group bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatUnit {
    pub bracket: ObjectId,
    pub atoms: Vec<ObjectId>,
    pub count: u32,
}

#[derive(Default)]
struct BracketCollector<'doc> {
    brackets: Vec<&'doc Bracket>,
}

impl<'doc> DocumentVisitor<'doc> for BracketCollector<'doc> {
    fn visit_bracket(&mut self, bracket: &'doc Bracket) {
        if is_expandable(bracket) {
            self.brackets.push(bracket);
        }
    }
}

/// Multiple-group brackets whose first bracketed object is an atom. Charge
/// brackets, polymer brackets and empty brackets are left out.
pub fn is_expandable(bracket: &Bracket) -> bool {
    bracket.usage == BracketUsage::MultipleGroup
        && matches!(bracket.objects.first(), Some(BracketedObject::Atom(_)))
}

pub fn collect_multiple_groups(page: &Page) -> Vec<&Bracket> {
    let mut collector = BracketCollector::default();
    walk_page(&mut collector, 0, page);
    collector.brackets
}

/// First integer in the repeat annotation; 1 when there is none.
pub fn repeat_count(annotation: Option<&str>) -> u32 {
    annotation
        .and_then(|text| REPEAT_COUNT.find(text))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

/// Repeat units whose bracketed atoms belong to `fragment`.
pub fn repeat_units_for(fragment: &Fragment, brackets: &[&Bracket]) -> Vec<RepeatUnit> {
    let members: HashSet<ObjectId> = fragment.atoms.iter().map(|a| a.id).collect();

    brackets
        .iter()
        .filter_map(|bracket| {
            let atoms: Vec<ObjectId> = bracket
                .atom_ids()
                .filter(|id| members.contains(id))
                .collect();
            if atoms.is_empty() {
                return None;
            }
            Some(RepeatUnit {
                bracket: bracket.id,
                atoms,
                count: repeat_count(bracket.repeat.as_deref()),
            })
        })
        .collect()
}
