//! Identity-free report of what the extractor sees in a document.
//!
//! Runs every stage that needs no external service: fragment
//! classification, reconciliation, bracket and R-group collection, and
//! reaction role placement. Used by the `inspect` command.

use indexmap::IndexMap;
use serde::Serialize;

use crate::assemble::{abbreviation_map, build_graph};
use crate::brackets::{collect_multiple_groups, RepeatUnit};
use crate::classify::classify_fragments;
use crate::config::ExtractionConfig;
use crate::document::{Document, Fragment, ObjectId, Page};
use crate::lexicon::Lexicon;
use crate::reaction::{page_candidates, RoleClassifier, RolePartition};
use crate::reconcile::Reconciler;
use crate::rgroup::{collect_definitions, RGroupDefinitions};

#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    pub index: usize,
    pub id: ObjectId,
    /// Every fragment reached, nested ones included.
    pub fragment_count: usize,
    pub fragments: Vec<FragmentReport>,
    pub rgroups: RGroupDefinitions,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Serialize)]
pub struct FragmentReport {
    pub id: ObjectId,
    pub atoms: usize,
    pub bonds: usize,
    pub residue_labels: Vec<String>,
    pub abbreviations: IndexMap<String, String>,
    pub repeat_units: Vec<RepeatUnit>,
    /// Why the fragment could not be converted, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub id: ObjectId,
    pub roles: RolePartition,
    pub conditions: Vec<String>,
}

pub fn inspect_document(
    document: &Document,
    config: &ExtractionConfig,
    lexicon: &Lexicon,
) -> DocumentReport {
    let reconciler = Reconciler::new(lexicon);
    let roles = RoleClassifier::new(config.agent_extent_ratio);

    let pages = document
        .pages
        .iter()
        .enumerate()
        .map(|(index, page)| inspect_page(index, page, config, lexicon, &reconciler, &roles))
        .collect();
    DocumentReport { pages }
}

fn inspect_page(
    index: usize,
    page: &Page,
    config: &ExtractionConfig,
    lexicon: &Lexicon,
    reconciler: &Reconciler<'_>,
    roles: &RoleClassifier,
) -> PageReport {
    let classification = classify_fragments(page);
    let brackets = collect_multiple_groups(page);

    let fragments = classification
        .complete
        .iter()
        .map(|fragment| {
            let abbreviations = abbreviation_map(fragment, lexicon, lexicon);
            match build_graph(reconciler, fragment, &brackets, config.min_fragment_atoms) {
                Ok(graph) => FragmentReport {
                    id: fragment.id,
                    atoms: graph.atom_count(),
                    bonds: graph.bond_count(),
                    residue_labels: graph.residue_labels().into_iter().map(String::from).collect(),
                    abbreviations,
                    repeat_units: graph.repeat_units().to_vec(),
                    error: None,
                },
                Err(err) => failed_fragment(fragment, abbreviations, err.to_string()),
            }
        })
        .collect();

    let candidates = page_candidates(page);
    let steps = page
        .steps
        .iter()
        .map(|step| StepReport {
            id: step.id,
            roles: roles.partition(step, &candidates),
            conditions: roles
                .conditions(step, &page.texts)
                .into_iter()
                .map(String::from)
                .collect(),
        })
        .collect();

    PageReport {
        index,
        id: page.id,
        fragment_count: classification.all.len(),
        fragments,
        rgroups: collect_definitions(page, lexicon),
        steps,
    }
}

fn failed_fragment(
    fragment: &Fragment,
    abbreviations: IndexMap<String, String>,
    error: String,
) -> FragmentReport {
    FragmentReport {
        id: fragment.id,
        atoms: fragment.atoms.len(),
        bonds: fragment.bonds.len(),
        residue_labels: Vec::new(),
        abbreviations,
        repeat_units: Vec::new(),
        error: Some(error),
    }
}
