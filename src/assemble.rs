//! Turns a document into substances and reactions.
//!
//! Work is done one page at a time and one item at a time. A fragment or
//! reaction step that fails to convert is logged at `warn`, counted as
//! skipped, and the run continues with the next item.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::brackets::{collect_multiple_groups, repeat_units_for, RepeatUnit};
use crate::classify::{classify_fragments, is_complete};
use crate::config::ExtractionConfig;
use crate::document::{Bracket, Document, Fragment, NodeKind, ObjectId, Page, ReactionStep};
use crate::error::ExtractError;
use crate::geo::Rect;
use crate::graph::MolecularGraph;
use crate::lexicon::Lexicon;
use crate::logging::ASSEMBLE;
use crate::projection::{ProjectionFlags, RingProjectionClassifier};
use crate::reaction::{page_candidates, Candidate, Role, RoleClassifier};
use crate::reconcile::Reconciler;
use crate::rgroup::{collect_definitions, RGroupDefinitions};
use crate::services::{
    AbbreviationLookup, IdentityService, MarkushExpander, ReactionGraphs, ReactionIdentity,
    RingPerception, StructureIdentity,
};

/// Where a substance was drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub page: usize,
    pub fragment: ObjectId,
    pub bounds: Option<Rect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Substance {
    /// Fragment the substance was first built from.
    pub fragment: ObjectId,
    pub page: usize,
    /// Index of the R-group variant, for expanded Markush fragments.
    pub variant: Option<usize>,
    pub identity: Option<StructureIdentity>,
    pub occurrences: Vec<Occurrence>,
    /// Substituent SMILES to the label drawn for it.
    pub abbreviations: IndexMap<String, String>,
    pub repeat_units: Vec<RepeatUnit>,
    pub projections: Option<ProjectionFlags>,
    #[serde(skip)]
    pub graph: MolecularGraph,
}

impl Substance {
    pub fn inchi(&self) -> Option<&str> {
        self.identity.as_ref().and_then(StructureIdentity::inchi)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionComponent {
    pub fragment: ObjectId,
    /// Page object the role was assigned to: the fragment itself or its
    /// group.
    pub candidate: ObjectId,
    pub role: Role,
    pub identity: Option<StructureIdentity>,
    pub bounds: Option<Rect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reaction {
    pub step: ObjectId,
    pub page: usize,
    pub reactants: Vec<ReactionComponent>,
    pub agents: Vec<ReactionComponent>,
    pub products: Vec<ReactionComponent>,
    /// Text drawn beside the arrow, verbatim.
    pub conditions: Vec<String>,
    pub identity: Option<ReactionIdentity>,
}

/// Counters for one extraction run, across all pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub pages: usize,
    /// Complete fragments considered.
    pub fragments: usize,
    /// Substances, before deduplication, whose identity carries an InChI.
    pub fragments_with_inchi: usize,
    /// Distinct non-empty InChIs.
    pub distinct_substances: usize,
    pub skipped_fragments: usize,
    pub reaction_steps: usize,
    pub reactions: usize,
    pub skipped_steps: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstanceExtraction {
    pub substances: Vec<Substance>,
    pub stats: ExtractionStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionExtraction {
    pub reactions: Vec<Reaction>,
    pub stats: ExtractionStats,
}

/// External collaborators for one run. Only the identity service is
/// required.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub identity: &'a dyn IdentityService,
    pub rings: Option<&'a dyn RingPerception>,
    pub markush: Option<&'a dyn MarkushExpander>,
    /// Label lookup used instead of the lexicon's abbreviation table.
    pub abbreviations: Option<&'a dyn AbbreviationLookup>,
}

impl<'a> Services<'a> {
    pub fn new(identity: &'a dyn IdentityService) -> Self {
        Self {
            identity,
            rings: None,
            markush: None,
            abbreviations: None,
        }
    }

    pub fn with_rings(mut self, rings: &'a dyn RingPerception) -> Self {
        self.rings = Some(rings);
        self
    }

    pub fn with_markush(mut self, markush: &'a dyn MarkushExpander) -> Self {
        self.markush = Some(markush);
        self
    }

    pub fn with_abbreviations(mut self, abbreviations: &'a dyn AbbreviationLookup) -> Self {
        self.abbreviations = Some(abbreviations);
        self
    }
}

/// Collapses substances sharing a non-empty InChI into the first one seen,
/// which gains the others' occurrences and any abbreviations it lacks.
/// Substances without an InChI are all kept.
pub fn deduplicate(substances: Vec<Substance>) -> Vec<Substance> {
    let mut out: Vec<Substance> = Vec::with_capacity(substances.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for substance in substances {
        let Some(inchi) = substance.inchi().map(str::to_string) else {
            out.push(substance);
            continue;
        };
        match seen.get(&inchi) {
            Some(&index) => {
                let kept = &mut out[index];
                kept.occurrences.extend(substance.occurrences);
                for (smiles, label) in substance.abbreviations {
                    kept.abbreviations.entry(smiles).or_insert(label);
                }
            }
            None => {
                seen.insert(inchi, out.len());
                out.push(substance);
            }
        }
    }
    out
}

/// Reconciles `fragment` and flattens it into a graph carrying the page's
/// repeat units for it.
pub fn build_graph(
    reconciler: &Reconciler<'_>,
    fragment: &Fragment,
    brackets: &[&Bracket],
    min_atoms: usize,
) -> Result<MolecularGraph, ExtractError> {
    if !fragment.is_valid(min_atoms) {
        return Err(ExtractError::InvalidFragment {
            fragment: fragment.id,
            atoms: fragment.atoms.len(),
            required: min_atoms,
        });
    }

    let reconciled = reconciler.reconcile(fragment)?;
    let mut graph =
        MolecularGraph::from_reconciled(fragment, &reconciled.atoms, &reconciled.bonds)?;
    graph.set_repeat_units(repeat_units_for(fragment, brackets));
    Ok(graph)
}

/// Substituent SMILES to display label for every abbreviation or nickname
/// atom of `fragment` whose label `lookup` knows. Filtered words and
/// unwanted abbreviations are left out; the first label seen for a SMILES
/// is kept.
pub fn abbreviation_map(
    fragment: &Fragment,
    lexicon: &Lexicon,
    lookup: &dyn AbbreviationLookup,
) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for atom in &fragment.atoms {
        let abbreviated = atom.abbreviation().is_some()
            || matches!(atom.kind, NodeKind::Nickname | NodeKind::ElementListNickname);
        if !abbreviated {
            continue;
        }
        let Some(label) = atom.display_text() else {
            continue;
        };
        if lexicon.is_filtered_word(label) || lexicon.is_unwanted_abbreviation(label) {
            continue;
        }
        if let Some(smiles) = lookup.lookup(label) {
            map.entry(smiles.to_string())
                .or_insert_with(|| label.to_string());
        }
    }
    map
}

fn distinct_inchis(substances: &[Substance]) -> usize {
    let mut inchis: Vec<&str> = substances.iter().filter_map(Substance::inchi).collect();
    inchis.sort_unstable();
    inchis.dedup();
    inchis.len()
}

pub struct Extractor<'a> {
    config: &'a ExtractionConfig,
    lexicon: &'a Lexicon,
    services: Services<'a>,
    reconciler: Reconciler<'a>,
    projections: RingProjectionClassifier,
    roles: RoleClassifier,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a ExtractionConfig, lexicon: &'a Lexicon, services: Services<'a>) -> Self {
        Self {
            config,
            lexicon,
            services,
            reconciler: Reconciler::new(lexicon),
            projections: RingProjectionClassifier::new(config.haworth_horizontal_tolerance_deg),
            roles: RoleClassifier::new(config.agent_extent_ratio),
        }
    }

    pub fn extract_substances(&self, document: &Document) -> SubstanceExtraction {
        let mut stats = ExtractionStats::default();
        let mut substances = Vec::new();

        for (index, page) in document.pages.iter().enumerate() {
            let span = info_span!(target: ASSEMBLE, "page", page = index);
            let _enter = span.enter();
            stats.pages += 1;

            let classification = classify_fragments(page);
            let brackets = collect_multiple_groups(page);
            let definitions = if self.config.resolve_rgroups {
                collect_definitions(page, self.lexicon)
            } else {
                RGroupDefinitions::new()
            };

            for fragment in classification.complete {
                stats.fragments += 1;
                let span = info_span!(target: ASSEMBLE, "fragment", fragment = %fragment.id);
                let _enter = span.enter();

                match self.substances_for(index, fragment, &brackets, &definitions) {
                    Ok(found) => substances.extend(found),
                    Err(err) => {
                        warn!(
                            target: ASSEMBLE,
                            page = index,
                            fragment = %fragment.id,
                            error = %err,
                            "Skipping fragment"
                        );
                        stats.skipped_fragments += 1;
                    }
                }
            }
        }

        stats.fragments_with_inchi = substances.iter().filter(|s| s.inchi().is_some()).count();
        stats.distinct_substances = distinct_inchis(&substances);
        if self.config.deduplicate {
            substances = deduplicate(substances);
        }

        info!(
            target: ASSEMBLE,
            pages = stats.pages,
            fragments = stats.fragments,
            with_inchi = stats.fragments_with_inchi,
            distinct = stats.distinct_substances,
            skipped = stats.skipped_fragments,
            "Extracted substances"
        );

        SubstanceExtraction { substances, stats }
    }

    fn substances_for(
        &self,
        page: usize,
        fragment: &Fragment,
        brackets: &[&Bracket],
        definitions: &RGroupDefinitions,
    ) -> Result<Vec<Substance>, ExtractError> {
        let graph = self.build_graph(fragment, brackets)?;
        let abbreviations = self.abbreviations(fragment);
        let occurrence = Occurrence {
            page,
            fragment: fragment.id,
            bounds: fragment.effective_bounds(),
        };

        let variants = self.expand(fragment.id, graph, definitions)?;
        let expanded = variants.len() > 1;

        let mut substances = Vec::with_capacity(variants.len());
        let mut last_error = None;
        for (variant, graph) in variants.into_iter().enumerate() {
            let identity = match self.identify(fragment.id, &graph) {
                Ok(identity) => Some(identity),
                Err(err) if !self.config.deduplicate => {
                    warn!(
                        target: ASSEMBLE,
                        page,
                        fragment = %fragment.id,
                        error = %err,
                        "Keeping substance without identity"
                    );
                    None
                }
                Err(err) => {
                    warn!(
                        target: ASSEMBLE,
                        page,
                        fragment = %fragment.id,
                        variant,
                        error = %err,
                        "Dropping variant without identity"
                    );
                    last_error = Some(err);
                    continue;
                }
            };

            substances.push(Substance {
                fragment: fragment.id,
                page,
                variant: expanded.then_some(variant),
                identity,
                occurrences: vec![occurrence.clone()],
                abbreviations: abbreviations.clone(),
                repeat_units: graph.repeat_units().to_vec(),
                projections: self.projections(&graph),
                graph,
            });
        }
        // The fragment only counts as skipped when no variant survived.
        match last_error {
            Some(err) if substances.is_empty() => Err(err),
            _ => Ok(substances),
        }
    }

    pub fn build_graph(
        &self,
        fragment: &Fragment,
        brackets: &[&Bracket],
    ) -> Result<MolecularGraph, ExtractError> {
        build_graph(
            &self.reconciler,
            fragment,
            brackets,
            self.config.min_fragment_atoms,
        )
    }

    /// One graph per R-group combination when expansion is on and the page
    /// defines any of the graph's residue labels; otherwise just `graph`.
    fn expand(
        &self,
        fragment: ObjectId,
        graph: MolecularGraph,
        definitions: &RGroupDefinitions,
    ) -> Result<Vec<MolecularGraph>, ExtractError> {
        let Some(markush) = self.services.markush.filter(|_| self.config.resolve_rgroups) else {
            return Ok(vec![graph]);
        };
        let relevant = definitions.restricted_to(graph.residue_labels());
        if relevant.is_empty() {
            return Ok(vec![graph]);
        }

        debug!(
            target: ASSEMBLE,
            %fragment,
            identifiers = relevant.len(),
            combinations = relevant.combinations(),
            "Expanding R-groups"
        );
        markush
            .expand(&graph, &relevant)
            .map_err(|source| ExtractError::Expansion { fragment, source })
    }

    fn identify(
        &self,
        fragment: ObjectId,
        graph: &MolecularGraph,
    ) -> Result<StructureIdentity, ExtractError> {
        let mut identity = self
            .services
            .identity
            .identify(graph)
            .map_err(|source| ExtractError::Identity { fragment, source })?;

        let limit = self.config.aux_info_limit;
        if identity.aux_info.as_ref().is_some_and(|aux| aux.len() > limit) {
            debug!(target: ASSEMBLE, %fragment, limit, "Dropping oversized AuxInfo");
            identity.aux_info = None;
        }
        Ok(identity)
    }

    fn projections(&self, graph: &MolecularGraph) -> Option<ProjectionFlags> {
        if !self.config.detect_projections {
            return None;
        }
        let rings = self.services.rings?.isolated_rings(graph);
        Some(ProjectionFlags::detect(&self.projections, graph, &rings))
    }

    pub fn abbreviations(&self, fragment: &Fragment) -> IndexMap<String, String> {
        let lookup: &dyn AbbreviationLookup = match self.services.abbreviations {
            Some(lookup) => lookup,
            None => self.lexicon,
        };
        abbreviation_map(fragment, self.lexicon, lookup)
    }

    pub fn extract_reactions(&self, document: &Document) -> ReactionExtraction {
        let mut stats = ExtractionStats::default();
        let mut reactions = Vec::new();

        for (index, page) in document.pages.iter().enumerate() {
            let span = info_span!(target: ASSEMBLE, "page", page = index);
            let _enter = span.enter();
            stats.pages += 1;

            if page.steps.is_empty() {
                continue;
            }

            let candidates = page_candidates(page);
            let members = candidate_members(page);
            let brackets = collect_multiple_groups(page);
            stats.fragments += members.values().map(Vec::len).sum::<usize>();

            for step in &page.steps {
                stats.reaction_steps += 1;
                let span = info_span!(target: ASSEMBLE, "step", step = %step.id);
                let _enter = span.enter();

                match self.reaction_for(index, page, step, &candidates, &members, &brackets) {
                    Ok(reaction) => reactions.push(reaction),
                    Err(err) => {
                        warn!(
                            target: ASSEMBLE,
                            page = index,
                            step = %step.id,
                            error = %err,
                            "Skipping reaction step"
                        );
                        stats.skipped_steps += 1;
                    }
                }
            }
        }

        stats.reactions = reactions.len();
        info!(
            target: ASSEMBLE,
            pages = stats.pages,
            steps = stats.reaction_steps,
            reactions = stats.reactions,
            skipped = stats.skipped_steps,
            "Extracted reactions"
        );

        ReactionExtraction { reactions, stats }
    }

    fn reaction_for(
        &self,
        page_index: usize,
        page: &Page,
        step: &ReactionStep,
        candidates: &[Candidate],
        members: &HashMap<ObjectId, Vec<&Fragment>>,
        brackets: &[&Bracket],
    ) -> Result<Reaction, ExtractError> {
        let partition = self.roles.partition(step, candidates);
        if partition.reactants.is_empty() {
            return Err(ExtractError::IncompleteReaction {
                step: step.id,
                role: "reactants",
            });
        }
        if partition.products.is_empty() {
            return Err(ExtractError::IncompleteReaction {
                step: step.id,
                role: "products",
            });
        }

        let mut graphs: Vec<(Role, MolecularGraph)> = Vec::new();
        let mut components: [Vec<ReactionComponent>; 3] = Default::default();
        for (slot, (role, ids)) in [
            (Role::Reactant, &partition.reactants),
            (Role::Agent, &partition.agents),
            (Role::Product, &partition.products),
        ]
        .into_iter()
        .enumerate()
        {
            for &candidate in ids {
                for fragment in members.get(&candidate).into_iter().flatten() {
                    let graph = match self.build_graph(fragment, brackets) {
                        Ok(graph) => graph,
                        Err(err) => {
                            warn!(
                                target: ASSEMBLE,
                                page = page_index,
                                step = %step.id,
                                fragment = %fragment.id,
                                error = %err,
                                "Leaving out reaction component"
                            );
                            continue;
                        }
                    };
                    let identity = self.component_identity(fragment.id, &graph);
                    components[slot].push(ReactionComponent {
                        fragment: fragment.id,
                        candidate,
                        role,
                        identity,
                        bounds: fragment.effective_bounds(),
                    });
                    graphs.push((role, graph));
                }
            }
        }

        let [reactants, agents, products] = components;
        if reactants.is_empty() {
            return Err(ExtractError::IncompleteReaction {
                step: step.id,
                role: "reactants",
            });
        }
        if products.is_empty() {
            return Err(ExtractError::IncompleteReaction {
                step: step.id,
                role: "products",
            });
        }

        let reaction_graphs = ReactionGraphs {
            reactants: graphs_in_role(&graphs, Role::Reactant),
            agents: graphs_in_role(&graphs, Role::Agent),
            products: graphs_in_role(&graphs, Role::Product),
        };
        let identity = match self.services.identity.identify_reaction(&reaction_graphs) {
            Ok(identity) => Some(identity),
            Err(err) => {
                warn!(
                    target: ASSEMBLE,
                    page = page_index,
                    step = %step.id,
                    error = %err,
                    "Reaction identity failed"
                );
                None
            }
        };

        Ok(Reaction {
            step: step.id,
            page: page_index,
            reactants,
            agents,
            products,
            conditions: self
                .roles
                .conditions(step, &page.texts)
                .into_iter()
                .map(str::to_string)
                .collect(),
            identity,
        })
    }

    /// Component identities are informational: a failure leaves the
    /// component without one.
    fn component_identity(
        &self,
        fragment: ObjectId,
        graph: &MolecularGraph,
    ) -> Option<StructureIdentity> {
        match self.identify(fragment, graph) {
            Ok(identity) => Some(identity),
            Err(err) => {
                warn!(target: ASSEMBLE, %fragment, error = %err, "Component without identity");
                None
            }
        }
    }
}

fn graphs_in_role(graphs: &[(Role, MolecularGraph)], wanted: Role) -> Vec<&MolecularGraph> {
    graphs
        .iter()
        .filter(|(role, _)| *role == wanted)
        .map(|(_, graph)| graph)
        .collect()
}

/// Complete fragments behind each reaction candidate: a group's own
/// complete fragments, or the fragment itself.
fn candidate_members(page: &Page) -> HashMap<ObjectId, Vec<&Fragment>> {
    let groups = page.groups.iter().map(|group| {
        let fragments = group.fragments.iter().filter(|f| is_complete(f)).collect();
        (group.id, fragments)
    });
    let fragments = page
        .fragments
        .iter()
        .filter(|f| is_complete(f))
        .map(|fragment| (fragment.id, vec![fragment]));
    groups.chain(fragments).collect()
}
