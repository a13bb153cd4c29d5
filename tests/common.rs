#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use molextract::document::{
    Arrow, Atom, Bond, BondOrder, Bracket, BracketUsage, BracketedObject, Document, Fragment,
    Group, NodeKind, ObjectId, Page, ReactionStep, Text,
};
use molextract::error::ServiceError;
use molextract::geo::{Point, Rect};
use molextract::graph::{GraphAtom, MolecularGraph};
use molextract::lexicon::Lexicon;
use molextract::reconcile::Reconciler;
use molextract::rgroup::RGroupDefinitions;
use molextract::services::{
    IdentityService, MarkushExpander, ReactionGraphs, ReactionIdentity, RingPerception,
    StructureIdentity,
};

pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;

pub fn atom(id: ObjectId, element: u8, kind: NodeKind, x: f64, y: f64) -> Atom {
    Atom {
        id,
        element,
        kind,
        position: Some(Point::new(x, y)),
        position_3d: None,
        label: None,
        warning: None,
        fragments: Vec::new(),
        charge: 0,
        isotope: None,
    }
}

/// Builds a fragment whose atoms and bonds take ids `id + 1`, `id + 2`, ...
/// in the order they are added.
pub struct FragmentBuilder {
    fragment: Fragment,
    next_id: u32,
}

impl FragmentBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            fragment: Fragment {
                id: ObjectId(id),
                atoms: Vec::new(),
                bonds: Vec::new(),
                bounds: None,
            },
            next_id: id + 1,
        }
    }

    fn next(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push_atom(&mut self, atom: Atom) -> ObjectId {
        let id = atom.id;
        self.fragment.atoms.push(atom);
        id
    }

    pub fn element(&mut self, element: u8, x: f64, y: f64) -> ObjectId {
        let id = self.next();
        self.push_atom(atom(id, element, NodeKind::Element, x, y))
    }

    pub fn carbon(&mut self, x: f64, y: f64) -> ObjectId {
        self.element(CARBON, x, y)
    }

    pub fn oxygen(&mut self, x: f64, y: f64) -> ObjectId {
        self.element(OXYGEN, x, y)
    }

    /// Non-element node carrying a text label, e.g. an R-group.
    pub fn labelled(&mut self, kind: NodeKind, label: &str, x: f64, y: f64) -> ObjectId {
        let id = self.next();
        let mut node = atom(id, 0, kind, x, y);
        node.label = Some(label.to_string());
        self.push_atom(node)
    }

    pub fn connection_point(&mut self, x: f64, y: f64) -> ObjectId {
        let id = self.next();
        self.push_atom(atom(id, 0, NodeKind::ExternalConnectionPoint, x, y))
    }

    /// Abbreviation atom owning `nested`.
    pub fn abbreviation(&mut self, label: &str, nested: Fragment, x: f64, y: f64) -> ObjectId {
        let id = self.next();
        let mut node = atom(id, 0, NodeKind::Fragment, x, y);
        node.label = Some(label.to_string());
        node.fragments.push(nested);
        self.push_atom(node)
    }

    pub fn bond(&mut self, begin: ObjectId, end: ObjectId) -> ObjectId {
        self.bond_with(begin, end, BondOrder::Single)
    }

    pub fn bond_with(&mut self, begin: ObjectId, end: ObjectId, order: BondOrder) -> ObjectId {
        let id = self.next();
        self.fragment.bonds.push(Bond {
            id,
            begin,
            end,
            order,
            display: Default::default(),
            stereo: Default::default(),
        });
        id
    }

    /// Closed ring of carbons through `points`; returns the atom ids in
    /// order.
    pub fn carbon_ring(&mut self, points: &[(f64, f64)]) -> Vec<ObjectId> {
        let ids: Vec<ObjectId> = points.iter().map(|&(x, y)| self.carbon(x, y)).collect();
        for i in 0..ids.len() {
            self.bond(ids[i], ids[(i + 1) % ids.len()]);
        }
        ids
    }

    pub fn bounds(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> &mut Self {
        self.fragment.bounds = Some(Rect::new(x0, y0, x1, y1));
        self
    }

    pub fn build(self) -> Fragment {
        self.fragment
    }
}

/// A methyl-like stub `[ecp]-C-C` whose attachment atom is the first carbon.
/// Returns the fragment and the attachment atom id.
pub fn nested_stub(id: u32) -> (Fragment, ObjectId) {
    let mut nested = FragmentBuilder::new(id);
    let point = nested.connection_point(0.0, 0.0);
    let attach = nested.carbon(1.0, 0.0);
    let tail = nested.carbon(2.0, 0.0);
    nested.bond(point, attach);
    nested.bond(attach, tail);
    (nested.build(), attach)
}

/// Plain `C-C` fragment with the given bounds.
pub fn ethane(id: u32, bounds: Rect) -> Fragment {
    let mut builder = FragmentBuilder::new(id);
    let a = builder.carbon(bounds.x0, bounds.y0);
    let b = builder.carbon(bounds.x1, bounds.y1);
    builder.bond(a, b);
    builder.bounds(bounds.x0, bounds.y0, bounds.x1, bounds.y1);
    builder.build()
}

pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            page: Page {
                id: ObjectId(id),
                ..Default::default()
            },
        }
    }

    pub fn fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.page.fragments.push(fragment);
        self
    }

    pub fn group(&mut self, id: u32, fragments: Vec<Fragment>) -> &mut Self {
        self.page.groups.push(Group {
            id: ObjectId(id),
            fragments,
            bounds: None,
        });
        self
    }

    pub fn text(&mut self, id: u32, content: &str, bounds: Option<Rect>) -> &mut Self {
        self.page.texts.push(Text {
            id: ObjectId(id),
            content: content.to_string(),
            bounds,
        });
        self
    }

    pub fn multiple_group(&mut self, id: u32, atoms: &[ObjectId], repeat: &str) -> &mut Self {
        self.page.brackets.push(Bracket {
            id: ObjectId(id),
            usage: BracketUsage::MultipleGroup,
            objects: atoms.iter().map(|&a| BracketedObject::Atom(a)).collect(),
            repeat: Some(repeat.to_string()),
        });
        self
    }

    pub fn bracket(&mut self, bracket: Bracket) -> &mut Self {
        self.page.brackets.push(bracket);
        self
    }

    pub fn step(&mut self, id: u32, tail: (f64, f64), head: (f64, f64)) -> &mut Self {
        self.page.steps.push(reaction_step(id, tail, head));
        self
    }

    pub fn push_step(&mut self, step: ReactionStep) -> &mut Self {
        self.page.steps.push(step);
        self
    }

    pub fn build(&mut self) -> Page {
        std::mem::take(&mut self.page)
    }
}

pub fn reaction_step(id: u32, tail: (f64, f64), head: (f64, f64)) -> ReactionStep {
    ReactionStep {
        id: ObjectId(id),
        arrow: Arrow {
            tail: Point::new(tail.0, tail.1),
            head: Point::new(head.0, head.1),
            extent: None,
        },
        reactants: Vec::new(),
        products: Vec::new(),
        agents: Vec::new(),
    }
}

pub fn document(pages: Vec<Page>) -> Document {
    Document { pages }
}

pub fn empty_lexicon() -> Lexicon {
    Lexicon::from_parts(Vec::<String>::new(), Vec::<String>::new(), Vec::<(String, String)>::new())
}

/// Reconciles and flattens `fragment` with `lexicon`.
pub fn graph_of(fragment: &Fragment, lexicon: &Lexicon) -> MolecularGraph {
    let reconciled = Reconciler::new(lexicon)
        .reconcile(fragment)
        .expect("fragment reconciles");
    MolecularGraph::from_reconciled(fragment, &reconciled.atoms, &reconciled.bonds)
        .expect("graph builds")
}

pub fn nodes(graph: &MolecularGraph, ids: &[ObjectId]) -> Vec<NodeIndex> {
    ids.iter()
        .map(|&id| graph.node(id).expect("atom is in graph"))
        .collect()
}

/// Identity derived from atom labels, elements and bond count, so equal
/// structures get equal InChIs.
#[derive(Default)]
pub struct FakeIdentity {
    /// Fragments whose identification fails.
    pub failing: HashSet<ObjectId>,
    /// Structure keys whose identification fails.
    pub failing_keys: HashSet<String>,
    /// Fragments that come back with an empty InChI.
    pub empty_inchi: HashSet<ObjectId>,
    pub aux_info_len: usize,
    pub fail_reactions: bool,
    pub calls: Cell<usize>,
}

impl FakeIdentity {
    pub fn key(graph: &MolecularGraph) -> String {
        let mut parts: Vec<String> = graph
            .atoms()
            .map(|a| match &a.label {
                Some(label) => label.clone(),
                None => a.element.to_string(),
            })
            .collect();
        parts.sort();
        format!("{}/b{}", parts.join("."), graph.bond_count())
    }

    fn side(graphs: &[&MolecularGraph]) -> String {
        graphs
            .iter()
            .map(|g| Self::key(g))
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl IdentityService for FakeIdentity {
    fn identify(&self, graph: &MolecularGraph) -> Result<StructureIdentity, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        let key = Self::key(graph);
        if self.failing.contains(&graph.fragment()) || self.failing_keys.contains(&key) {
            return Err(ServiceError::Failed(format!("cannot identify {}", graph.fragment())));
        }
        let inchi = if self.empty_inchi.contains(&graph.fragment()) {
            String::new()
        } else {
            format!("InChI=1S/{}", key)
        };
        Ok(StructureIdentity {
            smiles: Some(key.clone()),
            extended_smiles: None,
            inchi: Some(inchi),
            inchi_key: None,
            aux_info: Some("A".repeat(self.aux_info_len)),
            formula: None,
        })
    }

    fn identify_reaction(
        &self,
        reaction: &ReactionGraphs<'_>,
    ) -> Result<ReactionIdentity, ServiceError> {
        if self.fail_reactions {
            return Err(ServiceError::Unsupported("reaction".to_string()));
        }
        Ok(ReactionIdentity {
            rinchi: Some(format!(
                "RInChI=1.00.1S/{}<>{}",
                Self::side(&reaction.reactants),
                Self::side(&reaction.products)
            )),
            smiles: Some(format!(
                "{}>{}>{}",
                Self::side(&reaction.reactants),
                Self::side(&reaction.agents),
                Self::side(&reaction.products)
            )),
            ..Default::default()
        })
    }
}

/// Ring perception returning fixed rings given by atom id.
pub struct FakeRings {
    pub rings: Vec<Vec<ObjectId>>,
}

impl RingPerception for FakeRings {
    fn isolated_rings(&self, graph: &MolecularGraph) -> Vec<Vec<NodeIndex>> {
        self.rings
            .iter()
            .filter_map(|ring| ring.iter().map(|&id| graph.node(id)).collect())
            .collect()
    }
}

/// Replaces each R-group label with every substituent in turn.
#[derive(Default)]
pub struct FakeMarkush {
    pub fail: bool,
}

impl MarkushExpander for FakeMarkush {
    fn expand(
        &self,
        graph: &MolecularGraph,
        definitions: &RGroupDefinitions,
    ) -> Result<Vec<MolecularGraph>, ServiceError> {
        if self.fail {
            return Err(ServiceError::Failed("expansion".to_string()));
        }

        let mut choices: Vec<Vec<(String, String)>> = vec![Vec::new()];
        for (identifier, labels) in definitions.iter() {
            choices = choices
                .into_iter()
                .flat_map(|chosen| {
                    labels.iter().map(move |label| {
                        let mut next = chosen.clone();
                        next.push((identifier.to_string(), label.clone()));
                        next
                    })
                })
                .collect();
        }

        Ok(choices
            .into_iter()
            .map(|chosen| {
                let mut variant = MolecularGraph::new(graph.fragment());
                for node in graph.atoms() {
                    let mut node: GraphAtom = node.clone();
                    if let Some((_, substituent)) = chosen
                        .iter()
                        .find(|(identifier, _)| node.label.as_deref() == Some(identifier.as_str()))
                    {
                        node.label = Some(substituent.clone());
                    }
                    variant.add_atom(node);
                }
                for edge in graph.graph().edge_references() {
                    let a = graph.atom(edge.source()).id;
                    let b = graph.atom(edge.target()).id;
                    variant.add_bond(a, b, edge.weight().clone());
                }
                variant
            })
            .collect())
    }
}
