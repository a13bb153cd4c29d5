//! Flattened molecular graph handed to the identity service.
//!
//! Nodes and edges keep the [`ObjectId`] of the drawing object they came
//! from, so results can be traced back to the page.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::Serialize;

use crate::brackets::RepeatUnit;
use crate::document::{
    Atom, Bond, BondDisplay, BondOrder, BondStereo, Fragment, NodeKind, ObjectId,
};
use crate::error::ExtractError;
use crate::geo::Point;
use crate::reconcile::AtomIndex;
use crate::rgroup::is_rgroup_label;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphAtom {
    pub id: ObjectId,
    pub element: u8,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub position: Option<Point>,
    pub charge: i8,
    pub isotope: Option<u16>,
}

impl From<&Atom> for GraphAtom {
    fn from(atom: &Atom) -> Self {
        Self {
            id: atom.id,
            element: atom.element,
            kind: atom.kind,
            label: atom.display_text().map(str::to_string),
            position: atom.position,
            charge: atom.charge,
            isotope: atom.isotope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphBond {
    pub id: ObjectId,
    pub order: BondOrder,
    pub display: BondDisplay,
    pub stereo: BondStereo,
}

impl From<&Bond> for GraphBond {
    fn from(bond: &Bond) -> Self {
        Self {
            id: bond.id,
            order: bond.order,
            display: bond.display,
            stereo: bond.stereo,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MolecularGraph {
    fragment: ObjectId,
    graph: UnGraph<GraphAtom, GraphBond>,
    nodes: HashMap<ObjectId, NodeIndex>,
    repeat_units: Vec<RepeatUnit>,
}

impl MolecularGraph {
    pub fn new(fragment: ObjectId) -> Self {
        Self {
            fragment,
            graph: UnGraph::default(),
            nodes: HashMap::new(),
            repeat_units: Vec::new(),
        }
    }

    /// Builds the graph of `fragment` from its reconciled bond list.
    ///
    /// Nodes are the fragment's own plain element atoms plus every endpoint
    /// of a retained bond, in document order. An endpoint missing from
    /// `atoms` is a [`ExtractError::DanglingBond`].
    pub fn from_reconciled(
        fragment: &Fragment,
        atoms: &AtomIndex<'_>,
        bonds: &[Bond],
    ) -> Result<Self, ExtractError> {
        let mut wanted: HashSet<ObjectId> = fragment
            .atoms
            .iter()
            .filter(|a| a.is_plain_element())
            .map(|a| a.id)
            .collect();

        for bond in bonds {
            for end in [bond.begin, bond.end] {
                if !atoms.contains(end) {
                    return Err(ExtractError::DanglingBond {
                        fragment: fragment.id,
                        bond: bond.id,
                        atom: end,
                    });
                }
                wanted.insert(end);
            }
        }

        let mut graph = Self::new(fragment.id);
        for atom in atoms.iter().filter(|a| wanted.contains(&a.id)) {
            graph.add_atom(GraphAtom::from(atom));
        }
        for bond in bonds {
            graph.add_bond(bond.begin, bond.end, GraphBond::from(bond));
        }

        Ok(graph)
    }

    /// Adds `atom` unless a node with the same id exists.
    pub fn add_atom(&mut self, atom: GraphAtom) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(&atom.id) {
            return ix;
        }
        let id = atom.id;
        let ix = self.graph.add_node(atom);
        self.nodes.insert(id, ix);
        ix
    }

    /// Adds an edge between two existing nodes. Self loops and parallel
    /// edges are ignored.
    pub fn add_bond(&mut self, a: ObjectId, b: ObjectId, bond: GraphBond) -> Option<EdgeIndex> {
        let (&ia, &ib) = (self.nodes.get(&a)?, self.nodes.get(&b)?);
        if ia == ib || self.graph.find_edge(ia, ib).is_some() {
            return None;
        }
        Some(self.graph.add_edge(ia, ib, bond))
    }

    pub fn fragment(&self) -> ObjectId {
        self.fragment
    }

    pub fn graph(&self) -> &UnGraph<GraphAtom, GraphBond> {
        &self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: ObjectId) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }

    pub fn atom(&self, ix: NodeIndex) -> &GraphAtom {
        &self.graph[ix]
    }

    pub fn atoms(&self) -> impl Iterator<Item = &GraphAtom> {
        self.graph.node_weights()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&GraphBond> {
        self.graph.find_edge(a, b).map(|e| &self.graph[e])
    }

    pub fn neighbors(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(ix)
    }

    /// Distinct R-group labels carried by atoms, in node order.
    pub fn residue_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in self.atoms().filter_map(|a| a.label.as_deref()) {
            if is_rgroup_label(label) && !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    pub fn repeat_units(&self) -> &[RepeatUnit] {
        &self.repeat_units
    }

    pub fn set_repeat_units(&mut self, units: Vec<RepeatUnit>) {
        self.repeat_units = units;
    }
}
