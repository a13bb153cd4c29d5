//! Interfaces to the collaborators that turn molecular graphs into
//! identifiers, perceive rings and expand Markush structures.
//!
//! Implementations are synchronous and are called at most once per fragment
//! or reaction step; failures go back to the caller unretried.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::graph::MolecularGraph;
use crate::rgroup::RGroupDefinitions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureIdentity {
    pub smiles: Option<String>,
    /// SMILES carrying 2D coordinates.
    pub extended_smiles: Option<String>,
    pub inchi: Option<String>,
    pub inchi_key: Option<String>,
    pub aux_info: Option<String>,
    pub formula: Option<String>,
}

impl StructureIdentity {
    /// The InChI when present and non-empty.
    pub fn inchi(&self) -> Option<&str> {
        self.inchi.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionIdentity {
    pub rinchi: Option<String>,
    pub long_key: Option<String>,
    pub short_key: Option<String>,
    pub web_key: Option<String>,
    pub smiles: Option<String>,
}

/// Molecular graphs of one reaction, split by role.
#[derive(Debug, Default)]
pub struct ReactionGraphs<'a> {
    pub reactants: Vec<&'a MolecularGraph>,
    pub agents: Vec<&'a MolecularGraph>,
    pub products: Vec<&'a MolecularGraph>,
}

pub trait IdentityService {
    fn identify(&self, graph: &MolecularGraph) -> Result<StructureIdentity, ServiceError>;

    fn identify_reaction(
        &self,
        reaction: &ReactionGraphs<'_>,
    ) -> Result<ReactionIdentity, ServiceError>;
}

pub trait RingPerception {
    /// Smallest set of smallest rings, each an ordered cycle of nodes.
    fn isolated_rings(&self, graph: &MolecularGraph) -> Vec<Vec<NodeIndex>>;
}

pub trait MarkushExpander {
    /// One concrete graph per substituent combination.
    fn expand(
        &self,
        graph: &MolecularGraph,
        definitions: &RGroupDefinitions,
    ) -> Result<Vec<MolecularGraph>, ServiceError>;
}

pub trait AbbreviationLookup {
    /// SMILES for a short label such as `Ph`, `None` when unknown.
    fn lookup(&self, label: &str) -> Option<&str>;
}
