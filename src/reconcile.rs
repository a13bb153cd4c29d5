//! Turns a fragment's raw bond list into the bonds of its molecular graph.
//!
//! Three things in the drawing need fixing up on the way:
//!
//! * An atom that abbreviates a nested fragment (`Ph`, `Boc`, ...) is only
//!   a placeholder. A bond to it really ends at the nested atom bonded to
//!   the nested fragment's external connection point, and the nested
//!   fragment's own bonds join the parent's list.
//! * Abbreviations whose label is on the unwanted list are annotations.
//!   Their nested bonds are left out and nothing is spliced.
//! * Only bonds between atoms that mean something chemically are kept (see
//!   [`Reconciler::retains`]).
//!
//! The input tree is never modified. Rewritten bonds are copies.

use std::collections::HashSet;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::document::{Atom, Bond, Fragment, NodeKind, ObjectId};
use crate::error::ExtractError;
use crate::lexicon::Lexicon;
use crate::logging::RECONCILE;
use crate::rgroup::is_rgroup_label;
use crate::visit::{walk_fragment, DocumentVisitor, FragmentOwner};

/// Every atom of a fragment, nested fragments included, by id and in
/// document order.
#[derive(Debug, Default)]
pub struct AtomIndex<'doc> {
    atoms: IndexMap<ObjectId, &'doc Atom>,
}

struct AtomIndexer<'doc> {
    atoms: IndexMap<ObjectId, &'doc Atom>,
}

impl<'doc> DocumentVisitor<'doc> for AtomIndexer<'doc> {
    fn visit_atom(&mut self, atom: &'doc Atom, _fragment: &'doc Fragment) {
        self.atoms.entry(atom.id).or_insert(atom);
    }
}

impl<'doc> AtomIndex<'doc> {
    pub fn build(fragment: &'doc Fragment) -> Self {
        let mut indexer = AtomIndexer {
            atoms: IndexMap::new(),
        };
        walk_fragment(&mut indexer, fragment, FragmentOwner::Page);
        Self {
            atoms: indexer.atoms,
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&'doc Atom> {
        self.atoms.get(&id).copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.atoms.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'doc Atom> + '_ {
        self.atoms.values().copied()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Reconciled bonds together with the index their endpoints resolve in.
#[derive(Debug)]
pub struct Reconciled<'doc> {
    pub atoms: AtomIndex<'doc>,
    pub bonds: Vec<Bond>,
}

/// Atom a nested fragment attaches through: the neighbour of its single
/// external connection point.
pub fn attachment_atom(nested: &Fragment) -> Result<ObjectId, ExtractError> {
    let mut points = nested.connection_points();
    let point = points.next().ok_or(ExtractError::MissingConnectionPoint {
        fragment: nested.id,
    })?;
    let extra = points.count();
    if extra > 0 {
        return Err(ExtractError::AmbiguousConnectionPoint {
            fragment: nested.id,
            count: extra + 1,
        });
    }

    nested
        .bonds
        .iter()
        .find_map(|bond| bond.other(point.id))
        .ok_or(ExtractError::NoAttachmentBond {
            fragment: nested.id,
            point: point.id,
        })
}

pub struct Reconciler<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> Reconciler<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn reconcile<'doc>(
        &self,
        fragment: &'doc Fragment,
    ) -> Result<Reconciled<'doc>, ExtractError> {
        let atoms = AtomIndex::build(fragment);
        let mut pass = SplicePass {
            reconciler: self,
            fragment: fragment.id,
            atoms: &atoms,
            spliced: HashSet::new(),
            bonds: Vec::new(),
        };

        pass.process(&fragment.bonds)?;

        // Abbreviations no bond points at still contribute their own bonds.
        for atom in &fragment.atoms {
            if let Some(nested) = self.spliceable(atom) {
                if pass.spliced.insert(nested.id) {
                    pass.process(&nested.bonds)?;
                }
            }
        }

        let bonds = pass.bonds;
        debug!(
            target: RECONCILE,
            fragment = %fragment.id,
            raw = fragment.bonds.len(),
            reconciled = bonds.len(),
            "Reconciled bonds"
        );

        Ok(Reconciled { atoms, bonds })
    }

    /// Endpoint rewrite only: no filtering, no nested bonds added. A bond
    /// whose endpoints own no spliceable abbreviation comes back unchanged,
    /// so applying this to its own output changes nothing.
    pub fn splice(
        &self,
        bonds: &[Bond],
        atoms: &AtomIndex<'_>,
    ) -> Result<Vec<Bond>, ExtractError> {
        bonds
            .iter()
            .map(|bond| self.splice_bond(bond, atoms).map(|(spliced, _)| spliced))
            .collect()
    }

    fn splice_bond<'doc>(
        &self,
        bond: &Bond,
        atoms: &AtomIndex<'doc>,
    ) -> Result<(Bond, SmallVec<[&'doc Fragment; 2]>), ExtractError> {
        let mut out = bond.clone();
        let mut nested_used = SmallVec::new();

        for at_begin in [true, false] {
            let endpoint = if at_begin { out.begin } else { out.end };
            let Some(nested) = atoms.get(endpoint).and_then(|a| self.spliceable(a)) else {
                continue;
            };
            let target = attachment_atom(nested)?;
            trace!(
                target: RECONCILE,
                bond = %bond.id,
                from = %endpoint,
                to = %target,
                "Splicing abbreviation"
            );
            if at_begin {
                out.begin = target;
            } else {
                out.end = target;
            }
            nested_used.push(nested);
        }

        Ok((out, nested_used))
    }

    /// The nested fragment of `atom`, unless there is none or its label is
    /// an unwanted abbreviation.
    fn spliceable<'doc>(&self, atom: &'doc Atom) -> Option<&'doc Fragment> {
        let nested = atom.abbreviation()?;
        if let Some(label) = atom.display_text() {
            if self.lexicon.is_unwanted_abbreviation(label) {
                trace!(
                    target: RECONCILE,
                    atom = %atom.id,
                    label,
                    "Suppressing unwanted abbreviation"
                );
                return None;
            }
        }
        Some(nested)
    }

    /// Whether a spliced bond belongs in the molecular graph. It does when
    /// both ends are plain elements, or either end is an R-group label, a
    /// multi-attachment node, or a label the drawing tool flagged as
    /// uninterpretable.
    pub fn retains(&self, a: &Atom, b: &Atom) -> bool {
        let kept_end = |atom: &Atom| {
            atom.display_text().is_some_and(is_rgroup_label)
                || atom.kind == NodeKind::MultiAttachment
                || atom.has_unresolved_warning()
        };
        (a.is_plain_element() && b.is_plain_element()) || kept_end(a) || kept_end(b)
    }
}

struct SplicePass<'r, 'a, 'doc> {
    reconciler: &'r Reconciler<'a>,
    fragment: ObjectId,
    atoms: &'r AtomIndex<'doc>,
    spliced: HashSet<ObjectId>,
    bonds: Vec<Bond>,
}

impl<'doc> SplicePass<'_, '_, 'doc> {
    fn process(&mut self, bonds: &[Bond]) -> Result<(), ExtractError> {
        for raw in bonds {
            let (bond, nested) = self.reconciler.splice_bond(raw, self.atoms)?;

            let begin = self.resolve(&bond, bond.begin)?;
            let end = self.resolve(&bond, bond.end)?;
            if self.reconciler.retains(begin, end) {
                self.bonds.push(bond);
            } else {
                trace!(target: RECONCILE, bond = %raw.id, "Dropping bond");
            }

            for fragment in nested {
                if self.spliced.insert(fragment.id) {
                    self.process(&fragment.bonds)?;
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, bond: &Bond, atom: ObjectId) -> Result<&'doc Atom, ExtractError> {
        self.atoms.get(atom).ok_or(ExtractError::DanglingBond {
            fragment: self.fragment,
            bond: bond.id,
            atom,
        })
    }
}
