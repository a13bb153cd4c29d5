//! Depth-first traversal over the document tree.
//!
//! Order per page: groups (each group, then its fragments), page-level
//! fragments, brackets, texts, reaction steps. Inside a fragment every atom
//! is visited before the fragments nested in it, and bonds come after all
//! atoms. A nested fragment is only ever reached through the atom that owns
//! it, so each node is visited once.

use crate::document::{
    Atom, Bond, Bracket, Document, Fragment, Group, ObjectId, Page, ReactionStep, Text,
};

/// The edge through which a fragment was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOwner {
    Page,
    Group(ObjectId),
    Atom(ObjectId),
}

impl FragmentOwner {
    pub fn is_nested(self) -> bool {
        matches!(self, FragmentOwner::Atom(_))
    }
}

/// Per-node callbacks. Every method defaults to a no-op.
pub trait DocumentVisitor<'doc> {
    fn visit_page(&mut self, _index: usize, _page: &'doc Page) {}

    fn visit_group(&mut self, _group: &'doc Group) {}

    fn visit_fragment(&mut self, _fragment: &'doc Fragment, _owner: FragmentOwner) {}

    fn visit_atom(&mut self, _atom: &'doc Atom, _fragment: &'doc Fragment) {}

    fn visit_bond(&mut self, _bond: &'doc Bond, _fragment: &'doc Fragment) {}

    fn visit_bracket(&mut self, _bracket: &'doc Bracket) {}

    fn visit_text(&mut self, _text: &'doc Text) {}

    fn visit_reaction_step(&mut self, _step: &'doc ReactionStep) {}
}

pub fn walk_document<'doc, V>(visitor: &mut V, document: &'doc Document)
where
    V: DocumentVisitor<'doc> + ?Sized,
{
    for (index, page) in document.pages.iter().enumerate() {
        walk_page(visitor, index, page);
    }
}

pub fn walk_page<'doc, V>(visitor: &mut V, index: usize, page: &'doc Page)
where
    V: DocumentVisitor<'doc> + ?Sized,
{
    visitor.visit_page(index, page);

    for group in &page.groups {
        visitor.visit_group(group);
        for fragment in &group.fragments {
            walk_fragment(visitor, fragment, FragmentOwner::Group(group.id));
        }
    }
    for fragment in &page.fragments {
        walk_fragment(visitor, fragment, FragmentOwner::Page);
    }
    for bracket in &page.brackets {
        visitor.visit_bracket(bracket);
    }
    for text in &page.texts {
        visitor.visit_text(text);
    }
    for step in &page.steps {
        visitor.visit_reaction_step(step);
    }
}

pub fn walk_fragment<'doc, V>(visitor: &mut V, fragment: &'doc Fragment, owner: FragmentOwner)
where
    V: DocumentVisitor<'doc> + ?Sized,
{
    visitor.visit_fragment(fragment, owner);

    for atom in &fragment.atoms {
        visitor.visit_atom(atom, fragment);
        for nested in &atom.fragments {
            walk_fragment(visitor, nested, FragmentOwner::Atom(atom.id));
        }
    }
    for bond in &fragment.bonds {
        visitor.visit_bond(bond, fragment);
    }
}
