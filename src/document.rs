//! In-memory chemical drawing document.
//!
//! The tree is produced by an external tokenizer and is read-only here.
//! Bonds refer to atoms by [`ObjectId`]; an atom that stands for an
//! abbreviation owns the expanded sub-structure as a nested [`Fragment`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::{Point, Rect};

/// Object identifier assigned by the drawing tool, unique within a document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub id: ObjectId,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub brackets: Vec<Bracket>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub steps: Vec<ReactionStep>,
}

/// A set of fragments the author grouped together on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: ObjectId,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub bounds: Option<Rect>,
}

impl Group {
    /// Declared bounds, or the union of the member fragments' bounds.
    pub fn effective_bounds(&self) -> Option<Rect> {
        self.bounds.or_else(|| {
            self.fragments
                .iter()
                .filter_map(Fragment::effective_bounds)
                .reduce(|a, b| a.union(&b))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: ObjectId,
    #[serde(default)]
    pub atoms: Vec<Atom>,
    #[serde(default)]
    pub bonds: Vec<Bond>,
    #[serde(default)]
    pub bounds: Option<Rect>,
}

impl Fragment {
    /// A fragment needs at least `min_atoms` atoms to describe a structure.
    pub fn is_valid(&self, min_atoms: usize) -> bool {
        self.atoms.len() >= min_atoms
    }

    pub fn atom(&self, id: ObjectId) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    pub fn connection_points(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|a| a.kind == NodeKind::ExternalConnectionPoint)
    }

    pub fn has_connection_point(&self) -> bool {
        self.connection_points().next().is_some()
    }

    /// Declared bounds, or the box around the atom positions.
    pub fn effective_bounds(&self) -> Option<Rect> {
        self.bounds
            .or_else(|| Rect::covering(self.atoms.iter().filter_map(|a| a.position)))
    }
}

/// What an atom node stands for in the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Element,
    ElementList,
    ElementListNickname,
    Nickname,
    Fragment,
    Formula,
    GenericNickname,
    AnonymousAlternativeGroup,
    NamedAlternativeGroup,
    MultiAttachment,
    VariableAttachment,
    ExternalConnectionPoint,
    LinkNode,
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    pub id: ObjectId,
    /// Atomic number; carbon when the drawing leaves it implicit.
    #[serde(default = "default_element")]
    pub element: u8,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub position_3d: Option<[f64; 3]>,
    /// Label text as drawn, e.g. `Ph` or `R1`.
    #[serde(default)]
    pub label: Option<String>,
    /// Chemical warning left by the drawing tool when it could not interpret
    /// the label.
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub charge: i8,
    #[serde(default)]
    pub isotope: Option<u16>,
}

fn default_element() -> u8 {
    6
}

impl Atom {
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Element node with no abbreviation hanging off it.
    pub fn is_plain_element(&self) -> bool {
        self.is_element() && self.fragments.is_empty()
    }

    pub fn is_connection_point(&self) -> bool {
        self.kind == NodeKind::ExternalConnectionPoint
    }

    /// The nested fragment this atom abbreviates, if any.
    pub fn abbreviation(&self) -> Option<&Fragment> {
        self.fragments.first()
    }

    pub fn display_text(&self) -> Option<&str> {
        self.label.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn has_unresolved_warning(&self) -> bool {
        !self.is_element() && self.warning.as_deref().is_some_and(|w| !w.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    /// Aromatic.
    OneHalf,
    Dative,
    Ionic,
    Hydrogen,
    ThreeCenter,
    SingleOrDouble,
    SingleOrAromatic,
    DoubleOrAromatic,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondDisplay {
    #[default]
    Solid,
    Dash,
    Hash,
    WedgedHashBegin,
    WedgedHashEnd,
    Bold,
    WedgeBegin,
    WedgeEnd,
    Wavy,
    HollowWedgeBegin,
    HollowWedgeEnd,
    Dot,
    DashDot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondStereo {
    #[default]
    None,
    E,
    Z,
    Undetermined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub id: ObjectId,
    pub begin: ObjectId,
    pub end: ObjectId,
    #[serde(default)]
    pub order: BondOrder,
    #[serde(default)]
    pub display: BondDisplay,
    #[serde(default)]
    pub stereo: BondStereo,
}

impl Bond {
    pub fn touches(&self, atom: ObjectId) -> bool {
        self.begin == atom || self.end == atom
    }

    /// The endpoint opposite `atom`, `None` if `atom` is not an endpoint.
    pub fn other(&self, atom: ObjectId) -> Option<ObjectId> {
        if self.begin == atom {
            Some(self.end)
        } else if self.end == atom {
            Some(self.begin)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BracketUsage {
    #[default]
    Unspecified,
    MultipleGroup,
    RepeatUnit,
    Copolymer,
    Crosslink,
    Graft,
    Modification,
    Component,
    Mixture,
    Generic,
    Anypolymer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum BracketedObject {
    Atom(ObjectId),
    Bond(ObjectId),
    Fragment(ObjectId),
    Graphic(ObjectId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bracket {
    pub id: ObjectId,
    #[serde(default)]
    pub usage: BracketUsage,
    #[serde(default)]
    pub objects: Vec<BracketedObject>,
    /// Repeat annotation as drawn next to the bracket, e.g. `3` or `n=2`.
    #[serde(default)]
    pub repeat: Option<String>,
}

impl Bracket {
    pub fn atom_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().filter_map(|o| match o {
            BracketedObject::Atom(id) => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub id: ObjectId,
    pub content: String,
    #[serde(default)]
    pub bounds: Option<Rect>,
}

/// Arrow geometry anchoring a reaction step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub tail: Point,
    pub head: Point,
    /// Distance either side of the shaft within which objects count as
    /// agents.
    #[serde(default)]
    pub extent: Option<f64>,
}

/// One step of a reaction scheme.
///
/// Role lists hold the ids the drawing tool recorded explicitly; objects
/// not listed are placed by geometry against the arrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionStep {
    pub id: ObjectId,
    pub arrow: Arrow,
    #[serde(default)]
    pub reactants: Vec<ObjectId>,
    #[serde(default)]
    pub products: Vec<ObjectId>,
    #[serde(default)]
    pub agents: Vec<ObjectId>,
}
