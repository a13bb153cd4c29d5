//! Recognises sugar rings drawn in Haworth or chair projection.
//!
//! The geometric test walks a ring's 2D coordinates and records whether the
//! path turns left or right at each atom. Haworth rings are drawn as plain
//! convex polygons with a flat front edge, so every turn goes the same way.
//! Chairs zig-zag in a fixed pattern. The turn sequence is looked up in a
//! table of known signatures; no 3D stereochemistry is computed.
//!
//! [`is_sugar_ring`] is an unrelated topology test (one ring oxygen, enough
//! hydroxyl-like substituents). The two are reported separately.

use petgraph::graph::NodeIndex;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::trace;

use crate::document::BondOrder;
use crate::geo::{turn, Point, Turn};
use crate::graph::MolecularGraph;
use crate::logging::PROJECTION;

const OXYGEN: u8 = 8;
const CARBON: u8 = 6;

pub type TurnSequence = SmallVec<[Turn; 7]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Projection {
    Haworth,
    Chair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Handedness {
    Clockwise,
    Anticlockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectionMatch {
    Haworth(Handedness),
    Chair(Handedness),
    Other,
}

impl ProjectionMatch {
    pub fn projection(self) -> Option<Projection> {
        match self {
            ProjectionMatch::Haworth(_) => Some(Projection::Haworth),
            ProjectionMatch::Chair(_) => Some(Projection::Chair),
            ProjectionMatch::Other => None,
        }
    }
}

const L: Turn = Turn::Left;
const R: Turn = Turn::Right;

static SIGNATURES: &[(&[Turn], ProjectionMatch)] = &[
    (&[L, L, L, L, L], ProjectionMatch::Haworth(Handedness::Anticlockwise)),
    (&[L, L, L, L, L, L], ProjectionMatch::Haworth(Handedness::Anticlockwise)),
    (&[L, L, L, L, L, L, L], ProjectionMatch::Haworth(Handedness::Anticlockwise)),
    (&[R, R, R, R, R], ProjectionMatch::Haworth(Handedness::Clockwise)),
    (&[R, R, R, R, R, R], ProjectionMatch::Haworth(Handedness::Clockwise)),
    (&[R, R, R, R, R, R, R], ProjectionMatch::Haworth(Handedness::Clockwise)),
    (&[L, R, R, L, R, R], ProjectionMatch::Chair(Handedness::Clockwise)),
    (&[R, R, L, R, R, L], ProjectionMatch::Chair(Handedness::Clockwise)),
    (&[R, L, R, R, L, R], ProjectionMatch::Chair(Handedness::Clockwise)),
    (&[R, L, L, R, L, L], ProjectionMatch::Chair(Handedness::Anticlockwise)),
    (&[L, L, R, L, L, R], ProjectionMatch::Chair(Handedness::Anticlockwise)),
    (&[L, R, L, L, R, L], ProjectionMatch::Chair(Handedness::Anticlockwise)),
];

/// Exact, rotation-sensitive lookup of a turn sequence.
pub fn match_signature(turns: &[Turn]) -> ProjectionMatch {
    SIGNATURES
        .iter()
        .find(|(signature, _)| *signature == turns)
        .map(|(_, m)| *m)
        .unwrap_or(ProjectionMatch::Other)
}

/// Turn at every vertex of the closed polygon `points`, starting at the
/// first. `None` if any three consecutive points are collinear.
pub fn turn_sequence(points: &[Point]) -> Option<TurnSequence> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    (0..n)
        .map(|i| turn(points[(i + n - 1) % n], points[i], points[(i + 1) % n]))
        .collect()
}

/// Whether some edge of the closed polygon lies within `tolerance_deg` of
/// horizontal.
pub fn has_horizontal_edge(points: &[Point], tolerance_deg: f64) -> bool {
    let n = points.len();
    (0..n).any(|i| {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let (dx, dy) = ((b.x - a.x).abs(), (b.y - a.y).abs());
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        dy.atan2(dx).to_degrees() < tolerance_deg
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingProjectionClassifier {
    horizontal_tolerance_deg: f64,
}

impl Default for RingProjectionClassifier {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl RingProjectionClassifier {
    pub fn new(horizontal_tolerance_deg: f64) -> Self {
        Self {
            horizontal_tolerance_deg,
        }
    }

    /// Tests one ring, given as its ordered vertex coordinates, against
    /// `kind`. Anything that is not a match of that kind is
    /// [`ProjectionMatch::Other`].
    pub fn classify_ring(&self, points: &[Point], kind: Projection) -> ProjectionMatch {
        if !(5..=7).contains(&points.len()) {
            return ProjectionMatch::Other;
        }
        if kind == Projection::Haworth
            && !has_horizontal_edge(points, self.horizontal_tolerance_deg)
        {
            return ProjectionMatch::Other;
        }
        let Some(turns) = turn_sequence(points) else {
            trace!(target: PROJECTION, size = points.len(), "Collinear ring points");
            return ProjectionMatch::Other;
        };

        let found = match_signature(&turns);
        if found.projection() == Some(kind) {
            found
        } else {
            ProjectionMatch::Other
        }
    }

    /// Whether any ring of `graph` is drawn in `kind` projection. Rings with
    /// an atom lacking coordinates are skipped.
    pub fn contains(
        &self,
        graph: &MolecularGraph,
        rings: &[Vec<NodeIndex>],
        kind: Projection,
    ) -> bool {
        rings.iter().any(|ring| {
            ring_points(graph, ring)
                .is_some_and(|points| self.classify_ring(&points, kind) != ProjectionMatch::Other)
        })
    }
}

fn ring_points(graph: &MolecularGraph, ring: &[NodeIndex]) -> Option<Vec<Point>> {
    ring.iter().map(|&ix| graph.atom(ix).position).collect()
}

/// Furanose/pyranose-like ring from topology alone: five or six members,
/// all ring bonds single, exactly one ring oxygen with carbons elsewhere,
/// and at least two (five-membered) or three (six-membered) oxygens
/// single-bonded to ring carbons from outside the ring.
pub fn is_sugar_ring(graph: &MolecularGraph, ring: &[NodeIndex]) -> bool {
    let size = ring.len();
    let required = match size {
        5 => 2,
        6 => 3,
        _ => return false,
    };

    let all_single = (0..size).all(|i| {
        graph
            .bond_between(ring[i], ring[(i + 1) % size])
            .is_some_and(|b| b.order == BondOrder::Single)
    });
    if !all_single {
        return false;
    }

    let oxygens = ring.iter().filter(|&&ix| graph.atom(ix).element == OXYGEN).count();
    let carbons = ring.iter().filter(|&&ix| graph.atom(ix).element == CARBON).count();
    if oxygens != 1 || carbons != size - 1 {
        return false;
    }

    let exocyclic_oxygens: usize = ring
        .iter()
        .filter(|&&ix| graph.atom(ix).element == CARBON)
        .map(|&ix| {
            graph
                .neighbors(ix)
                .filter(|n| !ring.contains(n))
                .filter(|&n| graph.atom(n).element == OXYGEN)
                .filter(|&n| {
                    graph
                        .bond_between(ix, n)
                        .is_some_and(|b| b.order == BondOrder::Single)
                })
                .count()
        })
        .sum();

    exocyclic_oxygens >= required
}

/// Per-substance ring findings, each computed independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionFlags {
    pub haworth: bool,
    pub chair: bool,
    pub sugar_ring: bool,
}

impl ProjectionFlags {
    pub fn detect(
        classifier: &RingProjectionClassifier,
        graph: &MolecularGraph,
        rings: &[Vec<NodeIndex>],
    ) -> Self {
        Self {
            haworth: classifier.contains(graph, rings, Projection::Haworth),
            chair: classifier.contains(graph, rings, Projection::Chair),
            sugar_ring: rings.iter().any(|ring| is_sugar_ring(graph, ring)),
        }
    }
}
