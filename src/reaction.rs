//! Places the objects around a reaction arrow into reactant, agent and
//! product roles.
//!
//! Geometry is measured in the arrow's own frame: `along` runs from the tail
//! towards the head, `perp` is the signed distance from the shaft. Objects
//! before the tail are reactants and objects past the head are products,
//! provided they sit in line with the arrow. Objects beside the shaft, within
//! its extent, are agents.

use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::{debug, trace};

use crate::classify::is_complete;
use crate::document::{Arrow, ObjectId, Page, ReactionStep, Text};
use crate::geo::{line_intersects_rect, ArrowFrame, Rect};
use crate::logging::REACTION_GEOMETRY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Reactant,
    Agent,
    Product,
}

/// An object that may take part in a reaction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: ObjectId,
    pub bounds: Rect,
}

/// Candidates of every group on the page, then every complete page-level
/// fragment. Objects without bounds cannot be placed and are left out.
pub fn page_candidates(page: &Page) -> Vec<Candidate> {
    let groups = page.groups.iter().filter_map(|group| {
        group.effective_bounds().map(|bounds| Candidate {
            id: group.id,
            bounds,
        })
    });
    let fragments = page
        .fragments
        .iter()
        .filter(|fragment| is_complete(fragment))
        .filter_map(|fragment| {
            fragment.effective_bounds().map(|bounds| Candidate {
                id: fragment.id,
                bounds,
            })
        });
    groups.chain(fragments).collect()
}

/// Candidate ids per role, each list ordered along the arrow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolePartition {
    pub reactants: Vec<ObjectId>,
    pub agents: Vec<ObjectId>,
    pub products: Vec<ObjectId>,
}

impl RolePartition {
    pub fn role_of(&self, id: ObjectId) -> Option<Role> {
        if self.reactants.contains(&id) {
            Some(Role::Reactant)
        } else if self.agents.contains(&id) {
            Some(Role::Agent)
        } else if self.products.contains(&id) {
            Some(Role::Product)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reactants.is_empty() && self.agents.is_empty() && self.products.is_empty()
    }
}

/// Role of `rect` relative to `arrow`, with `extent` the half-width of the
/// agent band either side of the shaft. A zero-length arrow places nothing.
pub fn role_of(arrow: &Arrow, extent: f64, rect: &Rect) -> Option<Role> {
    let frame = ArrowFrame::new(arrow.tail, arrow.head)?;
    let local = frame.project_rect(rect);
    let along = local.along_center();

    let in_line = || {
        line_intersects_rect(arrow.tail, arrow.head, rect) || local.perp_center().abs() <= extent
    };

    if along < 0.0 {
        in_line().then_some(Role::Reactant)
    } else if along > frame.length() {
        in_line().then_some(Role::Product)
    } else if local.perp_max >= -extent && local.perp_min <= extent {
        Some(Role::Agent)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleClassifier {
    agent_extent_ratio: f64,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl RoleClassifier {
    pub fn new(agent_extent_ratio: f64) -> Self {
        Self { agent_extent_ratio }
    }

    /// Agent band half-width: the arrow's own extent, or a fraction of its
    /// length.
    pub fn extent(&self, arrow: &Arrow) -> f64 {
        arrow
            .extent
            .unwrap_or_else(|| arrow.tail.distance(&arrow.head) * self.agent_extent_ratio)
    }

    /// Role of one candidate. Ids the step lists explicitly keep their listed
    /// role; everything else is placed by geometry.
    pub fn role(&self, step: &ReactionStep, candidate: &Candidate) -> Option<Role> {
        if step.reactants.contains(&candidate.id) {
            return Some(Role::Reactant);
        }
        if step.products.contains(&candidate.id) {
            return Some(Role::Product);
        }
        if step.agents.contains(&candidate.id) {
            return Some(Role::Agent);
        }
        role_of(&step.arrow, self.extent(&step.arrow), &candidate.bounds)
    }

    pub fn partition(&self, step: &ReactionStep, candidates: &[Candidate]) -> RolePartition {
        let frame = ArrowFrame::new(step.arrow.tail, step.arrow.head);
        let along = |c: &Candidate| {
            OrderedFloat(frame.map_or(0.0, |f| f.project_rect(&c.bounds).along_center()))
        };

        let mut placed: Vec<(&Candidate, Role)> = candidates
            .iter()
            .filter_map(|candidate| {
                let role = self.role(step, candidate);
                trace!(
                    target: REACTION_GEOMETRY,
                    step = %step.id,
                    candidate = %candidate.id,
                    ?role,
                    "Placed candidate"
                );
                role.map(|role| (candidate, role))
            })
            .collect();
        placed.sort_by_key(|(candidate, _)| along(candidate));

        let mut partition = RolePartition::default();
        for (candidate, role) in placed {
            match role {
                Role::Reactant => partition.reactants.push(candidate.id),
                Role::Agent => partition.agents.push(candidate.id),
                Role::Product => partition.products.push(candidate.id),
            }
        }

        debug!(
            target: REACTION_GEOMETRY,
            step = %step.id,
            reactants = partition.reactants.len(),
            agents = partition.agents.len(),
            products = partition.products.len(),
            "Partitioned reaction step"
        );
        partition
    }

    /// Text drawn in the agent band of `step`, typically reagents and
    /// conditions written above or below the arrow.
    pub fn conditions<'doc>(&self, step: &ReactionStep, texts: &'doc [Text]) -> Vec<&'doc str> {
        let extent = self.extent(&step.arrow);
        texts
            .iter()
            .filter(|text| {
                text.bounds
                    .is_some_and(|b| role_of(&step.arrow, extent, &b) == Some(Role::Agent))
            })
            .map(|text| text.content.trim())
            .filter(|content| !content.is_empty())
            .collect()
    }
}
