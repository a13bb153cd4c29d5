use molextract::document::{Arrow, ObjectId};
use molextract::geo::{line_intersects_rect, Point, Rect};
use molextract::reaction::{page_candidates, role_of, Candidate, Role, RoleClassifier};
use pretty_assertions::assert_eq;

mod common;
use common::{ethane, nested_stub, reaction_step, PageBuilder};

fn arrow() -> Arrow {
    Arrow {
        tail: Point::new(0.0, 0.0),
        head: Point::new(10.0, 0.0),
        extent: None,
    }
}

fn candidate(id: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Candidate {
    Candidate {
        id: ObjectId(id),
        bounds: Rect::new(x0, y0, x1, y1),
    }
}

#[cfg(test)]
mod intersection_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diagonal_crosses_rect() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(line_intersects_rect(
            Point::new(-5.0, -5.0),
            Point::new(15.0, 15.0),
            &rect
        ));
    }

    #[test]
    fn test_vertical_line_beside_rect() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!line_intersects_rect(
            Point::new(12.0, 0.0),
            Point::new(12.0, 10.0),
            &rect
        ));
    }

    #[test]
    fn test_corner_order_does_not_matter() {
        let ordered = Rect::new(0.0, 0.0, 10.0, 10.0);
        let reversed = Rect {
            x0: 10.0,
            y0: 10.0,
            x1: 0.0,
            y1: 0.0,
        };
        let cases = [
            (Point::new(-5.0, -5.0), Point::new(15.0, 15.0)),
            (Point::new(12.0, 0.0), Point::new(12.0, 10.0)),
            (Point::new(-3.0, 5.0), Point::new(-1.0, 5.0)),
        ];
        for (start, end) in cases {
            assert_eq!(
                line_intersects_rect(start, end, &ordered),
                line_intersects_rect(start, end, &reversed)
            );
        }
    }

    #[test]
    fn test_line_extends_past_its_endpoints() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        // The drawn connector stops short of the rectangle.
        assert!(line_intersects_rect(
            Point::new(-5.0, 5.0),
            Point::new(-2.0, 5.0),
            &rect
        ));
    }

    #[test]
    fn test_line_through_corner_touches() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!line_intersects_rect(
            Point::new(10.0, 20.0),
            Point::new(20.0, 10.0),
            &rect
        ));
        assert!(line_intersects_rect(
            Point::new(0.0, 20.0),
            Point::new(20.0, 0.0),
            &rect
        ));
    }
}

#[cfg(test)]
mod role_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roles_by_position() {
        let arrow = arrow();
        let extent = 5.0;
        assert_eq!(
            role_of(&arrow, extent, &Rect::new(-8.0, -1.0, -4.0, 1.0)),
            Some(Role::Reactant)
        );
        assert_eq!(
            role_of(&arrow, extent, &Rect::new(14.0, -1.0, 18.0, 1.0)),
            Some(Role::Product)
        );
        assert_eq!(
            role_of(&arrow, extent, &Rect::new(3.0, 2.0, 7.0, 4.0)),
            Some(Role::Agent)
        );
        assert_eq!(
            role_of(&arrow, extent, &Rect::new(3.0, -4.0, 7.0, -2.0)),
            Some(Role::Agent)
        );
        assert_eq!(role_of(&arrow, extent, &Rect::new(3.0, 20.0, 7.0, 22.0)), None);
        assert_eq!(role_of(&arrow, extent, &Rect::new(-8.0, 20.0, -4.0, 22.0)), None);
    }

    #[test]
    fn test_roles_follow_arrow_direction() {
        // Right-to-left arrow: what sits on the right is the reactant.
        let arrow = Arrow {
            tail: Point::new(10.0, 0.0),
            head: Point::new(0.0, 0.0),
            extent: None,
        };
        assert_eq!(
            role_of(&arrow, 5.0, &Rect::new(14.0, -1.0, 18.0, 1.0)),
            Some(Role::Reactant)
        );
        assert_eq!(
            role_of(&arrow, 5.0, &Rect::new(-8.0, -1.0, -4.0, 1.0)),
            Some(Role::Product)
        );
    }

    #[test]
    fn test_zero_length_arrow_places_nothing() {
        let arrow = Arrow {
            tail: Point::new(1.0, 1.0),
            head: Point::new(1.0, 1.0),
            extent: None,
        };
        assert_eq!(role_of(&arrow, 5.0, &Rect::new(0.0, 0.0, 2.0, 2.0)), None);
    }

    #[test]
    fn test_extent_defaults_to_fraction_of_length() {
        let classifier = RoleClassifier::new(0.5);
        let mut arrow = arrow();
        assert_eq!(classifier.extent(&arrow), 5.0);
        arrow.extent = Some(1.0);
        assert_eq!(classifier.extent(&arrow), 1.0);
    }

    #[test]
    fn test_partition_orders_along_arrow() {
        let step = reaction_step(1, (0.0, 0.0), (10.0, 0.0));
        let candidates = [
            candidate(10, -8.0, -1.0, -4.0, 1.0),
            candidate(11, -24.0, -1.0, -16.0, 1.0),
            candidate(12, 14.0, -1.0, 18.0, 1.0),
            candidate(13, 3.0, 2.0, 7.0, 4.0),
            candidate(14, 3.0, 40.0, 7.0, 44.0),
        ];

        let partition = RoleClassifier::default().partition(&step, &candidates);
        assert_eq!(partition.reactants, vec![ObjectId(11), ObjectId(10)]);
        assert_eq!(partition.agents, vec![ObjectId(13)]);
        assert_eq!(partition.products, vec![ObjectId(12)]);
        assert_eq!(partition.role_of(ObjectId(14)), None);
    }

    #[test]
    fn test_explicit_roles_win() {
        let mut step = reaction_step(1, (0.0, 0.0), (10.0, 0.0));
        step.products.push(ObjectId(10));
        step.agents.push(ObjectId(14));
        let candidates = [
            candidate(10, -8.0, -1.0, -4.0, 1.0),
            candidate(12, 14.0, -1.0, 18.0, 1.0),
            candidate(14, 3.0, 40.0, 7.0, 44.0),
        ];

        let partition = RoleClassifier::default().partition(&step, &candidates);
        assert!(partition.reactants.is_empty());
        assert_eq!(partition.agents, vec![ObjectId(14)]);
        assert_eq!(partition.products, vec![ObjectId(10), ObjectId(12)]);
    }
}

#[cfg(test)]
mod page_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_groups_and_complete_fragments_are_candidates() {
        let (stub, _) = nested_stub(900);
        let page = PageBuilder::new(1)
            .group(
                50,
                vec![
                    ethane(100, Rect::new(-10.0, 0.0, -8.0, 1.0)),
                    ethane(200, Rect::new(-6.0, -1.0, -4.0, 0.0)),
                ],
            )
            .fragment(ethane(300, Rect::new(14.0, 0.0, 16.0, 1.0)))
            .fragment(stub)
            .build();

        let candidates = page_candidates(&page);
        let ids: Vec<u32> = candidates.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![50, 300]);
        assert_eq!(candidates[0].bounds, Rect::new(-10.0, -1.0, -4.0, 1.0));
    }

    #[test]
    fn test_conditions_come_from_agent_band() {
        let mut builder = PageBuilder::new(1);
        builder
            .text(70, "Pd/C, H2", Some(Rect::new(3.0, 1.0, 7.0, 2.0)))
            .text(71, "rt, 2 h", Some(Rect::new(3.0, -2.0, 7.0, -1.0)))
            .text(72, "Scheme 1", Some(Rect::new(-8.0, -1.0, -4.0, 1.0)))
            .text(73, "   ", Some(Rect::new(3.0, 1.0, 7.0, 2.0)))
            .text(74, "no bounds", None);
        let page = builder.build();

        let step = reaction_step(1, (0.0, 0.0), (10.0, 0.0));
        let conditions = RoleClassifier::default().conditions(&step, &page.texts);
        assert_eq!(conditions, vec!["Pd/C, H2", "rt, 2 h"]);
    }
}
