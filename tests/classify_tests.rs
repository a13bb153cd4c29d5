use molextract::classify::{classify_fragments, is_complete};
use molextract::document::{Atom, Bond, Bracket, Fragment, ObjectId, Page, ReactionStep, Text};
use molextract::visit::{walk_document, DocumentVisitor, FragmentOwner};
use pretty_assertions::assert_eq;

mod common;
use common::{document, nested_stub, FragmentBuilder, PageBuilder};

fn ids(fragments: &[&Fragment]) -> Vec<u32> {
    fragments.iter().map(|f| f.id.0).collect()
}

#[cfg(test)]
mod fragment_classifier_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_connection_point_decides_completeness() {
        let mut plain = FragmentBuilder::new(100);
        let a = plain.carbon(0.0, 0.0);
        let b = plain.carbon(1.0, 0.0);
        plain.bond(a, b);
        let plain = plain.build();

        let (stub, _) = nested_stub(200);

        assert!(is_complete(&plain));
        assert!(!is_complete(&stub));
    }

    #[test]
    fn test_single_atom_fragment_without_bonds_is_complete() {
        let mut lone = FragmentBuilder::new(100);
        lone.carbon(0.0, 0.0);
        assert!(is_complete(&lone.build()));
    }

    #[test]
    fn test_nested_fragments_are_never_complete() {
        let mut outer = FragmentBuilder::new(100);
        let c = outer.carbon(0.0, 0.0);
        // An abbreviation's fragment with its connection point stripped is
        // still nested.
        let mut inner = FragmentBuilder::new(500);
        let x = inner.carbon(1.0, 0.0);
        let y = inner.carbon(2.0, 0.0);
        inner.bond(x, y);
        let ph = outer.abbreviation("Ph", inner.build(), 1.0, 0.0);
        outer.bond(c, ph);

        let (stub, _) = nested_stub(300);
        let page = PageBuilder::new(1).fragment(outer.build()).fragment(stub).build();

        let classification = classify_fragments(&page);
        assert_eq!(ids(&classification.complete), vec![100]);
        assert_eq!(ids(&classification.all), vec![100, 500, 300]);
    }

    #[test]
    fn test_group_fragments_are_classified() {
        let mut member = FragmentBuilder::new(100);
        member.carbon(0.0, 0.0);
        let (stub, _) = nested_stub(200);

        let mut loose = FragmentBuilder::new(300);
        loose.carbon(5.0, 5.0);

        let page = PageBuilder::new(1)
            .group(50, vec![member.build(), stub])
            .fragment(loose.build())
            .build();

        let classification = classify_fragments(&page);
        assert_eq!(ids(&classification.complete), vec![100, 300]);
        assert_eq!(ids(&classification.all), vec![100, 200, 300]);
    }

    #[test]
    fn test_empty_page() {
        let page = Page::default();
        let classification = classify_fragments(&page);
        assert!(classification.complete.is_empty());
        assert!(classification.all.is_empty());
    }
}

#[cfg(test)]
mod visitor_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl<'doc> DocumentVisitor<'doc> for Recorder {
        fn visit_page(&mut self, index: usize, _page: &'doc Page) {
            self.events.push(format!("page {}", index));
        }

        fn visit_fragment(&mut self, fragment: &'doc Fragment, owner: FragmentOwner) {
            let owner = match owner {
                FragmentOwner::Page => "page".to_string(),
                FragmentOwner::Group(id) => format!("group {}", id.0),
                FragmentOwner::Atom(id) => format!("atom {}", id.0),
            };
            self.events.push(format!("fragment {} in {}", fragment.id.0, owner));
        }

        fn visit_atom(&mut self, atom: &'doc Atom, _fragment: &'doc Fragment) {
            self.events.push(format!("atom {}", atom.id.0));
        }

        fn visit_bond(&mut self, bond: &'doc Bond, _fragment: &'doc Fragment) {
            self.events.push(format!("bond {}", bond.id.0));
        }

        fn visit_bracket(&mut self, bracket: &'doc Bracket) {
            self.events.push(format!("bracket {}", bracket.id.0));
        }

        fn visit_text(&mut self, text: &'doc Text) {
            self.events.push(format!("text {}", text.id.0));
        }

        fn visit_reaction_step(&mut self, step: &'doc ReactionStep) {
            self.events.push(format!("step {}", step.id.0));
        }
    }

    #[test]
    fn test_walk_order() {
        let (stub, _) = nested_stub(500);
        let mut outer = FragmentBuilder::new(100);
        let c = outer.carbon(0.0, 0.0);
        let r = outer.abbreviation("Et", stub, 1.0, 0.0);
        outer.bond(c, r);

        let mut grouped = FragmentBuilder::new(200);
        grouped.carbon(0.0, 0.0);

        let page = PageBuilder::new(1)
            .group(50, vec![grouped.build()])
            .fragment(outer.build())
            .multiple_group(60, &[ObjectId(101)], "2")
            .text(70, "R = Me", None)
            .step(80, (0.0, 0.0), (1.0, 0.0))
            .build();
        let doc = document(vec![page]);

        let mut recorder = Recorder::default();
        walk_document(&mut recorder, &doc);

        assert_eq!(
            recorder.events,
            vec![
                "page 0",
                "fragment 200 in group 50",
                "atom 201",
                "fragment 100 in page",
                "atom 101",
                "atom 102",
                "fragment 500 in atom 102",
                "atom 501",
                "atom 502",
                "atom 503",
                "bond 504",
                "bond 505",
                "bond 103",
                "bracket 60",
                "text 70",
                "step 80",
            ]
        );
    }

    #[test]
    fn test_default_methods_do_nothing() {
        struct Silent;
        impl<'doc> DocumentVisitor<'doc> for Silent {}

        let page = PageBuilder::new(1).text(1, "hello", None).build();
        walk_document(&mut Silent, &document(vec![page]));
    }
}
