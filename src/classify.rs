use tracing::debug;

use crate::document::{Fragment, Page};
use crate::logging::CLASSIFY;
use crate::visit::{walk_page, DocumentVisitor, FragmentOwner};

/// Fragments of one page split by whether they can stand alone.
#[derive(Debug, Default)]
pub struct FragmentClassification<'doc> {
    /// Page- or group-level fragments without external connection points.
    pub complete: Vec<&'doc Fragment>,
    /// Every fragment reached, nested abbreviation fragments included.
    pub all: Vec<&'doc Fragment>,
}

/// A fragment is complete when none of its own atoms is an external
/// connection point. Bond structure plays no part.
pub fn is_complete(fragment: &Fragment) -> bool {
    !fragment.has_connection_point()
}

#[derive(Default)]
struct FragmentClassifier<'doc> {
    result: FragmentClassification<'doc>,
}

impl<'doc> DocumentVisitor<'doc> for FragmentClassifier<'doc> {
    fn visit_fragment(&mut self, fragment: &'doc Fragment, owner: FragmentOwner) {
        self.result.all.push(fragment);
        if !owner.is_nested() && is_complete(fragment) {
            self.result.complete.push(fragment);
        }
    }
}

pub fn classify_fragments(page: &Page) -> FragmentClassification<'_> {
    let mut classifier = FragmentClassifier::default();
    walk_page(&mut classifier, 0, page);

    debug!(
        target: CLASSIFY,
        page = %page.id,
        complete = classifier.result.complete.len(),
        all = classifier.result.all.len(),
        "Classified page fragments"
    );

    classifier.result
}
