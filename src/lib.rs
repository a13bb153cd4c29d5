pub mod assemble;
pub mod brackets;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod geo;
pub mod graph;
pub mod inspect;
pub mod lexicon;
pub mod logging;
pub mod projection;
pub mod reaction;
pub mod reconcile;
pub mod rgroup;
pub mod services;
pub mod visit;

pub use assemble::{
    ExtractionStats, Extractor, ReactionExtraction, Services, Substance, SubstanceExtraction,
};
pub use config::ExtractionConfig;
pub use document::Document;
pub use error::{ConfigError, ExtractError, ServiceError};
pub use lexicon::Lexicon;

/// Extract substances from every page of a document
///
/// # Arguments
/// * `document` - The parsed drawing document
/// * `config` - Run switches (R-group expansion, deduplication) and thresholds
/// * `lexicon` - Lookup tables, loaded once per process
/// * `services` - Identity service plus optional ring perception and Markush expansion
///
/// # Returns
/// * `SubstanceExtraction` - Substances and the run's statistics. Fragments
///   that fail to convert are logged and counted, never returned as errors.
pub fn extract_substances(
    document: &Document,
    config: &ExtractionConfig,
    lexicon: &Lexicon,
    services: Services<'_>,
) -> SubstanceExtraction {
    Extractor::new(config, lexicon, services).extract_substances(document)
}

/// Extract reactions from every reaction step of a document
///
/// Roles come from explicit step listings where present and from the
/// position of each group or fragment relative to the step's arrow
/// otherwise. Steps lacking reactants or products are skipped.
pub fn extract_reactions(
    document: &Document,
    config: &ExtractionConfig,
    lexicon: &Lexicon,
    services: Services<'_>,
) -> ReactionExtraction {
    Extractor::new(config, lexicon, services).extract_reactions(document)
}
