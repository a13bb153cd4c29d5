//! Error types for extraction.
//!
//! [`ExtractError`] is recoverable: it costs one fragment or one reaction
//! step, which the assembler logs and skips. [`ConfigError`] is raised while
//! loading lookup tables or configuration and aborts before any extraction
//! starts.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::ObjectId;

/// Failure reported by an external collaborator (identity service, Markush
/// expansion).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Failed(String),

    #[error("unsupported structure: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The abbreviation fragment has nothing marking where it attaches.
    #[error("abbreviation fragment {fragment} has no external connection point")]
    MissingConnectionPoint { fragment: ObjectId },

    /// More than one attachment marker, so the attachment atom is ambiguous.
    #[error("abbreviation fragment {fragment} has {count} external connection points")]
    AmbiguousConnectionPoint { fragment: ObjectId, count: usize },

    #[error("no bond in abbreviation fragment {fragment} touches connection point {point}")]
    NoAttachmentBond { fragment: ObjectId, point: ObjectId },

    #[error("bond {bond} in fragment {fragment} references unknown atom {atom}")]
    DanglingBond {
        fragment: ObjectId,
        bond: ObjectId,
        atom: ObjectId,
    },

    #[error("fragment {fragment} has {atoms} atoms, at least {required} required")]
    InvalidFragment {
        fragment: ObjectId,
        atoms: usize,
        required: usize,
    },

    #[error("structure identity failed for fragment {fragment}: {source}")]
    Identity {
        fragment: ObjectId,
        #[source]
        source: ServiceError,
    },

    #[error("R-group expansion failed for fragment {fragment}: {source}")]
    Expansion {
        fragment: ObjectId,
        #[source]
        source: ServiceError,
    },

    #[error("reaction step {step} has no {role}")]
    IncompleteReaction { step: ObjectId, role: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}
