//! Save/load persistence with integrity verification
//!
//! Features:
//! - Versioned JSON envelope
//! - BLAKE3 integrity digest
//! - Per-version migration (unversioned legacy saves included)

pub mod envelope;
pub mod migration;
pub mod validation;

pub use envelope::{DEFAULT_VERSION, Decoded, FORMAT_TAG, MAX_STATE_DEPTH, SaveCodec};
pub use migration::{LEGACY_VERSION, Migration, Migrations};

use thiserror::Error;

/// Why stored text could not be turned back into state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not parseable JSON at all
    #[error("saved state is not well-formed JSON: {0}")]
    Malformed(String),
    /// Well-formed, but no supported schema (or migration path) accepts it
    #[error("saved state has unsupported schema (version {version:?}): {reason}")]
    SchemaMismatch {
        version: Option<u32>,
        reason: String,
    },
    /// Envelope digest does not match its state payload
    #[error("saved state failed integrity check (expected {expected}, computed {computed})")]
    Corrupted { expected: String, computed: String },
}

impl DecodeError {
    pub(crate) fn mismatch(version: Option<u32>, reason: impl Into<String>) -> Self {
        DecodeError::SchemaMismatch {
            version,
            reason: reason.into(),
        }
    }
}

/// State that cannot be written as a save the decoder will accept
#[derive(Debug, Error)]
pub enum EncodeError {
    /// serde cannot express the state as JSON (e.g. non-string map keys)
    #[error("state cannot be encoded as JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Nested deeper than the decoder will parse
    #[error("state nests {depth} levels deep (limit {limit})")]
    TooDeep { depth: usize, limit: usize },
}
