//! Store error model.

use thiserror::Error;

use skuhub_core::DomainError;

/// Result type used across the store layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-level error.
///
/// Domain failures pass through unchanged; the variants added here cover
/// concerns only the storage layer can detect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A unique field collided with an existing record. Not retried for
    /// category code/name (genuine duplicate data); retried internally for
    /// generated batch codes.
    #[error("unique constraint violated on {entity}.{field}: {value:?}")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The bounded batch-code retry loop gave up. Practically this means the
    /// code space under one category prefix is (close to) exhausted.
    #[error("no free batch code under prefix {prefix:?} after {attempts} attempts")]
    BatchCodeSpaceExhausted { prefix: String, attempts: u32 },

    #[error("store lock poisoned")]
    LockPoisoned,
}
