//! Entity trait: identity + continuity across state changes.

use crate::meta::RecordMeta;

/// Entity marker + minimal interface.
///
/// Implemented by every stored record so the store layer can stamp audit
/// metadata and apply soft deletion generically.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Audit/soft-delete metadata carried by the record.
    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;
}
