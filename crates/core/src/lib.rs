//! `skuhub-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage concerns):
//! typed identifiers, the error taxonomy, and the audit/soft-delete record
//! metadata shared by every entity.

pub mod entity;
pub mod error;
pub mod id;
pub mod meta;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{RecordId, UserId};
pub use meta::RecordMeta;
