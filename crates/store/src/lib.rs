//! `skuhub-store` — in-memory persistence collaborator.
//!
//! The derivation rules in the entity crates are pure; this crate is the
//! caller that runs them at the right moment. Every `save_*` operation
//! resolves references, invokes the entity's rule, enforces the uniqueness
//! constraints a database would carry (category code/name, batch code) and
//! then commits — all under one write lock, so the uniqueness check and the
//! insert are a single atomic step.
//!
//! Intended for tests and as the reference contract a database-backed store
//! must honor. Not optimized for performance.

pub mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::{Store, MAX_BATCH_CODE_ATTEMPTS};
