//! Audit and soft-delete metadata shared by every entity.
//!
//! These fields are cross-cutting: the derivation rules never consult them.
//! The store stamps them on every write and flips the soft-delete flag
//! instead of removing rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

impl RecordMeta {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    /// Fresh metadata stamped with the current wall clock.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Record an update, preserving creation attribution.
    pub fn touch(&mut self, now: DateTime<Utc>, actor: Option<UserId>) {
        self.updated_at = now;
        if actor.is_some() {
            self.updated_by = actor;
        }
    }

    /// Record creation attribution (first persist only).
    pub fn stamp_created(&mut self, now: DateTime<Utc>, actor: Option<UserId>) {
        self.created_at = now;
        self.updated_at = now;
        self.created_by = actor;
        self.updated_by = actor;
    }

    /// Soft-delete the record. The row stays in storage.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>, actor: Option<UserId>) {
        self.deleted = true;
        self.deleted_at = Some(now);
        self.touch(now, actor);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::now()
    }
}
