use serde::{Deserialize, Serialize};

use skuhub_core::{DomainError, DomainResult, Entity, RecordId, RecordMeta};

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub RecordId);

impl CategoryId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Number of characters in a category code. The code doubles as the batch
/// code prefix for inventory lots.
pub const CODE_LEN: usize = 3;

/// A node in the category tree.
///
/// `path` is a materialized view of the tree position and is derived on every
/// save; `code` is a short unique mnemonic, uppercased on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub parent: Option<CategoryId>,
    /// Derived: `parent.path + "/" + name`, or just `name` at the root.
    pub path: String,
    pub meta: RecordMeta,
}

impl Category {
    pub fn new(id: CategoryId, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            description: None,
            parent: None,
            path: String::new(),
            meta: RecordMeta::now(),
        }
    }

    /// Derive `path` and normalize `code` from the current field values.
    ///
    /// `parent` must be the resolved record for `self.parent` (or `None` for
    /// a root category); the store looks it up before calling. Only this
    /// node's path is recomputed: renaming or reparenting a category does
    /// not cascade to descendants, so their paths go stale until their own
    /// next save.
    pub fn resolve(&mut self, parent: Option<&Category>) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        if self.code.len() != CODE_LEN || !self.code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(format!(
                "category code must be exactly {CODE_LEN} ASCII letters or digits"
            )));
        }

        match (self.parent, parent) {
            (Some(parent_id), _) if parent_id == self.id => {
                return Err(DomainError::invariant("category cannot be its own parent"));
            }
            (Some(parent_id), Some(parent)) if parent.id != parent_id => {
                return Err(DomainError::invariant("resolved parent does not match parent id"));
            }
            (Some(_), None) => {
                return Err(DomainError::not_found());
            }
            (None, Some(_)) => {
                return Err(DomainError::invariant("parent supplied for a root category"));
            }
            _ => {}
        }

        self.code = self.code.to_ascii_uppercase();
        self.path = match parent {
            Some(parent) => format!("{}/{}", parent.path, self.name),
            None => self.name.clone(),
        };
        Ok(())
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path)
    }
}
