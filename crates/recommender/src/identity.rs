//! Bidirectional mapping between external identifiers and dense indices.
//!
//! Latent factor matrices are addressed by row number, so every external
//! user or item ID is assigned a contiguous index in `[0, N)`. Indices are
//! handed out in first-seen order and never change for the lifetime of the
//! map; a model trained against one map is meaningless with another.

use crate::error::{EngineError, IdentityKind, Result};
use std::collections::HashMap;

/// Immutable external ID <-> dense index mapping for one side (users or items)
#[derive(Debug, Clone)]
pub struct IdentityMap {
    kind: IdentityKind,
    forward: HashMap<String, usize>,
    reverse: Vec<String>,
}

impl IdentityMap {
    /// Assign each distinct ID the next unused index, in first-seen order
    pub fn build<I, S>(kind: IdentityKind, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut forward = HashMap::new();
        let mut reverse = Vec::new();

        for id in ids {
            let id = id.as_ref();
            if !forward.contains_key(id) {
                forward.insert(id.to_string(), reverse.len());
                reverse.push(id.to_string());
            }
        }

        Self {
            kind,
            forward,
            reverse,
        }
    }

    /// Dense index of `external_id`
    ///
    /// Fails with `UnknownIdentity` for IDs not seen at build time.
    pub fn to_index(&self, external_id: &str) -> Result<usize> {
        self.forward
            .get(external_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownIdentity {
                kind: self.kind,
                id: external_id.to_string(),
            })
    }

    /// External ID for an index produced by this map
    pub fn to_external(&self, index: usize) -> Result<&str> {
        self.reverse
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                EngineError::ShapeMismatch(format!(
                    "{} index {} outside [0, {})",
                    self.kind,
                    index,
                    self.reverse.len()
                ))
            })
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.forward.contains_key(external_id)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    /// External IDs in index order
    pub fn external_ids(&self) -> impl Iterator<Item = &str> {
        self.reverse.iter().map(String::as_str)
    }
}
