//! Core domain types for implicit-feedback interaction logs.
//!
//! An interaction log is a flat list of (user, item, weight) records, e.g.
//! click counts. Identifiers are opaque strings: nothing downstream may
//! assume they are numeric or ordered.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with item IDs

/// External identifier of a user
pub type UserId = String;

/// External identifier of an item
pub type ItemId = String;

// =============================================================================
// Interaction
// =============================================================================

/// A single implicit-feedback signal from a user for an item.
///
/// `weight` is non-negative (clicks, plays, purchases...). After
/// [`aggregate_duplicates`](crate::aggregate::aggregate_duplicates) there is
/// at most one record per (user, item) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub weight: f64,
}

impl Interaction {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, weight: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            weight,
        }
    }
}

/// Names of the three columns of an interaction file.
///
/// Defaults match the files written by the synthetic generator:
/// `user_id,item_id,clicks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub user: String,
    pub item: String,
    pub weight: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            user: "user_id".to_string(),
            item: "item_id".to_string(),
            weight: "clicks".to_string(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Summary statistics for an interaction log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub interactions: usize,
    pub users: usize,
    pub items: usize,
    /// Fraction of the user x item grid that holds an interaction
    pub sparsity: f64,
}

impl DatasetStats {
    pub fn compute(interactions: &[Interaction]) -> Self {
        let users: HashSet<&str> = interactions.iter().map(|i| i.user_id.as_str()).collect();
        let items: HashSet<&str> = interactions.iter().map(|i| i.item_id.as_str()).collect();

        let cells = users.len() * items.len();
        let sparsity = if cells == 0 {
            0.0
        } else {
            interactions.len() as f64 / cells as f64
        };

        Self {
            interactions: interactions.len(),
            users: users.len(),
            items: items.len(),
            sparsity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counts_distinct_ids() {
        let log = vec![
            Interaction::new("u1", "i1", 5.0),
            Interaction::new("u1", "i2", 1.0),
            Interaction::new("u2", "i2", 3.0),
        ];

        let stats = DatasetStats::compute(&log);
        assert_eq!(stats.interactions, 3);
        assert_eq!(stats.users, 2);
        assert_eq!(stats.items, 2);
        assert!((stats.sparsity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty_log() {
        let stats = DatasetStats::compute(&[]);
        assert_eq!(stats.interactions, 0);
        assert_eq!(stats.sparsity, 0.0);
    }
}
