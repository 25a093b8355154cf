//! Offline precision@k / recall@k against held-out interactions.
//!
//! ## Algorithm
//! 1. Group held-out interactions by user (first-seen order)
//! 2. Skip users the model has never seen, and users none of whose
//!    held-out items are in the model's item map
//! 3. For every remaining user, request `k` recommendations and count hits
//!    against the known held-out items
//! 4. Average per-user precision (`hits / k`) and recall
//!    (`hits / |known held-out items|`) over evaluated users only
//!
//! Precision always divides by the requested `k`, so a recommender that
//! returns fewer than `k` items is penalized for the empty slots.

use data_loader::Interaction;
use rayon::prelude::*;
use recommender::{Recommend, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Averaged metrics for one evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    /// Users that contributed to the averages
    pub evaluated_users: usize,
    /// Held-out users excluded as unknown or without known items
    pub skipped_users: usize,
}

/// Per-user contribution to the averages
#[derive(Debug, Clone, Copy, PartialEq)]
struct UserScore {
    precision: f64,
    recall: f64,
}

/// Scores any [`Recommend`] implementation against held-out data
///
/// Holds only a shared reference: evaluation never mutates the model, and
/// users are scored in parallel.
pub struct Evaluator<'a, R: Recommend + ?Sized> {
    recommender: &'a R,
}

impl<'a, R: Recommend + ?Sized> Evaluator<'a, R> {
    pub fn new(recommender: &'a R) -> Self {
        Self { recommender }
    }

    /// Compute mean precision@k and recall@k over `held_out`
    ///
    /// Degenerate inputs (`k == 0`, empty `held_out`, no evaluable user)
    /// produce zeros, not errors. Only model failures such as `NotTrained`
    /// propagate.
    #[instrument(skip_all, fields(k = k, held_out = held_out.len()))]
    pub fn evaluate(&self, held_out: &[Interaction], k: usize) -> Result<EvaluationReport> {
        info!("Evaluating model...");
        let groups = group_by_user(held_out);

        let scores: Vec<Option<UserScore>> = groups
            .par_iter()
            .map(|(user_id, items)| self.score_user(user_id, items, k))
            .collect::<Result<_>>()?;

        let evaluated: Vec<UserScore> = scores.into_iter().flatten().collect();
        let evaluated_users = evaluated.len();
        let (precision_at_k, recall_at_k) = if evaluated_users == 0 {
            (0.0, 0.0)
        } else {
            let precision: f64 = evaluated.iter().map(|s| s.precision).sum();
            let recall: f64 = evaluated.iter().map(|s| s.recall).sum();
            (
                precision / evaluated_users as f64,
                recall / evaluated_users as f64,
            )
        };

        let report = EvaluationReport {
            k,
            precision_at_k,
            recall_at_k,
            evaluated_users,
            skipped_users: groups.len() - evaluated_users,
        };
        info!(
            "precision@{} = {:.4}, recall@{} = {:.4} over {} users ({} skipped)",
            k, report.precision_at_k, k, report.recall_at_k, report.evaluated_users, report.skipped_users
        );
        Ok(report)
    }

    /// `None` when the user is excluded from the averages
    fn score_user(&self, user_id: &str, items: &[&str], k: usize) -> Result<Option<UserScore>> {
        let catalog = self.recommender.catalog();
        if !catalog.users.contains(user_id) {
            debug!("Skipping unknown user {}", user_id);
            return Ok(None);
        }

        let actual: HashSet<&str> = items
            .iter()
            .copied()
            .filter(|item_id| catalog.items.contains(item_id))
            .collect();
        if actual.is_empty() {
            debug!("Skipping user {} with no known held-out items", user_id);
            return Ok(None);
        }

        let recommendations = self.recommender.recommend(user_id, k)?;
        let recommended: HashSet<&str> = recommendations
            .iter()
            .map(|r| r.item_id.as_str())
            .collect();

        let hits = actual.intersection(&recommended).count() as f64;
        let precision = if k > 0 { hits / k as f64 } else { 0.0 };
        let recall = hits / actual.len() as f64;

        Ok(Some(UserScore { precision, recall }))
    }
}

/// Held-out items per user, users in first-seen order
fn group_by_user(held_out: &[Interaction]) -> Vec<(&str, Vec<&str>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();

    for interaction in held_out {
        let user_id = interaction.user_id.as_str();
        let pos = *positions.entry(user_id).or_insert_with(|| {
            groups.push((user_id, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(interaction.item_id.as_str());
    }

    groups
}
