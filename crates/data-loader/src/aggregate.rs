//! Collapsing repeated (user, item) records into a single weighted record.

use crate::types::Interaction;
use std::collections::HashMap;

/// Sum the weights of records sharing a (user, item) pair.
///
/// The output holds one record per pair, in the order each pair was
/// first seen.
pub fn aggregate_duplicates(interactions: Vec<Interaction>) -> Vec<Interaction> {
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut aggregated: Vec<Interaction> = Vec::with_capacity(interactions.len());

    for interaction in interactions {
        let key = (interaction.user_id.clone(), interaction.item_id.clone());
        match positions.get(&key) {
            Some(&pos) => aggregated[pos].weight += interaction.weight,
            None => {
                positions.insert(key, aggregated.len());
                aggregated.push(interaction);
            }
        }
    }

    aggregated
}
