use std::collections::HashSet;

use crate::models::{Order, SeenSet};

/// Merges the new orders of every source into one delivery sequence.
#[derive(Debug, Default)]
pub struct Aggregator {
    delivered: SeenSet,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenates `batches` in source order, drops ids already merged in this
    /// call or in any earlier one, and sorts oldest first. Ties keep their
    /// source order.
    pub fn merge(&mut self, batches: Vec<Vec<Order>>) -> Vec<Order> {
        let mut merged_now = HashSet::new();
        let mut merged: Vec<Order> = batches
            .into_iter()
            .flatten()
            .filter(|order| {
                let id = order.id();
                if !merged_now.insert(id.to_string()) {
                    tracing::debug!("Dropping repeated order {} from {}", id, order.source());
                    return false;
                }
                if !self.delivered.insert(id) {
                    tracing::debug!("Order {} from {} was already delivered", id, order.source());
                    return false;
                }
                true
            })
            .collect();

        sort_oldest_first(&mut merged);
        merged
    }

    /// Ids merged across all sources so far.
    pub fn delivered(&self) -> &SeenSet {
        &self.delivered
    }
}

/// Stable sort by minutes since publication, descending.
pub fn sort_oldest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.recency_ordinal().cmp(&a.recency_ordinal()));
}
