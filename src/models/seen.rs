use std::collections::HashSet;

use super::Order;

/// Ids already reported during this process's life. Never persisted: a restart
/// starts from an empty set and re-reports whatever is still listed.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id`, returning `true` the first time it is seen.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keeps the orders whose id is new, in input order, and records them.
    /// Repeats within `orders` collapse to the first occurrence.
    pub fn retain_new(&mut self, orders: Vec<Order>) -> Vec<Order> {
        orders
            .into_iter()
            .filter(|order| self.insert(order.id()))
            .collect()
    }
}
