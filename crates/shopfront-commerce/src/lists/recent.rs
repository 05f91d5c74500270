use std::collections::VecDeque;

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::settings::DEFAULT_RECENTLY_VIEWED_LIMIT;

/// Recently viewed product snapshots, most recent first.
#[derive(Debug, Clone)]
pub struct RecentlyViewed {
    entries: VecDeque<Product>,
    limit: usize,
}

impl RecentlyViewed {
    /// Create a tracker keeping at most `limit` products (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Record a view. An existing entry is moved to the front and refreshed.
    pub fn record(&mut self, product: &Product) {
        self.entries.retain(|p| p.id != product.id);
        self.entries.push_front(product.clone());
        self.entries.truncate(self.limit);
    }

    /// Snapshots, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.entries.iter()
    }

    pub fn most_recent(&self) -> Option<&Product> {
        self.entries.front()
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|p| &p.id == product_id)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RecentlyViewed {
    fn default() -> Self {
        Self::new(DEFAULT_RECENTLY_VIEWED_LIMIT)
    }
}
