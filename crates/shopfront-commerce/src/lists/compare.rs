use crate::ids::ProductId;
use crate::CommerceError;
use serde::{Deserialize, Serialize};

/// Maximum number of products compared side by side.
pub const COMPARE_CAPACITY: usize = 3;

/// Products selected for side-by-side comparison.
///
/// Adds past [`COMPARE_CAPACITY`] are rejected, never truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareList {
    ids: Vec<ProductId>,
}

impl CompareList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product. Leaves the list untouched on error.
    pub fn add(&mut self, product_id: &ProductId) -> Result<(), CommerceError> {
        if self.contains(product_id) {
            return Err(CommerceError::AlreadyInCompare(product_id.to_string()));
        }
        if self.is_full() {
            return Err(CommerceError::CompareFull {
                capacity: COMPARE_CAPACITY,
            });
        }
        self.ids.push(product_id.clone());
        Ok(())
    }

    /// Remove a product. No-op if absent.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != product_id);
        self.ids.len() < before
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.ids.contains(product_id)
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= COMPARE_CAPACITY
    }

    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
