//! Read-only catalog access with a live search term.

use std::sync::Arc;

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::CommerceError;

/// Immutable product list plus the shopper's current search term.
///
/// The product list is shared (`Arc`) and never mutated; only the search
/// term changes.
#[derive(Debug, Clone)]
pub struct CatalogView {
    products: Arc<[Product]>,
    search_term: String,
}

impl CatalogView {
    /// Wrap an externally supplied product list.
    pub fn new(products: impl Into<Arc<[Product]>>) -> Self {
        Self {
            products: products.into(),
            search_term: String::new(),
        }
    }

    /// Parse a JSON array of products.
    pub fn from_json(json: &str) -> Result<Self, CommerceError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Ok(Self::new(products))
    }

    /// Every product, in supplied order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Find a product by ID.
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Find a product by ID or fail with `ProductNotFound`.
    pub fn require(&self, id: &ProductId) -> Result<&Product, CommerceError> {
        self.get(id)
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    /// Current search term.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Replace the search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Clear the search term.
    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    /// Products matching the current search term.
    pub fn filtered(&self) -> Vec<&Product> {
        self.search(&self.search_term)
    }

    /// Products matching an arbitrary term.
    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.matches(term)).collect()
    }

    /// Products in a category (case-insensitive).
    pub fn by_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Distinct category names, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in self.products.iter() {
            if !product.category.is_empty() && !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::new(Vec::<Product>::new())
    }
}
