//! Product records supplied by the external catalog.

use std::collections::BTreeMap;

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Stock level at or below which a product counts as "low stock".
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A color option shown on the product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorVariant {
    /// Display name (e.g., "Midnight").
    pub name: String,
    /// CSS color value.
    pub hex: String,
}

/// A product in the catalog. Read-only from the shop's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Brand name.
    pub brand: String,
    /// Category name.
    pub category: String,
    /// Current selling price.
    pub price: Money,
    /// Price before discount, if discounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    /// Units available.
    pub stock: u32,
    /// Average rating (0.0 - 5.0).
    #[serde(default)]
    pub rating: f32,
    /// Number of reviews behind the rating.
    #[serde(default)]
    pub review_count: u32,
    /// Specification sheet (e.g., "Storage" -> "256 GB").
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    /// Available colors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<ColorVariant>,
    /// Monthly installment price, when offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_price: Option<Money>,
    /// Eligible for express delivery.
    #[serde(default)]
    pub express_delivery: bool,
    /// Image reference.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Create a product with the fields the shop logic depends on.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            category: String::new(),
            price,
            original_price: None,
            stock,
            rating: 0.0,
            review_count: 0,
            specifications: BTreeMap::new(),
            colors: Vec::new(),
            installment_price: None,
            express_delivery: false,
            image: String::new(),
        }
    }

    /// Set brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Set category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the pre-discount price.
    pub fn with_original_price(mut self, original: Money) -> Self {
        self.original_price = Some(original);
        self
    }

    /// Whether any units are available.
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether stock is running out.
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= LOW_STOCK_THRESHOLD
    }

    /// Whole-percent saving against the original price.
    pub fn discount_percent(&self) -> Option<u8> {
        let original = self.original_price?;
        if original.currency != self.price.currency
            || original.amount_minor <= self.price.amount_minor
            || original.amount_minor <= 0
        {
            return None;
        }
        let saved = original.amount_minor - self.price.amount_minor;
        Some(((saved as f64 / original.amount_minor as f64) * 100.0).round() as u8)
    }

    /// Case-insensitive match against name, brand and category.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.brand, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}
