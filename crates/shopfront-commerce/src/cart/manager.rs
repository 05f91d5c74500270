//! Cart line items and the stock-aware cart manager.

use serde::{Deserialize, Serialize};
use shopfront_cache::now_millis;

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};

/// One product entry in the cart.
///
/// Display fields are captured when the product is first added and are not
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Product this line is for. Unique within a cart.
    pub product_id: ProductId,
    /// Product name at add-time.
    pub name: String,
    /// Brand at add-time.
    pub brand: String,
    /// Unit price at add-time.
    pub price: Money,
    /// Image reference at add-time.
    pub image: String,
    /// Quantity, always within `1..=stock`.
    pub quantity: u32,
    /// Stock level last seen for the product.
    pub stock: u32,
}

impl CartLine {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
            stock: product.stock,
        }
    }

    /// `price * quantity`.
    pub fn line_total(&self) -> Money {
        Money::new(
            self.price
                .amount_minor
                .saturating_mul(i64::from(self.quantity)),
            self.price.currency,
        )
    }
}

/// A request that asked for more units than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockExceeded {
    /// Quantity the shopper asked the line to reach.
    pub requested: u32,
    /// Units actually available.
    pub available: u32,
}

/// Result of a cart mutation on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    /// Line that changed.
    pub product_id: ProductId,
    /// Quantity after the change; `0` means the line was removed.
    pub quantity: u32,
    /// Set when the request was clamped down to the available stock.
    pub stock_exceeded: Option<StockExceeded>,
}

impl CartUpdate {
    /// Whether the line no longer exists.
    pub fn is_removed(&self) -> bool {
        self.quantity == 0
    }
}

/// Ordered, stock-aware collection of cart lines.
///
/// Totals are recomputed from the lines on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartManager {
    currency: Currency,
    lines: Vec<CartLine>,
    updated_at: i64,
}

impl CartManager {
    /// Create an empty cart priced in `currency`.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            lines: Vec::new(),
            updated_at: now_millis(),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line accumulates; the result is clamped to
    /// `1..=product.stock`. Clamping is not an error: the returned update
    /// carries a [`StockExceeded`] instead.
    pub fn add_to_cart(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> Result<CartUpdate, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }
        if product.price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: product.price.currency.code().to_string(),
            });
        }
        if product.stock == 0 {
            return Err(CommerceError::OutOfStock(product.id.to_string()));
        }

        let available = product.stock;
        let update = match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                let requested = line.quantity.saturating_add(quantity);
                line.stock = available;
                line.quantity = requested.clamp(1, available);
                CartUpdate {
                    product_id: product.id.clone(),
                    quantity: line.quantity,
                    stock_exceeded: (requested > available)
                        .then_some(StockExceeded { requested, available }),
                }
            }
            None => {
                let line = CartLine::from_product(product, quantity.min(available));
                let update = CartUpdate {
                    product_id: product.id.clone(),
                    quantity: line.quantity,
                    stock_exceeded: (quantity > available).then_some(StockExceeded {
                        requested: quantity,
                        available,
                    }),
                };
                self.lines.push(line);
                update
            }
        };

        if let Some(exceeded) = update.stock_exceeded {
            tracing::warn!(
                product_id = %update.product_id,
                requested = exceeded.requested,
                available = exceeded.available,
                "cart quantity clamped to stock"
            );
        }
        self.touch();
        Ok(update)
    }

    /// Set a line's quantity.
    ///
    /// A quantity of zero or less removes the line. Otherwise the quantity is
    /// clamped to `1..=stock`.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartUpdate, CommerceError> {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return Ok(CartUpdate {
                product_id: product_id.clone(),
                quantity: 0,
                stock_exceeded: None,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
            .ok_or_else(|| CommerceError::ItemNotInCart(product_id.to_string()))?;

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        let available = line.stock.max(1);
        line.quantity = requested.clamp(1, available);
        let update = CartUpdate {
            product_id: product_id.clone(),
            quantity: line.quantity,
            stock_exceeded: (requested > available)
                .then_some(StockExceeded { requested, available }),
        };

        if update.stock_exceeded.is_some() {
            tracing::warn!(%product_id, requested, available, "cart quantity clamped to stock");
        }
        self.touch();
        Ok(update)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        let removed = self.lines.len() < len_before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.touch();
    }

    /// Sum of `price * quantity` over every line, recomputed on each call.
    pub fn total_amount(&self) -> Money {
        let total = self
            .lines
            .iter()
            .fold(0_i64, |acc, line| acc.saturating_add(line.line_total().amount_minor));
        Money::new(total, self.currency)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Deep copy of the lines.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Get a line by product ID.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Whether a product is in the cart.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Total units (sum of quantities).
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Number of distinct products.
    pub fn unique_item_count(&self) -> usize {
        self.lines.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Cart currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Unix millis of the last mutation.
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

impl Default for CartManager {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}
