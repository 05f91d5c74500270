//! Orders and the append-only order ledger.

use serde::{Deserialize, Serialize};
use shopfront_cache::now_millis;

use crate::cart::{CartLine, CartPricing};
use crate::checkout::{CustomerSnapshot, PaymentMethod};
use crate::ids::{OrderId, OrderReference, ProductId, TransactionId};
use crate::money::Money;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid and recorded, awaiting fulfilment.
    #[default]
    Placed,
    /// Handed to the courier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled after placement.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Snapshot of a cart line at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            brand: line.brand.clone(),
            image: line.image.clone(),
            unit_price: line.price,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// A placed order. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Reference sent to the payment gateway.
    pub reference: OrderReference,
    /// Gateway transaction, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub items: Vec<OrderLine>,
    pub customer: CustomerSnapshot,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub discount: Money,
    pub delivery_fee: Money,
    /// Amount charged at the gateway.
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    /// Unix millis.
    pub created_at: i64,
}

impl Order {
    /// Total units ordered.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// Input to [`OrderLedger::create_order`].
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub reference: OrderReference,
    pub transaction_id: Option<TransactionId>,
    /// Cart lines to snapshot. Copied, never referenced.
    pub items: &'a [CartLine],
    pub customer: CustomerSnapshot,
    pub payment_method: PaymentMethod,
    pub pricing: CartPricing,
    /// Amount charged at the gateway.
    pub total: Money,
    pub coupon_code: Option<String>,
}

/// Append-only record of placed orders.
///
/// The ledger does not deduplicate by reference. Callers guard against
/// recording the same payment twice.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
    sequence: u64,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new order and return it.
    pub fn create_order(&mut self, input: NewOrder<'_>) -> &Order {
        self.sequence += 1;
        let created_at = now_millis();
        let order = Order {
            id: OrderId::new(format!("ORD-{}-{:04}", created_at, self.sequence)),
            reference: input.reference,
            transaction_id: input.transaction_id,
            items: input.items.iter().map(OrderLine::from).collect(),
            customer: input.customer,
            payment_method: input.payment_method,
            subtotal: input.pricing.subtotal,
            discount: input.pricing.discount,
            delivery_fee: input.pricing.delivery_fee,
            total: input.total,
            coupon_code: input.coupon_code,
            status: OrderStatus::Placed,
            created_at,
        };

        tracing::info!(
            order_id = %order.id,
            reference = %order.reference,
            total = %order.total,
            items = order.items.len(),
            "order placed"
        );

        let index = self.orders.len();
        self.orders.push(order);
        &self.orders[index]
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == id)
    }

    pub fn find_by_reference(&self, reference: &OrderReference) -> Option<&Order> {
        self.orders.iter().find(|order| &order.reference == reference)
    }

    /// Most recently placed order.
    pub fn latest(&self) -> Option<&Order> {
        self.orders.last()
    }

    /// Orders placed with a given contact email (case-insensitive), oldest first.
    pub fn orders_for(&self, email: &str) -> Vec<&Order> {
        let email = email.trim();
        self.orders
            .iter()
            .filter(|order| order.customer.email.trim().eq_ignore_ascii_case(email))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
