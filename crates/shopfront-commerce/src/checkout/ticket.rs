//! Hand-off ticket and the consumed-reference set.
//!
//! Both live in a session-scoped [`Cache`]. The ticket expires after its TTL;
//! processed markers never expire, so a late duplicate gateway return is still
//! recognised.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shopfront_cache::{cache_key, Cache, SessionId, SessionSlot};

use crate::cart::{CartLine, CartPricing};
use crate::checkout::{CustomerSnapshot, PaymentMethod};
use crate::ids::OrderReference;
use crate::money::Money;
use crate::CommerceError;

const TICKET_SLOT: &str = "checkout_ticket";
const PROCESSED_PREFIX: &str = "checkout:processed";

/// Checkout data written before control leaves for the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutTicket {
    pub reference: OrderReference,
    pub customer: CustomerSnapshot,
    pub payment_method: PaymentMethod,
    /// Cart lines the amount was priced from.
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Amount sent to the gateway.
    pub amount: Money,
    pub pricing: CartPricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    /// Unix millis.
    pub issued_at: i64,
}

/// Session-scoped storage for the ticket and processed references.
#[derive(Debug, Clone)]
pub struct HandoffStore {
    cache: Cache,
    ticket: SessionSlot<CheckoutTicket>,
}

impl HandoffStore {
    pub fn new(session_id: SessionId, ticket_ttl: Duration) -> Self {
        Self {
            cache: Cache::new(),
            ticket: SessionSlot::new(session_id, TICKET_SLOT).with_ttl(ticket_ttl),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        self.ticket.session_id()
    }

    /// Write the ticket, replacing any previous one.
    pub fn write_ticket(&mut self, ticket: &CheckoutTicket) -> Result<(), CommerceError> {
        self.ticket.store(&mut self.cache, ticket)?;
        Ok(())
    }

    /// The live ticket, if present and not expired.
    pub fn read_ticket(&self) -> Result<Option<CheckoutTicket>, CommerceError> {
        Ok(self.ticket.load(&self.cache)?)
    }

    /// Delete the ticket. Returns whether a live ticket was removed.
    pub fn delete_ticket(&mut self) -> bool {
        self.ticket.clear(&mut self.cache)
    }

    pub fn has_ticket(&self) -> bool {
        self.ticket.exists(&self.cache)
    }

    /// Whether a reference was already turned into an order.
    pub fn is_processed(&self, reference: &OrderReference) -> bool {
        self.cache.exists(&processed_key(reference))
    }

    /// Record a reference as consumed.
    pub fn mark_processed(&mut self, reference: &OrderReference) -> Result<(), CommerceError> {
        self.cache
            .set_with_ttl(&processed_key(reference), &true, None)?;
        Ok(())
    }

    /// Consumed references, sorted.
    pub fn processed_references(&self) -> Vec<OrderReference> {
        let prefix = format!("{PROCESSED_PREFIX}:");
        self.cache
            .keys_with_prefix(&prefix)
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(OrderReference::from))
            .collect()
    }
}

fn processed_key(reference: &OrderReference) -> String {
    cache_key!(PROCESSED_PREFIX, reference)
}
