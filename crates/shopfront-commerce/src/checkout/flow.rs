//! Checkout state machine.
//!
//! `ShippingInfo -> PaymentSelection -> Review -> GatewayHandoff -> Reconciled`.
//! The first three steps move forward on explicit "continue" actions and may
//! step back one at a time. Confirming the review writes a hand-off ticket and
//! produces a [`GatewayRequest`]; the gateway's answer is fed to
//! [`CheckoutCoordinator::reconcile`], which records at most one order per
//! reference.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shopfront_cache::{now_millis, SessionId};

use crate::cart::{AppliedCoupon, CartLine, CartManager, CartPricing};
use crate::checkout::{
    CheckoutTicket, CustomerSnapshot, GatewayRequest, GatewayResult, GatewayStatus,
    HandoffStore, NewOrder, OrderLedger, PaymentMethod,
};
use crate::ids::{OrderId, OrderReference};
use crate::money::Money;
use crate::settings::AppSettings;
use crate::CommerceError;

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Contact and delivery address.
    ShippingInfo,
    /// KNET or card.
    PaymentSelection,
    /// Order summary before paying.
    Review,
    /// Control is with the payment gateway.
    GatewayHandoff,
    /// Order recorded.
    Reconciled,
}

impl CheckoutStep {
    pub const COUNT: u8 = 5;

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::ShippingInfo => "shipping_info",
            CheckoutStep::PaymentSelection => "payment_selection",
            CheckoutStep::Review => "review",
            CheckoutStep::GatewayHandoff => "gateway_handoff",
            CheckoutStep::Reconciled => "reconciled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::ShippingInfo => "Shipping",
            CheckoutStep::PaymentSelection => "Payment",
            CheckoutStep::Review => "Review",
            CheckoutStep::GatewayHandoff => "Processing Payment",
            CheckoutStep::Reconciled => "Confirmed",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::ShippingInfo => 1,
            CheckoutStep::PaymentSelection => 2,
            CheckoutStep::Review => 3,
            CheckoutStep::GatewayHandoff => 4,
            CheckoutStep::Reconciled => 5,
        }
    }
}

/// Step indicator data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutProgress {
    pub step: CheckoutStep,
    pub number: u8,
    pub total: u8,
    pub percent: u8,
}

/// The hand-off currently outstanding at the gateway.
///
/// `items` is the cart as it was priced; the order is built from it, not
/// from whatever the cart holds when the gateway answers.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingHandoff {
    pub reference: OrderReference,
    pub items: Vec<CartLine>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub pricing: CartPricing,
    pub coupon_code: Option<String>,
}

/// What reconciling a gateway return did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new order was recorded.
    Created(OrderId),
    /// The reference was already turned into an order; nothing changed.
    AlreadyProcessed,
    /// No hand-off outstanding and the cart is empty; handled elsewhere.
    Stale,
    /// The shopper backed out at the gateway; checkout is back at review.
    Cancelled,
    /// Missing or mismatched reference, or a non-success status. No order.
    Invalid(String),
}

impl ReconcileOutcome {
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            ReconcileOutcome::Created(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, ReconcileOutcome::Created(_))
    }
}

/// Collects checkout data and owns the gateway hand-off for one session.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator {
    step: CheckoutStep,
    customer: CustomerSnapshot,
    payment_method: Option<PaymentMethod>,
    coupon: Option<AppliedCoupon>,
    pending: Option<PendingHandoff>,
    completed_order: Option<OrderId>,
    handoff: HandoffStore,
}

impl CheckoutCoordinator {
    /// Create a coordinator whose tickets live for `ticket_ttl`.
    pub fn new(session_id: SessionId, ticket_ttl: Duration) -> Self {
        Self {
            step: CheckoutStep::ShippingInfo,
            customer: CustomerSnapshot::default(),
            payment_method: None,
            coupon: None,
            pending: None,
            completed_order: None,
            handoff: HandoffStore::new(session_id, ticket_ttl),
        }
    }

    pub fn from_settings(session_id: SessionId, settings: &AppSettings) -> Self {
        Self::new(session_id, settings.checkout_ticket_ttl)
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn progress(&self) -> CheckoutProgress {
        let number = self.step.number();
        CheckoutProgress {
            step: self.step,
            number,
            total: CheckoutStep::COUNT,
            percent: ((number as f64 / CheckoutStep::COUNT as f64) * 100.0) as u8,
        }
    }

    pub fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    /// Replace the shipping details.
    pub fn set_customer(&mut self, customer: CustomerSnapshot) -> Result<(), CommerceError> {
        self.ensure_editable("shipping_info")?;
        self.customer = customer;
        Ok(())
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingHandoff> {
        self.pending.as_ref()
    }

    pub fn is_handoff_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether shipping, payment and coupon can still change.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.step,
            CheckoutStep::ShippingInfo | CheckoutStep::PaymentSelection | CheckoutStep::Review
        )
    }

    /// Order created by the last successful reconciliation.
    pub fn completed_order(&self) -> Option<&OrderId> {
        self.completed_order.as_ref()
    }

    pub fn handoff_store(&self) -> &HandoffStore {
        &self.handoff
    }

    /// The live hand-off ticket, if any.
    pub fn ticket(&self) -> Result<Option<CheckoutTicket>, CommerceError> {
        self.handoff.read_ticket()
    }

    /// `ShippingInfo -> PaymentSelection`, once every shipping field is filled.
    pub fn continue_to_payment(&mut self) -> Result<CheckoutStep, CommerceError> {
        self.expect_step(CheckoutStep::ShippingInfo, CheckoutStep::PaymentSelection)?;
        let missing = self.customer.missing_fields();
        if !missing.is_empty() {
            return Err(CommerceError::CheckoutIncomplete(missing.join(", ")));
        }
        self.transition(CheckoutStep::PaymentSelection);
        Ok(self.step)
    }

    /// Choose a payment method. It must be enabled in settings.
    pub fn select_payment(
        &mut self,
        method: PaymentMethod,
        settings: &AppSettings,
    ) -> Result<(), CommerceError> {
        self.ensure_editable("payment_selection")?;
        if !settings.is_payment_enabled(method) {
            return Err(CommerceError::PaymentMethodDisabled(
                method.display_name().to_string(),
            ));
        }
        self.payment_method = Some(method);
        Ok(())
    }

    /// `PaymentSelection -> Review`, once an enabled method is chosen.
    pub fn continue_to_review(&mut self, settings: &AppSettings) -> Result<CheckoutStep, CommerceError> {
        self.expect_step(CheckoutStep::PaymentSelection, CheckoutStep::Review)?;
        let method = self
            .payment_method
            .ok_or_else(|| CommerceError::CheckoutIncomplete("payment method".to_string()))?;
        if !settings.is_payment_enabled(method) {
            return Err(CommerceError::PaymentMethodDisabled(
                method.display_name().to_string(),
            ));
        }
        self.transition(CheckoutStep::Review);
        Ok(self.step)
    }

    /// Step back one in-app step. Entered data is kept.
    pub fn back(&mut self) -> Result<CheckoutStep, CommerceError> {
        let previous = match self.step {
            CheckoutStep::PaymentSelection => CheckoutStep::ShippingInfo,
            CheckoutStep::Review => CheckoutStep::PaymentSelection,
            other => {
                return Err(CommerceError::InvalidCheckoutTransition {
                    from: other.as_str().to_string(),
                    to: "previous".to_string(),
                })
            }
        };
        self.transition(previous);
        Ok(previous)
    }

    /// Apply a coupon code from the settings table.
    ///
    /// An unknown code fails with `InvalidCoupon` and changes nothing.
    pub fn apply_coupon(
        &mut self,
        code: &str,
        settings: &AppSettings,
    ) -> Result<&AppliedCoupon, CommerceError> {
        self.ensure_editable("coupon")?;
        let coupon = settings
            .find_coupon(code)
            .ok_or_else(|| CommerceError::InvalidCoupon(code.trim().to_string()))?;
        let applied = self.coupon.insert(AppliedCoupon::from(coupon));
        Ok(&*applied)
    }

    /// Drop the applied coupon. Returns whether one was applied.
    pub fn remove_coupon(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.coupon.take().is_some()
    }

    /// Price the cart with the applied coupon.
    pub fn pricing(&self, cart: &CartManager, settings: &AppSettings) -> CartPricing {
        CartPricing::calculate(cart, settings, self.coupon.as_ref())
    }

    /// Confirm the review and start the gateway hand-off.
    ///
    /// Writes the ticket before returning, so the returned request can be
    /// sent straight to the gateway. Fails with `HandoffInProgress` while a
    /// previous hand-off is outstanding.
    pub fn confirm(
        &mut self,
        cart: &CartManager,
        settings: &AppSettings,
    ) -> Result<GatewayRequest, CommerceError> {
        if let Some(pending) = &self.pending {
            return Err(CommerceError::HandoffInProgress(pending.reference.to_string()));
        }
        self.expect_step(CheckoutStep::Review, CheckoutStep::GatewayHandoff)?;
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        let missing = self.customer.missing_fields();
        if !missing.is_empty() {
            return Err(CommerceError::CheckoutIncomplete(missing.join(", ")));
        }
        let payment_method = self
            .payment_method
            .ok_or_else(|| CommerceError::CheckoutIncomplete("payment method".to_string()))?;
        if !settings.is_payment_enabled(payment_method) {
            return Err(CommerceError::PaymentMethodDisabled(
                payment_method.display_name().to_string(),
            ));
        }

        let pricing = self.pricing(cart, settings);
        let items = cart.snapshot();
        let reference = OrderReference::generate();
        let coupon_code = self.coupon.as_ref().map(|c| c.code.clone());
        let ticket = CheckoutTicket {
            reference: reference.clone(),
            customer: self.customer.clone(),
            payment_method,
            items: items.clone(),
            amount: pricing.total,
            pricing: pricing.clone(),
            coupon_code: coupon_code.clone(),
            issued_at: now_millis(),
        };
        self.handoff.write_ticket(&ticket)?;

        tracing::info!(
            %reference,
            amount = %pricing.total,
            method = payment_method.as_str(),
            "checkout handed off to gateway"
        );

        self.pending = Some(PendingHandoff {
            reference: reference.clone(),
            items,
            amount: pricing.total,
            payment_method,
            pricing: pricing.clone(),
            coupon_code,
        });
        self.transition(CheckoutStep::GatewayHandoff);

        Ok(GatewayRequest {
            amount: pricing.total,
            order_reference: reference,
            payment_method,
        })
    }

    /// Abandon the outstanding hand-off and return to review.
    ///
    /// Deletes the ticket. The cart is left untouched.
    pub fn cancel_handoff(&mut self) -> Result<CheckoutStep, CommerceError> {
        self.expect_step(CheckoutStep::GatewayHandoff, CheckoutStep::Review)?;
        if let Some(pending) = self.pending.take() {
            tracing::info!(reference = %pending.reference, "gateway hand-off cancelled");
        }
        self.handoff.delete_ticket();
        self.transition(CheckoutStep::Review);
        Ok(self.step)
    }

    /// Turn a gateway return into at most one order.
    ///
    /// Checks run in order: reference present and status success, reference
    /// not already processed, reference matches the outstanding hand-off.
    /// With no hand-off outstanding, an empty cart is stale and otherwise the
    /// ticket must carry the reference. The order is built from the lines
    /// snapshotted at `confirm`. The reference is marked processed before the
    /// order is written. When the ticket is gone, `fallback` (usually the
    /// signed-in user's contact) stands in for the customer snapshot.
    pub fn reconcile(
        &mut self,
        result: &GatewayResult,
        cart: &mut CartManager,
        ledger: &mut OrderLedger,
        fallback: Option<CustomerSnapshot>,
    ) -> Result<ReconcileOutcome, CommerceError> {
        let reference = match &result.order_reference {
            Some(reference) if !reference.is_empty() => reference.clone(),
            _ => {
                tracing::warn!("gateway return without order reference");
                return Ok(ReconcileOutcome::Invalid("missing order reference".to_string()));
            }
        };
        let matches_pending = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.reference == reference);

        match &result.status {
            GatewayStatus::Success => {}
            GatewayStatus::Cancelled if matches_pending => {
                self.cancel_handoff()?;
                return Ok(ReconcileOutcome::Cancelled);
            }
            status => {
                tracing::warn!(%reference, status = status.as_str(), "gateway return not successful");
                if matches_pending {
                    self.cancel_handoff()?;
                }
                return Ok(ReconcileOutcome::Invalid(format!(
                    "payment status {}",
                    status.as_str()
                )));
            }
        }

        if self.handoff.is_processed(&reference) {
            tracing::debug!(%reference, "gateway return already reconciled");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }
        if let Some(pending) = &self.pending {
            if !matches_pending {
                tracing::warn!(
                    %reference,
                    expected = %pending.reference,
                    "gateway returned a mismatched reference"
                );
                return Ok(ReconcileOutcome::Invalid("order reference mismatch".to_string()));
            }
        } else if cart.is_empty() {
            tracing::debug!(%reference, "gateway return with empty cart treated as stale");
            return Ok(ReconcileOutcome::Stale);
        }

        let ticket = self
            .handoff
            .read_ticket()?
            .filter(|ticket| ticket.reference == reference);

        let (items, payment_method, amount, pricing, coupon_code) =
            match (self.pending.clone(), &ticket) {
                (Some(pending), _) => (
                    pending.items,
                    pending.payment_method,
                    pending.amount,
                    pending.pricing,
                    pending.coupon_code,
                ),
                (None, Some(ticket)) => (
                    ticket.items.clone(),
                    ticket.payment_method,
                    ticket.amount,
                    ticket.pricing.clone(),
                    ticket.coupon_code.clone(),
                ),
                (None, None) => {
                    tracing::warn!(%reference, "gateway return with no checkout in progress");
                    return Ok(ReconcileOutcome::Invalid("no checkout in progress".to_string()));
                }
            };
        let customer = match ticket {
            Some(ticket) => ticket.customer,
            None => {
                tracing::warn!(%reference, "checkout ticket missing, using fallback customer");
                fallback.unwrap_or_else(|| self.customer.clone())
            }
        };

        self.handoff.mark_processed(&reference)?;

        let order_id = ledger
            .create_order(NewOrder {
                reference,
                transaction_id: result.transaction_id.clone(),
                items: &items,
                customer,
                payment_method,
                pricing,
                total: amount,
                coupon_code,
            })
            .id
            .clone();

        cart.clear_cart();
        self.handoff.delete_ticket();
        self.pending = None;
        self.coupon = None;
        self.completed_order = Some(order_id.clone());
        self.transition(CheckoutStep::Reconciled);

        Ok(ReconcileOutcome::Created(order_id))
    }

    /// Start over after a completed order. Shipping details are kept for
    /// the next checkout; the processed set is never reset.
    pub fn restart(&mut self) -> Result<(), CommerceError> {
        if let Some(pending) = &self.pending {
            return Err(CommerceError::HandoffInProgress(pending.reference.to_string()));
        }
        self.payment_method = None;
        self.coupon = None;
        self.completed_order = None;
        self.transition(CheckoutStep::ShippingInfo);
        Ok(())
    }

    fn expect_step(&self, expected: CheckoutStep, to: CheckoutStep) -> Result<(), CommerceError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn ensure_editable(&self, what: &str) -> Result<(), CommerceError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: what.to_string(),
            })
        }
    }

    fn transition(&mut self, to: CheckoutStep) {
        tracing::debug!(from = self.step.as_str(), to = to.as_str(), "checkout step");
        self.step = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Coupon;
    use crate::catalog::Product;
    use crate::checkout::Address;
    use crate::ids::{ProductId, TransactionId};
    use crate::money::Currency;

    fn settings() -> AppSettings {
        let mut settings = AppSettings::default();
        settings.free_shipping_threshold = Money::from_major(800, Currency::KWD);
        settings.coupons = vec![Coupon::fixed("FIVE", 5.0)];
        settings
    }

    fn customer() -> CustomerSnapshot {
        CustomerSnapshot {
            full_name: "Sara Ahmad".to_string(),
            email: "sara@example.com".to_string(),
            phone: "55551234".to_string(),
            address: Address {
                area: "Salmiya".to_string(),
                block: "10".to_string(),
                street: "Salem Al Mubarak".to_string(),
                building: "7".to_string(),
                notes: None,
            },
        }
    }

    fn cart() -> CartManager {
        let mut cart = CartManager::new(Currency::KWD);
        let phone = Product::new("p1", "Galaxy S24", Money::from_major(390, Currency::KWD), 3);
        cart.add_to_cart(&phone, 2).unwrap();
        cart
    }

    fn at_review(settings: &AppSettings) -> CheckoutCoordinator {
        let mut checkout = CheckoutCoordinator::from_settings(SessionId::new("s1"), settings);
        checkout.set_customer(customer()).unwrap();
        checkout.continue_to_payment().unwrap();
        checkout.select_payment(PaymentMethod::Knet, settings).unwrap();
        checkout.continue_to_review(settings).unwrap();
        checkout
    }

    #[test]
    fn test_shipping_validation_lists_missing_fields() {
        let mut checkout = CheckoutCoordinator::new(SessionId::new("s1"), Duration::from_secs(60));
        let err = checkout.continue_to_payment().unwrap_err();
        match err {
            CommerceError::CheckoutIncomplete(missing) => {
                assert!(missing.contains("full name"));
                assert!(missing.contains("area"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(checkout.step(), CheckoutStep::ShippingInfo);
    }

    #[test]
    fn test_back_preserves_state() {
        let settings = settings();
        let mut checkout = at_review(&settings);

        assert_eq!(checkout.back().unwrap(), CheckoutStep::PaymentSelection);
        assert_eq!(checkout.back().unwrap(), CheckoutStep::ShippingInfo);
        assert!(checkout.back().is_err());

        assert_eq!(checkout.customer(), &customer());
        assert_eq!(checkout.payment_method(), Some(PaymentMethod::Knet));
    }

    #[test]
    fn test_disabled_payment_method() {
        let mut settings = settings();
        settings.payments.card_enabled = false;
        let mut checkout = CheckoutCoordinator::from_settings(SessionId::new("s1"), &settings);
        checkout.set_customer(customer()).unwrap();
        checkout.continue_to_payment().unwrap();

        assert!(matches!(
            checkout.select_payment(PaymentMethod::CreditCard, &settings),
            Err(CommerceError::PaymentMethodDisabled(_))
        ));
        assert!(matches!(
            checkout.continue_to_review(&settings),
            Err(CommerceError::CheckoutIncomplete(_))
        ));
    }

    #[test]
    fn test_confirm_charges_subtotal_plus_delivery() {
        let settings = settings();
        let mut checkout = at_review(&settings);

        let request = checkout.confirm(&cart(), &settings).unwrap();

        assert_eq!(request.amount, Money::from_major(782, Currency::KWD));
        assert_eq!(checkout.step(), CheckoutStep::GatewayHandoff);
        let ticket = checkout.ticket().unwrap().unwrap();
        assert_eq!(ticket.reference, request.order_reference);
        assert_eq!(ticket.customer, customer());
        assert_eq!(ticket.items, cart().snapshot());
    }

    #[test]
    fn test_confirm_rejects_second_submission() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        checkout.confirm(&cart(), &settings).unwrap();

        assert!(matches!(
            checkout.confirm(&cart(), &settings),
            Err(CommerceError::HandoffInProgress(_))
        ));
    }

    #[test]
    fn test_confirm_rejects_empty_cart() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let empty = CartManager::new(Currency::KWD);
        assert!(matches!(checkout.confirm(&empty, &settings), Err(CommerceError::EmptyCart)));
        assert!(!checkout.handoff_store().has_ticket());
    }

    #[test]
    fn test_coupon_applied_before_delivery() {
        let settings = settings();
        let mut checkout = at_review(&settings);

        assert!(matches!(
            checkout.apply_coupon("NOPE", &settings),
            Err(CommerceError::InvalidCoupon(_))
        ));
        assert!(checkout.coupon().is_none());

        checkout.apply_coupon("five", &settings).unwrap();
        let request = checkout.confirm(&cart(), &settings).unwrap();
        assert_eq!(request.amount, Money::from_major(777, Currency::KWD));
    }

    #[test]
    fn test_details_locked_after_confirm() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        assert!(checkout.is_editable());
        checkout.confirm(&cart(), &settings).unwrap();

        assert!(!checkout.is_editable());
        assert!(matches!(
            checkout.set_customer(CustomerSnapshot::default()),
            Err(CommerceError::InvalidCheckoutTransition { .. })
        ));
        assert_eq!(checkout.customer(), &customer());
    }

    #[test]
    fn test_cancel_handoff_returns_to_review() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let cart = cart();
        checkout.confirm(&cart, &settings).unwrap();

        checkout.cancel_handoff().unwrap();

        assert_eq!(checkout.step(), CheckoutStep::Review);
        assert!(checkout.pending().is_none());
        assert!(!checkout.handoff_store().has_ticket());
        assert_eq!(cart.item_count(), 2);
        // A fresh confirm is allowed again.
        assert!(checkout.confirm(&cart, &settings).is_ok());
    }

    #[test]
    fn test_reconcile_creates_one_order() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();
        let result = GatewayResult::success(request.order_reference.clone(), TransactionId::new("TXN-1"));

        let outcome = checkout.reconcile(&result, &mut cart, &mut ledger, None).unwrap();

        let order_id = outcome.order_id().cloned().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Reconciled);
        assert_eq!(checkout.completed_order(), Some(&order_id));
        assert!(cart.is_empty());
        assert!(!checkout.handoff_store().has_ticket());

        let order = ledger.get(&order_id).unwrap();
        assert_eq!(order.total, request.amount);
        assert_eq!(order.reference, request.order_reference);
        assert_eq!(order.transaction_id, Some(TransactionId::new("TXN-1")));
        assert_eq!(order.items[0].quantity, 2);

        // Second return with the same reference is ignored.
        let again = checkout.reconcile(&result, &mut cart, &mut ledger, None).unwrap();
        assert_eq!(again, ReconcileOutcome::AlreadyProcessed);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reconcile_processed_even_with_new_cart() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();
        let result = GatewayResult::success(request.order_reference, TransactionId::new("TXN-1"));
        checkout.reconcile(&result, &mut cart, &mut ledger, None).unwrap();

        let mut refilled = self::cart();
        let outcome = checkout.reconcile(&result, &mut refilled, &mut ledger, None).unwrap();

        assert_eq!(outcome, ReconcileOutcome::AlreadyProcessed);
        assert_eq!(refilled.item_count(), 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reconcile_rejects_mismatched_reference() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        checkout.confirm(&cart, &settings).unwrap();

        let forged = GatewayResult::success(OrderReference::new("REF-other"), TransactionId::new("TXN-1"));
        let outcome = checkout.reconcile(&forged, &mut cart, &mut ledger, None).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Invalid(_)));
        assert!(ledger.is_empty());
        assert_eq!(cart.item_count(), 2);
        assert_eq!(checkout.step(), CheckoutStep::GatewayHandoff);
    }

    #[test]
    fn test_reconcile_rejects_missing_reference_and_bad_status() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();

        let missing = GatewayResult::from_query("status=success");
        assert!(matches!(
            checkout.reconcile(&missing, &mut cart, &mut ledger, None).unwrap(),
            ReconcileOutcome::Invalid(_)
        ));

        let declined = GatewayResult::from_query(&format!(
            "orderReference={}&status=declined",
            request.order_reference
        ));
        assert!(matches!(
            checkout.reconcile(&declined, &mut cart, &mut ledger, None).unwrap(),
            ReconcileOutcome::Invalid(_)
        ));
        assert!(ledger.is_empty());
        assert_eq!(checkout.step(), CheckoutStep::Review);
    }

    #[test]
    fn test_reconcile_cancelled_returns_to_review() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();

        let outcome = checkout
            .reconcile(
                &GatewayResult::cancelled(request.order_reference),
                &mut cart,
                &mut ledger,
                None,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Cancelled);
        assert_eq!(checkout.step(), CheckoutStep::Review);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_reconcile_records_cart_as_priced() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();

        let headphones = Product::new("p2", "WH-1000XM5", Money::from_major(300, Currency::KWD), 5);
        cart.add_to_cart(&headphones, 3).unwrap();
        cart.update_quantity(&ProductId::new("p1"), 1).unwrap();

        let outcome = checkout
            .reconcile(
                &GatewayResult::success(request.order_reference, TransactionId::new("TXN-1")),
                &mut cart,
                &mut ledger,
                None,
            )
            .unwrap();

        assert!(outcome.is_created());
        let order = ledger.latest().unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        let items_total: i64 = order.items.iter().map(|l| l.line_total.amount_minor).sum();
        assert_eq!(items_total, order.subtotal.amount_minor);
        assert_eq!(order.total, request.amount);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_reconcile_records_order_when_cart_emptied_during_handoff() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();
        cart.clear_cart();

        let outcome = checkout
            .reconcile(
                &GatewayResult::success(request.order_reference, TransactionId::new("TXN-1")),
                &mut cart,
                &mut ledger,
                None,
            )
            .unwrap();

        assert!(outcome.is_created());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.latest().unwrap().item_count(), 2);
        assert_eq!(checkout.step(), CheckoutStep::Reconciled);
    }

    #[test]
    fn test_reconcile_without_handoff_and_empty_cart_is_stale() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut empty = CartManager::new(Currency::KWD);
        let mut ledger = OrderLedger::new();

        let outcome = checkout
            .reconcile(
                &GatewayResult::success(OrderReference::new("REF-reload"), TransactionId::new("TXN-1")),
                &mut empty,
                &mut ledger,
                None,
            )
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Stale);
        assert!(ledger.is_empty());
        assert_eq!(checkout.step(), CheckoutStep::Review);
    }

    #[test]
    fn test_reconcile_mismatched_reference_with_empty_cart_is_invalid() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        checkout.confirm(&cart, &settings).unwrap();
        cart.clear_cart();

        let forged = GatewayResult::success(OrderReference::new("REF-other"), TransactionId::new("TXN-1"));
        let outcome = checkout.reconcile(&forged, &mut cart, &mut ledger, None).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Invalid("order reference mismatch".to_string()));
        assert!(ledger.is_empty());
        assert!(checkout.is_handoff_pending());
        assert!(checkout.handoff_store().has_ticket());
    }

    #[test]
    fn test_reconcile_without_ticket_uses_fallback() {
        let mut settings = settings();
        settings.checkout_ticket_ttl = Duration::ZERO;
        let mut checkout = at_review(&settings);
        let mut cart = cart();
        let mut ledger = OrderLedger::new();
        let request = checkout.confirm(&cart, &settings).unwrap();
        assert!(checkout.ticket().unwrap().is_none());

        let fallback = CustomerSnapshot {
            full_name: "Signed In".to_string(),
            email: "member@example.com".to_string(),
            ..CustomerSnapshot::default()
        };
        let outcome = checkout
            .reconcile(
                &GatewayResult::success(request.order_reference, TransactionId::new("TXN-1")),
                &mut cart,
                &mut ledger,
                Some(fallback),
            )
            .unwrap();

        assert!(outcome.is_created());
        let order = ledger.latest().unwrap();
        assert_eq!(order.customer.email, "member@example.com");
        assert_eq!(order.payment_method, PaymentMethod::Knet);
    }

    #[test]
    fn test_progress_and_restart() {
        let settings = settings();
        let mut checkout = at_review(&settings);
        assert_eq!(checkout.progress().number, 3);
        assert_eq!(checkout.progress().percent, 60);

        checkout.confirm(&cart(), &settings).unwrap();
        assert!(checkout.restart().is_err());
        checkout.cancel_handoff().unwrap();
        checkout.restart().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::ShippingInfo);
        assert_eq!(checkout.customer(), &customer());
    }
}
