//! The per-session store.
//!
//! [`ShopStore`] owns every manager for one shopping session and is handed
//! by reference to whatever drives the UI. Manager outcomes that the shopper
//! should see (stock clamps, rejected compare adds, bad coupons, payment
//! results) are turned into notifications here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use shopfront_auth::{AccountDirectory, AuthError, AuthSession, Credentials, Role, User};
use shopfront_cache::SessionId;
use shopfront_commerce::cart::{AppliedCoupon, CartManager, CartPricing, CartUpdate};
use shopfront_commerce::catalog::{CatalogView, Product};
use shopfront_commerce::checkout::{
    CheckoutCoordinator, CheckoutStep, CustomerSnapshot, GatewayRequest, GatewayResult, Order,
    OrderLedger, PaymentGateway, PaymentMethod, ReconcileOutcome,
};
use shopfront_commerce::lists::{CompareList, RecentlyViewed, Wishlist, COMPARE_CAPACITY};
use shopfront_commerce::notify::{NotificationHandle, NotificationQueue, Severity};
use shopfront_commerce::summary::{generate_summary, ReviewSummaries, ReviewSummarizer, SummaryState};
use shopfront_commerce::{AppSettings, CommerceError, ProductId};

use crate::ShopError;

/// Everything one shopping session can see and change.
#[derive(Debug)]
pub struct ShopStore {
    settings: Arc<AppSettings>,
    session_id: SessionId,
    catalog: CatalogView,
    cart: CartManager,
    wishlist: Wishlist,
    compare: CompareList,
    recently_viewed: RecentlyViewed,
    auth: AuthSession,
    notifications: NotificationQueue,
    checkout: CheckoutCoordinator,
    orders: OrderLedger,
    summaries: ReviewSummaries,
}

impl ShopStore {
    /// Start a session with a fresh session ID.
    pub fn new(settings: Arc<AppSettings>, catalog: CatalogView) -> Self {
        Self::with_session_id(settings, catalog, SessionId::generate())
    }

    pub fn with_session_id(
        settings: Arc<AppSettings>,
        catalog: CatalogView,
        session_id: SessionId,
    ) -> Self {
        tracing::debug!(%session_id, products = catalog.len(), "shop session started");
        Self {
            cart: CartManager::new(settings.currency),
            recently_viewed: RecentlyViewed::new(settings.recently_viewed_limit),
            notifications: NotificationQueue::new(settings.notification_duration),
            checkout: CheckoutCoordinator::from_settings(session_id.clone(), &settings),
            wishlist: Wishlist::new(),
            compare: CompareList::new(),
            auth: AuthSession::new(),
            orders: OrderLedger::new(),
            summaries: ReviewSummaries::new(),
            settings,
            session_id,
            catalog,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn catalog(&self) -> &CatalogView {
        &self.catalog
    }

    pub fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn compare(&self) -> &CompareList {
        &self.compare
    }

    pub fn recently_viewed(&self) -> &RecentlyViewed {
        &self.recently_viewed
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn checkout(&self) -> &CheckoutCoordinator {
        &self.checkout
    }

    pub fn orders(&self) -> &OrderLedger {
        &self.orders
    }

    // ---- Notifications ----

    /// Show a notification for the configured default duration.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> NotificationHandle {
        self.notifications.show(message, severity)
    }

    /// Expiry timer callback.
    pub fn expire_notification(&mut self, handle: NotificationHandle) -> bool {
        self.notifications.expire(handle)
    }

    pub fn poll_notifications(&mut self, now: Instant) -> bool {
        self.notifications.poll(now)
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.dismiss();
    }

    // ---- Catalog ----

    pub fn search(&mut self, term: impl Into<String>) -> Vec<&Product> {
        self.catalog.set_search_term(term);
        self.catalog.filtered()
    }

    /// Open a product page. Records it in recently viewed.
    pub fn view_product(&mut self, product_id: &ProductId) -> Result<&Product, CommerceError> {
        let product = self.catalog.require(product_id)?;
        self.recently_viewed.record(product);
        Ok(product)
    }

    // ---- Cart ----

    /// Add a catalog product to the cart.
    ///
    /// A request above stock is clamped and reported with an error
    /// notification; the returned update still succeeds. The cart is locked
    /// while a payment is at the gateway.
    pub fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartUpdate, CommerceError> {
        self.ensure_cart_unlocked()?;
        let product = self.catalog.require(product_id)?;
        let name = product.name.clone();
        let outcome = self.cart.add_to_cart(product, quantity);
        self.announce_cart_update(&name, outcome, "added to cart")
    }

    /// Set a cart line's quantity. Zero or less removes the line.
    pub fn update_cart_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartUpdate, CommerceError> {
        self.ensure_cart_unlocked()?;
        let name = self
            .cart
            .line(product_id)
            .map(|line| line.name.clone())
            .unwrap_or_else(|| product_id.to_string());
        let outcome = self.cart.update_quantity(product_id, quantity);
        let (removed, clamped) = match &outcome {
            Ok(update) => (update.is_removed(), update.stock_exceeded.is_some()),
            Err(_) => (false, false),
        };
        if removed {
            self.notify(format!("{name} removed from cart"), Severity::Info);
            return outcome;
        }
        if outcome.is_ok() && !clamped {
            return outcome;
        }
        self.announce_cart_update(&name, outcome, "updated")
    }

    /// Remove a line. Returns whether it was in the cart.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<bool, CommerceError> {
        self.ensure_cart_unlocked()?;
        let name = self.cart.line(product_id).map(|line| line.name.clone());
        let removed = self.cart.remove_from_cart(product_id);
        if let (true, Some(name)) = (removed, name) {
            self.notify(format!("{name} removed from cart"), Severity::Info);
        }
        Ok(removed)
    }

    /// Pricing with the coupon held by checkout.
    pub fn pricing(&self) -> CartPricing {
        self.checkout.pricing(&self.cart, &self.settings)
    }

    /// The order is built from the cart as priced at hand-off.
    fn ensure_cart_unlocked(&mut self) -> Result<(), CommerceError> {
        match self.checkout.pending() {
            Some(pending) => {
                let reference = pending.reference.to_string();
                self.notify("Payment is in progress, the cart cannot change", Severity::Error);
                Err(CommerceError::HandoffInProgress(reference))
            }
            None => Ok(()),
        }
    }

    fn announce_cart_update(
        &mut self,
        name: &str,
        outcome: Result<CartUpdate, CommerceError>,
        verb: &str,
    ) -> Result<CartUpdate, CommerceError> {
        match &outcome {
            Ok(update) => match &update.stock_exceeded {
                Some(exceeded) => {
                    self.notify(
                        format!("Only {} units of {name} available", exceeded.available),
                        Severity::Error,
                    );
                }
                None => {
                    self.notify(format!("{name} {verb}"), Severity::Success);
                }
            },
            Err(CommerceError::OutOfStock(_)) => {
                self.notify(format!("{name} is out of stock"), Severity::Error);
            }
            Err(e) => {
                self.notify(e.to_string(), Severity::Error);
            }
        }
        outcome
    }

    // ---- Lists ----

    /// Add or remove a product from the wishlist. Returns the new membership.
    pub fn toggle_wishlist(&mut self, product_id: &ProductId) -> Result<bool, CommerceError> {
        let name = self.catalog.require(product_id)?.name.clone();
        let saved = self.wishlist.toggle(product_id);
        if saved {
            self.notify(format!("{name} saved to wishlist"), Severity::Success);
        } else {
            self.notify(format!("{name} removed from wishlist"), Severity::Info);
        }
        Ok(saved)
    }

    /// Move a wishlist entry into the cart.
    pub fn move_wishlist_to_cart(&mut self, product_id: &ProductId) -> Result<CartUpdate, CommerceError> {
        if !self.wishlist.contains(product_id) {
            return Err(CommerceError::ProductNotFound(product_id.to_string()));
        }
        let update = self.add_to_cart(product_id, 1)?;
        self.wishlist.remove(product_id);
        Ok(update)
    }

    pub fn wishlist_products(&self) -> Vec<&Product> {
        self.resolve(self.wishlist.ids())
    }

    /// Add a product to the compare list. Rejections notify and change nothing.
    pub fn add_to_compare(&mut self, product_id: &ProductId) -> Result<(), CommerceError> {
        let name = self.catalog.require(product_id)?.name.clone();
        match self.compare.add(product_id) {
            Ok(()) => {
                self.notify(format!("{name} added to compare"), Severity::Success);
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    CommerceError::CompareFull { .. } => {
                        format!("You can compare up to {COMPARE_CAPACITY} products")
                    }
                    CommerceError::AlreadyInCompare(_) => format!("{name} is already in compare"),
                    other => other.to_string(),
                };
                self.notify(message, Severity::Error);
                Err(e)
            }
        }
    }

    pub fn remove_from_compare(&mut self, product_id: &ProductId) -> bool {
        self.compare.remove(product_id)
    }

    pub fn compared_products(&self) -> Vec<&Product> {
        self.resolve(self.compare.ids())
    }

    fn resolve(&self, ids: &[ProductId]) -> Vec<&Product> {
        ids.iter().filter_map(|id| self.catalog.get(id)).collect()
    }

    // ---- Auth ----

    /// Sign in. Pre-fills blank checkout details from the account.
    pub fn login(
        &mut self,
        directory: &mut AccountDirectory,
        credentials: &Credentials,
    ) -> Result<&User, AuthError> {
        match self.auth.login(directory, credentials) {
            Ok(user) => {
                let message = format!("Welcome back, {}", user.name);
                let contact = user.contact_snapshot();
                if self.checkout.is_editable()
                    && self.checkout.customer() == &CustomerSnapshot::default()
                {
                    if let Err(e) = self.checkout.set_customer(contact) {
                        tracing::warn!(error = %e, "could not prefill shipping details");
                    }
                }
                self.notify(message, Severity::Success);
            }
            Err(e) => {
                let message = match &e {
                    AuthError::AccountLocked { .. } => "Too many attempts. Try again later".to_string(),
                    AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                    other => other.to_string(),
                };
                self.notify(message, Severity::Error);
                return Err(e);
            }
        }
        self.auth.current().ok_or(AuthError::NotSignedIn)
    }

    /// Sign out. Cart and lists stay with the session.
    pub fn logout(&mut self) -> Option<User> {
        let user = self.auth.logout();
        if user.is_some() {
            self.notify("Signed out", Severity::Info);
        }
        user
    }

    /// Gate for admin views. Client-side only.
    pub fn require_admin(&self) -> Result<&User, AuthError> {
        self.auth.require_role(Role::Admin)
    }

    // ---- Checkout ----

    pub fn set_shipping(&mut self, customer: CustomerSnapshot) -> Result<(), CommerceError> {
        self.checkout.set_customer(customer)
    }

    pub fn continue_to_payment(&mut self) -> Result<CheckoutStep, CommerceError> {
        let result = self.checkout.continue_to_payment();
        self.notify_on_error(&result);
        result
    }

    pub fn select_payment(&mut self, method: PaymentMethod) -> Result<(), CommerceError> {
        let result = self.checkout.select_payment(method, &self.settings);
        self.notify_on_error(&result);
        result
    }

    pub fn continue_to_review(&mut self) -> Result<CheckoutStep, CommerceError> {
        let result = self.checkout.continue_to_review(&self.settings);
        self.notify_on_error(&result);
        result
    }

    pub fn checkout_back(&mut self) -> Result<CheckoutStep, CommerceError> {
        self.checkout.back()
    }

    /// Apply a coupon. An unknown code notifies and changes nothing.
    pub fn apply_coupon(&mut self, code: &str) -> Result<AppliedCoupon, CommerceError> {
        match self.checkout.apply_coupon(code, &self.settings) {
            Ok(applied) => {
                let applied = applied.clone();
                self.notify(format!("Coupon {} applied", applied.code), Severity::Success);
                Ok(applied)
            }
            Err(e) => {
                let message = match &e {
                    CommerceError::InvalidCoupon(_) => "Invalid coupon code".to_string(),
                    other => other.to_string(),
                };
                self.notify(message, Severity::Error);
                Err(e)
            }
        }
    }

    /// Confirm the review and get the request to hand to the gateway.
    pub fn begin_handoff(&mut self) -> Result<GatewayRequest, CommerceError> {
        let result = self.checkout.confirm(&self.cart, &self.settings);
        if let Err(CommerceError::HandoffInProgress(_)) = &result {
            self.notify("Payment is already in progress", Severity::Info);
        } else {
            self.notify_on_error(&result);
        }
        result
    }

    /// Shopper backed out of the gateway.
    pub fn cancel_handoff(&mut self) -> Result<CheckoutStep, CommerceError> {
        let step = self.checkout.cancel_handoff()?;
        self.notify("Payment cancelled", Severity::Info);
        Ok(step)
    }

    /// Reconcile a gateway return. Safe to call repeatedly with the same result.
    pub fn complete_gateway_return(
        &mut self,
        result: &GatewayResult,
    ) -> Result<ReconcileOutcome, CommerceError> {
        let fallback = self.auth.contact_snapshot();
        let outcome = self
            .checkout
            .reconcile(result, &mut self.cart, &mut self.orders, fallback)?;

        match &outcome {
            ReconcileOutcome::Created(order_id) => {
                self.notify(format!("Order {order_id} placed"), Severity::Success);
            }
            ReconcileOutcome::Cancelled => {
                self.notify("Payment cancelled", Severity::Info);
            }
            ReconcileOutcome::Invalid(reason) => {
                tracing::warn!(%reason, "gateway return rejected");
                self.notify("We could not verify your payment", Severity::Error);
            }
            ReconcileOutcome::AlreadyProcessed | ReconcileOutcome::Stale => {}
        }
        Ok(outcome)
    }

    /// Reconcile from the return URL's query string.
    pub fn complete_gateway_query(&mut self, query: &str) -> Result<ReconcileOutcome, CommerceError> {
        self.complete_gateway_return(&GatewayResult::from_query(query))
    }

    /// Run the whole hand-off against a gateway and reconcile the result.
    ///
    /// If the gateway itself errors the hand-off is cancelled so the shopper
    /// can retry from review.
    pub async fn place_order(
        &mut self,
        gateway: &dyn PaymentGateway,
    ) -> Result<ReconcileOutcome, ShopError> {
        let request = self.begin_handoff()?;
        let result = match gateway.process(&request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(reference = %request.order_reference, error = %e, "gateway failed");
                self.checkout.cancel_handoff()?;
                self.notify("Payment failed, please try again", Severity::Error);
                return Err(e.into());
            }
        };
        Ok(self.complete_gateway_return(&result)?)
    }

    /// Start a new checkout after an order.
    pub fn restart_checkout(&mut self) -> Result<(), CommerceError> {
        self.checkout.restart()
    }

    pub fn last_order(&self) -> Option<&Order> {
        self.checkout
            .completed_order()
            .and_then(|id| self.orders.get(id))
    }

    fn notify_on_error<T>(&mut self, result: &Result<T, CommerceError>) {
        if let Err(e) = result {
            let message = match e {
                CommerceError::CheckoutIncomplete(missing) => format!("Please fill in: {missing}"),
                CommerceError::EmptyCart => "Your cart is empty".to_string(),
                other => other.to_string(),
            };
            self.notify(message, Severity::Error);
        }
    }

    // ---- Review summaries ----

    pub fn summary(&self, product_id: &ProductId) -> SummaryState {
        self.summaries.state(product_id)
    }

    /// Mark a summary pending and return the product to summarize.
    ///
    /// `None` if the product is unknown, a request is running or a summary
    /// is already shown. A failed (empty) summary may be asked for again.
    pub fn begin_summary(&mut self, product_id: &ProductId) -> Option<Product> {
        let state = self.summaries.state(product_id);
        if state.is_pending() || state.text().is_some() {
            return None;
        }
        let product = self.catalog.get(product_id)?.clone();
        self.summaries.begin(product_id).then_some(product)
    }

    pub fn finish_summary(&mut self, product_id: &ProductId, text: String) {
        self.summaries.finish(product_id, text);
    }

    /// Generate the summary for one product.
    pub async fn load_summary(
        &mut self,
        summarizer: &dyn ReviewSummarizer,
        product_id: &ProductId,
        timeout: Option<Duration>,
    ) -> SummaryState {
        if let Some(product) = self.begin_summary(product_id) {
            let text = generate_summary(summarizer, &product, timeout).await;
            self.finish_summary(product_id, text);
        }
        self.summary(product_id)
    }

    /// Generate summaries for every compared product concurrently.
    pub async fn load_compare_summaries(
        &mut self,
        summarizer: &dyn ReviewSummarizer,
        timeout: Option<Duration>,
    ) {
        let ids = self.compare.ids().to_vec();
        let products: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.begin_summary(id))
            .collect();

        let texts = join_all(
            products
                .iter()
                .map(|product| generate_summary(summarizer, product, timeout)),
        )
        .await;

        for (product, text) in products.iter().zip(texts) {
            self.finish_summary(&product.id, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_auth::PasswordHasher;
    use shopfront_commerce::checkout::Address;
    use shopfront_commerce::{Currency, Money};

    fn settings() -> Arc<AppSettings> {
        let settings = AppSettings::from_toml_str(
            r#"
            currency = "KWD"
            delivery_fee = 2.0
            free_shipping_threshold = 800

            [[coupons]]
            code = "WELCOME10"
            value = { kind = "percentage", value = 10.0 }
            "#,
        )
        .unwrap();
        Arc::new(settings)
    }

    fn store() -> ShopStore {
        let catalog = CatalogView::new(vec![
            Product::new("p1", "Galaxy S24", Money::from_major(390, Currency::KWD), 3),
            Product::new("p2", "Pixel 9", Money::from_major(280, Currency::KWD), 0),
            Product::new("p3", "iPhone 16", Money::from_major(350, Currency::KWD), 5),
            Product::new("p4", "Xperia 1", Money::from_major(300, Currency::KWD), 2),
        ]);
        ShopStore::new(settings(), catalog)
    }

    fn id(value: &str) -> ProductId {
        ProductId::new(value)
    }

    fn last_message(store: &ShopStore) -> (String, Severity) {
        let current = store.notifications().current().unwrap();
        (current.message.clone(), current.severity)
    }

    #[test]
    fn test_add_to_cart_notifies_success() {
        let mut store = store();
        store.add_to_cart(&id("p1"), 1).unwrap();
        assert_eq!(
            last_message(&store),
            ("Galaxy S24 added to cart".to_string(), Severity::Success)
        );
    }

    #[test]
    fn test_add_to_cart_clamp_notifies_error() {
        let mut store = store();
        let update = store.add_to_cart(&id("p1"), 5).unwrap();
        assert_eq!(update.quantity, 3);
        let (message, severity) = last_message(&store);
        assert_eq!(severity, Severity::Error);
        assert!(message.contains("Only 3"));
    }

    #[test]
    fn test_add_out_of_stock_is_rejected() {
        let mut store = store();
        let result = store.add_to_cart(&id("p2"), 1);
        assert!(matches!(result, Err(CommerceError::OutOfStock(_))));
        assert!(store.cart().is_empty());
        assert_eq!(
            last_message(&store),
            ("Pixel 9 is out of stock".to_string(), Severity::Error)
        );
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut store = store();
        store.add_to_cart(&id("p1"), 2).unwrap();
        let update = store.update_cart_quantity(&id("p1"), 0).unwrap();
        assert!(update.is_removed());
        assert!(store.cart().is_empty());
        assert_eq!(last_message(&store).1, Severity::Info);
    }

    #[test]
    fn test_view_product_records_recent() {
        let mut store = store();
        store.view_product(&id("p1")).unwrap();
        store.view_product(&id("p3")).unwrap();
        store.view_product(&id("p1")).unwrap();

        let recent: Vec<_> = store.recently_viewed().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(recent, vec!["p1", "p3"]);
    }

    #[test]
    fn test_compare_full_notifies_and_keeps_list() {
        let mut store = store();
        for product in ["p1", "p2", "p3"] {
            store.add_to_compare(&id(product)).unwrap();
        }

        let result = store.add_to_compare(&id("p4"));
        assert!(matches!(result, Err(CommerceError::CompareFull { capacity: 3 })));
        assert_eq!(store.compared_products().len(), 3);
        assert_eq!(
            last_message(&store),
            ("You can compare up to 3 products".to_string(), Severity::Error)
        );
    }

    #[test]
    fn test_move_wishlist_to_cart() {
        let mut store = store();
        assert!(store.toggle_wishlist(&id("p3")).unwrap());
        assert_eq!(store.wishlist_products().len(), 1);

        store.move_wishlist_to_cart(&id("p3")).unwrap();
        assert!(store.wishlist().is_empty());
        assert_eq!(store.cart().line(&id("p3")).unwrap().quantity, 1);
    }

    #[test]
    fn test_invalid_coupon_notifies() {
        let mut store = store();
        assert!(store.apply_coupon("NOPE").is_err());
        assert_eq!(
            last_message(&store),
            ("Invalid coupon code".to_string(), Severity::Error)
        );

        store.add_to_cart(&id("p1"), 1).unwrap();
        store.apply_coupon("welcome10").unwrap();
        assert_eq!(store.pricing().discount, Money::from_major(39, Currency::KWD));
    }

    #[test]
    fn test_login_prefills_blank_checkout() {
        let mut directory = AccountDirectory::new(PasswordHasher::with_cost(1024, 1).unwrap());
        let creds = Credentials::new("sara@example.com", "Secret123");
        directory.register("Sara Ahmad", &creds, Role::Customer).unwrap();
        directory.set_phone("sara@example.com", "55551234").unwrap();

        let mut store = store();
        store.login(&mut directory, &creds).unwrap();

        assert_eq!(store.checkout().customer().full_name, "Sara Ahmad");
        assert_eq!(store.checkout().customer().phone, "55551234");
        assert!(store.require_admin().is_err());

        store.add_to_cart(&id("p1"), 1).unwrap();
        store.logout();
        assert!(!store.auth().is_authenticated());
        assert_eq!(store.cart().item_count(), 1);
    }

    #[test]
    fn test_wrong_password_notifies() {
        let mut directory = AccountDirectory::new(PasswordHasher::with_cost(1024, 1).unwrap());
        let creds = Credentials::new("sara@example.com", "Secret123");
        directory.register("Sara", &creds, Role::Customer).unwrap();

        let mut store = store();
        let result = store.login(&mut directory, &Credentials::new("sara@example.com", "wrong-pass"));
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(
            last_message(&store),
            ("Invalid email or password".to_string(), Severity::Error)
        );
    }

    #[test]
    fn test_incomplete_shipping_notifies_missing_fields() {
        let mut store = store();
        store
            .set_shipping(CustomerSnapshot {
                full_name: "Sara".to_string(),
                email: "sara@example.com".to_string(),
                phone: "55551234".to_string(),
                address: Address::default(),
            })
            .unwrap();

        assert!(store.continue_to_payment().is_err());
        let (message, severity) = last_message(&store);
        assert_eq!(severity, Severity::Error);
        assert!(message.starts_with("Please fill in:"));
    }

    fn to_review(store: &mut ShopStore) {
        store
            .set_shipping(CustomerSnapshot {
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
            })
            .unwrap();
        store.continue_to_payment().unwrap();
        store.select_payment(PaymentMethod::Knet).unwrap();
        store.continue_to_review().unwrap();
    }

    #[test]
    fn test_cart_locked_while_payment_pending() {
        let mut store = store();
        store.add_to_cart(&id("p1"), 1).unwrap();
        store.toggle_wishlist(&id("p3")).unwrap();
        to_review(&mut store);
        let request = store.begin_handoff().unwrap();

        assert!(matches!(
            store.add_to_cart(&id("p3"), 3),
            Err(CommerceError::HandoffInProgress(_))
        ));
        assert_eq!(last_message(&store).1, Severity::Error);
        assert!(store.update_cart_quantity(&id("p1"), 3).is_err());
        assert!(store.remove_from_cart(&id("p1")).is_err());
        assert!(store.move_wishlist_to_cart(&id("p3")).is_err());
        assert!(store.wishlist().contains(&id("p3")));
        assert_eq!(store.cart().item_count(), 1);

        let query = format!(
            "orderReference={}&status=success&transactionId=txn-1",
            request.order_reference
        );
        assert!(store.complete_gateway_query(&query).unwrap().is_created());

        let order = store.last_order().unwrap();
        let items_total: i64 = order.items.iter().map(|l| l.line_total.amount_minor).sum();
        assert_eq!(items_total, order.subtotal.amount_minor);
        assert_eq!(order.total, request.amount);

        // Unlocked again once the order is recorded.
        assert!(store.add_to_cart(&id("p3"), 1).is_ok());
    }

    #[test]
    fn test_cart_unlocked_after_cancel() {
        let mut store = store();
        store.add_to_cart(&id("p1"), 1).unwrap();
        to_review(&mut store);
        store.begin_handoff().unwrap();
        store.cancel_handoff().unwrap();

        assert_eq!(store.update_cart_quantity(&id("p1"), 2).unwrap().quantity, 2);
        assert!(matches!(store.remove_from_cart(&id("p1")), Ok(true)));
    }

    #[test]
    fn test_forged_query_is_rejected() {
        let mut store = store();
        store.add_to_cart(&id("p1"), 1).unwrap();

        let outcome = store
            .complete_gateway_query("orderReference=ord-forged&status=success&transactionId=txn-1")
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Invalid(_)));
        assert!(store.orders().is_empty());
        assert_eq!(store.cart().item_count(), 1);
    }
}
