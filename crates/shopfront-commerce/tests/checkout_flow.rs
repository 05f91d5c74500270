//! End-to-end checkout against the simulated gateway.

use std::time::Duration;

use shopfront_cache::SessionId;
use shopfront_commerce::prelude::*;

fn settings() -> AppSettings {
    AppSettings::from_toml_str(
        r#"
        currency = "KWD"
        delivery_fee = 2.0
        free_shipping_threshold = 800
        "#,
    )
    .unwrap()
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
            notes: Some("Floor 2".to_string()),
        },
    }
}

fn catalog() -> CatalogView {
    CatalogView::new(vec![
        Product::new("p1", "Galaxy S24", Money::from_major(390, Currency::KWD), 3)
            .with_brand("Samsung"),
        Product::new("p2", "Pixel 9", Money::from_major(280, Currency::KWD), 1)
            .with_brand("Google"),
    ])
}

fn ready_checkout(settings: &AppSettings) -> CheckoutCoordinator {
    let mut checkout = CheckoutCoordinator::from_settings(SessionId::generate(), settings);
    checkout.set_customer(customer()).unwrap();
    checkout.continue_to_payment().unwrap();
    checkout.select_payment(PaymentMethod::CreditCard, settings).unwrap();
    checkout.continue_to_review(settings).unwrap();
    checkout
}

#[tokio::test(start_paused = true)]
async fn test_order_placed_once_through_gateway() {
    let settings = settings();
    let catalog = catalog();
    let mut cart = CartManager::new(settings.currency);
    let mut ledger = OrderLedger::new();

    cart.add_to_cart(catalog.require(&"p1".into()).unwrap(), 2).unwrap();
    assert_eq!(cart.total_amount(), Money::from_major(780, Currency::KWD));
    assert_eq!(
        settings.remaining_for_free_shipping(&cart.total_amount()),
        Money::from_major(20, Currency::KWD)
    );

    let mut checkout = ready_checkout(&settings);
    let request = checkout.confirm(&cart, &settings).unwrap();
    assert_eq!(request.amount, Money::from_major(782, Currency::KWD));

    let gateway = SimulatedGateway::new(Duration::from_millis(1500));
    let result = gateway.process(&request).await.unwrap();

    // The host transports the result as query parameters.
    let returned = GatewayResult::from_query(&result.to_query());
    let outcome = checkout
        .reconcile(&returned, &mut cart, &mut ledger, None)
        .unwrap();

    let order = ledger.get(outcome.order_id().unwrap()).unwrap();
    assert_eq!(order.total, Money::from_major(782, Currency::KWD));
    assert_eq!(order.payment_method, PaymentMethod::CreditCard);
    assert_eq!(order.customer, customer());
    assert_eq!(order.item_count(), 2);
    assert!(cart.is_empty());

    // Re-entering the confirmation view replays the same return.
    for _ in 0..3 {
        let replay = checkout
            .reconcile(&returned, &mut cart, &mut ledger, None)
            .unwrap();
        assert_eq!(replay, ReconcileOutcome::AlreadyProcessed);
    }
    assert_eq!(ledger.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forged_return_creates_nothing() {
    let settings = settings();
    let mut cart = CartManager::new(settings.currency);
    let mut ledger = OrderLedger::new();
    cart.add_to_cart(catalog().require(&"p2".into()).unwrap(), 1).unwrap();

    let mut checkout = ready_checkout(&settings);
    let request = checkout.confirm(&cart, &settings).unwrap();

    let gateway = SimulatedGateway::new(Duration::from_millis(10))
        .with_outcome(SimulatedOutcome::WrongReference);
    let result = gateway.process(&request).await.unwrap();
    let outcome = checkout.reconcile(&result, &mut cart, &mut ledger, None).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Invalid(_)));
    assert!(ledger.is_empty());
    assert_eq!(cart.item_count(), 1);
    assert!(checkout.ticket().unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_at_gateway_keeps_cart() {
    let settings = settings();
    let mut cart = CartManager::new(settings.currency);
    let mut ledger = OrderLedger::new();
    cart.add_to_cart(catalog().require(&"p1".into()).unwrap(), 1).unwrap();

    let mut checkout = ready_checkout(&settings);
    let request = checkout.confirm(&cart, &settings).unwrap();

    let gateway = SimulatedGateway::new(Duration::from_millis(10))
        .with_outcome(SimulatedOutcome::Cancel);
    let result = gateway.process(&request).await.unwrap();
    let outcome = checkout.reconcile(&result, &mut cart, &mut ledger, None).unwrap();

    assert_eq!(outcome, ReconcileOutcome::Cancelled);
    assert_eq!(checkout.step(), CheckoutStep::Review);
    assert_eq!(cart.item_count(), 1);
    assert!(checkout.ticket().unwrap().is_none());

    // Paying on the second attempt works.
    let retry = checkout.confirm(&cart, &settings).unwrap();
    let result = SimulatedGateway::new(Duration::ZERO).process(&retry).await.unwrap();
    assert!(checkout
        .reconcile(&result, &mut cart, &mut ledger, None)
        .unwrap()
        .is_created());
    assert_eq!(ledger.len(), 1);
}
