//! Rehearse a full checkout against the simulated gateway.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use shopfront_commerce::checkout::{
    Address, CustomerSnapshot, Order, PaymentGateway, PaymentMethod, ReconcileOutcome,
    SimulatedGateway,
};
use shopfront_commerce::summary::TemplateSummarizer;
use shopfront_commerce::ProductId;
use shopfront_sdk::ShopStore;

use super::{parse_item, SimulateArgs};
use crate::context::Context;
use crate::output::format_timestamp;

const STEPS: usize = 6;

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let settings = Arc::new(ctx.config.settings()?);
    let catalog = ctx.load_catalog(args.file.as_deref())?;
    let mut store = ShopStore::new(settings, catalog);
    tracing::info!(session_id = %store.session_id(), "simulation started");

    let items = args
        .items
        .iter()
        .map(|item| parse_item(item))
        .collect::<Result<Vec<_>>>()?;

    // Step 1: Browse
    ctx.output.step(1, STEPS, "Browsing products...");
    for (id, _) in &items {
        let id = ProductId::new(id.as_str());
        if let Err(e) = store.view_product(&id) {
            ctx.output.warn(&e.to_string());
            continue;
        }
        if !store.wishlist().contains(&id) {
            store.toggle_wishlist(&id)?;
        }
        if store.add_to_compare(&id).is_err() {
            ctx.output.notification(store.notifications().current());
        }
    }
    let timeout = Duration::from_millis(ctx.config.simulate.summary_timeout_ms);
    store
        .load_compare_summaries(&TemplateSummarizer, Some(timeout))
        .await;
    for product in store.compared_products() {
        match store.summary(&product.id).text() {
            Some(text) => ctx.output.kv(&product.name, text),
            None => ctx.output.kv(&product.name, "(no summary)"),
        }
    }

    // Step 2: Cart
    ctx.output.step(2, STEPS, "Moving items to cart...");
    for (id, quantity) in &items {
        let id = ProductId::new(id.as_str());
        let saved = store.wishlist().contains(&id);
        let mut added = if saved {
            store.move_wishlist_to_cart(&id)
        } else {
            store.add_to_cart(&id, *quantity)
        };
        if saved && *quantity > 1 && added.is_ok() {
            added = store.add_to_cart(&id, quantity - 1);
        }
        if let Err(e) = added {
            ctx.output.debug(&format!("{id}: {e}"));
        }
        ctx.output.notification(store.notifications().current());
    }
    if store.cart().is_empty() {
        bail!("Nothing could be added to the cart");
    }

    // Step 3: Shipping
    ctx.output.step(3, STEPS, "Entering shipping details...");
    store.set_shipping(demo_customer())?;
    store.continue_to_payment()?;

    // Step 4: Payment and review
    let method: PaymentMethod = args.method.into();
    ctx.output.step(
        4,
        STEPS,
        &format!("Paying with {}...", method.display_name()),
    );
    if let Err(e) = store.select_payment(method) {
        ctx.output.notification(store.notifications().current());
        return Err(e.into());
    }
    store.continue_to_review()?;
    if let Some(code) = &args.coupon {
        // An unknown code is reported but does not stop checkout.
        let _ = store.apply_coupon(code);
        ctx.output.notification(store.notifications().current());
    }
    print_pricing(&store, ctx);

    // Step 5: Gateway
    ctx.output.step(5, STEPS, "Handing off to payment gateway...");
    let delay = Duration::from_millis(
        args.delay_ms
            .unwrap_or(ctx.config.simulate.gateway_delay_ms),
    );
    let gateway = SimulatedGateway::new(delay).with_outcome(args.outcome.into());

    let request = store.begin_handoff()?;
    ctx.output
        .debug(&format!("Order reference: {}", request.order_reference));
    let spinner = ctx.output.spinner("Waiting for gateway...");
    let result = gateway.process(&request).await;
    spinner.finish_and_clear();
    let query = result?.to_query();
    ctx.output.debug(&format!("Return query: ?{query}"));

    // Step 6: Reconcile
    ctx.output.step(6, STEPS, "Reconciling gateway return...");
    let outcome = store.complete_gateway_query(&query)?;
    report_outcome(&outcome, ctx);
    ctx.output.notification(store.notifications().current());

    if args.replay {
        let replay = store.complete_gateway_query(&query)?;
        ctx.output.info("Return delivered again:");
        report_outcome(&replay, ctx);
        ctx.output
            .kv("orders in ledger", &store.orders().len().to_string());
    }

    match store.last_order() {
        Some(order) => print_order(order, ctx),
        None if ctx.output.is_json() => ctx.output.json(&serde_json::json!({
            "outcome": outcome_label(&outcome),
        })),
        None => {}
    }

    Ok(())
}

fn demo_customer() -> CustomerSnapshot {
    CustomerSnapshot {
        full_name: "Demo Shopper".to_string(),
        email: "demo@shopfront.test".to_string(),
        phone: "+965 5555 1234".to_string(),
        address: Address {
            area: "Salmiya".to_string(),
            block: "10".to_string(),
            street: "Salem Al Mubarak St".to_string(),
            building: "7".to_string(),
            notes: None,
        },
    }
}

fn print_pricing(store: &ShopStore, ctx: &Context) {
    let pricing = store.pricing();
    ctx.output.kv("subtotal", &pricing.subtotal.display());
    if pricing.has_discount() {
        ctx.output
            .kv("discount", &format!("-{}", pricing.discount.display()));
    }
    if pricing.has_free_delivery() {
        ctx.output.kv("delivery", "free");
    } else {
        ctx.output.kv("delivery", &pricing.delivery_fee.display());
        ctx.output.kv(
            "free delivery in",
            &pricing.remaining_for_free_shipping.display(),
        );
    }
    ctx.output.kv("total", &pricing.total.display());
}

fn outcome_label(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Created(order_id) => format!("created {order_id}"),
        ReconcileOutcome::AlreadyProcessed => "already processed".to_string(),
        ReconcileOutcome::Stale => "stale".to_string(),
        ReconcileOutcome::Cancelled => "cancelled".to_string(),
        ReconcileOutcome::Invalid(reason) => format!("rejected: {reason}"),
    }
}

fn report_outcome(outcome: &ReconcileOutcome, ctx: &Context) {
    let label = outcome_label(outcome);
    match outcome {
        ReconcileOutcome::Created(_) => ctx.output.success(&label),
        ReconcileOutcome::AlreadyProcessed | ReconcileOutcome::Stale => ctx.output.info(&label),
        ReconcileOutcome::Cancelled | ReconcileOutcome::Invalid(_) => ctx.output.warn(&label),
    }
}

fn print_order(order: &Order, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(order);
        return;
    }

    ctx.output.header(&format!("Order {}", order.id));
    ctx.output.kv("reference", order.reference.as_str());
    if let Some(txn) = &order.transaction_id {
        ctx.output.kv("transaction", txn.as_str());
    }
    ctx.output.kv("placed", &format_timestamp(order.created_at));
    ctx.output.kv("status", order.status.display_name());
    ctx.output.kv("payment", order.payment_method.display_name());
    ctx.output.kv("ship to", &order.customer.address.one_line());
    for line in &order.items {
        ctx.output.list_item(&format!(
            "{} x{} {}",
            line.name,
            line.quantity,
            line.line_total.display()
        ));
    }
    if let Some(code) = &order.coupon_code {
        ctx.output.kv("coupon", code);
    }
    ctx.output.kv("total", &order.total.display());
}
