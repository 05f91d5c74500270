//! Catalog inspection commands.

use std::time::Duration;

use anyhow::Result;
use shopfront_commerce::catalog::{CatalogView, Product};
use shopfront_commerce::summary::{generate_summary, TemplateSummarizer};
use shopfront_commerce::ProductId;

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::stock_badge;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.load_catalog(args.file.as_deref())?;

    match args.command {
        CatalogCommand::List { search, category } => {
            list_products(&catalog, search.as_deref(), category.as_deref(), ctx)
        }
        CatalogCommand::Show { id } => show_product(&catalog, &id, ctx).await,
        CatalogCommand::Categories => list_categories(&catalog, ctx),
    }
}

fn list_products(
    catalog: &CatalogView,
    search: Option<&str>,
    category: Option<&str>,
    ctx: &Context,
) -> Result<()> {
    let mut products: Vec<&Product> = match search {
        Some(term) => catalog.search(term),
        None => catalog.products().iter().collect(),
    };
    if let Some(category) = category {
        products.retain(|p| p.category.eq_ignore_ascii_case(category));
    }

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("Products ({})", products.len()));
    let widths = [10, 28, 12, 16];
    ctx.output
        .table_row(&["ID", "NAME", "BRAND", "PRICE"], &widths);
    for product in &products {
        let price = product.price.display();
        ctx.output.table_row(
            &[product.id.as_str(), &product.name, &product.brand, &price],
            &widths,
        );
    }

    if products.is_empty() {
        ctx.output.info("No products match");
    }
    Ok(())
}

async fn show_product(catalog: &CatalogView, id: &str, ctx: &Context) -> Result<()> {
    let product = catalog.require(&ProductId::new(id))?;
    let timeout = Duration::from_millis(ctx.config.simulate.summary_timeout_ms);
    let summary = generate_summary(&TemplateSummarizer, product, Some(timeout)).await;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "product": product,
            "summary": summary,
        }));
        return Ok(());
    }

    ctx.output.header(&product.name);
    ctx.output.kv("id", product.id.as_str());
    ctx.output.kv("brand", &product.brand);
    ctx.output.kv("category", &product.category);
    ctx.output.kv("price", &product.price.display());
    if let (Some(original), Some(percent)) = (product.original_price, product.discount_percent()) {
        ctx.output
            .kv("was", &format!("{} (-{percent}%)", original.display()));
    }
    if let Some(installment) = product.installment_price {
        ctx.output
            .kv("installments", &format!("{} / month", installment.display()));
    }
    ctx.output.kv("stock", &stock_badge(product.stock));
    ctx.output.kv(
        "rating",
        &format!("{:.1} ({} reviews)", product.rating, product.review_count),
    );
    if product.express_delivery {
        ctx.output.kv("delivery", "express");
    }

    if !product.specifications.is_empty() {
        ctx.output.info("Specifications:");
        for (name, value) in &product.specifications {
            ctx.output.kv(name, value);
        }
    }

    if summary.is_empty() {
        ctx.output.debug("No review summary available");
    } else {
        ctx.output.info(&summary);
    }
    Ok(())
}

fn list_categories(catalog: &CatalogView, ctx: &Context) -> Result<()> {
    let categories = catalog.categories();

    if ctx.output.is_json() {
        ctx.output.json(&categories);
        return Ok(());
    }

    ctx.output.header("Categories");
    for category in categories {
        let count = catalog.by_category(category).len();
        ctx.output.list_item(&format!("{category} ({count})"));
    }
    Ok(())
}
