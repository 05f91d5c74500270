//! Store settings commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use shopfront_commerce::checkout::PaymentMethod;
use shopfront_commerce::AppSettings;

use super::{SettingsArgs, SettingsCommand, Toggle};
use crate::config::{generate_default_config, CliConfig};
use crate::context::{Context, CONFIG_NAMES};

/// Run the settings command.
pub async fn run(args: SettingsArgs, ctx: &Context) -> Result<()> {
    match args.command {
        SettingsCommand::Show => show_settings(ctx),
        SettingsCommand::Init { name, force } => init_config(&name, force, ctx),
        SettingsCommand::Validate => validate_config(ctx),
        SettingsCommand::Payment { method, state } => {
            set_payment(method.into(), state == Toggle::On, ctx)
        }
    }
}

fn show_settings(ctx: &Context) -> Result<()> {
    let settings = ctx.config.settings()?;

    if ctx.output.is_json() {
        ctx.output.json(&settings.to_file());
        return Ok(());
    }

    ctx.output.header(&settings.store_name);
    match &ctx.config_path {
        Some(path) => ctx.output.kv("config", &path.display().to_string()),
        None => ctx.output.kv("config", "(defaults)"),
    }
    ctx.output.kv("currency", settings.currency.code());
    ctx.output.kv("delivery fee", &settings.delivery_fee.display());
    ctx.output.kv(
        "free shipping from",
        &settings.free_shipping_threshold.display(),
    );
    ctx.output.kv(
        "recently viewed",
        &format!("{} products", settings.recently_viewed_limit),
    );
    ctx.output.kv(
        "notifications",
        &format!("{} ms", settings.notification_duration.as_millis()),
    );
    ctx.output.kv(
        "checkout ticket",
        &format!("{} s", settings.checkout_ticket_ttl.as_secs()),
    );

    ctx.output.info("Payment methods:");
    for method in PaymentMethod::ALL {
        let state = if settings.is_payment_enabled(method) {
            "enabled"
        } else {
            "disabled"
        };
        ctx.output.kv(method.display_name(), state);
    }

    if !settings.coupons.is_empty() {
        ctx.output.info("Coupons:");
        for coupon in &settings.coupons {
            let description = coupon.description.as_deref().unwrap_or("");
            let line = format!("{} {description}", coupon.code);
            ctx.output.list_item(line.trim_end());
        }
    }

    Ok(())
}

fn init_config(name: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite.", CONFIG_NAMES[0]);
    }

    let config = generate_default_config(name);
    fs::write(&config_path, config)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created {}", config_path.display()));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        bail!("No config file found. Run 'shop settings init' to create one.");
    };

    ctx.output.info(&format!("Validating {}...", path.display()));

    let settings = ctx.config.settings()?;
    let warnings = collect_warnings(&settings);

    // The catalog must parse and price in the store currency.
    match ctx.load_catalog(None) {
        Ok(catalog) => {
            let foreign = catalog
                .products()
                .iter()
                .filter(|p| p.price.currency != settings.currency)
                .count();
            if foreign > 0 {
                bail!(
                    "{foreign} products are not priced in {}",
                    settings.currency.code()
                );
            }
            ctx.output
                .debug(&format!("Catalog has {} products", catalog.len()));
        }
        Err(e) => bail!("{e:#}"),
    }

    for warning in &warnings {
        ctx.output.warn(warning);
    }
    ctx.output.success("Configuration is valid");
    Ok(())
}

/// Things that parse but probably are not what the merchant wants.
fn collect_warnings(settings: &AppSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    if settings.enabled_payment_methods().is_empty() {
        warnings.push("No payment method is enabled; checkout cannot complete".to_string());
    }
    if settings.free_shipping_threshold.is_zero() {
        warnings.push("Free shipping applies to every order".to_string());
    }
    if settings.notification_duration.is_zero() {
        warnings.push("Notifications disappear immediately".to_string());
    }
    warnings
}

fn set_payment(method: PaymentMethod, enabled: bool, ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        bail!("No config file found. Run 'shop settings init' to create one.");
    };

    let mut config = CliConfig::load(path)?;
    match method {
        PaymentMethod::Knet => config.store.payments.knet_enabled = enabled,
        PaymentMethod::CreditCard => config.store.payments.card_enabled = enabled,
    }
    // Refuse to write settings that no longer validate.
    config.settings()?;
    config.save(path)?;

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.output
        .success(&format!("{} {state}", method.display_name()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_commerce::money::Money;

    #[test]
    fn test_warnings_for_closed_checkout() {
        let mut settings = AppSettings::default();
        settings.payments.knet_enabled = false;
        settings.payments.card_enabled = false;
        settings.free_shipping_threshold = Money::zero(settings.currency);

        let warnings = collect_warnings(&settings);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("payment"));
    }

    #[test]
    fn test_default_settings_have_no_warnings() {
        assert!(collect_warnings(&AppSettings::default()).is_empty());
    }
}
