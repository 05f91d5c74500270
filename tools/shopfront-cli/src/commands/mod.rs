//! CLI command implementations.

pub mod catalog;
pub mod settings;
pub mod simulate;

use clap::{Args, Subcommand, ValueEnum};
use shopfront_commerce::checkout::{PaymentMethod, SimulatedOutcome};

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,

    /// Catalog JSON to read instead of the configured one.
    #[arg(long, global = true)]
    pub file: Option<String>,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List products.
    List {
        /// Only products whose name, brand or category contains this.
        #[arg(short, long)]
        search: Option<String>,

        /// Only products in this category.
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product with its review summary.
    Show {
        /// Product ID.
        id: String,
    },
    /// List categories.
    Categories,
}

/// Arguments for the settings command.
#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the effective store settings.
    Show,
    /// Write a new shop.toml.
    Init {
        /// Store display name.
        #[arg(long, default_value = "Shopfront")]
        name: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
    /// Turn a payment method on or off.
    Payment {
        /// Payment method.
        #[arg(value_enum)]
        method: MethodArg,

        /// Enable or disable.
        #[arg(value_enum)]
        state: Toggle,
    },
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Items to buy, as `ID` or `ID:QTY`.
    #[arg(required = true)]
    pub items: Vec<String>,

    /// Payment method.
    #[arg(short, long, value_enum, default_value = "knet")]
    pub method: MethodArg,

    /// Coupon code to apply at review.
    #[arg(long)]
    pub coupon: Option<String>,

    /// How the simulated gateway resolves.
    #[arg(short, long, value_enum, default_value = "approve")]
    pub outcome: OutcomeArg,

    /// Gateway latency in milliseconds (default from config).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Deliver the gateway return a second time.
    #[arg(long)]
    pub replay: bool,

    /// Catalog JSON to read instead of the configured one.
    #[arg(long)]
    pub file: Option<String>,
}

/// Payment method on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    Knet,
    Card,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Knet => PaymentMethod::Knet,
            MethodArg::Card => PaymentMethod::CreditCard,
        }
    }
}

/// Simulated gateway outcome on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutcomeArg {
    Approve,
    Cancel,
    Decline,
    WrongReference,
}

impl From<OutcomeArg> for SimulatedOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Approve => SimulatedOutcome::Approve,
            OutcomeArg::Cancel => SimulatedOutcome::Cancel,
            OutcomeArg::Decline => SimulatedOutcome::Decline,
            OutcomeArg::WrongReference => SimulatedOutcome::WrongReference,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Parse an `ID` or `ID:QTY` item argument.
pub fn parse_item(item: &str) -> anyhow::Result<(String, u32)> {
    match item.split_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid quantity in '{item}'"))?;
            Ok((id.to_string(), qty))
        }
        None => Ok((item.to_string(), 1)),
    }
}
