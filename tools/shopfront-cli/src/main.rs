//! Shop CLI - Command line tool for a Shopfront store.
//!
//! Commands:
//! - `shop catalog` - Browse the product catalog
//! - `shop settings` - Inspect and edit store settings
//! - `shop simulate` - Rehearse a checkout against the simulated gateway

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CatalogArgs, SettingsArgs, SimulateArgs};

/// Shop CLI - Inspect a Shopfront store and rehearse checkout
#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog(CatalogArgs),

    /// Inspect and edit store settings
    Settings(SettingsArgs),

    /// Rehearse a checkout end to end
    Simulate(SimulateArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "shop=debug,shopfront_sdk=debug,shopfront_commerce=debug,shopfront_auth=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Catalog(args) => commands::catalog::run(args, &ctx).await,
        Commands::Settings(args) => commands::settings::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}
