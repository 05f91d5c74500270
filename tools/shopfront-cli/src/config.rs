//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shopfront_commerce::settings::SettingsFile;
use shopfront_commerce::AppSettings;

/// CLI configuration file (`shop.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where the catalog lives.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Store settings, validated into [`AppSettings`] on use.
    #[serde(default)]
    pub store: SettingsFile,

    /// Simulation knobs.
    #[serde(default)]
    pub simulate: SimulateConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validated store settings.
    pub fn settings(&self) -> Result<AppSettings> {
        self.store
            .clone()
            .validate()
            .context("Invalid [store] settings")
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Catalog source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the catalog JSON, relative to the config file.
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// Defaults for `shop simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateConfig {
    /// Simulated gateway latency in milliseconds.
    #[serde(default = "default_gateway_delay_ms")]
    pub gateway_delay_ms: u64,

    /// Review summary timeout in milliseconds.
    #[serde(default = "default_summary_timeout_ms")]
    pub summary_timeout_ms: u64,
}

fn default_gateway_delay_ms() -> u64 {
    1500
}

fn default_summary_timeout_ms() -> u64 {
    2000
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            gateway_delay_ms: default_gateway_delay_ms(),
            summary_timeout_ms: default_summary_timeout_ms(),
        }
    }
}

/// Generate a default shop.toml config file.
pub fn generate_default_config(store_name: &str) -> String {
    format!(
        r#"# Shopfront configuration

[catalog]
path = "catalog.json"

[store]
store_name = "{store_name}"
currency = "KWD"
delivery_fee = 2.0
free_shipping_threshold = 800
recently_viewed_limit = 8
notification_ms = 3000
checkout_ticket_ttl_secs = 1800

[store.payments]
knet_enabled = true
card_enabled = true

[[store.coupons]]
code = "WELCOME10"
description = "10% off your first order"
value = {{ kind = "percentage", value = 10.0 }}

[simulate]
gateway_delay_ms = 1500
summary_timeout_ms = 2000
"#
    )
}
