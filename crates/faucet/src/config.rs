//! Faucet configuration

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Development-only funding key. Override with `FAUCET_PRIVATE_KEY` or a
/// config file before pointing the service at a real network.
const DEV_PRIVATE_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

/// Faucet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Server address
    pub server_addr: String,

    /// RPC endpoint of the ledger node
    pub rpc_url: String,

    /// Per-request RPC timeout (seconds)
    pub rpc_timeout_secs: u64,

    /// Faucet account private key (hex)
    pub private_key: String,

    /// Asset units dispensed per grant
    pub grant_amount: u64,

    /// Cooldown between grants for one claimant (milliseconds)
    pub cooldown_ms: i64,

    /// Display symbol of the dispensed asset
    pub token_symbol: String,

    /// Transaction protocol version
    pub tx_version: u16,

    /// Gas price for dispensed transfers
    pub gas_price: u64,

    /// Gas limit for dispensed transfers
    pub gas_limit: u64,

    /// Eligibility ledger path
    pub db_path: String,

    /// Upper bound on claims processed at once
    pub max_concurrent_claims: usize,

    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            rpc_url: "http://localhost:10332".to_string(),
            rpc_timeout_secs: 10,
            private_key: DEV_PRIVATE_KEY.to_string(),
            grant_amount: 1000,
            cooldown_ms: 604_800_000, // 7 days
            token_symbol: "CPX".to_string(),
            tx_version: 1,
            gas_price: 3,
            gas_limit: 300_000,
            db_path: "./faucet_data".to_string(),
            max_concurrent_claims: 32,
            cors_enabled: true,
        }
    }
}

impl FaucetConfig {
    /// Load configuration, layered: defaults, then an optional file, then
    /// `FAUCET_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("FAUCET").try_parsing(true))
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get RPC timeout duration
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Get cooldown duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_cover_every_field() {
        let config = FaucetConfig::default();
        assert_eq!(config.grant_amount, 1000);
        assert_eq!(config.cooldown_ms, 604_800_000);
        assert_eq!(config.token_symbol, "CPX");
        assert_eq!(config.rpc_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_values_override_defaults() {
        let toml = r#"
            grant_amount = 50
            token_symbol = "TST"
            cooldown_ms = 1000
        "#;

        let config: FaucetConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.grant_amount, 50);
        assert_eq!(config.token_symbol, "TST");
        assert_eq!(config.cooldown(), Duration::from_secs(1));
        // Untouched keys keep their defaults.
        assert_eq!(config.server_addr, "0.0.0.0:3000");
    }
}
