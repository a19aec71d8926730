//! Wallet configuration

use crate::core::constants::{
    AIRDROP_LAMPORTS, CEREMONY_TIMEOUT_MS, DEFAULT_RPC_URL, FUNDING_TIMEOUT_MS,
    RELYING_PARTY_NAME, SESSION_SECRET_KEY, SIMULATED_DELAY_MS, TOP_UP_THRESHOLD_LAMPORTS,
};
use crate::error::{Result, WalletError};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// RPC endpoint override
pub const RPC_URL_ENV: &str = "LAZORKIT_RPC_URL";
/// Storage key override for the session secret
pub const STORAGE_KEY_ENV: &str = "LAZORKIT_STORAGE_KEY";
/// Fallback delay override (milliseconds)
pub const SIMULATED_DELAY_ENV: &str = "LAZORKIT_SIMULATED_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Solana JSON-RPC endpoint
    pub rpc_url: String,
    /// Commitment level used by the RPC adapter ("processed", "confirmed", "finalized")
    pub commitment: String,
    /// Key under which the session keypair is persisted
    pub storage_key: String,
    /// Relying party name shown in the passkey prompt
    pub relying_party: String,
    /// Timeout hint handed to the platform authenticator
    pub ceremony_timeout_ms: u64,
    /// Request a faucet airdrop on connect when the balance is below this
    pub top_up_threshold_lamports: u64,
    /// Amount requested from the faucet
    pub airdrop_lamports: u64,
    /// Upper bound on the connect-time funding attempt
    pub funding_timeout_ms: u64,
    /// Delay before a simulated signature is returned
    pub simulated_delay_ms: u64,
    /// Paymaster endpoint, informational only
    pub paymaster_url: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: "confirmed".to_string(),
            storage_key: SESSION_SECRET_KEY.to_string(),
            relying_party: RELYING_PARTY_NAME.to_string(),
            ceremony_timeout_ms: CEREMONY_TIMEOUT_MS,
            top_up_threshold_lamports: TOP_UP_THRESHOLD_LAMPORTS,
            airdrop_lamports: AIRDROP_LAMPORTS,
            funding_timeout_ms: FUNDING_TIMEOUT_MS,
            simulated_delay_ms: SIMULATED_DELAY_MS,
            paymaster_url: None,
        }
    }
}

impl WalletConfig {
    /// Defaults overlaid with `LAZORKIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Read a JSON config file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config: Self = serde_json::from_str(&contents)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            self.rpc_url = url;
        }
        if let Ok(key) = std::env::var(STORAGE_KEY_ENV) {
            self.storage_key = key;
        }
        if let Ok(delay) = std::env::var(SIMULATED_DELAY_ENV) {
            self.simulated_delay_ms = delay.parse().map_err(|_| {
                WalletError::Config(format!(
                    "{} must be milliseconds, got {:?}",
                    SIMULATED_DELAY_ENV, delay
                ))
            })?;
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| WalletError::Config(format!("Unknown commitment: {}", self.commitment)))
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    pub fn funding_timeout(&self) -> Duration {
        Duration::from_millis(self.funding_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let value = serde_json::json!({
            "rpc_url": "http://127.0.0.1:8899",
            "simulated_delay_ms": 0
        });
        let parsed: WalletConfig = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(parsed.simulated_delay(), Duration::ZERO);
        assert_eq!(parsed.storage_key, "lazor_secret");
        assert_eq!(parsed.top_up_threshold_lamports, 50_000_000);
    }

    #[test]
    fn test_commitment_parsing() {
        let mut config = WalletConfig::default();
        assert_eq!(
            config.commitment_config().unwrap(),
            CommitmentConfig::confirmed()
        );

        config.commitment = "eventually".to_string();
        assert!(matches!(
            config.commitment_config(),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = WalletConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
