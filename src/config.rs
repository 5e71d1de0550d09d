//! Runtime configuration from environment variables
//!
//! Every value has a fallback except the wallet endpoint, whose absence
//! means "no wallet installed".

use std::str::FromStr;
use std::time::Duration;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;

use crate::constants::{DEFAULT_NOTES_ABI, DEFAULT_SEPOLIA_RPC_URL, DEFAULT_WALLET_POLL_INTERVAL};

pub const ENV_WALLET_URL: &str = "WALLET_PROVIDER_URL";
pub const ENV_RPC_URL: &str = "SEPOLIA_RPC_URL";
pub const ENV_NOTES_ADDRESS: &str = "NOTES_CONTRACT_ADDRESS";
pub const ENV_NOTES_ABI: &str = "NOTES_CONTRACT_ABI";
pub const ENV_POLL_INTERVAL_MS: &str = "WALLET_POLL_INTERVAL_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NOTES_CONTRACT_ADDRESS is not a valid address: {0}")]
    InvalidAddress(String),
    #[error("NOTES_CONTRACT_ABI is not a valid ABI: {0}")]
    InvalidAbi(#[source] serde_json::Error),
    #[error("WALLET_POLL_INTERVAL_MS must be a positive integer, got {0:?}")]
    InvalidPollInterval(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Wallet JSON-RPC endpoint; `None` when no wallet is available
    pub wallet_url: Option<String>,
    /// Read-only RPC endpoint used for balances
    pub rpc_url: String,
    pub notes_address: Option<Address>,
    pub notes_abi: JsonAbi,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let notes_address = get(ENV_NOTES_ADDRESS)
            .map(|raw| Address::from_str(&raw).map_err(|_| ConfigError::InvalidAddress(raw)))
            .transpose()?;

        let notes_abi = match get(ENV_NOTES_ABI) {
            Some(raw) => serde_json::from_str(&raw).map_err(ConfigError::InvalidAbi)?,
            None => serde_json::from_str(DEFAULT_NOTES_ABI).map_err(ConfigError::InvalidAbi)?,
        };

        let poll_interval = match get(ENV_POLL_INTERVAL_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidPollInterval(raw)),
            },
            None => DEFAULT_WALLET_POLL_INTERVAL,
        };

        Ok(Config {
            wallet_url: get(ENV_WALLET_URL),
            rpc_url: get(ENV_RPC_URL).unwrap_or_else(|| DEFAULT_SEPOLIA_RPC_URL.to_string()),
            notes_address,
            notes_abi,
            poll_interval,
        })
    }
}
