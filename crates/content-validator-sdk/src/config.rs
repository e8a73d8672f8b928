//! SDK configuration
//!
//! Every knob the lifecycle reads lives here so nothing is hardwired into
//! the submission logic. Load from TOML, then apply environment overrides.

use crate::error::ConfigError;
use crate::identity::ChainDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "client")]
pub use validator_rpc_client::RpcConfig;

/// Environment variable overriding the contract address
pub const ENV_CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
/// Front-end build variable accepted as a fallback for the contract address
pub const ENV_CONTRACT_ADDRESS_VITE: &str = "VITE_CONTRACT_ADDRESS";
/// Environment variable overriding the RPC endpoint
pub const ENV_RPC_URL: &str = "GENLAYER_RPC_URL";

/// Contract deployed for the public studio network
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x7C09035EbBe5150cc9567D225b713aE0568373A6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Contract receiving submissions; `None` leaves the SDK misconfigured
    #[serde(default = "default_contract_address")]
    pub contract_address: Option<String>,

    #[serde(default)]
    pub limits: SubmissionLimits,

    #[serde(default)]
    pub poll: PollConfig,

    /// Result codes treated as a successful execution
    #[serde(default = "default_success_codes")]
    pub success_codes: Vec<i64>,

    /// Delay before a fresh identity is generated after disconnect
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    #[serde(default)]
    pub chain: ChainDescriptor,

    #[cfg(feature = "client")]
    #[serde(default)]
    pub rpc: RpcConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            contract_address: default_contract_address(),
            limits: SubmissionLimits::default(),
            poll: PollConfig::default(),
            success_codes: default_success_codes(),
            reconnect_delay_ms: default_reconnect_delay(),
            chain: ChainDescriptor::default(),
            #[cfg(feature = "client")]
            rpc: RpcConfig::default(),
        }
    }
}

/// Client-side submission limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionLimits {
    /// Word threshold offered to the user by default
    #[serde(default = "default_min_words")]
    pub min_words_default: usize,

    /// Maximum characters per submission
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Score at or above which content counts as passing
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            min_words_default: default_min_words(),
            max_chars: default_max_chars(),
            passing_score: default_passing_score(),
        }
    }
}

/// Finalization polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status checks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Maximum number of status checks before giving up
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::for_interactive()
    }
}

impl PollConfig {
    /// Short budget for a best-effort UI (100 checks, ~5 minutes)
    pub fn for_interactive() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: 100,
        }
    }

    /// Long budget for slow consensus plus AI execution (300 checks, ~15 minutes)
    pub fn for_slow_consensus() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: 300,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl ValidatorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values unset the field.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup(ENV_CONTRACT_ADDRESS).or_else(|| lookup(ENV_CONTRACT_ADDRESS_VITE));
        if let Some(address) = address {
            let address = address.trim().to_string();
            self.contract_address = if address.is_empty() { None } else { Some(address) };
        }

        #[cfg(feature = "client")]
        {
            if let Some(url) = lookup(ENV_RPC_URL) {
                let url = url.trim();
                if !url.is_empty() {
                    self.rpc.endpoint = url.to_string();
                }
            }
        }

        self
    }

    /// Reject values the lifecycle cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Invalid("poll.interval_ms must be greater than 0".into()));
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid("poll.max_attempts must be greater than 0".into()));
        }
        if self.success_codes.is_empty() {
            return Err(ConfigError::Invalid("success_codes must not be empty".into()));
        }
        if self.limits.max_chars == 0 {
            return Err(ConfigError::Invalid("limits.max_chars must be greater than 0".into()));
        }
        if self.limits.passing_score > 100 {
            return Err(ConfigError::Invalid(format!(
                "limits.passing_score must be at most 100, got {}",
                self.limits.passing_score
            )));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

// Defaults
fn default_contract_address() -> Option<String> { Some(DEFAULT_CONTRACT_ADDRESS.to_string()) }
fn default_min_words() -> usize { 50 }
fn default_max_chars() -> usize { 2000 }
fn default_passing_score() -> u8 { 70 }
fn default_poll_interval() -> u64 { 3000 }
fn default_poll_attempts() -> u32 { 100 }
// 0 is plain success, 6 is the backend's alternate success code
fn default_success_codes() -> Vec<i64> { vec![0, 6] }
fn default_reconnect_delay() -> u64 { 100 }
