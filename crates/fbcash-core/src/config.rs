//! Configuration types for the FBCash client

use std::collections::HashMap;
use std::path::Path;

use alloy_primitives::{address, b256, Address, B256};
use serde::{Deserialize, Serialize};

use crate::{Error, PoolDescriptor, MAX_DECIMALS};

/// RPC node connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// JSON-RPC URL (e.g., "http://127.0.0.1:8545")
    pub url: String,

    /// Chain the deployments live on
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Per-call timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_chain_id() -> u64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            chain_id: default_chain_id(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// One entry of the deployment descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub address: Address,

    /// Raw ABI as shipped with the deployment; kept for inspection only
    #[serde(default)]
    pub abi: serde_json::Value,
}

/// External token entry, serialized as `[address, decimals]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalToken(pub Address, pub u8);

impl ExternalToken {
    pub fn address(&self) -> Address {
        self.0
    }

    pub fn decimals(&self) -> u8 {
        self.1
    }
}

/// A row of the bank (staking pool) table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDefinition {
    pub name: String,
    pub contract: String,
    pub deposit_token_name: String,
    pub earn_token_name: String,
    pub sort: u32,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub accelerator: bool,
    #[serde(default)]
    pub accelerator_token_name: Option<String>,
}

/// Liquidity-pair address derivation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniswapConfig {
    pub factory: Address,
    pub init_code_hash: B256,
}

impl Default for UniswapConfig {
    fn default() -> Self {
        Self {
            factory: address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"),
            init_code_hash: b256!(
                "96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f"
            ),
        }
    }
}

/// Gas limit padding as an exact ratio with four decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMultiplier {
    per_ten_thousand: u64,
}

impl GasMultiplier {
    const SCALE: u64 = 10_000;

    pub const ONE: Self = Self {
        per_ten_thousand: Self::SCALE,
    };

    /// Convert a configured multiplier; values below 1.0 would under-fund
    /// every transaction and are rejected.
    pub fn from_f64(multiplier: f64) -> Result<Self, Error> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config(format!(
                "gas limit multiplier must be >= 1.0, got {}",
                multiplier
            )));
        }
        Ok(Self {
            per_ten_thousand: (multiplier * Self::SCALE as f64).round() as u64,
        })
    }

    /// `ceil(gas * multiplier)`
    pub fn apply(&self, gas: u64) -> u64 {
        let scaled = gas as u128 * self.per_ten_thousand as u128;
        let padded = scaled.div_ceil(Self::SCALE as u128);
        u64::try_from(padded).unwrap_or(u64::MAX)
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Node connection settings
    pub node: NodeConfig,

    /// Safety factor applied to every gas estimate
    #[serde(default = "default_gas_limit_multiplier")]
    pub gas_limit_multiplier: f64,

    /// How often a UI is expected to poll, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Contract name -> deployment
    #[serde(default)]
    pub deployments: HashMap<String, Deployment>,

    /// Symbol -> (address, decimals)
    #[serde(default)]
    pub external_tokens: HashMap<String, ExternalToken>,

    /// Staking pool table
    #[serde(default)]
    pub banks: Vec<BankDefinition>,

    #[serde(default)]
    pub uniswap: UniswapConfig,

    /// Symbol of the stable asset spot prices are quoted in
    #[serde(default = "default_reference_token")]
    pub reference_token: String,
}

fn default_gas_limit_multiplier() -> f64 {
    1.7
}

fn default_refresh_interval_ms() -> u64 {
    30_000
}

fn default_reference_token() -> String {
    "USDT".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            gas_limit_multiplier: default_gas_limit_multiplier(),
            refresh_interval_ms: default_refresh_interval_ms(),
            deployments: HashMap::new(),
            external_tokens: HashMap::new(),
            banks: Vec::new(),
            uniswap: UniswapConfig::default(),
            reference_token: default_reference_token(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn gas_multiplier(&self) -> Result<GasMultiplier, Error> {
        GasMultiplier::from_f64(self.gas_limit_multiplier)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.node.request_timeout_secs)
    }

    /// Delay between two status refreshes in watch mode
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_interval_ms)
    }

    /// Bank table as validated pool descriptors
    pub fn pools(&self) -> Result<Vec<PoolDescriptor>, Error> {
        self.banks.iter().map(PoolDescriptor::from_definition).collect()
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.gas_multiplier()?;

        if self.node.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".into()));
        }

        if self.refresh_interval_ms == 0 {
            return Err(Error::Config("refresh interval must be positive".into()));
        }

        for (symbol, token) in &self.external_tokens {
            if token.decimals() > MAX_DECIMALS {
                return Err(Error::Config(format!(
                    "token {} declares {} decimals, at most {} are supported",
                    symbol,
                    token.decimals(),
                    MAX_DECIMALS
                )));
            }
        }

        for pool in self.pools()? {
            if !self.deployments.contains_key(&pool.contract) {
                return Err(Error::Config(format!(
                    "bank {} refers to undeployed contract {}",
                    pool.name, pool.contract
                )));
            }
        }

        Ok(())
    }
}
