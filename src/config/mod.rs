use anyhow::{anyhow, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Process environment configuration. Everything the client needs to reach the
/// chain and the three deployed contracts.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Env {
    // Network configuration
    #[validate(custom = "validate_rpc_url")]
    pub https_url: String,
    #[validate(custom = "validate_chain_id")]
    pub chain_id: u64,

    // Wallet configuration
    #[validate(custom = "validate_private_key")]
    pub private_key: String,

    // Contract addresses
    #[validate(custom = "validate_address")]
    pub grn_token: Address,
    #[validate(custom = "validate_address")]
    pub rwd_token: Address,
    #[validate(custom = "validate_address")]
    pub exchange: Address,
}

impl Env {
    pub fn new() -> Result<Self> {
        Ok(Self {
            https_url: require_var("HTTPS_URL")?,
            chain_id: require_var("CHAIN_ID")?.parse()?,
            private_key: require_var("PRIVATE_KEY")?,
            grn_token: require_address("GRN_TOKEN_ADDRESS")?,
            rwd_token: require_address("RWD_TOKEN_ADDRESS")?,
            exchange: require_address("GREEN_LOOP_ADDRESS")?,
        })
    }

    pub fn validate_all(&self) -> Result<()> {
        // Run validator derive validations
        if let Err(e) = self.validate() {
            return Err(anyhow!("Configuration validation failed: {:?}", e));
        }

        if self.grn_token == self.rwd_token {
            return Err(anyhow!("GRN and RWD token addresses must differ"));
        }
        if self.exchange == self.grn_token || self.exchange == self.rwd_token {
            return Err(anyhow!("Exchange address collides with a token address"));
        }

        Ok(())
    }
}

fn require_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("{} is not set", key))
}

fn require_address(key: &str) -> Result<Address> {
    let raw = require_var(key)?;
    parse_address(key, &raw)
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).map_err(|e| anyhow!("{} is not a valid address: {}", key, e))
}

// Custom validators
fn validate_rpc_url(url: &str) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::new("invalid_rpc_url"));
    }
    Ok(())
}

fn validate_chain_id(chain_id: u64) -> Result<(), ValidationError> {
    match chain_id {
        // Mainnets
        1 => Ok(()),        // Ethereum
        10 => Ok(()),       // Optimism
        137 => Ok(()),      // Polygon
        42161 => Ok(()),    // Arbitrum
        8453 => Ok(()),     // Base

        // Testnets and local nodes
        11155111 => Ok(()), // Sepolia
        80001 => Ok(()),    // Mumbai
        84531 => Ok(()),    // Base Goerli
        31337 => Ok(()),    // Anvil / Hardhat

        _ => Err(ValidationError::new("unsupported_chain")),
    }
}

fn validate_private_key(key: &str) -> Result<(), ValidationError> {
    let hex_part = key.strip_prefix("0x").unwrap_or(key);
    if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("invalid_private_key"));
    }
    Ok(())
}

fn validate_address(address: &Address) -> Result<(), ValidationError> {
    if address == &Address::zero() {
        return Err(ValidationError::new("zero_address"));
    }
    Ok(())
}
