//! Dapp configuration - passed in from the page or the CLI

use alloy_primitives::Address;
use std::str::FromStr;
use std::time::Duration;

use crate::core::contract::DEFAULT_POLL_INTERVAL;
use crate::core::network::Network;
use crate::error::{DappError, DappResult};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

pub mod env {
    pub const CONTRACT_ADDRESS: &str = "WHITELIST_CONTRACT_ADDRESS";
    pub const CHAIN_ID: &str = "WHITELIST_CHAIN_ID";
    pub const RPC_URL: &str = "WHITELIST_RPC_URL";
    pub const POLL_MS: &str = "WHITELIST_POLL_MS";
    pub const LOG_JSON: &str = "WHITELIST_LOG_JSON";
}

/// Where the contract lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DappConfig {
    pub contract_address: Address,
    /// The only network the page accepts.
    pub target_network: Network,
    /// Used by native providers only; the browser wallet brings its own.
    pub rpc_url: String,
    pub poll_interval: Duration,
}

impl DappConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            target_network: Network::default(),
            rpc_url: DEFAULT_RPC_URL.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_network(mut self, network: Network) -> Self { self.target_network = network; self }
    pub fn with_chain_id(mut self, chain_id: u64) -> Self { self.target_network = Network::from_chain_id(chain_id); self }
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self { self.rpc_url = url.into(); self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }

    pub fn target_chain_id(&self) -> u64 {
        self.target_network.chain_id()
    }

    /// Reads `WHITELIST_*` variables. Only the contract address is required.
    pub fn from_env() -> DappResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DappResult<Self> {
        let address = lookup(env::CONTRACT_ADDRESS)
            .ok_or_else(|| DappError::Config(format!("{} is not set", env::CONTRACT_ADDRESS)))?;
        let mut config = Self::new(parse_address(&address)?);
        if let Some(chain) = lookup(env::CHAIN_ID) {
            config.target_network = chain.parse::<Network>().map_err(|e| match e {
                DappError::Config(msg) => DappError::Config(format!("{}: {}", env::CHAIN_ID, msg)),
                other => other,
            })?;
        }
        if let Some(url) = lookup(env::RPC_URL) {
            config.rpc_url = url;
        }
        if let Some(ms) = lookup(env::POLL_MS) {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|e| DappError::Config(format!("{}: {}", env::POLL_MS, e)))?;
            config.poll_interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

pub fn parse_address(value: &str) -> DappResult<Address> {
    Address::from_str(value.trim()).map_err(|e| DappError::Config(format!("address '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ADDR: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_rinkeby() {
        let config = DappConfig::from_lookup(lookup(&[(env::CONTRACT_ADDRESS, ADDR)])).unwrap();
        assert_eq!(config.target_chain_id(), 4);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn overrides_apply() {
        let config = DappConfig::from_lookup(lookup(&[
            (env::CONTRACT_ADDRESS, ADDR),
            (env::CHAIN_ID, "31337"),
            (env::RPC_URL, "http://node:8545"),
            (env::POLL_MS, "50"),
        ]))
        .unwrap();
        assert_eq!(config.target_network, Network::Hardhat);
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn missing_or_bad_values_are_config_errors() {
        assert!(matches!(DappConfig::from_lookup(lookup(&[])), Err(DappError::Config(_))));
        assert!(matches!(
            DappConfig::from_lookup(lookup(&[(env::CONTRACT_ADDRESS, "0x1234")])),
            Err(DappError::Config(_))
        ));
        assert!(matches!(
            DappConfig::from_lookup(lookup(&[(env::CONTRACT_ADDRESS, ADDR), (env::POLL_MS, "soon")])),
            Err(DappError::Config(_))
        ));
    }
}
