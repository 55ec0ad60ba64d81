/* This file is part of Sovereign Seas
 *
 * Copyright (C) 2024-2026 Sovereign Seas developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{fmt, fs, path::PathBuf, str::FromStr};

use ethers::types::Address;
use log::{debug, error};
use serde::Deserialize;
use url::Url;

use crate::{
    swap::{KnownToken, SlippageBps, TokenRegistry},
    Error, Result,
};

fn default_native_symbol() -> String {
    String::from("CELO")
}

fn default_slippage_bps() -> u32 {
    100
}

/// Client configuration, one section per supported network
#[derive(Clone, Debug, Deserialize)]
pub struct SeasConfig {
    /// Network used when none is given on the command line
    pub network: String,
    /// Supported network configurations
    pub network_config: NetworkConfigs,
    /// Path to the configuration if read from a file
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl SeasConfig {
    /// Load and parse the configuration file at `path`.
    pub fn new(path: &PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read the configuration file {path:?}: {e}"))
        })?;

        let mut config = toml::from_str::<Self>(&contents).map_err(|e| {
            error!(target: "config", "Failed parsing TOML config: {e}");
            Error::ConfigError(format!("Failed to parse the configuration file {path:?}"))
        })?;

        config.path = Some(path.clone());
        debug!(target: "config", "Loaded configuration: {config:?}");
        Ok(config)
    }

    pub fn active_network_config(&self) -> Option<NetworkConfig> {
        self.get_network_config(&self.network)
    }

    pub fn get_network_config(&self, network: &str) -> Option<NetworkConfig> {
        match network {
            "celo" => self.network_config.celo.clone(),
            "alfajores" => self.network_config.alfajores.clone(),
            "localnet" => self.network_config.localnet.clone(),
            _ => None,
        }
    }
}

impl FromStr for SeasConfig {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Per-network sections of [`SeasConfig`]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NetworkConfigs {
    /// Celo mainnet
    pub celo: Option<NetworkConfig>,
    /// Celo Alfajores testnet
    pub alfajores: Option<NetworkConfig>,
    /// Local development chain
    pub localnet: Option<NetworkConfig>,
}

/// Contracts and tokens of one network
#[derive(Clone, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of a chain node
    pub endpoint: Url,
    /// Expected chain id, checked against the endpoint
    pub chain_id: u64,
    pub voting_contract: Address,
    /// Token swapper, absent on networks without one
    pub swapper_contract: Option<Address>,
    /// Address standing for the native currency in token selections
    pub native_token: Address,
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,
    /// Hex private key of the signing account
    pub private_key: Option<String>,
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u32,
    /// Well-known tokens used when contract metadata is unusable
    #[serde(default)]
    pub known_tokens: Vec<KnownToken>,
}

impl NetworkConfig {
    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(self.native_token, &self.native_symbol, self.known_tokens.clone())
    }

    pub fn default_slippage(&self) -> Result<SlippageBps> {
        SlippageBps::new(self.default_slippage_bps)
    }
}

/// Load the configuration at `path` and pick the section for `network`.
impl TryFrom<(&PathBuf, &String)> for NetworkConfig {
    type Error = Error;
    fn try_from(path_and_network: (&PathBuf, &String)) -> Result<Self> {
        let config = SeasConfig::new(path_and_network.0)?;
        match config.get_network_config(path_and_network.1) {
            Some(config) => Ok(config),
            None => Err(Error::ConfigError(format!(
                "Failed to retrieve network configuration for network: {}",
                path_and_network.1
            ))),
        }
    }
}

/// Keeps the private key out of logs
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("chain_id", &self.chain_id)
            .field("voting_contract", &self.voting_contract)
            .field("swapper_contract", &self.swapper_contract)
            .field("native_token", &self.native_token)
            .field("native_symbol", &self.native_symbol)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("default_slippage_bps", &self.default_slippage_bps)
            .field("known_tokens", &self.known_tokens.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse::parse_address;

    const CONFIG: &str = r#"
        network = "alfajores"

        [network_config.alfajores]
        endpoint = "https://alfajores-forno.celo-testnet.org"
        chain_id = 44787
        voting_contract = "0x0cc096b1cc568a22c1f02dab769881d1afe6161a"
        native_token = "0xf194afdf50b03e69bd7d057c1aa9e10c9954e4c9"
        private_key = "not-a-real-key"

        [[network_config.alfajores.known_tokens]]
        address = "0x874069fa1eb16d44d622f2e0ca25eea172369bc1"
        name = "Celo Dollar"
        symbol = "cUSD"

        [network_config.localnet]
        endpoint = "http://127.0.0.1:8545"
        chain_id = 31337
        voting_contract = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        swapper_contract = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"
        native_token = "0x471ece3750da237f93b8e339c536989b8978a438"
        native_symbol = "ETH"
        default_slippage_bps = 50
    "#;

    #[test]
    fn parse_network_sections() {
        let config = SeasConfig::from_str(CONFIG).unwrap();
        assert!(config.get_network_config("celo").is_none());
        assert!(config.get_network_config("mainnet").is_none());

        let alfajores = config.active_network_config().unwrap();
        assert_eq!(alfajores.chain_id, 44787);
        assert!(alfajores.swapper_contract.is_none());
        assert_eq!(alfajores.native_symbol, "CELO");
        assert_eq!(alfajores.default_slippage_bps, 100);
        assert_eq!(alfajores.known_tokens.len(), 1);
        assert_eq!(alfajores.known_tokens[0].decimals, 18);

        let registry = alfajores.token_registry();
        let cusd = parse_address("0x874069fa1eb16d44d622f2e0ca25eea172369bc1").unwrap();
        assert_eq!(registry.fallback_descriptor(cusd).symbol, "cUSD");

        let localnet = config.get_network_config("localnet").unwrap();
        assert_eq!(localnet.default_slippage().unwrap().bps(), 50);
        assert!(localnet.swapper_contract.is_some());
    }

    #[test]
    fn debug_redacts_key() {
        let config = SeasConfig::from_str(CONFIG).unwrap();
        let alfajores = config.active_network_config().unwrap();
        let printed = format!("{alfajores:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("not-a-real-key"));
    }

    #[test]
    fn malformed_config() {
        assert!(SeasConfig::from_str("network = 1").is_err());
    }
}
