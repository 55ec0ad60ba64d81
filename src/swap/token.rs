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

use std::collections::HashMap;

use ethers::{types::Address, utils::to_checksum};
use serde::Deserialize;

/// Decimals assumed for any token whose metadata cannot be resolved
pub const DEFAULT_DECIMALS: u8 = 18;

/// Decimals of the chain's native currency
pub const NATIVE_DECIMALS: u8 = 18;

/// Placeholder some token contracts return instead of reverting
const PLACEHOLDER_SYMBOL: &str = "Unknown";

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

/// Resolved metadata for a token used in votes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub display_name: String,
    pub is_native: bool,
}

/// Entry of the well-known token table, loaded from configuration
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct KnownToken {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

/// Static token knowledge: the native-currency sentinel and the
/// well-known token table used when contract metadata is unusable.
#[derive(Clone, Debug)]
pub struct TokenRegistry {
    native: TokenDescriptor,
    known: HashMap<Address, KnownToken>,
}

impl TokenRegistry {
    pub fn new(native_token: Address, native_symbol: &str, known_tokens: Vec<KnownToken>) -> Self {
        let known: HashMap<Address, KnownToken> =
            known_tokens.into_iter().map(|t| (t.address, t)).collect();

        let display_name = known
            .get(&native_token)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| native_symbol.to_string());

        let native = TokenDescriptor {
            address: native_token,
            symbol: native_symbol.to_string(),
            decimals: NATIVE_DECIMALS,
            display_name,
            is_native: true,
        };

        Self { native, known }
    }

    pub fn native(&self) -> &TokenDescriptor {
        &self.native
    }

    pub fn native_address(&self) -> Address {
        self.native.address
    }

    pub fn is_native(&self, token: &Address) -> bool {
        *token == self.native.address
    }

    pub fn known(&self, token: &Address) -> Option<&KnownToken> {
        self.known.get(token)
    }

    /// Build a descriptor without touching the network: native sentinel,
    /// then the well-known table, then a synthesized symbol with default
    /// decimals.
    pub fn fallback_descriptor(&self, token: Address) -> TokenDescriptor {
        if self.is_native(&token) {
            return self.native.clone()
        }

        match self.known(&token) {
            Some(known) => TokenDescriptor {
                address: token,
                symbol: known.symbol.clone(),
                decimals: known.decimals,
                display_name: known.name.clone(),
                is_native: false,
            },
            None => {
                let symbol = synthesize_symbol(&token);
                TokenDescriptor {
                    address: token,
                    symbol: symbol.clone(),
                    decimals: DEFAULT_DECIMALS,
                    display_name: symbol,
                    is_native: false,
                }
            }
        }
    }
}

/// Symbol for tokens with no usable metadata, e.g. `Token-0xAB12...34CD`.
pub fn synthesize_symbol(token: &Address) -> String {
    let checksummed = to_checksum(token, None);
    format!("Token-{}...{}", &checksummed[..6], &checksummed[checksummed.len() - 4..])
}

/// Whether a symbol returned by a token contract can be shown as-is.
pub fn is_usable_symbol(symbol: &str) -> bool {
    let symbol = symbol.trim();
    !symbol.is_empty() && symbol != PLACEHOLDER_SYMBOL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse::parse_address;

    fn registry() -> TokenRegistry {
        let celo = parse_address("0x471EcE3750Da237f93B8E339c536989b8978a438").unwrap();
        let cusd = parse_address("0x765DE816845861e75A25fCA122bb6898B8B1282a").unwrap();
        TokenRegistry::new(
            celo,
            "CELO",
            vec![
                KnownToken {
                    address: celo,
                    name: "Celo".to_string(),
                    symbol: "CELO".to_string(),
                    decimals: 18,
                },
                KnownToken {
                    address: cusd,
                    name: "Celo Dollar".to_string(),
                    symbol: "cUSD".to_string(),
                    decimals: 18,
                },
            ],
        )
    }

    #[test]
    fn native_descriptor() {
        let registry = registry();
        let native = registry.native();
        assert!(native.is_native);
        assert_eq!(native.symbol, "CELO");
        assert_eq!(native.display_name, "Celo");
        assert_eq!(native.decimals, NATIVE_DECIMALS);
        assert!(registry.is_native(&native.address));
    }

    #[test]
    fn fallback_prefers_known_table() {
        let registry = registry();
        let cusd = parse_address("0x765DE816845861e75A25fCA122bb6898B8B1282a").unwrap();
        let d = registry.fallback_descriptor(cusd);
        assert_eq!(d.symbol, "cUSD");
        assert_eq!(d.display_name, "Celo Dollar");
        assert!(!d.is_native);
    }

    #[test]
    fn fallback_synthesizes_unknown_tokens() {
        let registry = registry();
        let token = parse_address("0xab12000000000000000000000000000000003cd4").unwrap();
        let d = registry.fallback_descriptor(token);
        assert!(d.symbol.starts_with("Token-0x"));
        assert!(d.symbol.contains("..."));
        assert_eq!(d.symbol.len(), "Token-0xAB12...34CD".len());
        assert_eq!(d.decimals, DEFAULT_DECIMALS);
    }

    #[test]
    fn placeholder_symbols() {
        assert!(is_usable_symbol("cUSD"));
        assert!(!is_usable_symbol("Unknown"));
        assert!(!is_usable_symbol("  "));
    }
}
