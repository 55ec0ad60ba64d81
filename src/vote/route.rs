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

use ethers::types::{Address, H256, U256};

use crate::swap::{SwapOutcome, TokenRegistry};

/// Payment path of a vote
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteRoute {
    /// Native currency sent straight to the voting contract
    Native,
    /// ERC-20 token swapped by the swapper before voting
    TokenSwap(Address),
}

impl VoteRoute {
    pub fn resolve(token: Address, registry: &TokenRegistry) -> Self {
        if registry.is_native(&token) {
            return Self::Native
        }
        Self::TokenSwap(token)
    }
}

/// A confirmed vote
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Native { tx_hash: H256, amount: U256 },
    TokenSwap(SwapOutcome),
}

impl VoteOutcome {
    pub fn tx_hash(&self) -> H256 {
        match self {
            Self::Native { tx_hash, .. } => *tx_hash,
            Self::TokenSwap(outcome) => outcome.tx_hash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_routes_native() {
        let native = Address::from_low_u64_be(0xce10);
        let registry = TokenRegistry::new(native, "CELO", vec![]);

        assert_eq!(VoteRoute::resolve(native, &registry), VoteRoute::Native);

        let token = Address::from_low_u64_be(0xc05d);
        assert_eq!(VoteRoute::resolve(token, &registry), VoteRoute::TokenSwap(token));
    }
}
