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

use ethers::{
    abi::RawLog,
    contract::EthLogDecode,
    types::{Address, TransactionReceipt, H256, U256},
};

use crate::contract::evm::SwappedAndVotedFilter;

/// Parameters a swap-and-vote transaction was submitted with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapRequest {
    pub voter: Address,
    pub token: Address,
    pub campaign_id: U256,
    pub project_id: U256,
    pub token_amount: U256,
    pub min_native_amount: U256,
}

/// Amounts reported by the swapper's `SwappedAndVoted` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: H256,
    pub voter: Address,
    pub token: Address,
    pub campaign_id: U256,
    pub project_id: U256,
    pub token_amount: U256,
    pub native_swapped: U256,
    pub native_voted: U256,
}

/// Result of a mined swap-and-vote transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The event was decoded; the amounts are authoritative.
    Confirmed(SwapReceipt),
    /// The transaction succeeded on-chain but no `SwappedAndVoted` event
    /// from the swapper could be decoded, so only the request is known.
    ConfirmedUnparsed { tx_hash: H256, request: SwapRequest },
}

impl SwapOutcome {
    pub fn tx_hash(&self) -> H256 {
        match self {
            Self::Confirmed(receipt) => receipt.tx_hash,
            Self::ConfirmedUnparsed { tx_hash, .. } => *tx_hash,
        }
    }

    /// Native amount registered as a vote, when known.
    pub fn native_voted(&self) -> Option<U256> {
        match self {
            Self::Confirmed(receipt) => Some(receipt.native_voted),
            Self::ConfirmedUnparsed { .. } => None,
        }
    }
}

/// Find and decode the first `SwappedAndVoted` event emitted by `swapper`
/// in the receipt. Logs from other contracts (e.g. the ERC-20 transfer
/// events of the swap itself) are skipped.
pub fn decode_swap_event(swapper: Address, receipt: &TransactionReceipt) -> Option<SwapReceipt> {
    receipt.logs.iter().filter(|log| log.address == swapper).find_map(|log| {
        let raw = RawLog { topics: log.topics.clone(), data: log.data.to_vec() };
        let event = SwappedAndVotedFilter::decode_log(&raw).ok()?;

        Some(SwapReceipt {
            tx_hash: receipt.transaction_hash,
            voter: event.user,
            token: event.token,
            campaign_id: event.campaign_id,
            project_id: event.project_id,
            token_amount: event.token_amount,
            native_swapped: event.celo_swapped,
            native_voted: event.celo_voted,
        })
    })
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::{encode, Token},
        contract::EthEvent,
        types::Log,
    };

    use super::*;

    fn swap_log(swapper: Address, voter: Address, token: Address) -> Log {
        let data = encode(&[
            Token::Uint(U256::from(1)),
            Token::Uint(U256::from(2)),
            Token::Uint(U256::from(500)),
            Token::Uint(U256::from(250)),
            Token::Uint(U256::from(245)),
        ]);

        Log {
            address: swapper,
            topics: vec![SwappedAndVotedFilter::signature(), H256::from(voter), H256::from(token)],
            data: data.into(),
            ..Default::default()
        }
    }

    #[test]
    fn decodes_swapper_event() {
        let swapper = Address::from_low_u64_be(0x5a);
        let voter = Address::from_low_u64_be(0xa1);
        let token = Address::from_low_u64_be(0x70);

        let receipt = TransactionReceipt {
            transaction_hash: H256::from_low_u64_be(7),
            logs: vec![swap_log(swapper, voter, token)],
            ..Default::default()
        };

        let decoded = decode_swap_event(swapper, &receipt).unwrap();
        assert_eq!(decoded.tx_hash, H256::from_low_u64_be(7));
        assert_eq!(decoded.voter, voter);
        assert_eq!(decoded.token, token);
        assert_eq!(decoded.campaign_id, U256::from(1));
        assert_eq!(decoded.project_id, U256::from(2));
        assert_eq!(decoded.token_amount, U256::from(500));
        assert_eq!(decoded.native_swapped, U256::from(250));
        assert_eq!(decoded.native_voted, U256::from(245));
    }

    #[test]
    fn ignores_foreign_and_malformed_logs() {
        let swapper = Address::from_low_u64_be(0x5a);
        let other = Address::from_low_u64_be(0x5b);
        let voter = Address::from_low_u64_be(0xa1);
        let token = Address::from_low_u64_be(0x70);

        // Same event shape but emitted by another contract
        let foreign = swap_log(other, voter, token);
        // Right emitter, wrong topic
        let mut unrelated = swap_log(swapper, voter, token);
        unrelated.topics[0] = H256::from_low_u64_be(1);

        let receipt =
            TransactionReceipt { logs: vec![foreign, unrelated], ..Default::default() };
        assert!(decode_swap_event(swapper, &receipt).is_none());
    }
}
