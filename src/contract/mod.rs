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

//! Client-facing seams over the externally owned contracts.
//!
//! The voting contract accepts native-currency votes, the swapper
//! contract converts an ERC-20 token into the native currency and
//! forwards the proceeds as a vote. Every write returns the mined
//! [`TransactionReceipt`]; callers must still check its status with
//! [`ensure_success`].

use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, U256, U64};

use crate::{Error, Result};

/// `ethers`-backed implementations of the contract traits
pub mod evm;

/// Output of the swapper's `getExpectedVoteAmount`. The two amounts
/// differ by the service fee taken between the swap and the vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapQuote {
    /// Native amount the swap is expected to yield
    pub expected_native_amount: U256,
    /// Native amount that is registered as a vote after fees
    pub vote_native_amount: U256,
}

/// Swapper-side configuration of a supported token
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenConfig {
    pub is_supported: bool,
    /// Uniswap-style pool fee tier, in hundredths of a bip
    pub pool_fee: u32,
    /// Smallest token amount the swapper accepts
    pub min_amount: U256,
}

/// Voting contract: direct native-currency votes and per-account totals.
#[async_trait]
pub trait VotingContract: Send + Sync {
    /// Cast a native-currency vote, sending `amount` as the call value.
    async fn vote(
        &self,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt>;

    /// Native amount `voter` has voted for a single project.
    async fn user_project_votes(
        &self,
        campaign_id: U256,
        project_id: U256,
        voter: Address,
    ) -> Result<U256>;

    /// Native amount `voter` has voted across a whole campaign.
    async fn user_campaign_votes(&self, campaign_id: U256, voter: Address) -> Result<U256>;

    async fn campaign_count(&self) -> Result<U256>;

    async fn campaign_project_ids(&self, campaign_id: U256) -> Result<Vec<U256>>;
}

/// Token swapper contract: registry, quoting, swap-and-vote and admin.
#[async_trait]
pub trait SwapperContract: Send + Sync {
    /// On-chain address of the swapper, used as the ERC-20 spender and
    /// to filter receipt logs.
    fn address(&self) -> Address;

    async fn supported_token_count(&self) -> Result<U256>;

    async fn supported_token(&self, index: U256) -> Result<Address>;

    async fn token_config(&self, token: Address) -> Result<TokenConfig>;

    async fn expected_vote_amount(&self, token: Address, amount: U256) -> Result<SwapQuote>;

    /// Minimum acceptable native output for `amount` of `token` under
    /// `slippage_bps`, computed by the contract itself.
    async fn min_native_amount(
        &self,
        token: Address,
        amount: U256,
        slippage_bps: U256,
    ) -> Result<U256>;

    /// Token amount `voter` has swapped into votes for a project.
    async fn user_token_votes(
        &self,
        voter: Address,
        campaign_id: U256,
        project_id: U256,
        token: Address,
    ) -> Result<U256>;

    async fn swap_and_vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
        min_native_amount: U256,
    ) -> Result<TransactionReceipt>;

    async fn add_token(
        &self,
        token: Address,
        pool_fee: u32,
        min_amount: U256,
    ) -> Result<TransactionReceipt>;

    async fn remove_token(&self, token: Address) -> Result<TransactionReceipt>;

    async fn withdraw_fees(&self, recipient: Address) -> Result<TransactionReceipt>;
}

/// Standard ERC-20 surface used by the client. One implementation
/// serves every token, addressed per call.
#[async_trait]
pub trait TokenContract: Send + Sync {
    async fn symbol(&self, token: Address) -> Result<String>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>;
}

/// Fail with [`Error::TransactionReverted`] unless the receipt reports
/// a successful execution.
pub fn ensure_success(receipt: &TransactionReceipt, what: &str) -> Result<()> {
    if receipt.status == Some(U64::from(1)) {
        return Ok(())
    }

    Err(Error::TransactionReverted(format!("`{what}` in {:?}", receipt.transaction_hash)))
}
