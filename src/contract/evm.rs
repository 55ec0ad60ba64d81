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

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::{abigen, ContractCall},
    providers::Middleware,
    types::{Address, TransactionReceipt, U256},
};
use log::debug;

use super::{SwapQuote, SwapperContract, TokenConfig, TokenContract, VotingContract};
use crate::{Error, Result};

abigen!(
    SovereignVoting,
    r#"[
        function vote(uint256 campaignId, uint256 projectId, uint256 amount) external payable
        function getUserVotesForProject(uint256 campaignId, uint256 projectId, address voter) external view returns (uint256)
        function getUserTotalVotesInCampaign(uint256 campaignId, address voter) external view returns (uint256)
        function getCampaignCount() external view returns (uint256)
        function getCampaignProjectIds(uint256 campaignId) external view returns (uint256[])
    ]"#
);

abigen!(
    CeloSwapper,
    r#"[
        function getSupportedTokenCount() external view returns (uint256)
        function supportedTokenList(uint256 index) external view returns (address)
        function getTokenConfig(address token) external view returns (bool isSupported, uint24 poolFee, uint256 minAmount)
        function getExpectedVoteAmount(address token, uint256 amount) external view returns (uint256 expectedCelo, uint256 voteAmount)
        function calculateMinCeloAmount(address token, uint256 amount, uint256 slippageBps) external view returns (uint256)
        function getUserTokenVotes(address user, uint256 campaignId, uint256 projectId, address token) external view returns (uint256)
        function swapAndVoteToken(address token, uint256 campaignId, uint256 projectId, uint256 amount, uint256 minCeloAmount) external
        function addToken(address token, uint24 poolFee, uint256 minAmount) external
        function removeToken(address token) external
        function withdrawFees(address recipient) external
        event SwappedAndVoted(address indexed user, address indexed token, uint256 campaignId, uint256 projectId, uint256 tokenAmount, uint256 celoSwapped, uint256 celoVoted)
    ]"#
);

abigen!(
    Erc20,
    r#"[
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function balanceOf(address owner) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);

/// Submit a state-changing call and block until it is mined.
async fn send_and_confirm<M, D>(call: ContractCall<M, D>, what: &str) -> Result<TransactionReceipt>
where
    M: Middleware + 'static,
    D: Detokenize + Send + Sync,
{
    let pending =
        call.send().await.map_err(|e| Error::ContractCallFailed(format!("{what}: {e}")))?;

    let tx_hash = pending.tx_hash();
    debug!(target: "contract::evm", "Submitted `{what}` in {tx_hash:?}, awaiting receipt");

    match pending.await {
        Ok(Some(receipt)) => Ok(receipt),
        Ok(None) => Err(Error::TransactionDropped(format!("{tx_hash:?}"))),
        Err(e) => Err(Error::ContractCallFailed(format!("{what}: {e}"))),
    }
}

fn read_failed(what: &str, e: impl std::fmt::Display) -> Error {
    Error::ContractReadFailed(format!("{what}: {e}"))
}

/// Voting contract reached through an `ethers` middleware
pub struct EvmVoting<M: Middleware> {
    contract: SovereignVoting<M>,
}

impl<M: Middleware + 'static> EvmVoting<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self { contract: SovereignVoting::new(address, client) }
    }
}

#[async_trait]
impl<M: Middleware + 'static> VotingContract for EvmVoting<M> {
    async fn vote(
        &self,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        let call = self.contract.vote(campaign_id, project_id, amount).value(amount);
        send_and_confirm(call, "vote").await
    }

    async fn user_project_votes(
        &self,
        campaign_id: U256,
        project_id: U256,
        voter: Address,
    ) -> Result<U256> {
        self.contract
            .get_user_votes_for_project(campaign_id, project_id, voter)
            .call()
            .await
            .map_err(|e| read_failed("getUserVotesForProject", e))
    }

    async fn user_campaign_votes(&self, campaign_id: U256, voter: Address) -> Result<U256> {
        self.contract
            .get_user_total_votes_in_campaign(campaign_id, voter)
            .call()
            .await
            .map_err(|e| read_failed("getUserTotalVotesInCampaign", e))
    }

    async fn campaign_count(&self) -> Result<U256> {
        self.contract
            .get_campaign_count()
            .call()
            .await
            .map_err(|e| read_failed("getCampaignCount", e))
    }

    async fn campaign_project_ids(&self, campaign_id: U256) -> Result<Vec<U256>> {
        self.contract
            .get_campaign_project_ids(campaign_id)
            .call()
            .await
            .map_err(|e| read_failed("getCampaignProjectIds", e))
    }
}

/// Token swapper contract reached through an `ethers` middleware
pub struct EvmSwapper<M: Middleware> {
    contract: CeloSwapper<M>,
}

impl<M: Middleware + 'static> EvmSwapper<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self { contract: CeloSwapper::new(address, client) }
    }
}

#[async_trait]
impl<M: Middleware + 'static> SwapperContract for EvmSwapper<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn supported_token_count(&self) -> Result<U256> {
        self.contract
            .get_supported_token_count()
            .call()
            .await
            .map_err(|e| read_failed("getSupportedTokenCount", e))
    }

    async fn supported_token(&self, index: U256) -> Result<Address> {
        self.contract
            .supported_token_list(index)
            .call()
            .await
            .map_err(|e| read_failed("supportedTokenList", e))
    }

    async fn token_config(&self, token: Address) -> Result<TokenConfig> {
        let (is_supported, pool_fee, min_amount) = self
            .contract
            .get_token_config(token)
            .call()
            .await
            .map_err(|e| read_failed("getTokenConfig", e))?;

        Ok(TokenConfig { is_supported, pool_fee, min_amount })
    }

    async fn expected_vote_amount(&self, token: Address, amount: U256) -> Result<SwapQuote> {
        let (expected_native_amount, vote_native_amount) = self
            .contract
            .get_expected_vote_amount(token, amount)
            .call()
            .await
            .map_err(|e| read_failed("getExpectedVoteAmount", e))?;

        Ok(SwapQuote { expected_native_amount, vote_native_amount })
    }

    async fn min_native_amount(
        &self,
        token: Address,
        amount: U256,
        slippage_bps: U256,
    ) -> Result<U256> {
        self.contract
            .calculate_min_celo_amount(token, amount, slippage_bps)
            .call()
            .await
            .map_err(|e| read_failed("calculateMinCeloAmount", e))
    }

    async fn user_token_votes(
        &self,
        voter: Address,
        campaign_id: U256,
        project_id: U256,
        token: Address,
    ) -> Result<U256> {
        self.contract
            .get_user_token_votes(voter, campaign_id, project_id, token)
            .call()
            .await
            .map_err(|e| read_failed("getUserTokenVotes", e))
    }

    async fn swap_and_vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
        min_native_amount: U256,
    ) -> Result<TransactionReceipt> {
        let call = self.contract.swap_and_vote_token(
            token,
            campaign_id,
            project_id,
            amount,
            min_native_amount,
        );
        send_and_confirm(call, "swapAndVoteToken").await
    }

    async fn add_token(
        &self,
        token: Address,
        pool_fee: u32,
        min_amount: U256,
    ) -> Result<TransactionReceipt> {
        send_and_confirm(self.contract.add_token(token, pool_fee, min_amount), "addToken").await
    }

    async fn remove_token(&self, token: Address) -> Result<TransactionReceipt> {
        send_and_confirm(self.contract.remove_token(token), "removeToken").await
    }

    async fn withdraw_fees(&self, recipient: Address) -> Result<TransactionReceipt> {
        send_and_confirm(self.contract.withdraw_fees(recipient), "withdrawFees").await
    }
}

/// ERC-20 access for any token address through an `ethers` middleware
pub struct EvmTokens<M: Middleware> {
    client: Arc<M>,
}

impl<M: Middleware + 'static> EvmTokens<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    fn erc20(&self, token: Address) -> Erc20<M> {
        Erc20::new(token, self.client.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenContract for EvmTokens<M> {
    async fn symbol(&self, token: Address) -> Result<String> {
        let erc20 = self.erc20(token);
        erc20.symbol().call().await.map_err(|e| read_failed("symbol", e))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let erc20 = self.erc20(token);
        erc20.decimals().call().await.map_err(|e| read_failed("decimals", e))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let erc20 = self.erc20(token);
        erc20.balance_of(owner).call().await.map_err(|e| read_failed("balanceOf", e))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        let erc20 = self.erc20(token);
        send_and_confirm(erc20.approve(spender, amount), "approve").await
    }
}
