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

//! In-memory contract doubles. Every write is mined immediately and
//! every call is appended to a shared [`CallLog`], so tests can assert
//! on which contract methods ran and in what order.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use ethers::{
    abi::{encode, Token},
    contract::EthEvent,
    types::{Address, Log, TransactionReceipt, H256, U256, U64},
};
use smol::lock::Mutex;

use crate::{
    contract::{
        evm::SwappedAndVotedFilter, SwapQuote, SwapperContract, TokenConfig, TokenContract,
        VotingContract,
    },
    swap::{KnownToken, SlippageBps, TokenRegistry, TokenSwapClient},
    vote::VoteAggregator,
    Error, Result,
};

/// Ordered record of contract methods invoked on the mocks
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn record(&self, call: &str) {
        self.calls.lock().await.push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock_blocking().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock_blocking().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock_blocking().clear();
    }
}

/// A successful receipt for transaction `n`
pub fn mined_receipt(n: u64) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: H256::from_low_u64_be(n),
        status: Some(U64::from(1)),
        ..Default::default()
    }
}

/// A receipt for transaction `n` whose execution reverted
pub fn reverted_receipt(n: u64) -> TransactionReceipt {
    TransactionReceipt { status: Some(U64::zero()), ..mined_receipt(n) }
}

/// A `SwappedAndVoted` log as emitted by `swapper`
#[allow(clippy::too_many_arguments)]
pub fn swapped_and_voted_log(
    swapper: Address,
    voter: Address,
    token: Address,
    campaign_id: U256,
    project_id: U256,
    token_amount: U256,
    native_swapped: U256,
    native_voted: U256,
) -> Log {
    let data = encode(&[
        Token::Uint(campaign_id),
        Token::Uint(project_id),
        Token::Uint(token_amount),
        Token::Uint(native_swapped),
        Token::Uint(native_voted),
    ]);

    Log {
        address: swapper,
        topics: vec![SwappedAndVotedFilter::signature(), H256::from(voter), H256::from(token)],
        data: data.into(),
        ..Default::default()
    }
}

fn unavailable(what: &str) -> Error {
    Error::ContractReadFailed(format!("{what}: execution reverted"))
}

#[derive(Default)]
struct VotingState {
    project_votes: HashMap<(U256, U256), U256>,
    campaign_votes: HashMap<U256, U256>,
    campaign_projects: HashMap<U256, Vec<U256>>,
    campaign_count: U256,
    fail_reads: bool,
    revert_votes: bool,
    tx_count: u64,
}

/// Voting contract double tracking a single voter
pub struct MockVoting {
    state: Mutex<VotingState>,
    log: Arc<CallLog>,
}

impl MockVoting {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self { state: Mutex::new(VotingState::default()), log }
    }

    pub fn set_project_votes(&self, campaign_id: u64, project_id: u64, amount: U256) {
        let key = (U256::from(campaign_id), U256::from(project_id));
        self.state.lock_blocking().project_votes.insert(key, amount);
    }

    pub fn set_campaign_votes(&self, campaign_id: u64, amount: U256) {
        self.state.lock_blocking().campaign_votes.insert(U256::from(campaign_id), amount);
    }

    pub fn set_campaign_projects(&self, campaign_id: u64, project_ids: &[u64]) {
        let ids = project_ids.iter().map(|id| U256::from(*id)).collect();
        self.state.lock_blocking().campaign_projects.insert(U256::from(campaign_id), ids);
    }

    pub fn set_campaign_count(&self, count: u64) {
        self.state.lock_blocking().campaign_count = U256::from(count);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock_blocking().fail_reads = fail;
    }

    pub fn revert_votes(&self, revert: bool) {
        self.state.lock_blocking().revert_votes = revert;
    }
}

#[async_trait]
impl VotingContract for MockVoting {
    async fn vote(
        &self,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        self.log.record("vote").await;
        let mut state = self.state.lock().await;
        state.tx_count += 1;
        if state.revert_votes {
            return Ok(reverted_receipt(state.tx_count))
        }

        let votes = state.project_votes.entry((campaign_id, project_id)).or_default();
        *votes += amount;
        let votes = state.campaign_votes.entry(campaign_id).or_default();
        *votes += amount;

        Ok(mined_receipt(state.tx_count))
    }

    async fn user_project_votes(
        &self,
        campaign_id: U256,
        project_id: U256,
        _voter: Address,
    ) -> Result<U256> {
        self.log.record("getUserVotesForProject").await;
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(unavailable("getUserVotesForProject"))
        }
        Ok(state.project_votes.get(&(campaign_id, project_id)).copied().unwrap_or_default())
    }

    async fn user_campaign_votes(&self, campaign_id: U256, _voter: Address) -> Result<U256> {
        self.log.record("getUserTotalVotesInCampaign").await;
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(unavailable("getUserTotalVotesInCampaign"))
        }
        Ok(state.campaign_votes.get(&campaign_id).copied().unwrap_or_default())
    }

    async fn campaign_count(&self) -> Result<U256> {
        self.log.record("getCampaignCount").await;
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(unavailable("getCampaignCount"))
        }
        Ok(state.campaign_count)
    }

    async fn campaign_project_ids(&self, campaign_id: U256) -> Result<Vec<U256>> {
        self.log.record("getCampaignProjectIds").await;
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(unavailable("getCampaignProjectIds"))
        }
        Ok(state.campaign_projects.get(&campaign_id).cloned().unwrap_or_default())
    }
}

struct SwapperState {
    tokens: Vec<Address>,
    unreadable: HashSet<usize>,
    /// Native output per token unit, in basis points
    rates_bps: HashMap<Address, u64>,
    fee_bps: u64,
    token_votes: HashMap<(U256, U256, Address), U256>,
    fail_count: bool,
    fail_quotes: bool,
    emit_events: bool,
    revert_swaps: bool,
    tx_count: u64,
}

/// Swapper contract double with a fixed exchange rate per token
pub struct MockSwapper {
    address: Address,
    voter: Address,
    state: Mutex<SwapperState>,
    log: Arc<CallLog>,
}

impl MockSwapper {
    /// `voter` is the account reported in emitted events.
    pub fn new(address: Address, voter: Address, log: Arc<CallLog>) -> Self {
        let state = SwapperState {
            tokens: vec![],
            unreadable: HashSet::new(),
            rates_bps: HashMap::new(),
            fee_bps: 100,
            token_votes: HashMap::new(),
            fail_count: false,
            fail_quotes: false,
            emit_events: true,
            revert_swaps: false,
            tx_count: 1000,
        };
        Self { address, voter, state: Mutex::new(state), log }
    }

    /// List `token` with `rate_bps` native per token unit.
    pub fn add_supported(&self, token: Address, rate_bps: u64) {
        let mut state = self.state.lock_blocking();
        state.tokens.push(token);
        state.rates_bps.insert(token, rate_bps);
    }

    /// Make registry entry `index` fail to read.
    pub fn make_unreadable(&self, index: usize) {
        self.state.lock_blocking().unreadable.insert(index);
    }

    pub fn set_fee_bps(&self, fee_bps: u64) {
        self.state.lock_blocking().fee_bps = fee_bps;
    }

    pub fn set_token_votes(&self, campaign_id: u64, project_id: u64, token: Address, amount: U256) {
        let key = (U256::from(campaign_id), U256::from(project_id), token);
        self.state.lock_blocking().token_votes.insert(key, amount);
    }

    pub fn fail_count(&self, fail: bool) {
        self.state.lock_blocking().fail_count = fail;
    }

    pub fn fail_quotes(&self, fail: bool) {
        self.state.lock_blocking().fail_quotes = fail;
    }

    pub fn emit_events(&self, emit: bool) {
        self.state.lock_blocking().emit_events = emit;
    }

    pub fn revert_swaps(&self, revert: bool) {
        self.state.lock_blocking().revert_swaps = revert;
    }

    fn quote(state: &SwapperState, token: &Address, amount: U256) -> SwapQuote {
        let rate = state.rates_bps.get(token).copied().unwrap_or_default();
        let expected = amount * U256::from(rate) / U256::from(10_000);
        let fee = expected * U256::from(state.fee_bps) / U256::from(10_000);
        SwapQuote { expected_native_amount: expected, vote_native_amount: expected - fee }
    }
}

#[async_trait]
impl SwapperContract for MockSwapper {
    fn address(&self) -> Address {
        self.address
    }

    async fn supported_token_count(&self) -> Result<U256> {
        self.log.record("getSupportedTokenCount").await;
        let state = self.state.lock().await;
        if state.fail_count {
            return Err(unavailable("getSupportedTokenCount"))
        }
        Ok(U256::from(state.tokens.len()))
    }

    async fn supported_token(&self, index: U256) -> Result<Address> {
        self.log.record("supportedTokenList").await;
        let state = self.state.lock().await;
        let index = index.as_usize();
        if state.unreadable.contains(&index) {
            return Err(unavailable("supportedTokenList"))
        }
        state.tokens.get(index).copied().ok_or_else(|| unavailable("supportedTokenList"))
    }

    async fn token_config(&self, token: Address) -> Result<TokenConfig> {
        self.log.record("getTokenConfig").await;
        let state = self.state.lock().await;
        Ok(TokenConfig {
            is_supported: state.tokens.contains(&token),
            pool_fee: 3000,
            min_amount: U256::exp10(15),
        })
    }

    async fn expected_vote_amount(&self, token: Address, amount: U256) -> Result<SwapQuote> {
        self.log.record("getExpectedVoteAmount").await;
        let state = self.state.lock().await;
        if state.fail_quotes {
            return Err(unavailable("getExpectedVoteAmount"))
        }
        Ok(Self::quote(&state, &token, amount))
    }

    async fn min_native_amount(
        &self,
        token: Address,
        amount: U256,
        slippage_bps: U256,
    ) -> Result<U256> {
        self.log.record("calculateMinCeloAmount").await;
        let state = self.state.lock().await;
        if state.fail_quotes {
            return Err(unavailable("calculateMinCeloAmount"))
        }
        let slippage = SlippageBps::new(slippage_bps.as_u32())?;
        Ok(slippage.apply(Self::quote(&state, &token, amount).expected_native_amount))
    }

    async fn user_token_votes(
        &self,
        _voter: Address,
        campaign_id: U256,
        project_id: U256,
        token: Address,
    ) -> Result<U256> {
        self.log.record("getUserTokenVotes").await;
        let state = self.state.lock().await;
        Ok(state.token_votes.get(&(campaign_id, project_id, token)).copied().unwrap_or_default())
    }

    async fn swap_and_vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: U256,
        min_native_amount: U256,
    ) -> Result<TransactionReceipt> {
        self.log.record("swapAndVoteToken").await;
        let mut state = self.state.lock().await;
        state.tx_count += 1;
        if state.revert_swaps {
            return Ok(reverted_receipt(state.tx_count))
        }

        let quote = Self::quote(&state, &token, amount);
        if quote.expected_native_amount < min_native_amount {
            return Ok(reverted_receipt(state.tx_count))
        }

        let votes = state.token_votes.entry((campaign_id, project_id, token)).or_default();
        *votes += amount;

        let mut receipt = mined_receipt(state.tx_count);
        // Transfer-like log from the token itself, never decoded
        receipt.logs.push(Log { address: token, ..Default::default() });
        if state.emit_events {
            receipt.logs.push(swapped_and_voted_log(
                self.address,
                self.voter,
                token,
                campaign_id,
                project_id,
                amount,
                quote.expected_native_amount,
                quote.vote_native_amount,
            ));
        }

        Ok(receipt)
    }

    async fn add_token(
        &self,
        token: Address,
        _pool_fee: u32,
        _min_amount: U256,
    ) -> Result<TransactionReceipt> {
        self.log.record("addToken").await;
        let mut state = self.state.lock().await;
        state.tokens.push(token);
        state.rates_bps.entry(token).or_insert(10_000);
        state.tx_count += 1;
        Ok(mined_receipt(state.tx_count))
    }

    async fn remove_token(&self, token: Address) -> Result<TransactionReceipt> {
        self.log.record("removeToken").await;
        let mut state = self.state.lock().await;
        state.tokens.retain(|t| *t != token);
        state.tx_count += 1;
        Ok(mined_receipt(state.tx_count))
    }

    async fn withdraw_fees(&self, _recipient: Address) -> Result<TransactionReceipt> {
        self.log.record("withdrawFees").await;
        let mut state = self.state.lock().await;
        state.tx_count += 1;
        Ok(mined_receipt(state.tx_count))
    }
}

#[derive(Default)]
struct TokensState {
    symbols: HashMap<Address, String>,
    decimals: HashMap<Address, u8>,
    balances: HashMap<(Address, Address), U256>,
    revert_approvals: bool,
    tx_count: u64,
}

/// ERC-20 double. Tokens without a configured symbol or decimals revert
/// on those reads.
pub struct MockTokens {
    state: Mutex<TokensState>,
    log: Arc<CallLog>,
}

impl MockTokens {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self { state: Mutex::new(TokensState::default()), log }
    }

    pub fn set_metadata(&self, token: Address, symbol: &str, decimals: u8) {
        let mut state = self.state.lock_blocking();
        state.symbols.insert(token, symbol.to_string());
        state.decimals.insert(token, decimals);
    }

    pub fn set_balance(&self, token: Address, owner: Address, balance: U256) {
        self.state.lock_blocking().balances.insert((token, owner), balance);
    }

    pub fn revert_approvals(&self, revert: bool) {
        self.state.lock_blocking().revert_approvals = revert;
    }
}

#[async_trait]
impl TokenContract for MockTokens {
    async fn symbol(&self, token: Address) -> Result<String> {
        self.log.record("symbol").await;
        self.state.lock().await.symbols.get(&token).cloned().ok_or_else(|| unavailable("symbol"))
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.log.record("decimals").await;
        self.state.lock().await.decimals.get(&token).copied().ok_or_else(|| unavailable("decimals"))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        self.log.record("balanceOf").await;
        Ok(self.state.lock().await.balances.get(&(token, owner)).copied().unwrap_or_default())
    }

    async fn approve(
        &self,
        _token: Address,
        _spender: Address,
        _amount: U256,
    ) -> Result<TransactionReceipt> {
        self.log.record("approve").await;
        let mut state = self.state.lock().await;
        state.tx_count += 1;
        if state.revert_approvals {
            return Ok(reverted_receipt(state.tx_count))
        }
        Ok(mined_receipt(state.tx_count))
    }
}

/// Native currency sentinel used by [`TestHarness`]
pub fn native_token() -> Address {
    Address::from_low_u64_be(0xce10)
}

/// A token present in the harness' well-known table
pub fn known_token() -> Address {
    Address::from_low_u64_be(0xc05d)
}

/// Mocks wired together the way the CLI wires the real contracts
pub struct TestHarness {
    pub log: Arc<CallLog>,
    pub voting: Arc<MockVoting>,
    pub swapper: Arc<MockSwapper>,
    pub tokens: Arc<MockTokens>,
    pub voter: Address,
}

impl TestHarness {
    pub fn new() -> Self {
        let log = CallLog::new();
        let voter = Address::from_low_u64_be(0xa11ce);
        let swapper_address = Address::from_low_u64_be(0x5a99);

        Self {
            voting: Arc::new(MockVoting::new(log.clone())),
            swapper: Arc::new(MockSwapper::new(swapper_address, voter, log.clone())),
            tokens: Arc::new(MockTokens::new(log.clone())),
            log,
            voter,
        }
    }

    pub fn registry(&self) -> TokenRegistry {
        TokenRegistry::new(
            native_token(),
            "CELO",
            vec![KnownToken {
                address: known_token(),
                name: "Celo Dollar".to_string(),
                symbol: "cUSD".to_string(),
                decimals: 18,
            }],
        )
    }

    /// Swap client signing as the harness voter
    pub fn swap_client(&self) -> Arc<TokenSwapClient> {
        Arc::new(TokenSwapClient::new(
            Some(self.swapper.clone() as Arc<dyn SwapperContract>),
            self.tokens.clone(),
            Some(self.voter),
            self.registry(),
        ))
    }

    /// Swap client without a swapper backend or signing account
    pub fn bare_swap_client(&self) -> Arc<TokenSwapClient> {
        Arc::new(TokenSwapClient::new(None, self.tokens.clone(), None, self.registry()))
    }

    pub fn aggregator(&self) -> VoteAggregator {
        VoteAggregator::new(self.voting.clone(), self.swap_client())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
