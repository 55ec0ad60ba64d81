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

//! Token swap client.
//!
//! Talks to the swapper contract, which converts a supported ERC-20
//! token into the native currency and forwards the proceeds to the
//! voting contract as a vote. Reads degrade to empty or zero values and
//! are logged; writes propagate their errors.

use std::{collections::HashMap, sync::Arc};

use ethers::types::{Address, TransactionReceipt, U256};
use log::{debug, error, info, warn};
use smol::lock::RwLock;

use crate::{
    contract::{ensure_success, SwapQuote, SwapperContract, TokenConfig, TokenContract},
    util::parse::{check_positive_amount, parse_positive_amount},
    Error, Result,
};

/// Token metadata, well-known token table and native sentinel
pub mod token;
pub use token::{KnownToken, TokenDescriptor, TokenRegistry};

/// Slippage tolerance in basis points
pub mod slippage;
pub use slippage::SlippageBps;

/// `SwappedAndVoted` receipt decoding
pub mod event;
pub use event::{decode_swap_event, SwapOutcome, SwapReceipt, SwapRequest};

/// Upper bound on registry entries enumerated from the swapper
pub const MAX_SUPPORTED_TOKENS: usize = 256;

pub struct TokenSwapClient {
    /// Swapper backend, `None` when not deployed on the network
    swapper: Option<Arc<dyn SwapperContract>>,
    /// ERC-20 access for metadata, balances and approvals
    tokens: Arc<dyn TokenContract>,
    /// Signing account, `None` for read-only use
    account: Option<Address>,
    registry: TokenRegistry,
    /// Resolved descriptors, filled once per token
    descriptors: RwLock<HashMap<Address, TokenDescriptor>>,
    /// Last loaded registry listing, in contract order
    supported: RwLock<Vec<Address>>,
}

impl TokenSwapClient {
    pub fn new(
        swapper: Option<Arc<dyn SwapperContract>>,
        tokens: Arc<dyn TokenContract>,
        account: Option<Address>,
        registry: TokenRegistry,
    ) -> Self {
        Self {
            swapper,
            tokens,
            account,
            registry,
            descriptors: RwLock::new(HashMap::new()),
            supported: RwLock::new(vec![]),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn swapper_address(&self) -> Option<Address> {
        self.swapper.as_ref().map(|s| s.address())
    }

    fn swapper(&self) -> Result<&Arc<dyn SwapperContract>> {
        self.swapper.as_ref().ok_or(Error::SwapperNotConfigured)
    }

    /// Enumerate the swapper's token registry and resolve every entry.
    /// Unreadable entries are skipped; a failed count yields an empty list.
    pub async fn load_supported_tokens(&self) -> Vec<Address> {
        let Some(swapper) = &self.swapper else {
            debug!(target: "swap::load_supported_tokens", "No swapper configured");
            return vec![]
        };

        let count = match swapper.supported_token_count().await {
            Ok(v) => v,
            Err(e) => {
                error!(target: "swap::load_supported_tokens", "Failed reading token count: {e}");
                return vec![]
            }
        };

        let count = if count > U256::from(MAX_SUPPORTED_TOKENS) {
            warn!(
                target: "swap::load_supported_tokens",
                "Registry reports {count} tokens, only reading the first {MAX_SUPPORTED_TOKENS}",
            );
            MAX_SUPPORTED_TOKENS
        } else {
            count.as_usize()
        };

        let mut tokens = Vec::with_capacity(count);
        for index in 0..count {
            match swapper.supported_token(U256::from(index)).await {
                Ok(token) => tokens.push(token),
                Err(e) => {
                    warn!(
                        target: "swap::load_supported_tokens",
                        "Skipping registry entry {index}: {e}"
                    );
                }
            }
        }

        for token in &tokens {
            let descriptor = self.resolve_token(*token).await;
            debug!(
                target: "swap::load_supported_tokens",
                "{:?}: {} ({} decimals)", token, descriptor.symbol, descriptor.decimals,
            );
        }

        info!(target: "swap::load_supported_tokens", "Loaded {} supported tokens", tokens.len());
        *self.supported.write().await = tokens.clone();
        tokens
    }

    /// The loaded registry listing, loading it on first use.
    pub async fn supported_tokens(&self) -> Vec<Address> {
        {
            let supported = self.supported.read().await;
            if !supported.is_empty() {
                return supported.clone()
            }
        }

        self.load_supported_tokens().await
    }

    /// Resolve symbol and decimals of a token, once per client lifetime.
    /// A token outside the well-known table whose decimals could not be
    /// read is not cached.
    pub async fn resolve_token(&self, token: Address) -> TokenDescriptor {
        if self.registry.is_native(&token) {
            return self.registry.native().clone()
        }

        if let Some(descriptor) = self.descriptors.read().await.get(&token) {
            return descriptor.clone()
        }

        let fallback = self.registry.fallback_descriptor(token);

        let symbol = match self.tokens.symbol(token).await {
            Ok(symbol) if token::is_usable_symbol(&symbol) => symbol.trim().to_string(),
            Ok(symbol) => {
                debug!(
                    target: "swap::resolve_token",
                    "{token:?} returned symbol {symbol:?}, using fallback"
                );
                fallback.symbol.clone()
            }
            Err(e) => {
                warn!(target: "swap::resolve_token", "Failed reading symbol of {token:?}: {e}");
                fallback.symbol.clone()
            }
        };

        let (decimals, settled) = match self.tokens.decimals(token).await {
            Ok(decimals) => (decimals, true),
            Err(e) => {
                warn!(target: "swap::resolve_token", "Failed reading decimals of {token:?}: {e}");
                (fallback.decimals, self.registry.known(&token).is_some())
            }
        };

        let display_name = match self.registry.known(&token) {
            Some(known) => known.name.clone(),
            None => symbol.clone(),
        };

        let descriptor =
            TokenDescriptor { address: token, symbol, decimals, display_name, is_native: false };

        // Guessed decimals are retried on the next call
        if settled {
            self.descriptors.write().await.insert(token, descriptor.clone());
        }
        descriptor
    }

    /// Descriptor from what is already known, without any contract call.
    pub async fn describe(&self, token: Address) -> TokenDescriptor {
        if let Some(descriptor) = self.descriptors.read().await.get(&token) {
            return descriptor.clone()
        }
        self.registry.fallback_descriptor(token)
    }

    /// Quote a human-readable token amount. Zero when the swapper is not
    /// configured, the amount is not positive, or the read fails.
    pub async fn get_expected_vote_amount(&self, token: Address, amount: &str) -> SwapQuote {
        if self.swapper.is_none() {
            return SwapQuote::default()
        }

        let descriptor = self.resolve_token(token).await;
        let units = match parse_positive_amount(amount, descriptor.decimals) {
            Ok(v) => v,
            Err(e) => {
                debug!(target: "swap::get_expected_vote_amount", "Not quoting {amount:?}: {e}");
                return SwapQuote::default()
            }
        };

        self.quote_units(token, units).await
    }

    /// Quote an amount already in the token's smallest unit.
    pub async fn quote_units(&self, token: Address, units: U256) -> SwapQuote {
        let Some(swapper) = &self.swapper else { return SwapQuote::default() };

        match swapper.expected_vote_amount(token, units).await {
            Ok(quote) => quote,
            Err(e) => {
                error!(target: "swap::quote_units", "Failed quoting {units} of {token:?}: {e}");
                SwapQuote::default()
            }
        }
    }

    /// Minimum native output the swap must yield, as the swapper itself
    /// computes it for the given slippage tolerance.
    pub async fn calculate_minimum_native_amount(
        &self,
        token: Address,
        amount: &str,
        slippage_bps: u32,
    ) -> Result<U256> {
        let swapper = self.swapper()?;
        let slippage = SlippageBps::new(slippage_bps)?;
        check_positive_amount(amount)?;

        let descriptor = self.resolve_token(token).await;
        let units = parse_positive_amount(amount, descriptor.decimals)?;

        swapper.min_native_amount(token, units, slippage.into()).await
    }

    /// Swap `amount` of `token` into the native currency and vote with the
    /// proceeds. The approval is mined before the swap is submitted.
    pub async fn swap_and_vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: &str,
        slippage_bps: u32,
    ) -> Result<SwapOutcome> {
        let voter = self.account.ok_or(Error::WalletNotConnected)?;
        let swapper = self.swapper()?;
        if self.registry.is_native(&token) {
            return Err(Error::NativeTokenSwap)
        }
        check_positive_amount(amount)?;
        let slippage = SlippageBps::new(slippage_bps)?;

        let descriptor = self.resolve_token(token).await;
        let units = parse_positive_amount(amount, descriptor.decimals)?;
        let min_native_amount = swapper.min_native_amount(token, units, slippage.into()).await?;

        info!(
            target: "swap::swap_and_vote",
            "Swapping {amount} {} for campaign {campaign_id} project {project_id}, \
             minimum {min_native_amount}",
            descriptor.symbol,
        );

        let approval = self.tokens.approve(token, swapper.address(), units).await?;
        ensure_success(&approval, "approve")?;
        debug!(target: "swap::swap_and_vote", "Approval mined in {:?}", approval.transaction_hash);

        let receipt = swapper
            .swap_and_vote(token, campaign_id, project_id, units, min_native_amount)
            .await?;
        ensure_success(&receipt, "swapAndVoteToken")?;

        match decode_swap_event(swapper.address(), &receipt) {
            Some(swap) => {
                info!(
                    target: "swap::swap_and_vote",
                    "Swapped {} for {} native, {} voted",
                    swap.token_amount,
                    swap.native_swapped,
                    swap.native_voted,
                );
                Ok(SwapOutcome::Confirmed(swap))
            }
            None => {
                warn!(
                    target: "swap::swap_and_vote",
                    "No SwappedAndVoted event in {:?}", receipt.transaction_hash,
                );
                let request = SwapRequest {
                    voter,
                    token,
                    campaign_id,
                    project_id,
                    token_amount: units,
                    min_native_amount,
                };
                Ok(SwapOutcome::ConfirmedUnparsed { tx_hash: receipt.transaction_hash, request })
            }
        }
    }

    /// Token amount `voter` has swapped into votes for a project, zero
    /// when unavailable.
    pub async fn token_votes(
        &self,
        voter: Address,
        campaign_id: U256,
        project_id: U256,
        token: Address,
    ) -> U256 {
        let Some(swapper) = &self.swapper else { return U256::zero() };

        match swapper.user_token_votes(voter, campaign_id, project_id, token).await {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "swap::token_votes", "Failed reading {token:?} votes: {e}");
                U256::zero()
            }
        }
    }

    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        self.tokens.balance_of(token, owner).await
    }

    pub async fn token_config(&self, token: Address) -> Result<TokenConfig> {
        self.swapper()?.token_config(token).await
    }

    async fn forget_token(&self, token: &Address) {
        self.descriptors.write().await.remove(token);
        self.supported.write().await.clear();
    }

    /// Register a token with the swapper. Owner only.
    pub async fn add_token(
        &self,
        token: Address,
        pool_fee: u32,
        min_amount: U256,
    ) -> Result<TransactionReceipt> {
        let receipt = self.swapper()?.add_token(token, pool_fee, min_amount).await?;
        ensure_success(&receipt, "addToken")?;
        self.forget_token(&token).await;
        info!(target: "swap::add_token", "Added {token:?} with pool fee {pool_fee}");
        Ok(receipt)
    }

    /// Remove a token from the swapper registry. Owner only.
    pub async fn remove_token(&self, token: Address) -> Result<TransactionReceipt> {
        let receipt = self.swapper()?.remove_token(token).await?;
        ensure_success(&receipt, "removeToken")?;
        self.forget_token(&token).await;
        info!(target: "swap::remove_token", "Removed {token:?}");
        Ok(receipt)
    }

    /// Send accumulated service fees to `recipient`. Owner only.
    pub async fn withdraw_fees(&self, recipient: Address) -> Result<TransactionReceipt> {
        let receipt = self.swapper()?.withdraw_fees(recipient).await?;
        ensure_success(&receipt, "withdrawFees")?;
        info!(target: "swap::withdraw_fees", "Fees withdrawn to {recipient:?}");
        Ok(receipt)
    }
}
