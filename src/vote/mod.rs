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

//! Vote aggregation client.
//!
//! Routes a vote either to the voting contract (native currency) or
//! through the [`TokenSwapClient`], and merges both vote sources into
//! per-project and per-campaign summaries.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use ethers::types::{Address, U256};
use log::{debug, error, info, warn};
use smol::lock::{Mutex, RwLock};

use crate::{
    contract::{ensure_success, VotingContract},
    swap::{token::NATIVE_DECIMALS, TokenSwapClient},
    util::parse::{check_positive_amount, encode_base10, parse_positive_amount},
    Error, Result,
};

/// Vote summaries and their construction
pub mod summary;
pub use summary::{CampaignVoteSummary, TokenVote, VoteSummary};

/// Payment path resolution
pub mod route;
pub use route::{VoteOutcome, VoteRoute};

/// Upper bound on campaigns walked by [`VoteAggregator::get_all_user_votes`]
pub const MAX_CAMPAIGNS: usize = 1024;

/// Keeps the loading counter raised while alive.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn summary_key(campaign_id: U256, project_id: U256) -> String {
    format!("{campaign_id}-{project_id}")
}

pub struct VoteAggregator {
    voting: Arc<dyn VotingContract>,
    swap: Arc<TokenSwapClient>,
    /// Last fetched summary per `"{campaign}-{project}"`, advisory only
    summaries: RwLock<HashMap<String, VoteSummary>>,
    /// Operations in flight
    loading: AtomicUsize,
    /// Message of the last failed vote
    error: Mutex<Option<String>>,
}

impl VoteAggregator {
    pub fn new(voting: Arc<dyn VotingContract>, swap: Arc<TokenSwapClient>) -> Self {
        Self {
            voting,
            swap,
            summaries: RwLock::new(HashMap::new()),
            loading: AtomicUsize::new(0),
            error: Mutex::new(None),
        }
    }

    pub fn swap_client(&self) -> &Arc<TokenSwapClient> {
        &self.swap
    }

    /// Cast a vote and report success. On failure the message is kept
    /// in [`VoteAggregator::error`].
    pub async fn vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: &str,
        slippage_bps: u32,
    ) -> bool {
        self.clear_error().await;

        match self.try_vote(token, campaign_id, project_id, amount, slippage_bps).await {
            Ok(outcome) => {
                info!(target: "vote::vote", "Vote confirmed in {:?}", outcome.tx_hash());
                true
            }
            Err(e) => {
                error!(target: "vote::vote", "Vote failed: {e}");
                *self.error.lock().await = Some(e.to_string());
                false
            }
        }
    }

    /// Cast a vote on the route the token calls for, then refresh the
    /// cached summary of the target.
    pub async fn try_vote(
        &self,
        token: Address,
        campaign_id: U256,
        project_id: U256,
        amount: &str,
        slippage_bps: u32,
    ) -> Result<VoteOutcome> {
        let _loading = LoadingGuard::new(&self.loading);

        check_positive_amount(amount)?;
        if self.swap.account().is_none() {
            return Err(Error::WalletNotConnected)
        }

        let outcome = match VoteRoute::resolve(token, self.swap.registry()) {
            VoteRoute::Native => {
                let units = parse_positive_amount(amount, NATIVE_DECIMALS)?;
                debug!(
                    target: "vote::try_vote",
                    "Voting {units} native for campaign {campaign_id} project {project_id}",
                );
                let receipt = self.voting.vote(campaign_id, project_id, units).await?;
                ensure_success(&receipt, "vote")?;
                VoteOutcome::Native { tx_hash: receipt.transaction_hash, amount: units }
            }

            VoteRoute::TokenSwap(token) => {
                let outcome = self
                    .swap
                    .swap_and_vote(token, campaign_id, project_id, amount, slippage_bps)
                    .await?;
                VoteOutcome::TokenSwap(outcome)
            }
        };

        self.get_user_vote_summary(campaign_id, project_id).await;
        Ok(outcome)
    }

    /// Read the account's direct and swapped votes for one project and
    /// replace the cached summary. Failed reads count as zero.
    pub async fn get_user_vote_summary(&self, campaign_id: U256, project_id: U256) -> VoteSummary {
        let _loading = LoadingGuard::new(&self.loading);

        let Some(voter) = self.swap.account() else {
            debug!(target: "vote::get_user_vote_summary", "No account, returning empty summary");
            return VoteSummary::empty(campaign_id, project_id)
        };

        let direct = match self.voting.user_project_votes(campaign_id, project_id, voter).await {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "vote::get_user_vote_summary", "Failed reading direct votes: {e}");
                U256::zero()
            }
        };

        let mut token_votes = vec![];
        for token in self.swap.supported_tokens().await {
            if self.swap.registry().is_native(&token) {
                continue
            }

            let token_amount = self.swap.token_votes(voter, campaign_id, project_id, token).await;
            if token_amount.is_zero() {
                continue
            }

            let quote = self.swap.quote_units(token, token_amount).await;
            let descriptor = self.swap.resolve_token(token).await;
            token_votes.push(TokenVote {
                token,
                symbol: descriptor.symbol,
                token_amount,
                native_equivalent: quote.vote_native_amount,
            });
        }

        let summary = VoteSummary::new(campaign_id, project_id, direct, token_votes);
        self.summaries
            .write()
            .await
            .insert(summary_key(campaign_id, project_id), summary.clone());
        summary
    }

    /// The account's votes across every project of a campaign.
    pub async fn get_user_campaign_votes(&self, campaign_id: U256) -> CampaignVoteSummary {
        let _loading = LoadingGuard::new(&self.loading);

        let Some(voter) = self.swap.account() else {
            return CampaignVoteSummary::new(campaign_id, U256::zero(), &[])
        };

        let direct = match self.voting.user_campaign_votes(campaign_id, voter).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    target: "vote::get_user_campaign_votes",
                    "Failed reading campaign votes: {e}"
                );
                U256::zero()
            }
        };

        let project_ids = match self.voting.campaign_project_ids(campaign_id).await {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "vote::get_user_campaign_votes", "Failed reading projects: {e}");
                vec![]
            }
        };

        let mut projects = Vec::with_capacity(project_ids.len());
        for project_id in project_ids {
            projects.push(self.get_user_vote_summary(campaign_id, project_id).await);
        }

        CampaignVoteSummary::new(campaign_id, direct, &projects)
    }

    /// Campaign summaries for every listed campaign, including those the
    /// account never voted in.
    pub async fn get_all_user_votes(&self) -> Vec<CampaignVoteSummary> {
        let _loading = LoadingGuard::new(&self.loading);

        let count = match self.voting.campaign_count().await {
            Ok(v) => v,
            Err(e) => {
                error!(target: "vote::get_all_user_votes", "Failed reading campaign count: {e}");
                return vec![]
            }
        };

        let count = if count > U256::from(MAX_CAMPAIGNS) {
            warn!(
                target: "vote::get_all_user_votes",
                "Only walking the first {MAX_CAMPAIGNS} of {count} campaigns"
            );
            MAX_CAMPAIGNS
        } else {
            count.as_usize()
        };

        let mut campaigns = Vec::with_capacity(count);
        for campaign_id in 0..count {
            campaigns.push(self.get_user_campaign_votes(U256::from(campaign_id)).await);
        }

        campaigns
    }

    /// Render a smallest-unit amount as `"{decimal} {symbol}"`.
    pub async fn format_amount(&self, token: Address, amount: U256) -> String {
        let descriptor = self.swap.describe(token).await;
        format!("{} {}", encode_base10(amount, descriptor.decimals as usize), descriptor.symbol)
    }

    pub async fn cached_summary(&self, campaign_id: U256, project_id: U256) -> Option<VoteSummary> {
        self.summaries.read().await.get(&summary_key(campaign_id, project_id)).cloned()
    }

    pub async fn clear_cache(&self) {
        self.summaries.write().await.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn error(&self) -> Option<String> {
        self.error.lock().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.error.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_guard_nests() {
        let counter = AtomicUsize::new(0);
        {
            let _outer = LoadingGuard::new(&counter);
            {
                let _inner = LoadingGuard::new(&counter);
                assert_eq!(counter.load(Ordering::SeqCst), 2);
            }
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn keys() {
        assert_eq!(summary_key(U256::from(3), U256::from(12)), "3-12");
    }
}
