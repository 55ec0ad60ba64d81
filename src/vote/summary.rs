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

use ethers::types::{Address, U256};

/// Votes an account cast with one token on one target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenVote {
    pub token: Address,
    pub symbol: String,
    /// Amount in the token's smallest unit
    pub token_amount: U256,
    /// Spot-rate native value of `token_amount` after fees
    pub native_equivalent: U256,
}

fn total(direct: U256, token_votes: &[TokenVote]) -> U256 {
    token_votes.iter().fold(direct, |acc, v| acc.saturating_add(v.native_equivalent))
}

/// An account's votes for one project. The total is always derived from
/// the direct amount and the token votes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteSummary {
    campaign_id: U256,
    project_id: U256,
    direct_native_amount: U256,
    token_votes: Vec<TokenVote>,
    total_native_equivalent: U256,
}

impl VoteSummary {
    pub fn new(
        campaign_id: U256,
        project_id: U256,
        direct_native_amount: U256,
        token_votes: Vec<TokenVote>,
    ) -> Self {
        let total_native_equivalent = total(direct_native_amount, &token_votes);
        Self { campaign_id, project_id, direct_native_amount, token_votes, total_native_equivalent }
    }

    pub fn empty(campaign_id: U256, project_id: U256) -> Self {
        Self::new(campaign_id, project_id, U256::zero(), vec![])
    }

    pub fn campaign_id(&self) -> U256 {
        self.campaign_id
    }

    pub fn project_id(&self) -> U256 {
        self.project_id
    }

    pub fn direct_native_amount(&self) -> U256 {
        self.direct_native_amount
    }

    pub fn token_votes(&self) -> &[TokenVote] {
        &self.token_votes
    }

    pub fn total_native_equivalent(&self) -> U256 {
        self.total_native_equivalent
    }
}

/// An account's votes across a whole campaign, token votes merged by
/// token address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignVoteSummary {
    campaign_id: U256,
    direct_native_amount: U256,
    token_votes: Vec<TokenVote>,
    total_native_equivalent: U256,
    project_count: usize,
}

impl CampaignVoteSummary {
    /// `direct_native_amount` is the campaign-scoped direct total. Only the
    /// token votes of `projects` are used, their direct amounts are
    /// already part of it.
    pub fn new(campaign_id: U256, direct_native_amount: U256, projects: &[VoteSummary]) -> Self {
        let mut token_votes: Vec<TokenVote> = vec![];

        for vote in projects.iter().flat_map(|p| p.token_votes()) {
            match token_votes.iter_mut().find(|v| v.token == vote.token) {
                Some(merged) => {
                    merged.token_amount = merged.token_amount.saturating_add(vote.token_amount);
                    merged.native_equivalent =
                        merged.native_equivalent.saturating_add(vote.native_equivalent);
                }
                None => token_votes.push(vote.clone()),
            }
        }

        let total_native_equivalent = total(direct_native_amount, &token_votes);

        Self {
            campaign_id,
            direct_native_amount,
            token_votes,
            total_native_equivalent,
            project_count: projects.len(),
        }
    }

    pub fn campaign_id(&self) -> U256 {
        self.campaign_id
    }

    pub fn direct_native_amount(&self) -> U256 {
        self.direct_native_amount
    }

    pub fn token_votes(&self) -> &[TokenVote] {
        &self.token_votes
    }

    pub fn total_native_equivalent(&self) -> U256 {
        self.total_native_equivalent
    }

    pub fn project_count(&self) -> usize {
        self.project_count
    }
}
