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

use std::{env, process::exit, str::FromStr, sync::Arc};

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, U256},
};
use log::{debug, info};
use structopt::StructOpt;

use sovereign_seas::{
    config::{NetworkConfig, SeasConfig},
    contract::{
        evm::{EvmSwapper, EvmTokens, EvmVoting},
        SwapperContract,
    },
    error::friendly_error,
    swap::{SwapOutcome, TokenSwapClient},
    util::{
        cli::{init_logger, spawn_config},
        parse::{encode_base10, parse_address, parse_positive_amount},
        path::get_config_path,
    },
    vote::{CampaignVoteSummary, TokenVote, VoteAggregator, VoteOutcome, VoteSummary},
    Error, Result,
};

const CONFIG_FILE: &str = "seasctl_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../seasctl_config.toml");

/// Environment variable holding the signing key, preferred over the config
const PRIVATE_KEY_ENV: &str = "SEAS_PRIVATE_KEY";

#[derive(StructOpt)]
#[structopt(name = "seasctl", about = env!("CARGO_PKG_DESCRIPTION"))]
struct Args {
    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,

    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long)]
    /// Network to use (celo, alfajores, localnet)
    network: Option<String>,

    #[structopt(long)]
    /// Set log file output
    log: Option<String>,

    #[structopt(subcommand)]
    command: Subcmd,
}

#[derive(StructOpt)]
enum Subcmd {
    /// List the tokens the swapper accepts
    Tokens,

    /// Quote the native vote a token amount would yield
    Quote {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,

        /// Human-readable token amount
        amount: String,
    },

    /// Minimum native output the swapper accepts for a token amount
    MinAmount {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,

        /// Human-readable token amount
        amount: String,

        #[structopt(long)]
        /// Slippage tolerance in basis points
        slippage: Option<u32>,
    },

    /// Vote for a project, with the native currency or a supported token
    Vote {
        /// Campaign id
        campaign: u64,

        /// Project id
        project: u64,

        /// Human-readable amount
        amount: String,

        #[structopt(long, parse(try_from_str = parse_address))]
        /// Token to vote with (default is the native currency)
        token: Option<Address>,

        #[structopt(long)]
        /// Slippage tolerance in basis points for token votes
        slippage: Option<u32>,
    },

    /// Show the account's votes for a project
    Summary {
        /// Campaign id
        campaign: u64,

        /// Project id
        project: u64,
    },

    /// Show the account's votes across a campaign
    Campaign {
        /// Campaign id
        campaign: u64,
    },

    /// Show the account's votes across every campaign
    All,

    /// Token balance of an account
    Balance {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,

        #[structopt(parse(try_from_str = parse_address))]
        /// Account (default is the signing account)
        owner: Option<Address>,
    },

    /// Swapper configuration of a token
    TokenConfig {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,
    },

    /// Swapper owner operations
    Admin {
        #[structopt(subcommand)]
        command: AdminSubcmd,
    },
}

#[derive(StructOpt)]
enum AdminSubcmd {
    /// Accept a new token for swapping
    AddToken {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,

        /// Uniswap pool fee tier (e.g. 3000 for 0.3%)
        pool_fee: u32,

        /// Smallest accepted human-readable token amount
        min_amount: String,
    },

    /// Stop accepting a token
    RemoveToken {
        #[structopt(parse(try_from_str = parse_address))]
        /// Token address
        token: Address,
    },

    /// Send accumulated fees to a recipient
    WithdrawFees {
        #[structopt(parse(try_from_str = parse_address))]
        /// Recipient address
        recipient: Address,
    },
}

struct Seasctl {
    aggregator: VoteAggregator,
    default_slippage_bps: u32,
}

impl Seasctl {
    fn new<M: Middleware + 'static>(
        client: Arc<M>,
        network: &NetworkConfig,
        account: Option<Address>,
    ) -> Self {
        let voting = Arc::new(EvmVoting::new(network.voting_contract, client.clone()));
        let tokens = Arc::new(EvmTokens::new(client.clone()));
        let swapper = network.swapper_contract.map(|address| {
            Arc::new(EvmSwapper::new(address, client.clone())) as Arc<dyn SwapperContract>
        });

        let swap =
            Arc::new(TokenSwapClient::new(swapper, tokens, account, network.token_registry()));

        Self {
            aggregator: VoteAggregator::new(voting, swap),
            default_slippage_bps: network.default_slippage_bps,
        }
    }

    fn swap(&self) -> &TokenSwapClient {
        self.aggregator.swap_client()
    }

    fn native(&self) -> Address {
        self.swap().registry().native_address()
    }

    async fn tokens(&self) -> Result<()> {
        let tokens = self.swap().load_supported_tokens().await;
        if tokens.is_empty() {
            println!("No supported tokens");
            return Ok(())
        }

        for token in tokens {
            let descriptor = self.swap().resolve_token(token).await;
            println!(
                "{:?}  {:<10} {:>2} decimals  {}",
                token, descriptor.symbol, descriptor.decimals, descriptor.display_name,
            );
        }

        Ok(())
    }

    async fn quote(&self, token: Address, amount: &str) -> Result<()> {
        let quote = self.swap().get_expected_vote_amount(token, amount).await;
        let expected = self.aggregator.format_amount(self.native(), quote.expected_native_amount);
        let voted = self.aggregator.format_amount(self.native(), quote.vote_native_amount);
        println!("Expected swap output: {}", expected.await);
        println!("Registered as vote:   {}", voted.await);
        Ok(())
    }

    async fn min_amount(&self, token: Address, amount: &str, slippage: u32) -> Result<()> {
        let minimum = self.swap().calculate_minimum_native_amount(token, amount, slippage).await?;
        println!(
            "Minimum output at {slippage} bps: {}",
            self.aggregator.format_amount(self.native(), minimum).await
        );
        Ok(())
    }

    async fn vote(
        &self,
        token: Address,
        campaign: U256,
        project: U256,
        amount: &str,
        slippage: u32,
    ) -> Result<()> {
        match self.aggregator.try_vote(token, campaign, project, amount, slippage).await {
            Ok(outcome) => {
                println!("Vote confirmed in {:?}", outcome.tx_hash());
                if let VoteOutcome::TokenSwap(SwapOutcome::ConfirmedUnparsed { .. }) = outcome {
                    println!("Swap succeeded, but its amounts were not found in the receipt");
                }
            }
            Err(e) => {
                eprintln!("Vote failed: {}", friendly_error(&e.to_string()));
                exit(1);
            }
        }

        if let Some(summary) = self.aggregator.cached_summary(campaign, project).await {
            self.print_summary(&summary).await;
        }

        Ok(())
    }

    async fn print_votes(&self, direct: U256, token_votes: &[TokenVote], total: U256) {
        let native = self.native();
        println!("  Direct: {}", self.aggregator.format_amount(native, direct).await);
        for vote in token_votes {
            println!(
                "  {}: ~{}",
                self.aggregator.format_amount(vote.token, vote.token_amount).await,
                self.aggregator.format_amount(native, vote.native_equivalent).await,
            );
        }
        println!("  Total:  {}", self.aggregator.format_amount(native, total).await);
    }

    async fn print_summary(&self, summary: &VoteSummary) {
        println!("Campaign {} project {}", summary.campaign_id(), summary.project_id());
        self.print_votes(
            summary.direct_native_amount(),
            summary.token_votes(),
            summary.total_native_equivalent(),
        )
        .await;
    }

    async fn print_campaign(&self, summary: &CampaignVoteSummary) {
        println!("Campaign {} ({} projects)", summary.campaign_id(), summary.project_count());
        self.print_votes(
            summary.direct_native_amount(),
            summary.token_votes(),
            summary.total_native_equivalent(),
        )
        .await;
    }

    async fn balance(&self, token: Address, owner: Address) -> Result<()> {
        let descriptor = self.swap().resolve_token(token).await;
        let balance = self.swap().token_balance(token, owner).await?;
        println!("{} {}", encode_base10(balance, descriptor.decimals as usize), descriptor.symbol);
        Ok(())
    }

    async fn token_config(&self, token: Address) -> Result<()> {
        let config = self.swap().token_config(token).await?;
        println!("Supported:  {}", config.is_supported);
        println!("Pool fee:   {}", config.pool_fee);
        println!("Min amount: {}", self.aggregator.format_amount(token, config.min_amount).await);
        Ok(())
    }

    async fn admin(&self, command: AdminSubcmd) -> Result<()> {
        let receipt = match command {
            AdminSubcmd::AddToken { token, pool_fee, min_amount } => {
                let descriptor = self.swap().resolve_token(token).await;
                let min_amount = parse_positive_amount(&min_amount, descriptor.decimals)?;
                self.swap().add_token(token, pool_fee, min_amount).await?
            }
            AdminSubcmd::RemoveToken { token } => self.swap().remove_token(token).await?,
            AdminSubcmd::WithdrawFees { recipient } => self.swap().withdraw_fees(recipient).await?,
        };

        println!("Confirmed in {:?}", receipt.transaction_hash);
        Ok(())
    }

    async fn run(&self, command: Subcmd) -> Result<()> {
        match command {
            Subcmd::Tokens => self.tokens().await,

            Subcmd::Quote { token, amount } => self.quote(token, &amount).await,

            Subcmd::MinAmount { token, amount, slippage } => {
                self.min_amount(token, &amount, slippage.unwrap_or(self.default_slippage_bps)).await
            }

            Subcmd::Vote { campaign, project, amount, token, slippage } => {
                let token = token.unwrap_or_else(|| self.native());
                let slippage = slippage.unwrap_or(self.default_slippage_bps);
                self.vote(token, campaign.into(), project.into(), &amount, slippage).await
            }

            Subcmd::Summary { campaign, project } => {
                let summary =
                    self.aggregator.get_user_vote_summary(campaign.into(), project.into()).await;
                self.print_summary(&summary).await;
                Ok(())
            }

            Subcmd::Campaign { campaign } => {
                let summary = self.aggregator.get_user_campaign_votes(campaign.into()).await;
                self.print_campaign(&summary).await;
                Ok(())
            }

            Subcmd::All => {
                let mut campaigns = self.aggregator.get_all_user_votes().await;
                campaigns.retain(|c| !c.total_native_equivalent().is_zero());
                if campaigns.is_empty() {
                    println!("No votes found");
                }
                for summary in campaigns {
                    self.print_campaign(&summary).await;
                }
                Ok(())
            }

            Subcmd::Balance { token, owner } => {
                let Some(owner) = owner.or(self.swap().account()) else {
                    return Err(Error::WalletNotConnected)
                };
                self.balance(token, owner).await
            }

            Subcmd::TokenConfig { token } => self.token_config(token).await,

            Subcmd::Admin { command } => self.admin(command).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::from_args();

    init_logger(args.verbose.into(), args.log.as_deref())?;

    let config_path = get_config_path(args.config, CONFIG_FILE)?;
    spawn_config(&config_path, CONFIG_FILE_CONTENTS.as_bytes())?;

    let network = match args.network {
        Some(network) => network,
        None => SeasConfig::new(&config_path)?.network,
    };
    let network_config = NetworkConfig::try_from((&config_path, &network))?;
    debug!(target: "seasctl", "Using {network}: {network_config:?}");

    let provider = Provider::<Http>::try_from(network_config.endpoint.as_str())?;

    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| Error::ContractReadFailed(format!("eth_chainId: {e}")))?;
    if chain_id != U256::from(network_config.chain_id) {
        return Err(Error::ConfigError(format!(
            "Endpoint reports chain {chain_id}, {network} expects {}",
            network_config.chain_id
        )))
    }

    let private_key = env::var(PRIVATE_KEY_ENV).ok().or_else(|| network_config.private_key.clone());

    let seasctl = match private_key {
        Some(key) => {
            let wallet = LocalWallet::from_str(key.trim().trim_start_matches("0x"))
                .map_err(|e| Error::ConfigError(format!("Invalid private key: {e}")))?
                .with_chain_id(network_config.chain_id);
            let account = wallet.address();
            info!(target: "seasctl", "Signing as {account:?}");
            let client = Arc::new(SignerMiddleware::new(provider, wallet));
            Seasctl::new(client, &network_config, Some(account))
        }
        None => {
            info!(target: "seasctl", "No private key configured, running read-only");
            Seasctl::new(Arc::new(provider), &network_config, None)
        }
    };

    seasctl.run(args.command).await
}
