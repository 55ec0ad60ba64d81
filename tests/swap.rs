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

use sovereign_seas::{
    swap::{SwapOutcome, SwapRequest},
    testutils::{known_token, native_token, TestHarness},
    Error,
};

fn token(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

#[test]
fn load_supported_tokens_is_idempotent() {
    let h = TestHarness::new();
    let usdc = token(0x05dc);
    let mystery = token(0xab12_0000_3cd4);

    h.tokens.set_metadata(usdc, "USDC", 6);
    h.tokens.set_metadata(mystery, "Unknown", 18);
    h.swapper.add_supported(usdc, 10_000);
    h.swapper.add_supported(known_token(), 10_000);
    h.swapper.add_supported(mystery, 10_000);

    let client = h.swap_client();
    smol::block_on(async {
        let first = client.load_supported_tokens().await;
        assert_eq!(first, vec![usdc, known_token(), mystery]);

        let usdc_desc = client.resolve_token(usdc).await;
        assert_eq!(usdc_desc.symbol, "USDC");
        assert_eq!(usdc_desc.decimals, 6);

        // Contract metadata unreadable, taken from the well-known table
        let cusd_desc = client.resolve_token(known_token()).await;
        assert_eq!(cusd_desc.symbol, "cUSD");
        assert_eq!(cusd_desc.display_name, "Celo Dollar");
        assert_eq!(cusd_desc.decimals, 18);

        // Placeholder symbol, synthesized from the address
        let mystery_desc = client.resolve_token(mystery).await;
        assert!(mystery_desc.symbol.starts_with("Token-0x"));
        assert_eq!(mystery_desc.decimals, 18);

        let symbol_reads = h.log.count("symbol");
        let second = client.load_supported_tokens().await;
        assert_eq!(first, second);
        assert_eq!(client.resolve_token(usdc).await, usdc_desc);
        assert_eq!(client.resolve_token(known_token()).await, cusd_desc);
        assert_eq!(client.resolve_token(mystery).await, mystery_desc);
        assert_eq!(h.log.count("symbol"), symbol_reads);
    });
}

#[test]
fn load_supported_tokens_degrades() {
    let h = TestHarness::new();
    h.swapper.add_supported(token(1), 10_000);
    h.swapper.add_supported(token(2), 10_000);
    h.swapper.add_supported(token(3), 10_000);
    h.swapper.make_unreadable(1);

    let client = h.swap_client();
    smol::block_on(async {
        assert_eq!(client.load_supported_tokens().await, vec![token(1), token(3)]);

        h.swapper.fail_count(true);
        assert!(client.load_supported_tokens().await.is_empty());

        assert!(h.bare_swap_client().load_supported_tokens().await.is_empty());
    });
}

#[test]
fn unread_decimals_are_retried() {
    let h = TestHarness::new();
    let usdc = token(0x05dc);
    h.swapper.add_supported(usdc, 10_000);

    let client = h.swap_client();
    smol::block_on(async {
        // Outside the well-known table, the guess is not kept
        assert_eq!(client.resolve_token(usdc).await.decimals, 18);
        assert_eq!(client.describe(usdc).await.decimals, 18);

        h.tokens.set_metadata(usdc, "USDC", 6);
        let outcome = client.swap_and_vote(usdc, 1.into(), 1.into(), "1.5", 100).await.unwrap();
        let SwapOutcome::Confirmed(receipt) = outcome else { panic!("expected a decoded receipt") };
        assert_eq!(receipt.token_amount, U256::from(1_500_000));

        let decimal_reads = h.log.count("decimals");
        assert_eq!(client.resolve_token(usdc).await.symbol, "USDC");
        assert_eq!(h.log.count("decimals"), decimal_reads);
    });
}

#[test]
fn native_sentinel_resolves_locally() {
    let h = TestHarness::new();
    let client = h.swap_client();

    let native = smol::block_on(client.resolve_token(native_token()));
    assert!(native.is_native);
    assert_eq!(native.symbol, "CELO");
    assert_eq!(native.decimals, 18);
    assert!(h.log.calls().is_empty());
}

#[test]
fn expected_vote_amount() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);
    // Half a native unit per token, one percent fee
    h.swapper.add_supported(t, 5_000);
    h.swapper.set_fee_bps(100);

    let client = h.swap_client();
    smol::block_on(async {
        let quote = client.get_expected_vote_amount(t, "2").await;
        assert_eq!(quote.expected_native_amount, ether(1));
        assert_eq!(quote.vote_native_amount, ether(99) / U256::from(100));

        // Unparseable or non-positive amounts quote zero
        let quote = client.get_expected_vote_amount(t, "abc").await;
        assert_eq!(quote.expected_native_amount, U256::zero());
        assert_eq!(client.get_expected_vote_amount(t, "0").await.vote_native_amount, U256::zero());

        h.swapper.fail_quotes(true);
        let quote = client.get_expected_vote_amount(t, "2").await;
        assert!(quote.expected_native_amount.is_zero());
        assert!(quote.vote_native_amount.is_zero());

        let quote = h.bare_swap_client().get_expected_vote_amount(t, "2").await;
        assert!(quote.expected_native_amount.is_zero());
    });
}

#[test]
fn minimum_native_amount_follows_slippage() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);
    h.swapper.add_supported(t, 10_000);

    let client = h.swap_client();
    smol::block_on(async {
        let expected = client.get_expected_vote_amount(t, "10").await.expected_native_amount;
        assert_eq!(expected, ether(10));

        let exact = client.calculate_minimum_native_amount(t, "10", 0).await.unwrap();
        assert_eq!(exact, expected);

        let tolerant = client.calculate_minimum_native_amount(t, "10", 500).await.unwrap();
        assert_eq!(tolerant, ether(95) / U256::from(10));

        h.log.clear();
        let err = client.calculate_minimum_native_amount(t, "10", 10_001).await.unwrap_err();
        assert!(matches!(err, Error::SlippageOutOfRange(10_001)));
        assert!(h.log.calls().is_empty());

        // Errors propagate instead of degrading to zero
        h.swapper.fail_quotes(true);
        assert!(client.calculate_minimum_native_amount(t, "10", 100).await.is_err());

        let err = h.bare_swap_client().calculate_minimum_native_amount(t, "10", 100).await;
        assert!(matches!(err, Err(Error::SwapperNotConfigured)));
    });
}

#[test]
fn swap_and_vote_awaits_approval_first() {
    let h = TestHarness::new();
    let usdc = token(0x05dc);
    h.tokens.set_metadata(usdc, "USDC", 6);
    h.swapper.add_supported(usdc, 10_000);

    let client = h.swap_client();
    let outcome =
        smol::block_on(client.swap_and_vote(usdc, 1.into(), 2.into(), "1.5", 100)).unwrap();

    let SwapOutcome::Confirmed(receipt) = outcome else { panic!("expected a decoded receipt") };
    assert_eq!(receipt.voter, h.voter);
    assert_eq!(receipt.token, usdc);
    assert_eq!(receipt.campaign_id, U256::from(1));
    assert_eq!(receipt.project_id, U256::from(2));
    // 1.5 with 6 decimals
    assert_eq!(receipt.token_amount, U256::from(1_500_000));
    assert!(receipt.native_voted <= receipt.native_swapped);

    let calls = h.log.calls();
    let approve = calls.iter().position(|c| c == "approve").unwrap();
    let swap = calls.iter().position(|c| c == "swapAndVoteToken").unwrap();
    assert!(approve < swap);
    assert_eq!(h.log.count("approve"), 1);
    assert_eq!(h.log.count("swapAndVoteToken"), 1);
}

#[test]
fn swap_without_event_is_unparsed() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);
    h.swapper.add_supported(t, 10_000);
    h.swapper.emit_events(false);

    let client = h.swap_client();
    let outcome = smol::block_on(client.swap_and_vote(t, 3.into(), 4.into(), "1", 0)).unwrap();

    assert!(outcome.native_voted().is_none());
    let SwapOutcome::ConfirmedUnparsed { request, .. } = outcome else {
        panic!("expected an unparsed outcome")
    };
    assert_eq!(
        request,
        SwapRequest {
            voter: h.voter,
            token: t,
            campaign_id: 3.into(),
            project_id: 4.into(),
            token_amount: ether(1),
            min_native_amount: ether(1),
        }
    );
}

#[test]
fn reverted_approval_aborts_swap() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);
    h.swapper.add_supported(t, 10_000);
    h.tokens.revert_approvals(true);

    let client = h.swap_client();
    let err = smol::block_on(client.swap_and_vote(t, 1.into(), 1.into(), "1", 100)).unwrap_err();
    assert!(matches!(err, Error::TransactionReverted(_)));
    assert_eq!(h.log.count("swapAndVoteToken"), 0);
}

#[test]
fn reverted_swap_is_an_error() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);
    h.swapper.add_supported(t, 10_000);
    h.swapper.revert_swaps(true);

    let client = h.swap_client();
    let err = smol::block_on(client.swap_and_vote(t, 1.into(), 1.into(), "1", 100)).unwrap_err();
    assert!(matches!(err, Error::TransactionReverted(_)));
}

#[test]
fn swap_validates_before_any_call() {
    let h = TestHarness::new();
    let t = token(7);
    let client = h.swap_client();

    smol::block_on(async {
        let err = client.swap_and_vote(native_token(), 1.into(), 1.into(), "1", 100).await;
        assert!(matches!(err, Err(Error::NativeTokenSwap)));

        for amount in ["0", "-1", "0.000"] {
            let err = client.swap_and_vote(t, 1.into(), 1.into(), amount, 100).await;
            assert!(matches!(err, Err(Error::NonPositiveAmount)), "{amount}");
        }

        let err = client.swap_and_vote(t, 1.into(), 1.into(), "1", 20_000).await;
        assert!(matches!(err, Err(Error::SlippageOutOfRange(20_000))));

        let err = h.bare_swap_client().swap_and_vote(t, 1.into(), 1.into(), "1", 100).await;
        assert!(matches!(err, Err(Error::WalletNotConnected)));
    });

    assert!(h.log.calls().is_empty());
}

#[test]
fn admin_operations_refresh_token_list() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_metadata(t, "TKN", 18);

    let client = h.swap_client();
    smol::block_on(async {
        assert!(client.supported_tokens().await.is_empty());

        client.add_token(t, 3000, U256::exp10(15)).await.unwrap();
        assert_eq!(client.supported_tokens().await, vec![t]);
        assert!(client.token_config(t).await.unwrap().is_supported);

        client.remove_token(t).await.unwrap();
        assert!(client.supported_tokens().await.is_empty());
        assert!(!client.token_config(t).await.unwrap().is_supported);

        client.withdraw_fees(h.voter).await.unwrap();
        assert_eq!(h.log.count("withdrawFees"), 1);
    });
}

#[test]
fn token_balance() {
    let h = TestHarness::new();
    let t = token(7);
    h.tokens.set_balance(t, h.voter, ether(3));

    let client = h.swap_client();
    smol::block_on(async {
        assert_eq!(client.token_balance(t, h.voter).await.unwrap(), ether(3));
        assert!(client.token_balance(t, token(9)).await.unwrap().is_zero());
    });
}
