//! Tracked-asset allowances: outflow measured around each execution.

use keyward::{AccountConfig, AccountError, AuthError};
use keyward_core::{Address, Call, KeyId, Resource, TokenId};
use keyward_perms::{AssetBalances, SessionRequest};
use keyward_testkit::fixtures::{
    nft_transfer, random_address, reentrant_execute, token_transfer, AccountFixture,
};
use keyward_testkit::Script;

const KEY: KeyId = KeyId(1);

fn coin_fixture(held: u128, allowance: u128) -> (AccountFixture, Address) {
    let mut fixture = AccountFixture::new();
    let coin = fixture.deploy_token(held);
    fixture.grant_session(KEY, &SessionRequest::new(0).fungible(coin, allowance));
    (fixture, coin)
}

fn art_fixture() -> (AccountFixture, Address) {
    let mut fixture = AccountFixture::new();
    let art = fixture.deploy_collection(&[1, 2, 3]);
    fixture.grant_session(
        KEY,
        &SessionRequest::new(0).non_fungible(art, [(TokenId(1), 1), (TokenId(2), 0)]),
    );
    (fixture, art)
}

#[test]
fn test_fungible_outflow_within_allowance() {
    let (mut fixture, coin) = coin_fixture(500, 100);
    let friend = random_address();

    fixture.execute(KEY, token_transfer(coin, friend, 60)).unwrap();

    assert_eq!(fixture.remaining(KEY, Resource::Fungible(coin)), 40);
    assert_eq!(fixture.chain.balance_of(&coin, &friend), 60);
    assert_eq!(fixture.chain.balance_of(&coin, &fixture.account), 440);
}

#[test]
fn test_fungible_outflow_over_allowance_rolls_back() {
    let (mut fixture, coin) = coin_fixture(500, 100);
    let friend = random_address();
    let before = fixture.chain.state().clone();

    let err = fixture.execute(KEY, token_transfer(coin, friend, 150)).unwrap_err();

    assert_eq!(
        err.auth(),
        Some(&AuthError::InsufficientAllowance {
            key: KEY,
            resource: Resource::Fungible(coin),
            requested: 150,
            remaining: 100,
        })
    );
    assert_eq!(fixture.chain.state(), &before);
    assert_eq!(fixture.chain.balance_of(&coin, &friend), 0);
}

#[test]
fn test_fungible_allowance_accumulates() {
    let (mut fixture, coin) = coin_fixture(500, 100);
    let friend = random_address();

    fixture.execute(KEY, token_transfer(coin, friend, 70)).unwrap();
    assert!(fixture.execute(KEY, token_transfer(coin, friend, 31)).is_err());
    fixture.execute(KEY, token_transfer(coin, friend, 30)).unwrap();

    assert_eq!(fixture.remaining(KEY, Resource::Fungible(coin)), 0);
    assert_eq!(fixture.chain.balance_of(&coin, &friend), 100);
}

#[test]
fn test_inflow_is_not_credited() {
    let (mut fixture, coin) = coin_fixture(500, 100);
    let friend = random_address();
    let account = fixture.account;

    fixture.execute(KEY, token_transfer(coin, friend, 50)).unwrap();
    fixture
        .chain
        .transact(&friend, &token_transfer(coin, account, 50))
        .unwrap();

    assert_eq!(fixture.chain.balance_of(&coin, &account), 500);
    assert_eq!(fixture.remaining(KEY, Resource::Fungible(coin)), 50);
}

#[test]
fn test_untracked_fungible_moves_freely() {
    let (mut fixture, _coin) = coin_fixture(500, 0);
    let other = fixture.deploy_token(500);

    fixture
        .execute(KEY, token_transfer(other, random_address(), 500))
        .unwrap();
    assert_eq!(fixture.chain.balance_of(&other, &fixture.account), 0);
}

#[test]
fn test_tracked_token_with_zero_allowance() {
    let (mut fixture, art) = art_fixture();
    let before = fixture.chain.state().clone();

    let err = fixture.execute(KEY, nft_transfer(art, random_address(), 2)).unwrap_err();

    assert_eq!(
        err.auth(),
        Some(&AuthError::InsufficientAllowance {
            key: KEY,
            resource: Resource::NonFungible(art, Some(TokenId(2))),
            requested: 1,
            remaining: 0,
        })
    );
    assert_eq!(fixture.chain.state(), &before);
    assert_eq!(fixture.chain.owner_of(&art, TokenId(2)), Some(fixture.account));
}

#[test]
fn test_tracked_token_allowance_is_spent_once() {
    let (mut fixture, art) = art_fixture();
    let friend = random_address();
    let account = fixture.account;

    fixture.execute(KEY, nft_transfer(art, friend, 1)).unwrap();
    assert_eq!(fixture.chain.owner_of(&art, TokenId(1)), Some(friend));
    assert_eq!(fixture.remaining(KEY, Resource::NonFungible(art, Some(TokenId(1)))), 0);

    // Returned, then sent again: the allowance is gone
    fixture.chain.transact(&friend, &nft_transfer(art, account, 1)).unwrap();
    let err = fixture.execute(KEY, nft_transfer(art, friend, 1)).unwrap_err();
    assert!(matches!(err.auth(), Some(AuthError::InsufficientAllowance { .. })));
    assert_eq!(fixture.chain.owner_of(&art, TokenId(1)), Some(account));
}

#[test]
fn test_untracked_token_of_tracked_collection() {
    let (mut fixture, art) = art_fixture();

    let err = fixture.execute(KEY, nft_transfer(art, random_address(), 3)).unwrap_err();
    assert_eq!(
        err.auth(),
        Some(&AuthError::InsufficientAllowance {
            key: KEY,
            resource: Resource::NonFungible(art, None),
            requested: 1,
            remaining: 0,
        })
    );
    assert_eq!(fixture.chain.owner_of(&art, TokenId(3)), Some(fixture.account));
}

#[test]
fn test_accounting_disabled_by_config() {
    let mut fixture = AccountFixture::with_config(AccountConfig {
        asset_accounting: false,
        ..AccountConfig::default()
    });
    let coin = fixture.deploy_token(500);
    fixture.grant_session(KEY, &SessionRequest::new(0).fungible(coin, 10));

    fixture
        .execute(KEY, token_transfer(coin, random_address(), 400))
        .unwrap();
    assert_eq!(fixture.remaining(KEY, Resource::Fungible(coin)), 10);
}

#[test]
fn test_outflow_through_reentry_is_seen_by_outer_session() {
    // Key 1 tracks the coin tightly; key 2 is untracked. A callee holding
    // key 2 drains coin through the account while key 1's execution runs.
    let (mut fixture, coin) = coin_fixture(500, 10);
    let (account, admin) = (fixture.account, fixture.admin);
    let sink = random_address();
    let key2 = KeyId::new(2);

    let drainer = fixture.deploy_contract(
        Script::new().call(reentrant_execute(account, key2, token_transfer(coin, sink, 300))),
    );
    fixture.chain.create_key(&account, &admin, key2, &drainer).unwrap();
    fixture
        .chain
        .create_session(&account, &admin, key2, &SessionRequest::new(0))
        .unwrap();
    let before = fixture.chain.state().clone();

    let err = fixture.execute(KEY, Call::transfer(drainer, 0)).unwrap_err();
    assert_eq!(
        err.auth(),
        Some(&AuthError::InsufficientAllowance {
            key: KEY,
            resource: Resource::Fungible(coin),
            requested: 300,
            remaining: 10,
        })
    );
    assert_eq!(fixture.chain.state(), &before);
}

#[test]
fn test_nested_tracking_charges_both_sessions() {
    let (mut fixture, coin) = coin_fixture(500, 100);
    let (account, admin) = (fixture.account, fixture.admin);
    let sink = random_address();
    let key2 = KeyId::new(2);

    let spender = fixture.deploy_contract(
        Script::new().call(reentrant_execute(account, key2, token_transfer(coin, sink, 40))),
    );
    fixture.chain.create_key(&account, &admin, key2, &spender).unwrap();
    fixture
        .chain
        .create_session(&account, &admin, key2, &SessionRequest::new(0).fungible(coin, 50))
        .unwrap();

    fixture.execute(KEY, Call::transfer(spender, 0)).unwrap();

    assert_eq!(fixture.remaining(key2, Resource::Fungible(coin)), 10);
    assert_eq!(fixture.remaining(KEY, Resource::Fungible(coin)), 60);
    assert_eq!(fixture.chain.balance_of(&coin, &sink), 40);
}

#[test]
fn test_error_is_account_error_with_auth() {
    let (mut fixture, coin) = coin_fixture(5, 1);
    let err = fixture
        .execute(KEY, token_transfer(coin, random_address(), 5))
        .unwrap_err();
    assert!(matches!(err, AccountError::Perms(_)));
}
