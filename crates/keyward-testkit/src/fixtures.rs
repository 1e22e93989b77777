//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use bytes::Bytes;
use rand::Rng;

use keyward::{AccountConfig, AccountError, Environment, KeyRegistry};
use keyward_core::{Address, Call, KeyId, Resource, Session, TokenId};
use keyward_perms::SessionRequest;

use crate::chain::{Chain, ChainConfig};
use crate::message::{AccountCall, AssetCall};
use crate::script::Script;

/// Native value every fixture account starts with.
pub const INITIAL_BALANCE: u128 = 1_000;

/// A fresh random address.
pub fn random_address() -> Address {
    Address::from_bytes(rand::thread_rng().gen())
}

/// A chain with one funded key account, its admin, and a prospective key
/// holder.
pub struct AccountFixture {
    pub chain: Chain,
    pub account: Address,
    pub admin: Address,
    pub holder: Address,
}

impl AccountFixture {
    /// Create a fixture with random addresses and default configuration.
    pub fn new() -> Self {
        Self::with_config(AccountConfig::default())
    }

    /// Create a fixture with the given account configuration.
    pub fn with_config(config: AccountConfig) -> Self {
        Self::with_configs(config, ChainConfig::default())
    }

    /// Create a fixture with the given account and chain configuration.
    pub fn with_configs(config: AccountConfig, chain_config: ChainConfig) -> Self {
        let mut chain = Chain::with_config(chain_config);
        let account = random_address();
        let admin = random_address();
        let holder = random_address();

        chain
            .deploy_account(account, &admin, config)
            .expect("fresh address");
        chain.fund(&account, INITIAL_BALANCE).expect("fresh balance");

        Self {
            chain,
            account,
            admin,
            holder,
        }
    }

    /// Mint `key` to the holder.
    pub fn grant_key(&mut self, key: KeyId) -> &mut Self {
        let (account, admin, holder) = (self.account, self.admin, self.holder);
        self.chain
            .create_key(&account, &admin, key, &holder)
            .expect("admin holds root");
        self
    }

    /// Mint `key` to the holder and give it a session.
    pub fn grant_session(&mut self, key: KeyId, request: &SessionRequest) -> &mut Self {
        self.grant_key(key);
        self.create_session(key, request).expect("valid session request");
        self
    }

    /// Create a session as the admin.
    pub fn create_session(&mut self, key: KeyId, request: &SessionRequest) -> Result<Session, AccountError> {
        let (account, admin) = (self.account, self.admin);
        self.chain.create_session(&account, &admin, key, request)
    }

    /// Execute `call` as the holder.
    pub fn execute(&mut self, key: KeyId, call: Call) -> Result<Bytes, AccountError> {
        let (account, holder) = (self.account, self.holder);
        self.chain.execute(&account, &holder, key, call)
    }

    /// Execute `call` as the admin with the root key.
    pub fn execute_as_root(&mut self, call: Call) -> Result<Bytes, AccountError> {
        let (account, admin) = (self.account, self.admin);
        self.chain.execute(&account, &admin, KeyId::ROOT, call)
    }

    /// Whether `caller` holds `key`.
    pub fn holds(&self, caller: &Address, key: KeyId) -> bool {
        self.chain
            .account(&self.account)
            .map(|a| a.holds(caller, key))
            .unwrap_or(false)
    }

    /// The session for `key`.
    pub fn session(&self, key: KeyId) -> Option<&Session> {
        self.chain.session(&self.account, key)
    }

    /// Remaining native allowance of `key`, zero without a session.
    pub fn allowance(&self, key: KeyId) -> u128 {
        self.remaining(key, Resource::Native)
    }

    /// Remaining allowance of `key` for `resource`, zero without a session.
    pub fn remaining(&self, key: KeyId, resource: Resource) -> u128 {
        self.session(key).map(|s| s.remaining(&resource)).unwrap_or(0)
    }

    /// Native balance of the account.
    pub fn balance(&self) -> u128 {
        self.chain.native_balance(&self.account)
    }

    /// Deploy a fungible asset and mint `amount` of it to the account.
    pub fn deploy_token(&mut self, amount: u128) -> Address {
        let asset = random_address();
        self.chain.deploy_token(asset).expect("fresh address");
        self.chain
            .mint_tokens(&asset, &self.account, amount)
            .expect("fresh token");
        asset
    }

    /// Deploy a non-fungible asset and mint `ids` of it to the account.
    pub fn deploy_collection(&mut self, ids: &[u64]) -> Address {
        let asset = random_address();
        self.chain.deploy_collection(asset).expect("fresh address");
        for id in ids {
            self.chain
                .mint_nft(&asset, &self.account, TokenId(*id))
                .expect("fresh token id");
        }
        asset
    }

    /// Deploy a scripted contract at a fresh address.
    pub fn deploy_contract(&mut self, script: Script) -> Address {
        let address = random_address();
        self.chain
            .deploy_contract(address, script)
            .expect("fresh address");
        address
    }
}

impl Default for AccountFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A call moving `amount` of fungible `asset` to `to`.
pub fn token_transfer(asset: Address, to: Address, amount: u128) -> Call {
    AssetCall::Transfer { to, amount }
        .to_call(asset)
        .expect("asset messages encode")
}

/// A call moving non-fungible `token_id` of `asset` to `to`.
pub fn nft_transfer(asset: Address, to: Address, token_id: u64) -> Call {
    AssetCall::TransferToken {
        to,
        token_id: TokenId(token_id),
    }
    .to_call(asset)
    .expect("asset messages encode")
}

/// A call asking `account` to execute `call` with `key` on the sender's
/// behalf.
pub fn reentrant_execute(account: Address, key: KeyId, call: Call) -> Call {
    AccountCall::Execute { key, call }
        .to_call(account)
        .expect("account messages encode")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_setup() {
        let fixture = AccountFixture::new();
        assert!(fixture.holds(&fixture.admin, KeyId::ROOT));
        assert!(!fixture.holds(&fixture.holder, KeyId::ROOT));
        assert_eq!(fixture.balance(), INITIAL_BALANCE);
    }

    #[test]
    fn test_grant_session() {
        let mut fixture = AccountFixture::new();
        let key = KeyId::new(1);
        fixture.grant_session(key, &SessionRequest::new(25));

        assert!(fixture.holds(&fixture.holder, key));
        assert_eq!(fixture.allowance(key), 25);
        assert_eq!(fixture.allowance(KeyId::new(2)), 0);
    }

    #[test]
    fn test_fixtures_are_distinct() {
        let a = AccountFixture::new();
        let b = AccountFixture::new();
        assert_ne!(a.account, b.account);
        assert_ne!(a.account, a.admin);
        assert_ne!(a.admin, a.holder);
    }

    #[test]
    fn test_deployed_assets_belong_to_account() {
        let mut fixture = AccountFixture::new();
        let coin = fixture.deploy_token(70);
        let art = fixture.deploy_collection(&[1, 2]);

        use keyward_perms::AssetBalances;
        assert_eq!(fixture.chain.balance_of(&coin, &fixture.account), 70);
        assert_eq!(fixture.chain.balance_of(&art, &fixture.account), 2);
        assert_eq!(fixture.chain.owner_of(&art, TokenId(2)), Some(fixture.account));
    }
}
