//! Chain: a deterministic in-memory host.
//!
//! Holds native balances, key accounts, mock assets and scripted contracts.
//! Every dispatched call runs in its own frame: world state is snapshotted
//! when the frame opens and restored if the frame fails. Top-level
//! operations run in a transaction with the same all-or-nothing rule.

use std::collections::BTreeMap;

use bytes::Bytes;

use keyward::{
    AccountConfig, AccountError, DispatchError, Environment, ExecuteExt, KeyAccount, KeyRegistry,
    SessionManager, ValueReceiver,
};
use keyward_core::{decode_payload, Address, Blake3Hash, Call, KeyId, Session, TokenId};
use keyward_ledger::MemoryLedger;
use keyward_perms::{AssetBalances, SessionRequest};

use crate::assets::{MockCollection, MockToken};
use crate::message::{AccountCall, AssetCall};
use crate::script::{Script, Step};

/// Key account as hosted by the chain.
pub type ChainAccount = KeyAccount<MemoryLedger>;

/// Configuration for the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Maximum nesting of dispatched calls.
    pub max_call_depth: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { max_call_depth: 64 }
    }
}

/// Everything a failed frame rolls back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldState {
    accounts: BTreeMap<Address, ChainAccount>,
    balances: BTreeMap<Address, u128>,
    tokens: BTreeMap<Address, MockToken>,
    collections: BTreeMap<Address, MockCollection>,
    contracts: BTreeMap<Address, Script>,
}

impl WorldState {
    fn is_deployed(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
            || self.tokens.contains_key(address)
            || self.collections.contains_key(address)
            || self.contracts.contains_key(address)
    }
}

/// The test host.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    world: WorldState,
    config: ChainConfig,
    depth: usize,
}

impl Chain {
    /// An empty chain with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty chain.
    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            world: WorldState::default(),
            config,
            depth: 0,
        }
    }

    /// Current world state.
    pub fn state(&self) -> &WorldState {
        &self.world
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Deployment
    // ─────────────────────────────────────────────────────────────────────────

    /// Deploy a key account at `address` with `admin` holding root.
    pub fn deploy_account(&mut self, address: Address, admin: &Address, config: AccountConfig) -> Result<(), AccountError> {
        self.ensure_free(&address)?;
        let mut account = KeyAccount::new(address, MemoryLedger::new(), admin, config)?;
        if let Some(balance) = self.world.balances.remove(&address) {
            account.receive(&Address::ZERO, balance)?;
        }
        self.world.accounts.insert(address, account);
        Ok(())
    }

    /// Deploy an empty fungible asset.
    pub fn deploy_token(&mut self, address: Address) -> Result<(), AccountError> {
        self.ensure_free(&address)?;
        self.world.tokens.insert(address, MockToken::new());
        Ok(())
    }

    /// Deploy an empty non-fungible asset.
    pub fn deploy_collection(&mut self, address: Address) -> Result<(), AccountError> {
        self.ensure_free(&address)?;
        self.world.collections.insert(address, MockCollection::new());
        Ok(())
    }

    /// Deploy a scripted contract.
    pub fn deploy_contract(&mut self, address: Address, script: Script) -> Result<(), AccountError> {
        self.ensure_free(&address)?;
        self.world.contracts.insert(address, script);
        Ok(())
    }

    fn ensure_free(&self, address: &Address) -> Result<(), AccountError> {
        if self.world.is_deployed(address) {
            return Err(DispatchError::Reverted(format!("{} is already deployed", address)).into());
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Balances
    // ─────────────────────────────────────────────────────────────────────────

    /// Create native value out of nothing for `address`.
    pub fn fund(&mut self, address: &Address, amount: u128) -> Result<(), AccountError> {
        self.credit(&Address::ZERO, address, amount)?;
        Ok(())
    }

    /// Native balance of `address`.
    pub fn native_balance(&self, address: &Address) -> u128 {
        match self.world.accounts.get(address) {
            Some(account) => account.native_balance(),
            None => self.world.balances.get(address).copied().unwrap_or(0),
        }
    }

    /// Mint fungible units of `asset` to `to`.
    pub fn mint_tokens(&mut self, asset: &Address, to: &Address, amount: u128) -> Result<(), DispatchError> {
        self.world
            .tokens
            .get_mut(asset)
            .ok_or_else(|| DispatchError::Reverted(format!("no token at {}", asset)))?
            .mint(to, amount)
    }

    /// Mint `token_id` of `asset` to `to`.
    pub fn mint_nft(&mut self, asset: &Address, to: &Address, token_id: TokenId) -> Result<(), DispatchError> {
        self.world
            .collections
            .get_mut(asset)
            .ok_or_else(|| DispatchError::Reverted(format!("no collection at {}", asset)))?
            .mint(to, token_id)
    }

    fn debit(&mut self, address: &Address, amount: u128) -> Result<(), DispatchError> {
        if let Some(account) = self.world.accounts.get_mut(address) {
            account.withdraw(amount)?;
            return Ok(());
        }
        let balance = self.world.balances.get(address).copied().unwrap_or(0);
        let left = balance
            .checked_sub(amount)
            .ok_or(DispatchError::InsufficientBalance {
                account: *address,
                balance,
                requested: amount,
            })?;
        self.world.balances.insert(*address, left);
        Ok(())
    }

    fn credit(&mut self, from: &Address, address: &Address, amount: u128) -> Result<(), DispatchError> {
        if let Some(account) = self.world.accounts.get_mut(address) {
            account.receive(from, amount)?;
            return Ok(());
        }
        let balance = self.world.balances.get(address).copied().unwrap_or(0);
        let total = balance
            .checked_add(amount)
            .ok_or_else(|| DispatchError::Reverted(format!("native balance of {} overflows", address)))?;
        self.world.balances.insert(*address, total);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `f` as one transaction: on error, every change it made is undone.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let saved = self.world.clone();
        let result = f(self);
        if result.is_err() {
            self.world = saved;
        }
        result
    }

    /// Send `call` from an external sender.
    pub fn transact(&mut self, sender: &Address, call: &Call) -> Result<Bytes, DispatchError> {
        self.dispatch(sender, call)
    }

    /// Have `caller` execute `call` through `account` with `key`.
    pub fn execute(&mut self, account: &Address, caller: &Address, key: KeyId, call: Call) -> Result<Bytes, AccountError> {
        self.atomically(|chain| chain.execute_call(account, caller, key, call))
    }

    /// Mint `key` to `receiver` on `account`.
    pub fn create_key(&mut self, account: &Address, caller: &Address, key: KeyId, receiver: &Address) -> Result<(), AccountError> {
        self.atomically(|chain| chain.key_account(account)?.create_key(caller, key, receiver))
    }

    /// Burn `amount` of `key` from `holder` on `account`.
    pub fn burn_key(&mut self, account: &Address, caller: &Address, holder: &Address, key: KeyId, amount: u128) -> Result<(), AccountError> {
        self.atomically(|chain| chain.key_account(account)?.burn_key(caller, holder, key, amount))
    }

    /// Move `amount` of `key` from `caller` to `to` on `account`.
    pub fn transfer_key(&mut self, account: &Address, caller: &Address, to: &Address, key: KeyId, amount: u128) -> Result<(), AccountError> {
        self.atomically(|chain| chain.key_account(account)?.transfer_key(caller, to, key, amount))
    }

    /// Create the session for `key` on `account`.
    pub fn create_session(&mut self, account: &Address, caller: &Address, key: KeyId, request: &SessionRequest) -> Result<Session, AccountError> {
        self.atomically(|chain| {
            chain
                .key_account(account)?
                .create_session(caller, key, request)
                .cloned()
        })
    }

    /// The session for `key` on `account`.
    pub fn session(&self, account: &Address, key: KeyId) -> Option<&Session> {
        self.world.accounts.get(account)?.session(key)
    }

    /// Session digest of `account`.
    pub fn state_root(&self, account: &Address) -> Option<Blake3Hash> {
        self.world.accounts.get(account).map(|a| a.state_root())
    }

    fn key_account(&mut self, address: &Address) -> Result<&mut ChainAccount, AccountError> {
        self.world
            .accounts
            .get_mut(address)
            .ok_or(AccountError::AccountNotFound(*address))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────────

    fn run_frame(&mut self, from: &Address, call: &Call) -> Result<Bytes, DispatchError> {
        if call.value > 0 {
            self.debit(from, call.value)?;
            self.credit(from, &call.destination, call.value)?;
        }

        let to = call.destination;
        if self.world.accounts.contains_key(&to) {
            return self.run_account(from, &to, &call.payload);
        }
        if self.world.tokens.contains_key(&to) || self.world.collections.contains_key(&to) {
            return self.run_asset(from, &to, &call.payload);
        }
        if let Some(script) = self.world.contracts.get(&to).cloned() {
            return self.run_script(&to, &script);
        }
        Ok(Bytes::new())
    }

    fn run_account(&mut self, from: &Address, account: &Address, payload: &[u8]) -> Result<Bytes, DispatchError> {
        if payload.is_empty() {
            return Ok(Bytes::new());
        }
        let message: AccountCall =
            decode_payload(payload).map_err(|e| DispatchError::Malformed(e.to_string()))?;

        match message {
            AccountCall::Execute { key, call } => Ok(self.execute_call(account, from, key, call)?),
            AccountCall::CreateKey { key, receiver } => {
                self.key_account(account)?.create_key(from, key, &receiver)?;
                Ok(Bytes::new())
            }
            AccountCall::BurnKey { holder, key, amount } => {
                self.key_account(account)?.burn_key(from, &holder, key, amount)?;
                Ok(Bytes::new())
            }
            AccountCall::TransferKey { to, key, amount } => {
                self.key_account(account)?.transfer_key(from, &to, key, amount)?;
                Ok(Bytes::new())
            }
            AccountCall::CreateSession { key, request } => {
                self.key_account(account)?.create_session(from, key, &request)?;
                Ok(Bytes::new())
            }
        }
    }

    fn run_asset(&mut self, from: &Address, asset: &Address, payload: &[u8]) -> Result<Bytes, DispatchError> {
        if payload.is_empty() {
            return Ok(Bytes::new());
        }
        let message: AssetCall =
            decode_payload(payload).map_err(|e| DispatchError::Malformed(e.to_string()))?;

        match message {
            AssetCall::Transfer { to, amount } => self
                .world
                .tokens
                .get_mut(asset)
                .ok_or_else(|| DispatchError::Malformed(format!("{} is not fungible", asset)))?
                .transfer(from, &to, amount)?,
            AssetCall::TransferToken { to, token_id } => self
                .world
                .collections
                .get_mut(asset)
                .ok_or_else(|| DispatchError::Malformed(format!("{} is not a collection", asset)))?
                .transfer(from, &to, token_id)?,
        }
        Ok(Bytes::new())
    }

    fn run_script(&mut self, contract: &Address, script: &Script) -> Result<Bytes, DispatchError> {
        for step in script.steps() {
            match step {
                Step::Call { call, catch } => {
                    if let Err(e) = self.dispatch(contract, call) {
                        if !*catch {
                            return Err(e);
                        }
                        tracing::debug!(contract = %contract, error = %e, "nested failure caught");
                    }
                }
                Step::Revert(reason) => return Err(DispatchError::Reverted(reason.clone())),
                Step::Return(output) => return Ok(output.clone()),
            }
        }
        Ok(Bytes::new())
    }
}

impl AssetBalances for Chain {
    fn balance_of(&self, asset: &Address, owner: &Address) -> u128 {
        if let Some(token) = self.world.tokens.get(asset) {
            return token.balance_of(owner);
        }
        self.world
            .collections
            .get(asset)
            .map(|c| c.balance_of(owner))
            .unwrap_or(0)
    }

    fn owner_of(&self, asset: &Address, token_id: TokenId) -> Option<Address> {
        self.world.collections.get(asset)?.owner_of(token_id)
    }
}

impl Environment for Chain {
    type Ledger = MemoryLedger;

    fn account(&self, address: &Address) -> Option<&ChainAccount> {
        self.world.accounts.get(address)
    }

    fn account_mut(&mut self, address: &Address) -> Option<&mut ChainAccount> {
        self.world.accounts.get_mut(address)
    }

    fn dispatch(&mut self, from: &Address, call: &Call) -> Result<Bytes, DispatchError> {
        if self.depth >= self.config.max_call_depth {
            return Err(DispatchError::DepthExceeded(self.config.max_call_depth));
        }

        let saved = self.world.clone();
        self.depth += 1;
        let result = self.run_frame(from, call);
        self.depth -= 1;

        if let Err(e) = &result {
            tracing::debug!(from = %from, to = %call.destination, error = %e, "frame reverted");
            self.world = saved;
        }
        result
    }
}
