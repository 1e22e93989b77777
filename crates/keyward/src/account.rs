//! KeyAccount: an account whose outbound calls are gated by keys and sessions.

use keyward_core::{Address, Blake3Hash, CoreError, KeyId, Session};
use keyward_ledger::OwnershipLedger;
use keyward_perms::{KeyAuthority, SessionRequest, SessionStore};

use crate::capability::{KeyRegistry, SessionManager, ValueReceiver};
use crate::config::AccountConfig;
use crate::error::{DispatchError, Result};

/// An account holding native value, a key ledger, and one session per
/// non-root key.
///
/// Outbound calls go through [`ExecutionAuthorizer`](crate::ExecutionAuthorizer),
/// which needs the host the account lives in; everything else is here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAccount<L> {
    /// Where the account lives.
    address: Address,
    /// Key ownership.
    authority: KeyAuthority<L>,
    /// Sessions by key.
    sessions: SessionStore,
    /// Native value held.
    balance: u128,
    /// Configuration.
    config: AccountConfig,
}

impl<L: OwnershipLedger> KeyAccount<L> {
    /// Create an account at `address` and mint the root key to `admin`.
    pub fn new(address: Address, ledger: L, admin: &Address, config: AccountConfig) -> Result<Self> {
        let authority = KeyAuthority::bootstrap(ledger, admin)?;
        tracing::debug!(account = %address, admin = %admin, "account created");
        Ok(Self {
            address,
            authority,
            sessions: SessionStore::with_limits(config.session_limits()),
            balance: 0,
            config,
        })
    }

    /// The account's address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The account's configuration.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Key ownership.
    pub fn authority(&self) -> &KeyAuthority<L> {
        &self.authority
    }

    /// All sessions.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub(crate) fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    /// Take `amount` of native value out of the account.
    ///
    /// For hosts moving attached value when the account dispatches a call.
    /// Returns the balance left.
    pub fn withdraw(&mut self, amount: u128) -> std::result::Result<u128, DispatchError> {
        let left = self
            .balance
            .checked_sub(amount)
            .ok_or(DispatchError::InsufficientBalance {
                account: self.address,
                balance: self.balance,
                requested: amount,
            })?;
        self.balance = left;
        Ok(left)
    }
}

impl<L: OwnershipLedger> KeyRegistry for KeyAccount<L> {
    fn holds(&self, caller: &Address, key: KeyId) -> bool {
        self.authority.holds(caller, key)
    }

    fn create_key(&mut self, caller: &Address, key: KeyId, receiver: &Address) -> Result<()> {
        self.authority.create_key(caller, key, receiver)?;
        tracing::debug!(account = %self.address, %key, receiver = %receiver, "key created");
        Ok(())
    }

    fn burn_key(&mut self, caller: &Address, holder: &Address, key: KeyId, amount: u128) -> Result<()> {
        self.authority.burn_key(caller, holder, key, amount)?;
        tracing::debug!(account = %self.address, %key, holder = %holder, amount, "key burned");
        Ok(())
    }

    fn transfer_key(&mut self, caller: &Address, to: &Address, key: KeyId, amount: u128) -> Result<()> {
        self.authority.transfer_key(caller, to, key, amount)?;
        tracing::debug!(account = %self.address, %key, from = %caller, to = %to, amount, "key transferred");
        Ok(())
    }
}

impl<L: OwnershipLedger> SessionManager for KeyAccount<L> {
    fn create_session(&mut self, caller: &Address, key: KeyId, request: &SessionRequest) -> Result<&Session> {
        self.authority.require_root(caller)?;
        let session = self.sessions.create(key, request)?;
        tracing::debug!(
            account = %self.address,
            %key,
            native_allowance = session.native_allowance(),
            destinations = session.allowed_destinations().len(),
            tracked = session.tracked_assets().len(),
            "session created"
        );
        Ok(session)
    }

    fn session(&self, key: KeyId) -> Option<&Session> {
        self.sessions.get(key)
    }

    fn state_root(&self) -> Blake3Hash {
        self.sessions.state_root()
    }
}

impl<L: OwnershipLedger> ValueReceiver for KeyAccount<L> {
    fn receive(&mut self, from: &Address, amount: u128) -> Result<u128> {
        let balance = self.balance.checked_add(amount).ok_or_else(|| {
            CoreError::Overflow(format!("native balance of {} receiving {} from {}", self.address, amount, from))
        })?;
        self.balance = balance;
        Ok(balance)
    }

    fn native_balance(&self) -> u128 {
        self.balance
    }
}
