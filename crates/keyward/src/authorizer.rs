//! ExecutionAuthorizer: the `execute` state machine.
//!
//! ```text
//! AuthCheck ─┬─ root ──────────────────────────────────────────► Dispatch ─► Done
//!            └─ SessionCheck ─► DestinationCheck ─► AllowanceCheck
//!                 ─► (decrement) ─► Snapshot ─► Dispatch ─► Snapshot ─► Commit ─► Done
//! ```
//!
//! The native allowance is taken before dispatch, so a callee that re-enters
//! the account sees it already spent. Tracked-asset allowances are charged
//! after dispatch against whatever is left at that point.

use bytes::Bytes;

use keyward_core::{Address, Call, KeyId};
use keyward_perms::{AllowanceAccountant, Authorization};

use crate::environment::Environment;
use crate::error::{AccountError, Result};

/// Runs authorized calls through accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionAuthorizer {
    accountant: AllowanceAccountant,
}

impl ExecutionAuthorizer {
    /// Create an authorizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Have `caller` execute `call` through the account at `account`,
    /// authorized by `key`.
    ///
    /// Returns the callee's output. Any error means the whole execution
    /// failed; checks that fail before dispatch change nothing, and anything
    /// after dispatch is undone by the host's transaction.
    pub fn execute<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        account: &Address,
        caller: &Address,
        key: KeyId,
        call: Call,
    ) -> Result<Bytes> {
        let acct = env
            .account_mut(account)
            .ok_or(AccountError::AccountNotFound(*account))?;

        if let Err(e) = acct.authority().require(caller, key) {
            tracing::warn!(account = %account, caller = %caller, %key, error = %e, "execution denied");
            return Err(e.into());
        }

        if key.is_root() {
            tracing::debug!(
                account = %account,
                destination = %call.destination,
                value = call.value,
                "root execution"
            );
            return Ok(env.dispatch(account, &call)?);
        }

        let track_assets = acct.config().asset_accounting;
        let ticket = match acct.sessions_mut().authorize(caller, key, call, track_assets) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::warn!(account = %account, caller = %caller, %key, error = %e, "execution denied");
                return Err(e.into());
            }
        };

        tracing::debug!(
            account = %account,
            %key,
            destination = %ticket.call().destination,
            value = ticket.call().value,
            remaining = ticket.remaining_native(),
            "execution granted"
        );

        self.dispatch_and_settle(env, account, ticket)
    }

    /// Dispatch an admitted call and charge the tracked-asset outflow it
    /// caused.
    fn dispatch_and_settle<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        account: &Address,
        ticket: Authorization,
    ) -> Result<Bytes> {
        if ticket.watchlist().is_empty() {
            return Ok(env.dispatch(account, ticket.call())?);
        }

        let before = self.accountant.snapshot(account, ticket.watchlist(), &*env);
        let output = env.dispatch(account, ticket.call())?;
        let after = self.accountant.snapshot(account, ticket.watchlist(), &*env);

        let consumption = self.accountant.consumption(&before, &after);
        if consumption.is_empty() {
            return Ok(output);
        }

        let acct = env
            .account_mut(account)
            .ok_or(AccountError::AccountNotFound(*account))?;
        if let Err(e) = acct.sessions_mut().settle(&ticket, &consumption) {
            tracing::warn!(account = %account, key = %ticket.key(), error = %e, "asset outflow exceeds allowance");
            return Err(e.into());
        }

        for (resource, amount) in consumption.charges() {
            tracing::debug!(account = %account, key = %ticket.key(), %resource, amount, "allowance charged");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use keyward_core::{AuthError, Resource, TokenId};
    use keyward_ledger::MemoryLedger;
    use keyward_perms::{AssetBalances, SessionRequest};

    use crate::account::KeyAccount;
    use crate::capability::{KeyRegistry, SessionManager, ValueReceiver};
    use crate::config::AccountConfig;
    use crate::error::DispatchError;

    const ACCOUNT: Address = Address::from_low_u64(0xacc);
    const ADMIN: Address = Address::from_low_u64(1);
    const HOLDER: Address = Address::from_low_u64(2);
    const D1: Address = Address::from_low_u64(11);
    const D2: Address = Address::from_low_u64(12);
    const COIN: Address = Address::from_low_u64(50);
    const KEY: KeyId = KeyId(1);

    /// One account, one fungible asset, no rollback.
    struct Host {
        account: KeyAccount<MemoryLedger>,
        coins: BTreeMap<Address, u128>,
        received: BTreeMap<Address, u128>,
        seen_allowance: Vec<Option<u128>>,
        drain: u128,
        fail: bool,
    }

    impl Host {
        fn new(config: AccountConfig) -> Self {
            let mut account = KeyAccount::new(ACCOUNT, MemoryLedger::new(), &ADMIN, config).unwrap();
            account.create_key(&ADMIN, KEY, &HOLDER).unwrap();
            account.receive(&ADMIN, 1_000).unwrap();
            Self {
                account,
                coins: [(ACCOUNT, 500)].into_iter().collect(),
                received: BTreeMap::new(),
                seen_allowance: Vec::new(),
                drain: 0,
                fail: false,
            }
        }

        fn with_session(request: SessionRequest) -> Self {
            let mut host = Self::new(AccountConfig::default());
            host.account.create_session(&ADMIN, KEY, &request).unwrap();
            host
        }

        fn execute(&mut self, caller: &Address, key: KeyId, call: Call) -> Result<Bytes> {
            ExecutionAuthorizer::new().execute(self, &ACCOUNT, caller, key, call)
        }

        fn allowance(&self) -> u128 {
            self.account.session(KEY).unwrap().native_allowance()
        }
    }

    impl AssetBalances for Host {
        fn balance_of(&self, asset: &Address, owner: &Address) -> u128 {
            if *asset == COIN {
                self.coins.get(owner).copied().unwrap_or(0)
            } else {
                0
            }
        }

        fn owner_of(&self, _asset: &Address, _token_id: TokenId) -> Option<Address> {
            None
        }
    }

    impl Environment for Host {
        type Ledger = MemoryLedger;

        fn account(&self, address: &Address) -> Option<&KeyAccount<MemoryLedger>> {
            (*address == ACCOUNT).then_some(&self.account)
        }

        fn account_mut(&mut self, address: &Address) -> Option<&mut KeyAccount<MemoryLedger>> {
            if *address == ACCOUNT {
                Some(&mut self.account)
            } else {
                None
            }
        }

        fn dispatch(&mut self, from: &Address, call: &Call) -> std::result::Result<Bytes, DispatchError> {
            self.seen_allowance
                .push(self.account.session(KEY).map(|s| s.native_allowance()));
            if self.fail {
                return Err(DispatchError::Reverted("scripted failure".into()));
            }
            self.account.withdraw(call.value)?;
            *self.received.entry(call.destination).or_default() += call.value;
            let held = self.coins.entry(*from).or_default();
            *held = held.saturating_sub(self.drain);
            Ok(Bytes::from_static(b"ok"))
        }
    }

    #[test]
    fn test_root_bypasses_sessions() {
        let mut host = Host::new(AccountConfig::default());

        let out = host.execute(&ADMIN, KeyId::ROOT, Call::transfer(D2, 300)).unwrap();
        assert_eq!(&out[..], b"ok");
        assert_eq!(host.received[&D2], 300);
        assert!(host.account.sessions().is_empty());
    }

    #[test]
    fn test_caller_without_key_is_unauthorized() {
        let mut host = Host::with_session(SessionRequest::new(100));

        let err = host
            .execute(&Address::from_low_u64(99), KEY, Call::transfer(D1, 1))
            .unwrap_err();
        assert_eq!(
            err.auth(),
            Some(&AuthError::Unauthorized {
                caller: Address::from_low_u64(99),
                key: KEY,
            })
        );
        assert!(host.seen_allowance.is_empty());
        assert_eq!(host.allowance(), 100);
    }

    #[test]
    fn test_root_call_by_non_root_holder_is_unauthorized() {
        let mut host = Host::new(AccountConfig::default());
        let err = host.execute(&HOLDER, KeyId::ROOT, Call::transfer(D1, 1)).unwrap_err();
        assert!(matches!(err.auth(), Some(AuthError::Unauthorized { .. })));
    }

    #[test]
    fn test_key_without_session_is_unauthorized() {
        let mut host = Host::new(AccountConfig::default());
        let err = host.execute(&HOLDER, KEY, Call::transfer(D1, 0)).unwrap_err();
        assert_eq!(
            err.auth(),
            Some(&AuthError::Unauthorized {
                caller: HOLDER,
                key: KEY,
            })
        );
        assert!(host.seen_allowance.is_empty());
    }

    #[test]
    fn test_unknown_account() {
        let mut host = Host::new(AccountConfig::default());
        let err = ExecutionAuthorizer::new()
            .execute(&mut host, &D1, &ADMIN, KeyId::ROOT, Call::transfer(D2, 1))
            .unwrap_err();
        assert_eq!(err, AccountError::AccountNotFound(D1));
    }

    #[test]
    fn test_allowance_spent_before_dispatch() {
        let mut host = Host::with_session(SessionRequest::new(100).destination(D1));

        host.execute(&HOLDER, KEY, Call::transfer(D1, 40)).unwrap();
        assert_eq!(host.seen_allowance, vec![Some(60)]);
        assert_eq!(host.allowance(), 60);

        let err = host.execute(&HOLDER, KEY, Call::transfer(D1, 70)).unwrap_err();
        assert!(matches!(
            err.auth(),
            Some(AuthError::InsufficientAllowance {
                resource: Resource::Native,
                requested: 70,
                remaining: 60,
                ..
            })
        ));
        assert_eq!(host.allowance(), 60);
        assert_eq!(host.seen_allowance.len(), 1);
    }

    #[test]
    fn test_destination_outside_allow_list() {
        let mut host = Host::with_session(SessionRequest::new(100).destination(D1));
        let err = host.execute(&HOLDER, KEY, Call::transfer(D2, 1)).unwrap_err();
        assert_eq!(
            err.auth(),
            Some(&AuthError::UnauthorizedDestination {
                key: KEY,
                destination: D2,
            })
        );
        assert_eq!(host.allowance(), 100);
    }

    #[test]
    fn test_dispatch_failure_is_returned() {
        let mut host = Host::with_session(SessionRequest::new(100));
        host.fail = true;

        let err = host.execute(&HOLDER, KEY, Call::transfer(D1, 10)).unwrap_err();
        assert!(matches!(err, AccountError::Dispatch(DispatchError::Reverted(_))));
        assert!(err.auth().is_none());
    }

    #[test]
    fn test_asset_outflow_charged() {
        let mut host = Host::with_session(SessionRequest::new(0).fungible(COIN, 100));
        host.drain = 30;

        host.execute(&HOLDER, KEY, Call::transfer(D1, 0)).unwrap();
        let session = host.account.session(KEY).unwrap();
        assert_eq!(session.remaining(&Resource::Fungible(COIN)), 70);
    }

    #[test]
    fn test_asset_outflow_over_allowance_fails() {
        let mut host = Host::with_session(SessionRequest::new(0).fungible(COIN, 20));
        host.drain = 30;

        let err = host.execute(&HOLDER, KEY, Call::transfer(D1, 0)).unwrap_err();
        assert!(matches!(
            err.auth(),
            Some(AuthError::InsufficientAllowance {
                resource: Resource::Fungible(_),
                requested: 30,
                remaining: 20,
                ..
            })
        ));
        let session = host.account.session(KEY).unwrap();
        assert_eq!(session.remaining(&Resource::Fungible(COIN)), 20);
    }

    #[test]
    fn test_accounting_disabled() {
        let config = AccountConfig {
            asset_accounting: false,
            ..AccountConfig::default()
        };
        let mut host = Host::new(config);
        host.account
            .create_session(&ADMIN, KEY, &SessionRequest::new(0).fungible(COIN, 20))
            .unwrap();
        host.drain = 30;

        host.execute(&HOLDER, KEY, Call::transfer(D1, 0)).unwrap();
        let session = host.account.session(KEY).unwrap();
        assert_eq!(session.remaining(&Resource::Fungible(COIN)), 20);
    }
}
