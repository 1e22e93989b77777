//! The host an account lives in.

use bytes::Bytes;

use keyward_core::{Address, Call, KeyId};
use keyward_ledger::OwnershipLedger;
use keyward_perms::AssetBalances;

use crate::account::KeyAccount;
use crate::authorizer::ExecutionAuthorizer;
use crate::error::{DispatchError, Result};

/// A host: resolves accounts, answers asset balance queries, and carries out
/// calls.
///
/// All of it is synchronous. `dispatch` may re-enter an account that is in the
/// middle of an execution; the engine keeps no borrow of the account across a
/// dispatch, so that is always possible.
///
/// The host owns atomicity. A failed execution must leave no trace, and the
/// engine relies on the host undoing every change made inside the
/// transaction (or call frame) the execution ran in.
pub trait Environment: AssetBalances {
    /// Key ledger used by the accounts in this host.
    type Ledger: OwnershipLedger;

    /// The account at `address`.
    fn account(&self, address: &Address) -> Option<&KeyAccount<Self::Ledger>>;

    /// The account at `address`, mutably.
    fn account_mut(&mut self, address: &Address) -> Option<&mut KeyAccount<Self::Ledger>>;

    /// Carry out `call` on behalf of `from`, moving `call.value` of native
    /// value with it. Returns the callee's output.
    fn dispatch(&mut self, from: &Address, call: &Call) -> std::result::Result<Bytes, DispatchError>;
}

/// Extension trait for executing calls through an account.
pub trait ExecuteExt: Environment {
    /// Have `caller` execute `call` through the account at `account` using
    /// `key`, with the default authorizer.
    fn execute_call(&mut self, account: &Address, caller: &Address, key: KeyId, call: Call) -> Result<Bytes>;
}

impl<E: Environment + ?Sized> ExecuteExt for E {
    fn execute_call(&mut self, account: &Address, caller: &Address, key: KeyId, call: Call) -> Result<Bytes> {
        ExecutionAuthorizer::new().execute(self, account, caller, key, call)
    }
}
