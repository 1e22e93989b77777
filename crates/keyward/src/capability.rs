//! The three faces of an account.
//!
//! An account is one concrete type, but callers usually need only one of
//! these at a time: key management, session management, or receiving value.

use keyward_core::{Address, Blake3Hash, KeyId, Session};
use keyward_perms::SessionRequest;

use crate::error::Result;

/// Key management, gated by the root key.
pub trait KeyRegistry {
    /// Whether `caller` holds at least one unit of `key`.
    fn holds(&self, caller: &Address, key: KeyId) -> bool;

    /// Mint one unit of `key` to `receiver`. `caller` must hold root.
    fn create_key(&mut self, caller: &Address, key: KeyId, receiver: &Address) -> Result<()>;

    /// Burn `amount` units of `key` from `holder`. `caller` must hold root.
    ///
    /// Burning does not touch the key's session.
    fn burn_key(&mut self, caller: &Address, holder: &Address, key: KeyId, amount: u128) -> Result<()>;

    /// Move `amount` units of `key` from `caller` to `to`.
    fn transfer_key(&mut self, caller: &Address, to: &Address, key: KeyId, amount: u128) -> Result<()>;
}

/// One-shot session creation and session reads.
pub trait SessionManager {
    /// Create the session for `key`. `caller` must hold root.
    fn create_session(&mut self, caller: &Address, key: KeyId, request: &SessionRequest) -> Result<&Session>;

    /// The session for `key`, if one was created.
    fn session(&self, key: KeyId) -> Option<&Session>;

    /// Blake3 digest of every session.
    fn state_root(&self) -> Blake3Hash;
}

/// Accepting native value.
pub trait ValueReceiver {
    /// Credit `amount` sent by `from`. Returns the new balance.
    fn receive(&mut self, from: &Address, amount: u128) -> Result<u128>;

    /// Current native balance.
    fn native_balance(&self) -> u128;
}
