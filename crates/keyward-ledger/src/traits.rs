//! OwnershipLedger trait: the abstract interface for key ownership.
//!
//! The engine never keeps its own key table. Whether a caller holds a key is
//! always answered by the ledger, so a key exists exactly as long as some
//! holder has a non-zero balance of it.

use keyward_core::{Address, KeyId};

use crate::error::Result;

/// A multi-token balance table keyed by `(holder, key)`.
///
/// # Design Notes
///
/// - **Synchronous**: every method completes immediately; nothing awaits.
/// - **No pre-validation by callers**: `burn` and `transfer` report their own
///   underflow as [`LedgerError::InsufficientBalance`](crate::LedgerError).
/// - **Zero-balance holders are indistinguishable from absent ones.**
pub trait OwnershipLedger {
    /// Units of `key` held by `holder`.
    fn balance_of(&self, holder: &Address, key: KeyId) -> u128;

    /// Mint `amount` units of `key` to `receiver`.
    fn mint(&mut self, receiver: &Address, key: KeyId, amount: u128) -> Result<()>;

    /// Burn `amount` units of `key` from `holder`.
    fn burn(&mut self, holder: &Address, key: KeyId, amount: u128) -> Result<()>;

    /// Move `amount` units of `key` from `from` to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, key: KeyId, amount: u128) -> Result<()>;

    /// Whether `holder` holds at least one unit of `key`.
    fn holds(&self, holder: &Address, key: KeyId) -> bool {
        self.balance_of(holder, key) >= 1
    }
}
