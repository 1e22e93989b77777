//! Error types for accounts and execution.

use keyward_core::{Address, AuthError, CoreError};
use keyward_ledger::LedgerError;
use keyward_perms::PermsError;
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// Key or session check failed, or the ledger refused.
    #[error(transparent)]
    Perms(#[from] PermsError),

    /// The dispatched call failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// Arithmetic or encoding failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The host has no account at this address.
    #[error("account not found: {0}")]
    AccountNotFound(Address),
}

impl AccountError {
    /// The authorization failure behind this error, if there is one.
    ///
    /// Looks through account calls that failed inside a dispatch, so a
    /// re-entrant call that was denied still reports why.
    pub fn auth(&self) -> Option<&AuthError> {
        match self {
            AccountError::Perms(e) => e.auth(),
            AccountError::Dispatch(DispatchError::Reentrant(inner)) => inner.auth(),
            _ => None,
        }
    }
}

impl From<AuthError> for AccountError {
    fn from(e: AuthError) -> Self {
        AccountError::Perms(PermsError::Auth(e))
    }
}

impl From<LedgerError> for AccountError {
    fn from(e: LedgerError) -> Self {
        AccountError::Perms(PermsError::Ledger(e))
    }
}

/// Failures reported by a host while dispatching a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The callee reverted.
    #[error("reverted: {0}")]
    Reverted(String),

    /// The sender cannot cover the attached value.
    #[error("insufficient balance: {account} has {balance}, needs {requested}")]
    InsufficientBalance {
        account: Address,
        balance: u128,
        requested: u128,
    },

    /// Too many nested calls.
    #[error("call depth limit {0} exceeded")]
    DepthExceeded(usize),

    /// The callee could not make sense of the payload.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// An account operation invoked by the call failed.
    #[error("account call failed: {0}")]
    Reentrant(Box<AccountError>),
}

impl From<AccountError> for DispatchError {
    fn from(e: AccountError) -> Self {
        DispatchError::Reentrant(Box::new(e))
    }
}

/// Result type for account operations.
pub type Result<T> = std::result::Result<T, AccountError>;
