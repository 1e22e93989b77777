//! Error types for the ownership ledger.

use thiserror::Error;

use keyward_core::{Address, KeyId};

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Burn or transfer of more units than the holder owns.
    #[error("insufficient balance: {holder} holds {balance} of key {key}, needs {requested}")]
    InsufficientBalance {
        holder: Address,
        key: KeyId,
        balance: u128,
        requested: u128,
    },

    /// Minting would overflow a balance.
    #[error("balance overflow for {holder} on key {key}")]
    Overflow { holder: Address, key: KeyId },

    /// Units cannot be minted to or moved to the zero address.
    #[error("zero address cannot hold keys")]
    ZeroAddress,
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
