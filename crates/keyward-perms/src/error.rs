//! Error types for the permissions module.

use keyward_core::AuthError;
use keyward_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The engine refused.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The ownership ledger refused (e.g. burning a key nobody holds).
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl PermsError {
    /// The authorization failure, if this is one.
    pub fn auth(&self) -> Option<&AuthError> {
        match self {
            PermsError::Auth(e) => Some(e),
            PermsError::Ledger(_) => None,
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
