//! Error types for Keyward core.

use std::fmt;

use thiserror::Error;

use crate::types::{Address, KeyId, TokenId};

/// Core errors: encoding and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),
}

/// What an allowance is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Native value attached to calls.
    Native,
    /// A tracked fungible asset.
    Fungible(Address),
    /// One token id of a tracked non-fungible asset. `None` stands for an
    /// untracked id of that collection, which has no allowance at all.
    NonFungible(Address, Option<TokenId>),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Native => write!(f, "native value"),
            Resource::Fungible(asset) => write!(f, "asset {}", asset),
            Resource::NonFungible(asset, Some(id)) => write!(f, "asset {} token {}", asset, id),
            Resource::NonFungible(asset, None) => write!(f, "asset {} untracked token", asset),
        }
    }
}

/// Authorization failures.
///
/// These are the only ways the engine itself refuses work. Ledger and host
/// failures are reported by their own error types and wrapped above.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Caller lacks the declared key, or a non-root key has no session.
    #[error("unauthorized: {caller} cannot use key {key}")]
    Unauthorized { caller: Address, key: KeyId },

    /// Destination outside the session's non-empty allow-list.
    #[error("unauthorized destination {destination} for key {key}")]
    UnauthorizedDestination { key: KeyId, destination: Address },

    /// Requested or observed consumption exceeds what is left.
    #[error("insufficient allowance for key {key} on {resource}: requested {requested}, remaining {remaining}")]
    InsufficientAllowance {
        key: KeyId,
        resource: Resource,
        requested: u128,
        remaining: u128,
    },

    /// A session already exists for this key.
    #[error("session already exists for key {0}")]
    ExistingSession(KeyId),

    /// Structurally inconsistent session arguments.
    #[error("bad input: {0}")]
    BadInput(String),
}

impl AuthError {
    /// Build a `BadInput` from anything printable.
    pub fn bad_input(msg: impl Into<String>) -> Self {
        AuthError::BadInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_allowance_message() {
        let err = AuthError::InsufficientAllowance {
            key: KeyId::new(1),
            resource: Resource::Native,
            requested: 70,
            remaining: 60,
        };
        assert_eq!(
            err.to_string(),
            "insufficient allowance for key 1 on native value: requested 70, remaining 60"
        );
    }

    #[test]
    fn test_resource_display() {
        let asset = Address::from_low_u64(1);
        let shown = Resource::NonFungible(asset, Some(TokenId(4))).to_string();
        assert!(shown.ends_with("token #4"));
        let untracked = Resource::NonFungible(asset, None).to_string();
        assert!(untracked.ends_with("untracked token"));
    }
}
