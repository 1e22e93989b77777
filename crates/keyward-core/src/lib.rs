//! # Keyward Core
//!
//! Pure primitives for Keyward: addresses, keys, calls, sessions and the
//! authorization error taxonomy.
//!
//! This crate contains no I/O and no host interaction. It is plain data plus
//! the arithmetic that keeps allowances from going negative.
//!
//! ## Key Types
//!
//! - [`Address`] - 20-byte account or contract address
//! - [`KeyId`] - Permission key identifier; [`KeyId::ROOT`] is the admin key
//! - [`Call`] - An outbound call (destination, value, payload)
//! - [`Session`] - Destination allow-list and allowances bound to a key
//! - [`AuthError`] - Why the engine refused
//!
//! ## Canonicalization
//!
//! Session tables have a deterministic CBOR encoding and a Blake3 state root.
//! See [`canonical`] module.

pub mod call;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod session;
pub mod types;

pub use call::{decode_payload, encode_payload, Call};
pub use canonical::{canonical_session_bytes, canonical_table_bytes, state_root};
pub use error::{AuthError, CoreError, Resource};
pub use hash::Blake3Hash;
pub use session::{AssetAllowance, Session};
pub use types::{Address, KeyId, TokenId};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
