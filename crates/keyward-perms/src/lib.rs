//! # Keyward Permissions
//!
//! Keys, sessions, and allowance accounting.
//!
//! ## Overview
//!
//! An account's outbound calls are gated twice. First by key: the caller must
//! hold the key it claims, as recorded by the ownership ledger. Then, for any
//! key other than root, by the key's session: an allow-list of destinations
//! and a set of allowances that each call draws down.
//!
//! ## Key Concepts
//!
//! - **KeyAuthority**: `holds(caller, key)`, plus root-gated mint and burn
//! - **SessionStore**: one session per non-root key, created once, never removed
//! - **Authorization**: the ticket a session hands out after taking the call's
//!   native value off its allowance
//! - **AllowanceAccountant**: snapshots tracked assets around a call and turns
//!   any decrease into allowance charges
//!
//! ## Usage
//!
//! ```rust
//! use keyward_core::{Address, Call, KeyId};
//! use keyward_perms::{SessionRequest, SessionStore};
//!
//! let holder = Address::from_low_u64(2);
//! let shop = Address::from_low_u64(3);
//! let key = KeyId::new(1);
//!
//! let mut sessions = SessionStore::new();
//! sessions.create(key, &SessionRequest::new(100).destination(shop)).unwrap();
//!
//! let ticket = sessions.authorize(&holder, key, Call::transfer(shop, 40), true).unwrap();
//! assert_eq!(ticket.remaining_native(), 60);
//! ```

pub mod accountant;
pub mod authority;
pub mod error;
pub mod request;
pub mod store;

pub use accountant::{AllowanceAccountant, AssetBalances, BalanceSnapshot, Consumption, Watched, Watchlist};
pub use authority::KeyAuthority;
pub use error::{PermsError, Result};
pub use request::{SessionLimits, SessionRequest};
pub use store::{Authorization, SessionStore};
