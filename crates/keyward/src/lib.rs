//! # Keyward
//!
//! Accounts whose outbound calls are gated by keys and sessions.
//!
//! ## Overview
//!
//! A [`KeyAccount`] holds native value and can call anywhere, but only on
//! behalf of a caller holding one of its keys:
//!
//! - **Root key** (`KeyId::ROOT`): unrestricted. The holder also mints and
//!   burns keys and creates sessions.
//! - **Any other key**: restricted by the key's session, which lists the
//!   destinations it may call and how much native value and tracked assets
//!   it may still move.
//!
//! ## Key Concepts
//!
//! - **Environment**: the host an account lives in. It resolves accounts,
//!   answers balance queries, dispatches calls, and rolls back failed ones.
//! - **ExecutionAuthorizer**: runs `execute`. Spends the native allowance
//!   before dispatch and charges tracked-asset outflow after it.
//! - **Capabilities**: `KeyRegistry`, `SessionManager`, `ValueReceiver`, the
//!   three faces of an account.
//!
//! ## Usage
//!
//! ```rust
//! use keyward::{AccountConfig, KeyAccount, KeyRegistry, SessionManager};
//! use keyward::core::{Address, KeyId};
//! use keyward::ledger::MemoryLedger;
//! use keyward::perms::SessionRequest;
//!
//! let admin = Address::from_low_u64(1);
//! let holder = Address::from_low_u64(2);
//! let shop = Address::from_low_u64(3);
//!
//! let mut account = KeyAccount::new(
//!     Address::from_low_u64(100),
//!     MemoryLedger::new(),
//!     &admin,
//!     AccountConfig::default(),
//! )
//! .unwrap();
//!
//! let key = KeyId::new(1);
//! account.create_key(&admin, key, &holder).unwrap();
//! account
//!     .create_session(&admin, key, &SessionRequest::new(100).destination(shop))
//!     .unwrap();
//!
//! assert!(account.holds(&holder, key));
//! assert_eq!(account.session(key).unwrap().native_allowance(), 100);
//! ```
//!
//! Executing calls needs a host; see [`Environment`].
//!
//! ## Re-exports
//!
//! - `keyward::core` - Addresses, keys, calls, sessions, errors
//! - `keyward::ledger` - Key ownership ledger
//! - `keyward::perms` - Sessions and allowance accounting

pub mod account;
pub mod authorizer;
pub mod capability;
pub mod config;
pub mod environment;
pub mod error;

// Re-export component crates
pub use keyward_core as core;
pub use keyward_ledger as ledger;
pub use keyward_perms as perms;

// Re-export main types for convenience
pub use account::KeyAccount;
pub use authorizer::ExecutionAuthorizer;
pub use capability::{KeyRegistry, SessionManager, ValueReceiver};
pub use config::AccountConfig;
pub use environment::{Environment, ExecuteExt};
pub use error::{AccountError, DispatchError, Result};

// Re-export commonly used core types
pub use keyward_core::{Address, AuthError, Call, KeyId, Session, TokenId};
