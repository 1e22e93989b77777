//! # Keyward Ledger
//!
//! Key ownership for Keyward accounts. Provides a trait-based interface to the
//! multi-token ledger that records which address holds which key.
//!
//! ## Overview
//!
//! The engine only ever asks the ledger three things: does this caller hold
//! this key, mint, and burn. It keeps no key table of its own, so the ledger
//! is the single source of truth for key existence. [`MemoryLedger`] is the
//! reference implementation.
//!
//! ## Key Types
//!
//! - [`OwnershipLedger`] - The synchronous trait for all ledger operations
//! - [`MemoryLedger`] - In-memory balance table
//! - [`LedgerError`] - Underflow, overflow, zero-address
//!
//! ## Usage
//!
//! ```rust
//! use keyward_core::{Address, KeyId};
//! use keyward_ledger::{MemoryLedger, OwnershipLedger};
//!
//! let admin = Address::from_low_u64(1);
//! let mut ledger = MemoryLedger::new();
//! ledger.mint(&admin, KeyId::ROOT, 1).unwrap();
//! assert!(ledger.holds(&admin, KeyId::ROOT));
//! ```

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use traits::OwnershipLedger;
