//! # Keyward Testkit
//!
//! Testing utilities for Keyward accounts.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Chain**: an in-memory host with native value, mock assets, scripted
//!   contracts, and per-call rollback
//! - **Scenarios**: named operation sequences with expected outcomes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: a funded account with an admin and a key holder
//!
//! ## Scenarios
//!
//! ```rust
//! use keyward_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! for scenario in all_scenarios() {
//!     run_scenario(&scenario).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keyward_testkit::generators::{session_request, spends};
//!
//! proptest! {
//!     #[test]
//!     fn allowance_never_grows(request in session_request(), spends in spends(8)) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use keyward_core::{Call, KeyId};
//! use keyward_perms::SessionRequest;
//! use keyward_testkit::fixtures::{random_address, AccountFixture};
//!
//! let mut fixture = AccountFixture::new();
//! let key = KeyId::new(1);
//! fixture.grant_session(key, &SessionRequest::new(100));
//!
//! fixture.execute(key, Call::transfer(random_address(), 40)).unwrap();
//! assert_eq!(fixture.allowance(key), 60);
//! ```

pub mod assets;
pub mod chain;
pub mod fixtures;
pub mod generators;
pub mod message;
pub mod scenarios;
pub mod script;

pub use assets::{MockCollection, MockToken};
pub use chain::{Chain, ChainAccount, ChainConfig, WorldState};
pub use fixtures::{random_address, AccountFixture};
pub use message::{AccountCall, AssetCall};
pub use scenarios::{all_scenarios, run_scenario, verify_all_scenarios, Scenario};
pub use script::{Script, Step};
