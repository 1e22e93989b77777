//! Session: the capability restrictions bound to a non-root key.
//!
//! A session carries a destination allow-list and a set of allowances. The
//! allowances only ever go down after creation; every decrement goes through
//! [`Session::debit`], which refuses to take an allowance below zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Resource};
use crate::types::{Address, KeyId, TokenId};

/// Allowance for one tracked asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetAllowance {
    /// A fungible asset: one budget for the whole balance.
    Fungible(u128),

    /// A non-fungible asset: a budget per tracked token id. Ids not listed
    /// have no allowance.
    NonFungible(BTreeMap<TokenId, u128>),
}

impl AssetAllowance {
    /// Whether this is a non-fungible allowance.
    pub fn is_non_fungible(&self) -> bool {
        matches!(self, AssetAllowance::NonFungible(_))
    }

    /// Token ids tracked by a non-fungible allowance (empty for fungible).
    pub fn token_ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        let ids = match self {
            AssetAllowance::NonFungible(per_id) => Some(per_id.keys().copied()),
            AssetAllowance::Fungible(_) => None,
        };
        ids.into_iter().flatten()
    }
}

/// A session record.
///
/// Existence in a session table is what makes a session valid; there is no
/// separate validity flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    native_allowance: u128,
    allowed_destinations: BTreeSet<Address>,
    tracked_assets: BTreeMap<Address, AssetAllowance>,
}

impl Session {
    /// Create a session record.
    pub fn new(
        native_allowance: u128,
        allowed_destinations: BTreeSet<Address>,
        tracked_assets: BTreeMap<Address, AssetAllowance>,
    ) -> Self {
        Self {
            native_allowance,
            allowed_destinations,
            tracked_assets,
        }
    }

    /// Remaining native value allowance.
    pub fn native_allowance(&self) -> u128 {
        self.native_allowance
    }

    /// The destination allow-list. Empty means unrestricted.
    pub fn allowed_destinations(&self) -> &BTreeSet<Address> {
        &self.allowed_destinations
    }

    /// Whether a call to `destination` is allowed.
    ///
    /// An empty allow-list permits every destination.
    pub fn permits(&self, destination: &Address) -> bool {
        self.allowed_destinations.is_empty() || self.allowed_destinations.contains(destination)
    }

    /// Tracked assets and their allowances.
    pub fn tracked_assets(&self) -> &BTreeMap<Address, AssetAllowance> {
        &self.tracked_assets
    }

    /// Whether any asset is tracked.
    pub fn tracks_assets(&self) -> bool {
        !self.tracked_assets.is_empty()
    }

    /// Remaining allowance for a resource. Untracked resources have none.
    pub fn remaining(&self, resource: &Resource) -> u128 {
        match resource {
            Resource::Native => self.native_allowance,
            Resource::Fungible(asset) => match self.tracked_assets.get(asset) {
                Some(AssetAllowance::Fungible(left)) => *left,
                _ => 0,
            },
            Resource::NonFungible(asset, Some(id)) => match self.tracked_assets.get(asset) {
                Some(AssetAllowance::NonFungible(per_id)) => per_id.get(id).copied().unwrap_or(0),
                _ => 0,
            },
            Resource::NonFungible(_, None) => 0,
        }
    }

    /// Check that `amount` of `resource` could be debited, without debiting.
    pub fn check(&self, key: KeyId, resource: Resource, amount: u128) -> Result<(), AuthError> {
        let remaining = self.remaining(&resource);
        if amount > remaining {
            return Err(AuthError::InsufficientAllowance {
                key,
                resource,
                requested: amount,
                remaining,
            });
        }
        Ok(())
    }

    /// Debit `amount` of `resource`, returning what is left.
    ///
    /// Fails with `InsufficientAllowance` and leaves the session untouched if
    /// the remaining allowance is smaller than `amount`.
    pub fn debit(&mut self, key: KeyId, resource: Resource, amount: u128) -> Result<u128, AuthError> {
        match self.slot_mut(&resource) {
            Some(left) if *left >= amount => {
                *left -= amount;
                Ok(*left)
            }
            Some(left) => Err(AuthError::InsufficientAllowance {
                key,
                resource,
                requested: amount,
                remaining: *left,
            }),
            None if amount == 0 => Ok(0),
            None => Err(AuthError::InsufficientAllowance {
                key,
                resource,
                requested: amount,
                remaining: 0,
            }),
        }
    }

    fn slot_mut(&mut self, resource: &Resource) -> Option<&mut u128> {
        match resource {
            Resource::Native => Some(&mut self.native_allowance),
            Resource::Fungible(asset) => match self.tracked_assets.get_mut(asset) {
                Some(AssetAllowance::Fungible(left)) => Some(left),
                _ => None,
            },
            Resource::NonFungible(asset, Some(id)) => match self.tracked_assets.get_mut(asset) {
                Some(AssetAllowance::NonFungible(per_id)) => per_id.get_mut(id),
                _ => None,
            },
            Resource::NonFungible(_, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn session_with_assets() -> Session {
        let mut tracked = BTreeMap::new();
        tracked.insert(addr(10), AssetAllowance::Fungible(500));
        tracked.insert(
            addr(11),
            AssetAllowance::NonFungible([(TokenId(1), 1), (TokenId(2), 0)].into_iter().collect()),
        );
        Session::new(100, BTreeSet::new(), tracked)
    }

    #[test]
    fn test_empty_allow_list_permits_everything() {
        let session = Session::new(0, BTreeSet::new(), BTreeMap::new());
        assert!(session.permits(&addr(1)));
        assert!(session.permits(&Address::ZERO));
    }

    #[test]
    fn test_allow_list_restricts() {
        let session = Session::new(0, [addr(1)].into_iter().collect(), BTreeMap::new());
        assert!(session.permits(&addr(1)));
        assert!(!session.permits(&addr(2)));
    }

    #[test]
    fn test_native_debit() {
        let mut session = Session::new(100, BTreeSet::new(), BTreeMap::new());
        let key = KeyId::new(1);

        assert_eq!(session.debit(key, Resource::Native, 40).unwrap(), 60);

        let err = session.debit(key, Resource::Native, 70).unwrap_err();
        assert_eq!(
            err,
            AuthError::InsufficientAllowance {
                key,
                resource: Resource::Native,
                requested: 70,
                remaining: 60,
            }
        );
        assert_eq!(session.native_allowance(), 60);
    }

    #[test]
    fn test_asset_debits() {
        let mut session = session_with_assets();
        let key = KeyId::new(3);

        assert_eq!(session.debit(key, Resource::Fungible(addr(10)), 200).unwrap(), 300);

        let nft = Resource::NonFungible(addr(11), Some(TokenId(1)));
        assert_eq!(session.debit(key, nft, 1).unwrap(), 0);
        assert!(session.debit(key, nft, 1).is_err());

        // Zero allowance id and untracked id both refuse
        let zero = Resource::NonFungible(addr(11), Some(TokenId(2)));
        assert!(session.debit(key, zero, 1).is_err());
        let untracked = Resource::NonFungible(addr(11), None);
        assert!(session.debit(key, untracked, 1).is_err());
    }

    #[test]
    fn test_untracked_asset_has_no_allowance() {
        let session = session_with_assets();
        assert_eq!(session.remaining(&Resource::Fungible(addr(99))), 0);
        // Kind mismatch counts as untracked
        assert_eq!(session.remaining(&Resource::Fungible(addr(11))), 0);
    }

    #[test]
    fn test_zero_debit_always_succeeds() {
        let mut session = Session::new(0, BTreeSet::new(), BTreeMap::new());
        assert_eq!(
            session
                .debit(KeyId::new(1), Resource::Fungible(addr(5)), 0)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_token_ids() {
        let session = session_with_assets();
        let ids: Vec<_> = session.tracked_assets()[&addr(11)].token_ids().collect();
        assert_eq!(ids, vec![TokenId(1), TokenId(2)]);
        assert_eq!(session.tracked_assets()[&addr(10)].token_ids().count(), 0);
    }

    #[test]
    fn test_asset_kinds() {
        let session = session_with_assets();
        assert!(session.tracks_assets());
        assert!(session.tracked_assets()[&addr(11)].is_non_fungible());
        assert!(!session.tracked_assets()[&addr(10)].is_non_fungible());

        let bare = Session::new(5, BTreeSet::new(), BTreeMap::new());
        assert!(!bare.tracks_assets());
    }

    #[test]
    fn test_session_json_shape() {
        let session = Session::new(7, [addr(1)].into_iter().collect(), BTreeMap::new());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["native_allowance"], 7);
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    proptest::proptest! {
        #[test]
        fn test_debit_agrees_with_check(start in 0u128..1_000, amounts in proptest::collection::vec(0u128..400, 0..10)) {
            let mut session = Session::new(start, BTreeSet::new(), BTreeMap::new());
            let key = KeyId::new(1);

            for amount in amounts {
                let before = session.native_allowance();
                let checked = session.check(key, Resource::Native, amount);
                let debited = session.debit(key, Resource::Native, amount);

                proptest::prop_assert_eq!(checked.is_ok(), debited.is_ok());
                match debited {
                    Ok(left) => proptest::prop_assert_eq!(left, before - amount),
                    Err(_) => proptest::prop_assert_eq!(session.native_allowance(), before),
                }
            }
        }
    }
}
