//! Session creation requests.
//!
//! A request mirrors the argument shape of session creation: parallel arrays
//! of assets and allowances. Arrays that disagree in length are rejected with
//! `BadInput` before anything is written; nothing is truncated or padded.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use keyward_core::{Address, AssetAllowance, AuthError, KeyId, Session, TokenId};

/// Structural limits on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Maximum distinct destinations in the allow-list.
    pub max_destinations: usize,
    /// Maximum tracked assets (fungible and non-fungible together).
    pub max_tracked_assets: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_destinations: 256,
            max_tracked_assets: 32,
        }
    }
}

/// Arguments for creating a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Allowed destinations. Empty means unrestricted.
    pub destinations: Vec<Address>,

    /// Native value allowance.
    pub native_allowance: u128,

    /// Tracked fungible assets.
    pub fungible_assets: Vec<Address>,

    /// One allowance per entry of `fungible_assets`.
    pub fungible_allowances: Vec<u128>,

    /// Tracked non-fungible assets.
    pub nft_assets: Vec<Address>,

    /// Tracked token ids, one list per entry of `nft_assets`.
    pub nft_token_ids: Vec<Vec<TokenId>>,

    /// Allowances, one list per entry of `nft_assets`, each matching the
    /// corresponding `nft_token_ids` list.
    pub nft_allowances: Vec<Vec<u128>>,
}

impl SessionRequest {
    /// A request with a native allowance and nothing else.
    pub fn new(native_allowance: u128) -> Self {
        Self {
            native_allowance,
            ..Self::default()
        }
    }

    /// Add an allowed destination.
    pub fn destination(mut self, destination: Address) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Add several allowed destinations.
    pub fn destinations(mut self, destinations: impl IntoIterator<Item = Address>) -> Self {
        self.destinations.extend(destinations);
        self
    }

    /// Track a fungible asset with an allowance.
    pub fn fungible(mut self, asset: Address, allowance: u128) -> Self {
        self.fungible_assets.push(asset);
        self.fungible_allowances.push(allowance);
        self
    }

    /// Track token ids of a non-fungible asset, each with an allowance.
    pub fn non_fungible(
        mut self,
        asset: Address,
        allowances: impl IntoIterator<Item = (TokenId, u128)>,
    ) -> Self {
        let (ids, amounts): (Vec<_>, Vec<_>) = allowances.into_iter().unzip();
        self.nft_assets.push(asset);
        self.nft_token_ids.push(ids);
        self.nft_allowances.push(amounts);
        self
    }

    /// Validate the request and build the session it describes.
    pub fn validate(&self, key: KeyId, limits: &SessionLimits) -> Result<Session, AuthError> {
        if key.is_root() {
            return Err(AuthError::bad_input("the root key cannot carry a session"));
        }

        if self.fungible_assets.len() != self.fungible_allowances.len() {
            return Err(AuthError::bad_input(format!(
                "{} fungible assets but {} allowances",
                self.fungible_assets.len(),
                self.fungible_allowances.len()
            )));
        }
        if self.nft_assets.len() != self.nft_token_ids.len()
            || self.nft_assets.len() != self.nft_allowances.len()
        {
            return Err(AuthError::bad_input(format!(
                "{} non-fungible assets, {} token id lists, {} allowance lists",
                self.nft_assets.len(),
                self.nft_token_ids.len(),
                self.nft_allowances.len()
            )));
        }

        let destinations: BTreeSet<Address> = self.destinations.iter().copied().collect();
        if destinations.len() > limits.max_destinations {
            return Err(AuthError::bad_input(format!(
                "{} destinations exceeds limit of {}",
                destinations.len(),
                limits.max_destinations
            )));
        }

        let tracked_count = self.fungible_assets.len() + self.nft_assets.len();
        if tracked_count > limits.max_tracked_assets {
            return Err(AuthError::bad_input(format!(
                "{} tracked assets exceeds limit of {}",
                tracked_count, limits.max_tracked_assets
            )));
        }

        let mut tracked = BTreeMap::new();

        for (asset, allowance) in self.fungible_assets.iter().zip(&self.fungible_allowances) {
            if tracked
                .insert(*asset, AssetAllowance::Fungible(*allowance))
                .is_some()
            {
                return Err(duplicate_asset(asset));
            }
        }

        for ((asset, ids), amounts) in self
            .nft_assets
            .iter()
            .zip(&self.nft_token_ids)
            .zip(&self.nft_allowances)
        {
            if ids.len() != amounts.len() {
                return Err(AuthError::bad_input(format!(
                    "asset {}: {} token ids but {} allowances",
                    asset,
                    ids.len(),
                    amounts.len()
                )));
            }

            let mut per_id = BTreeMap::new();
            for (id, amount) in ids.iter().zip(amounts) {
                if per_id.insert(*id, *amount).is_some() {
                    return Err(AuthError::bad_input(format!(
                        "asset {}: token {} listed twice",
                        asset, id
                    )));
                }
            }

            if tracked
                .insert(*asset, AssetAllowance::NonFungible(per_id))
                .is_some()
            {
                return Err(duplicate_asset(asset));
            }
        }

        Ok(Session::new(self.native_allowance, destinations, tracked))
    }
}

fn duplicate_asset(asset: &Address) -> AuthError {
    AuthError::bad_input(format!("asset {} listed twice", asset))
}
