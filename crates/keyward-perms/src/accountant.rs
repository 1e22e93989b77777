//! Allowance accounting for tracked assets.
//!
//! The accountant bounds how much of each tracked asset leaves an account
//! during one call, without any help from the callee. It snapshots the
//! account's holdings before the call, snapshots again after, and turns every
//! decrease into a charge against the session's allowances.
//!
//! This is an after-the-fact bound: it cannot stop a callee from moving
//! assets, but a call whose visible outflow exceeds what the session allows
//! fails as a whole, which rolls the outflow back with it.

use std::collections::{BTreeMap, BTreeSet};

use keyward_core::{Address, AuthError, KeyId, Resource, Session, TokenId};

/// Balance queries against tracked assets.
///
/// Implemented by whatever hosts the assets; the accountant only reads.
pub trait AssetBalances {
    /// Fungible balance of `owner`, or the number of tokens `owner` holds in
    /// a non-fungible collection.
    fn balance_of(&self, asset: &Address, owner: &Address) -> u128;

    /// Current owner of a non-fungible token, if it exists.
    fn owner_of(&self, asset: &Address, token_id: TokenId) -> Option<Address>;
}

/// What to observe for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Watched {
    /// Just the balance.
    Fungible,
    /// The collection balance plus ownership of these token ids.
    NonFungible(Vec<TokenId>),
}

/// The set of assets to snapshot around a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    assets: BTreeMap<Address, Watched>,
}

impl Watchlist {
    /// Everything a session tracks.
    pub fn of(session: &Session) -> Self {
        let assets = session
            .tracked_assets()
            .iter()
            .map(|(asset, allowance)| {
                let watched = if allowance.is_non_fungible() {
                    Watched::NonFungible(allowance.token_ids().collect())
                } else {
                    Watched::Fungible
                };
                (*asset, watched)
            })
            .collect();
        Self { assets }
    }

    /// Whether nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Number of watched assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }
}

/// Holdings of one asset at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Holding {
    Fungible(u128),
    NonFungible { balance: u128, owned: BTreeSet<TokenId> },
}

/// Holdings of every watched asset at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    holdings: BTreeMap<Address, Holding>,
}

/// Allowance charges derived from two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consumption {
    charges: Vec<(Resource, u128)>,
}

impl Consumption {
    /// Whether nothing was consumed.
    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// The individual charges.
    pub fn charges(&self) -> &[(Resource, u128)] {
        &self.charges
    }

    /// Charge everything against `session`, or nothing.
    ///
    /// Every charge is checked against the remaining allowances before any of
    /// them is applied, so a failure leaves the session untouched.
    pub fn apply(&self, key: KeyId, session: &mut Session) -> Result<(), AuthError> {
        for (resource, amount) in &self.charges {
            session.check(key, *resource, *amount)?;
        }
        for (resource, amount) in &self.charges {
            session.debit(key, *resource, *amount)?;
        }
        Ok(())
    }
}

/// Snapshots holdings and diffs them into allowance consumption.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowanceAccountant;

impl AllowanceAccountant {
    /// Record what `owner` holds of every watched asset.
    pub fn snapshot<B: AssetBalances + ?Sized>(
        &self,
        owner: &Address,
        watchlist: &Watchlist,
        balances: &B,
    ) -> BalanceSnapshot {
        let holdings = watchlist
            .assets
            .iter()
            .map(|(asset, watched)| {
                let balance = balances.balance_of(asset, owner);
                let holding = match watched {
                    Watched::Fungible => Holding::Fungible(balance),
                    Watched::NonFungible(ids) => Holding::NonFungible {
                        balance,
                        owned: ids
                            .iter()
                            .copied()
                            .filter(|id| balances.owner_of(asset, *id).as_ref() == Some(owner))
                            .collect(),
                    },
                };
                (*asset, holding)
            })
            .collect();
        BalanceSnapshot { holdings }
    }

    /// Turn the difference between two snapshots into charges.
    ///
    /// Growth never credits an allowance. For a non-fungible asset, each
    /// tracked id that left costs one unit of that id's allowance. A drop in
    /// the collection balance beyond the tracked ids that left is charged to
    /// the untracked slot, which has no allowance.
    pub fn consumption(&self, before: &BalanceSnapshot, after: &BalanceSnapshot) -> Consumption {
        let mut charges = Vec::new();

        for (asset, held_before) in &before.holdings {
            let Some(held_after) = after.holdings.get(asset) else {
                continue;
            };

            match (held_before, held_after) {
                (Holding::Fungible(was), Holding::Fungible(now)) => {
                    if now < was {
                        charges.push((Resource::Fungible(*asset), was - now));
                    }
                }
                (
                    Holding::NonFungible {
                        balance: was,
                        owned: owned_before,
                    },
                    Holding::NonFungible {
                        balance: now,
                        owned: owned_after,
                    },
                ) => {
                    let mut tracked_lost = 0u128;
                    for id in owned_before.difference(owned_after) {
                        charges.push((Resource::NonFungible(*asset, Some(*id)), 1));
                        tracked_lost += 1;
                    }

                    let untracked_loss = was.saturating_sub(*now).saturating_sub(tracked_lost);
                    if untracked_loss > 0 {
                        charges.push((Resource::NonFungible(*asset, None), untracked_loss));
                    }
                }
                // Same watchlist on both sides, so the kinds always agree
                _ => {}
            }
        }

        Consumption { charges }
    }
}
