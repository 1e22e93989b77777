//! Mock assets hosted by the test chain.
//!
//! Failures are reported as reverts, the way a real asset contract would
//! refuse a transfer.

use std::collections::BTreeMap;

use keyward::DispatchError;
use keyward_core::{Address, TokenId};

/// A fungible asset: one balance per holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockToken {
    balances: BTreeMap<Address, u128>,
}

impl MockToken {
    /// An asset with no holders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `owner`.
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Total units in existence, or `None` if the total does not fit in a
    /// `u128`.
    pub fn total_supply(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |total, amount| total.checked_add(*amount))
    }

    /// Create `amount` units for `to`.
    pub fn mint(&mut self, to: &Address, amount: u128) -> Result<(), DispatchError> {
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| DispatchError::Reverted(format!("mint overflows balance of {}", to)))?;
        self.balances.insert(*to, balance);
        Ok(())
    }

    /// Move `amount` units from `from` to `to`.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), DispatchError> {
        let held = self.balance_of(from);
        let left = held.checked_sub(amount).ok_or_else(|| {
            DispatchError::Reverted(format!("{} holds {}, cannot send {}", from, held, amount))
        })?;
        if from == to {
            return Ok(());
        }
        let received = self.balance_of(to).checked_add(amount).ok_or_else(|| {
            DispatchError::Reverted(format!("transfer overflows balance of {}", to))
        })?;
        self.balances.insert(*from, left);
        self.balances.insert(*to, received);
        Ok(())
    }
}

/// A non-fungible asset: one owner per token id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCollection {
    owners: BTreeMap<TokenId, Address>,
}

impl MockCollection {
    /// A collection with no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of `token_id`, if minted.
    pub fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    /// Number of tokens `owner` holds.
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.owners.values().filter(|o| *o == owner).count() as u128
    }

    /// Create `token_id` owned by `to`.
    pub fn mint(&mut self, to: &Address, token_id: TokenId) -> Result<(), DispatchError> {
        if self.owners.contains_key(&token_id) {
            return Err(DispatchError::Reverted(format!("token {} already minted", token_id)));
        }
        self.owners.insert(token_id, *to);
        Ok(())
    }

    /// Move `token_id` from `from` to `to`. Only the owner may move it.
    pub fn transfer(&mut self, from: &Address, to: &Address, token_id: TokenId) -> Result<(), DispatchError> {
        match self.owners.get_mut(&token_id) {
            Some(owner) if owner == from => {
                *owner = *to;
                Ok(())
            }
            Some(owner) => Err(DispatchError::Reverted(format!(
                "token {} belongs to {}, not {}",
                token_id, owner, from
            ))),
            None => Err(DispatchError::Reverted(format!("token {} does not exist", token_id))),
        }
    }
}
