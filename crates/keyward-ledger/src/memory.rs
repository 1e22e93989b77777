//! In-memory implementation of the OwnershipLedger trait.
//!
//! Clone-able so hosts can snapshot it together with the rest of their state.

use std::collections::BTreeMap;

use keyward_core::{Address, KeyId};

use crate::error::{LedgerError, Result};
use crate::traits::OwnershipLedger;

/// In-memory ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    /// Balances indexed by (holder, key). Zero balances are removed.
    balances: BTreeMap<(Address, KeyId), u128>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total units of `key` across all holders, or `None` if the total
    /// does not fit in a `u128`.
    pub fn supply(&self, key: KeyId) -> Option<u128> {
        self.balances
            .iter()
            .filter(|((_, k), _)| *k == key)
            .try_fold(0u128, |total, (_, amount)| total.checked_add(*amount))
    }

    /// Addresses holding at least one unit of `key`, in address order.
    pub fn holders(&self, key: KeyId) -> Vec<Address> {
        self.balances
            .keys()
            .filter(|(_, k)| *k == key)
            .map(|(holder, _)| *holder)
            .collect()
    }

    fn set(&mut self, holder: Address, key: KeyId, amount: u128) {
        if amount == 0 {
            self.balances.remove(&(holder, key));
        } else {
            self.balances.insert((holder, key), amount);
        }
    }

    fn debit(&mut self, holder: &Address, key: KeyId, amount: u128) -> Result<()> {
        let balance = self.balance_of(holder, key);
        let left = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                holder: *holder,
                key,
                balance,
                requested: amount,
            })?;
        self.set(*holder, key, left);
        Ok(())
    }

    fn credit(&mut self, holder: &Address, key: KeyId, amount: u128) -> Result<()> {
        if *holder == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        let total = self
            .balance_of(holder, key)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { holder: *holder, key })?;
        self.set(*holder, key, total);
        Ok(())
    }
}

impl OwnershipLedger for MemoryLedger {
    fn balance_of(&self, holder: &Address, key: KeyId) -> u128 {
        self.balances.get(&(*holder, key)).copied().unwrap_or(0)
    }

    fn mint(&mut self, receiver: &Address, key: KeyId, amount: u128) -> Result<()> {
        self.credit(receiver, key, amount)
    }

    fn burn(&mut self, holder: &Address, key: KeyId, amount: u128) -> Result<()> {
        self.debit(holder, key, amount)
    }

    fn transfer(&mut self, from: &Address, to: &Address, key: KeyId, amount: u128) -> Result<()> {
        if *to == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        if from == to {
            let balance = self.balance_of(from, key);
            if balance < amount {
                return Err(LedgerError::InsufficientBalance {
                    holder: *from,
                    key,
                    balance,
                    requested: amount,
                });
            }
            return Ok(());
        }
        // Check the receiving side first so a failed credit leaves both untouched
        self.balance_of(to, key)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { holder: *to, key })?;
        self.debit(from, key, amount)?;
        self.credit(to, key, amount)
    }
}
