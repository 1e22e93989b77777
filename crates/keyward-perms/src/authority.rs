//! KeyAuthority: who holds which key, and root-gated key management.

use keyward_core::{Address, AuthError, KeyId};
use keyward_ledger::OwnershipLedger;

use crate::error::Result;

/// Answers key-holding questions against an ownership ledger and gates key
/// minting and burning behind the root key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAuthority<L> {
    ledger: L,
}

impl<L: OwnershipLedger> KeyAuthority<L> {
    /// Wrap a ledger.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Wrap a ledger and mint one root key unit to `admin`.
    pub fn bootstrap(mut ledger: L, admin: &Address) -> Result<Self> {
        ledger.mint(admin, KeyId::ROOT, 1)?;
        Ok(Self::new(ledger))
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Whether `caller` holds at least one unit of `key`.
    pub fn holds(&self, caller: &Address, key: KeyId) -> bool {
        self.ledger.holds(caller, key)
    }

    /// Fail with `Unauthorized` unless `caller` holds `key`.
    pub fn require(&self, caller: &Address, key: KeyId) -> std::result::Result<(), AuthError> {
        if self.holds(caller, key) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                caller: *caller,
                key,
            })
        }
    }

    /// Fail with `Unauthorized` unless `caller` holds the root key.
    pub fn require_root(&self, caller: &Address) -> std::result::Result<(), AuthError> {
        self.require(caller, KeyId::ROOT)
    }

    /// Mint one unit of `key` to `receiver`. Root only.
    pub fn create_key(&mut self, caller: &Address, key: KeyId, receiver: &Address) -> Result<()> {
        self.require_root(caller)?;
        self.ledger.mint(receiver, key, 1)?;
        Ok(())
    }

    /// Burn `amount` units of `key` from `holder`. Root only.
    ///
    /// The holder's balance is not checked here; the ledger reports its own
    /// underflow.
    pub fn burn_key(
        &mut self,
        caller: &Address,
        holder: &Address,
        key: KeyId,
        amount: u128,
    ) -> Result<()> {
        self.require_root(caller)?;
        self.ledger.burn(holder, key, amount)?;
        Ok(())
    }

    /// Move `amount` units of `key` from `caller` to `to`.
    pub fn transfer_key(
        &mut self,
        caller: &Address,
        to: &Address,
        key: KeyId,
        amount: u128,
    ) -> Result<()> {
        self.ledger.transfer(caller, to, key, amount)?;
        Ok(())
    }
}
