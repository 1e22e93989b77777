//! SessionStore: the per-key session table.
//!
//! Sessions are created once and never removed. The only mutation after
//! creation is allowance consumption, which goes through
//! [`SessionStore::authorize`] (native value) and [`SessionStore::settle`]
//! (tracked assets).

use std::collections::BTreeMap;

use keyward_core::{state_root, Address, AuthError, Blake3Hash, Call, KeyId, Resource, Session};

use crate::accountant::{Consumption, Watchlist};
use crate::request::{SessionLimits, SessionRequest};

/// Proof that a session admitted a call and its native allowance has already
/// been decremented.
///
/// Only [`SessionStore::authorize`] makes these. The ticket owns the call it
/// admits and borrows nothing, so the store is free to be re-entered while the
/// call is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an authorization does nothing until its call is dispatched"]
pub struct Authorization {
    caller: Address,
    key: KeyId,
    call: Call,
    remaining_native: u128,
    watchlist: Watchlist,
}

impl Authorization {
    /// Who asked.
    pub fn caller(&self) -> &Address {
        &self.caller
    }

    /// Which key was used.
    pub fn key(&self) -> KeyId {
        self.key
    }

    /// The admitted call.
    pub fn call(&self) -> &Call {
        &self.call
    }

    /// Native allowance left right after this call's value was taken.
    pub fn remaining_native(&self) -> u128 {
        self.remaining_native
    }

    /// Assets to snapshot around the call.
    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }
}

/// Per-key session table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStore {
    sessions: BTreeMap<KeyId, Session>,
    limits: SessionLimits,
}

impl SessionStore {
    /// Create an empty store with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given limits.
    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            sessions: BTreeMap::new(),
            limits,
        }
    }

    /// Create the session for `key`.
    ///
    /// Fails with `ExistingSession` if one exists, whatever the request says,
    /// and with `BadInput` if the request is inconsistent. Nothing is written
    /// on failure.
    pub fn create(&mut self, key: KeyId, request: &SessionRequest) -> Result<&Session, AuthError> {
        if self.sessions.contains_key(&key) {
            return Err(AuthError::ExistingSession(key));
        }
        let session = request.validate(key, &self.limits)?;
        Ok(self.sessions.entry(key).or_insert(session))
    }

    /// Look up the session for `key`.
    pub fn get(&self, key: KeyId) -> Option<&Session> {
        self.sessions.get(&key)
    }

    /// Whether `key` has a session.
    pub fn contains(&self, key: KeyId) -> bool {
        self.sessions.contains_key(&key)
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate sessions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyId, &Session)> {
        self.sessions.iter()
    }

    /// Blake3 digest of the canonical encoding of every session.
    pub fn state_root(&self) -> Blake3Hash {
        state_root(&self.sessions)
    }

    /// Admit `call` under the session of `key`.
    ///
    /// Checks, in order: a session exists, the destination is allowed, the
    /// native allowance covers `call.value`. On success the value is already
    /// subtracted from the allowance when this returns. On failure nothing
    /// changes.
    pub fn authorize(
        &mut self,
        caller: &Address,
        key: KeyId,
        call: Call,
        track_assets: bool,
    ) -> Result<Authorization, AuthError> {
        let session = self.sessions.get_mut(&key).ok_or(AuthError::Unauthorized {
            caller: *caller,
            key,
        })?;

        if !session.permits(&call.destination) {
            return Err(AuthError::UnauthorizedDestination {
                key,
                destination: call.destination,
            });
        }

        let remaining_native = session.debit(key, Resource::Native, call.value)?;

        let watchlist = if track_assets && session.tracks_assets() {
            Watchlist::of(session)
        } else {
            Watchlist::default()
        };

        Ok(Authorization {
            caller: *caller,
            key,
            call,
            remaining_native,
            watchlist,
        })
    }

    /// Charge tracked-asset consumption observed around an authorized call.
    ///
    /// Charges against the allowances as they are now, which may be lower
    /// than when the call was admitted if the call re-entered.
    pub fn settle(&mut self, ticket: &Authorization, consumption: &Consumption) -> Result<(), AuthError> {
        if consumption.is_empty() {
            return Ok(());
        }
        let session = self
            .sessions
            .get_mut(&ticket.key)
            .ok_or(AuthError::Unauthorized {
                caller: ticket.caller,
                key: ticket.key,
            })?;
        consumption.apply(ticket.key, session)
    }
}
