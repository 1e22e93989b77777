//! Canonical CBOR encoding of session state.
//!
//! This module implements the subset of RFC 8949 Core Deterministic Encoding
//! needed for session tables:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Amounts are `u128` and encode as 16-byte big-endian byte strings
//!
//! Two session tables with equal canonical bytes are identical, so the
//! Blake3 digest of these bytes serves as a state root.

use std::collections::BTreeMap;

use ciborium::value::Value;

use crate::hash::Blake3Hash;
use crate::session::{AssetAllowance, Session};
use crate::types::KeyId;

/// Session field keys (integer keys for compact encoding).
mod keys {
    pub const NATIVE_ALLOWANCE: u64 = 0;
    pub const DESTINATIONS: u64 = 1;
    pub const TRACKED_ASSETS: u64 = 2;
}

/// Allowance kind tags.
mod kinds {
    pub const FUNGIBLE: u64 = 0;
    pub const NON_FUNGIBLE: u64 = 1;
}

/// Domain prefix mixed into state roots.
pub const STATE_ROOT_DOMAIN: &[u8] = b"keyward/sessions/v1";

/// Encode one session to canonical CBOR bytes.
pub fn canonical_session_bytes(session: &Session) -> Vec<u8> {
    encode_cbor_value_canonical(&session_to_cbor_value(session))
}

/// Encode a whole session table to canonical CBOR bytes.
pub fn canonical_table_bytes(sessions: &BTreeMap<KeyId, Session>) -> Vec<u8> {
    let entries = sessions
        .iter()
        .map(|(key, session)| (Value::Integer(key.0.into()), session_to_cbor_value(session)))
        .collect();
    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Blake3 digest of a session table, domain separated.
pub fn state_root(sessions: &BTreeMap<KeyId, Session>) -> Blake3Hash {
    let mut input = STATE_ROOT_DOMAIN.to_vec();
    input.extend_from_slice(&canonical_table_bytes(sessions));
    Blake3Hash::hash(&input)
}

fn amount(n: u128) -> Value {
    Value::Bytes(n.to_be_bytes().to_vec())
}

/// Convert a session to a CBOR Value (map with integer keys).
fn session_to_cbor_value(session: &Session) -> Value {
    let mut entries = Vec::with_capacity(3);

    // 0: native allowance
    entries.push((
        Value::Integer(keys::NATIVE_ALLOWANCE.into()),
        amount(session.native_allowance()),
    ));

    // 1: destinations (array of bytes, already ordered by the set)
    let destinations = session
        .allowed_destinations()
        .iter()
        .map(|d| Value::Bytes(d.0.to_vec()))
        .collect();
    entries.push((Value::Integer(keys::DESTINATIONS.into()), Value::Array(destinations)));

    // 2: tracked assets (map asset -> [kind, allowance])
    let tracked = session
        .tracked_assets()
        .iter()
        .map(|(asset, allowance)| (Value::Bytes(asset.0.to_vec()), allowance_to_cbor_value(allowance)))
        .collect();
    entries.push((Value::Integer(keys::TRACKED_ASSETS.into()), Value::Map(tracked)));

    Value::Map(entries)
}

fn allowance_to_cbor_value(allowance: &AssetAllowance) -> Value {
    match allowance {
        AssetAllowance::Fungible(left) => Value::Array(vec![
            Value::Integer(kinds::FUNGIBLE.into()),
            amount(*left),
        ]),
        AssetAllowance::NonFungible(per_id) => {
            let ids = per_id
                .iter()
                .map(|(id, left)| (Value::Integer(id.0.into()), amount(*left)))
                .collect();
            Value::Array(vec![
                Value::Integer(kinds::NON_FUNGIBLE.into()),
                Value::Map(ids),
            ])
        }
    }
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only the value shapes built in this module reach here.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            // Keys, tags and token ids are all u64.
            encode_uint(buf, 0, n as u64);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        _ => {
            buf.push(0xf6);
        }
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
