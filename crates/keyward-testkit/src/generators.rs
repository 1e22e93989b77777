//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keyward_core::{Address, KeyId, TokenId};
use keyward_perms::SessionRequest;

/// Destinations generated sessions and calls draw from. Small, so that
/// generated calls hit and miss allow-lists often.
pub const DESTINATION_POOL: u64 = 6;

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate one of the pooled destinations.
pub fn pooled_destination() -> impl Strategy<Value = Address> {
    (0..DESTINATION_POOL).prop_map(destination)
}

/// The `n`th pooled destination.
pub fn destination(n: u64) -> Address {
    Address::from_low_u64(0xd000 + n)
}

/// Generate a non-root key.
pub fn key_id() -> impl Strategy<Value = KeyId> {
    (1u64..=16).prop_map(KeyId::new)
}

/// Generate an amount up to `max`.
pub fn amount(max: u128) -> impl Strategy<Value = u128> {
    0..=max
}

/// Generate a session request that validates: pooled destinations, a native
/// allowance, and no tracked assets.
pub fn session_request() -> impl Strategy<Value = SessionRequest> {
    (
        prop::collection::vec(pooled_destination(), 0..=3),
        amount(500),
    )
        .prop_map(|(destinations, native_allowance)| {
            SessionRequest::new(native_allowance).destinations(destinations)
        })
}

/// Generate a session request whose parallel arrays may disagree in length.
///
/// Every array length is drawn on its own, so both the outer non-fungible
/// arrays and the per-asset id and allowance lists can mismatch.
pub fn ragged_request() -> impl Strategy<Value = SessionRequest> {
    (
        prop::collection::vec(address(), 0..4),
        prop::collection::vec(any::<u128>(), 0..4),
        0u64..4,
        prop::collection::vec(prop::collection::vec(any::<u64>().prop_map(TokenId), 0..3), 0..3),
        prop::collection::vec(prop::collection::vec(any::<u128>(), 0..3), 0..3),
    )
        .prop_map(
            |(fungible_assets, fungible_allowances, nft_count, nft_token_ids, nft_allowances)| {
                let nft_assets = (0..nft_count)
                    .map(|n| Address::from_low_u64(0xe000 + n))
                    .collect();
                SessionRequest {
                    fungible_assets,
                    fungible_allowances,
                    nft_assets,
                    nft_token_ids,
                    nft_allowances,
                    ..SessionRequest::default()
                }
            },
        )
}

/// One attempted spend in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    pub destination: Address,
    pub value: u128,
}

/// Generate a sequence of spends against pooled destinations.
pub fn spends(max_len: usize) -> impl Strategy<Value = Vec<Spend>> {
    prop::collection::vec(
        (pooled_destination(), amount(200)).prop_map(|(destination, value)| Spend { destination, value }),
        0..=max_len,
    )
}
