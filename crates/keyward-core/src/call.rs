//! Outbound calls: the unit of work an account is asked to perform.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Address;

/// An outbound call from an account.
///
/// `value` is native value attached to the call; `payload` is opaque to the
/// engine and interpreted only by the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Where the call goes.
    pub destination: Address,

    /// Native value sent along.
    pub value: u128,

    /// Call data.
    pub payload: Bytes,
}

impl Call {
    /// Create a call carrying value and payload.
    pub fn new(destination: Address, value: u128, payload: impl Into<Bytes>) -> Self {
        Self {
            destination,
            value,
            payload: payload.into(),
        }
    }

    /// A plain value transfer with empty payload.
    pub fn transfer(destination: Address, value: u128) -> Self {
        Self::new(destination, value, Bytes::new())
    }

    /// A call with no value attached.
    pub fn invoke(destination: Address, payload: impl Into<Bytes>) -> Self {
        Self::new(destination, 0, payload)
    }
}

/// Encode a structured message as CBOR call data.
pub fn encode_payload<T: Serialize>(message: &T) -> Result<Bytes, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(message, &mut buf)
        .map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode CBOR call data into a structured message.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CoreError> {
    ciborium::from_reader(payload).map_err(|e| CoreError::DecodingError(e.to_string()))
}
