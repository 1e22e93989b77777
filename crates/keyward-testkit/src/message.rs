//! Call payloads understood by the test chain.
//!
//! Payloads are CBOR. An empty payload is a plain value transfer.

use serde::{Deserialize, Serialize};

use keyward_core::{encode_payload, Address, Call, CoreError, KeyId, TokenId};
use keyward_perms::SessionRequest;

/// Messages for mock assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCall {
    /// Move fungible units from the sender.
    Transfer { to: Address, amount: u128 },
    /// Move a non-fungible token owned by the sender.
    TransferToken { to: Address, token_id: TokenId },
}

impl AssetCall {
    /// Address this message to `asset`.
    pub fn to_call(&self, asset: Address) -> Result<Call, CoreError> {
        Ok(Call::invoke(asset, encode_payload(self)?))
    }
}

/// Messages for key accounts. The sender is the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCall {
    /// Execute a call through the account with a key the sender holds.
    Execute { key: KeyId, call: Call },
    /// Mint a key. Root only.
    CreateKey { key: KeyId, receiver: Address },
    /// Burn key units. Root only.
    BurnKey { holder: Address, key: KeyId, amount: u128 },
    /// Move key units the sender holds.
    TransferKey { to: Address, key: KeyId, amount: u128 },
    /// Create a session. Root only.
    CreateSession { key: KeyId, request: SessionRequest },
}

impl AccountCall {
    /// Address this message to `account`.
    pub fn to_call(&self, account: Address) -> Result<Call, CoreError> {
        Ok(Call::invoke(account, encode_payload(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::decode_payload;

    #[test]
    fn test_nested_execute_decodes() {
        let inner = AssetCall::Transfer {
            to: Address::from_low_u64(5),
            amount: 1 << 100,
        }
        .to_call(Address::from_low_u64(50))
        .unwrap();
        let outer = AccountCall::Execute {
            key: KeyId::new(3),
            call: inner,
        };

        let call = outer.to_call(Address::from_low_u64(100)).unwrap();
        assert_eq!(call.value, 0);
        let decoded: AccountCall = decode_payload(&call.payload).unwrap();
        assert_eq!(decoded, outer);
    }

    #[test]
    fn test_asset_call_is_not_account_call() {
        let call = AssetCall::TransferToken {
            to: Address::from_low_u64(5),
            token_id: TokenId(1),
        }
        .to_call(Address::from_low_u64(50))
        .unwrap();
        assert!(decode_payload::<AccountCall>(&call.payload).is_err());
    }
}
