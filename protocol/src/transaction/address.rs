//! Address format checks and curve membership for content transactions.
//!
//! An address is the base58 encoding of 32 bytes. For key-controlled
//! accounts those bytes are an Ed25519 public key; for accounts derived from
//! an off-chain user id they are a SHA-256 digest and need not be a curve
//! point. Curve membership therefore only matters where funds must land on
//! a key that can later sign, which today means donation campaign feeds.

use curve25519_dalek::edwards::CompressedEdwardsY;
use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::types::{TransactionType, UserContent};
use crate::config::{ADDRESS_LENGTH, CONTENT_TYPES_REQUIRING_CURVE_ADDRESS};
use crate::crypto::hash::sha256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address {0:?}: expected base58 of 32 bytes")]
    InvalidAddress(String),
}

/// Base58-decode `address` and require exactly 32 bytes.
pub fn validate_address_format(address: &str) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let invalid = || AddressError::InvalidAddress(address.to_string());
    let bytes = bs58::decode(address).into_vec().map_err(|_| invalid())?;
    bytes.try_into().map_err(|_| invalid())
}

/// Address for an off-chain user id: `base58(sha256(user_id))`.
///
/// ```
/// use mmn_protocol::transaction::address::{derive_address, validate_address_format};
///
/// let addr = derive_address("user-42");
/// assert!(validate_address_format(&addr).is_ok());
/// ```
pub fn derive_address(user_id: &str) -> String {
    bs58::encode(sha256(user_id.as_bytes())).into_string()
}

/// Whether the recipient is acceptable as far as the curve is concerned.
///
/// Only user-content transactions whose extra-info `type` is allow-listed
/// are checked; every other transaction passes. For those, unparsable
/// extra info, a recipient that is not 32 bytes, or bytes that do not
/// decompress to an Ed25519 point all fail. Non-canonical encodings of a
/// valid point are accepted, as ledger nodes accept them.
pub fn validate_curve_membership(tx: &Transaction) -> bool {
    if tx.tx_type() != TransactionType::UserContent {
        return true;
    }

    let content = match UserContent::from_extra_info(tx.extra_info()) {
        Ok(Some(content)) => content,
        Ok(None) => return true,
        Err(e) => {
            debug!(error = %e, "user content with unparsable extra info");
            return false;
        }
    };

    let content_type = content.content_type.as_str();
    if !CONTENT_TYPES_REQUIRING_CURVE_ADDRESS.contains(&content_type) {
        return true;
    }

    let Ok(bytes) = validate_address_format(tx.recipient()) else {
        return false;
    };
    let on_curve = is_curve_point(&bytes);
    if !on_curve {
        debug!(content_type, "recipient is not an Ed25519 point");
    }
    on_curve
}

fn is_curve_point(bytes: &[u8; ADDRESS_LENGTH]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONTENT_TYPE_DONATION_CAMPAIGN_FEED;
    use crate::crypto::MmnKeypair;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::ExtraInfo;

    /// 32 bytes that are valid base58 but not a curve point.
    fn off_curve_address() -> String {
        // Roughly half of all y coordinates have no matching x.
        let bytes = (1u8..=255)
            .map(|y| {
                let mut bytes = [0u8; 32];
                bytes[0] = y;
                bytes
            })
            .find(|b| CompressedEdwardsY(*b).decompress().is_none())
            .unwrap();
        bs58::encode(bytes).into_string()
    }

    fn content_tx(recipient: &str, content_type: Option<&str>) -> Transaction {
        let sender = MmnKeypair::from_seed(&[1u8; 32]).address();
        let mut builder = TransactionBuilder::new(TransactionType::UserContent)
            .sender(&sender)
            .recipient(recipient)
            .amount(1u64)
            .nonce(1)
            .timestamp(1_700_000_000);
        if let Some(t) = content_type {
            let mut extra = ExtraInfo::new();
            extra.insert("type".into(), t.into());
            builder = builder.extra_info(extra);
        }
        builder.build().unwrap()
    }

    #[test]
    fn format_accepts_32_bytes_only() {
        let addr = MmnKeypair::generate().address();
        assert!(validate_address_format(&addr).is_ok());

        for bad in [
            String::new(),
            "0OIl".to_string(),
            bs58::encode([7u8; 31]).into_string(),
            bs58::encode([7u8; 33]).into_string(),
        ] {
            assert_eq!(
                validate_address_format(&bad),
                Err(AddressError::InvalidAddress(bad.clone()))
            );
        }
    }

    #[test]
    fn derived_address_is_sha256() {
        let addr = derive_address("alice");
        let decoded = validate_address_format(&addr).unwrap();
        assert_eq!(decoded, sha256(b"alice"));
        assert_eq!(addr, derive_address("alice"));
        assert_ne!(addr, derive_address("bob"));
    }

    #[test]
    fn allow_listed_content_requires_curve_point() {
        let on_curve = MmnKeypair::generate().address();
        assert!(validate_curve_membership(&content_tx(
            &on_curve,
            Some(CONTENT_TYPE_DONATION_CAMPAIGN_FEED)
        )));
        assert!(!validate_curve_membership(&content_tx(
            &off_curve_address(),
            Some(CONTENT_TYPE_DONATION_CAMPAIGN_FEED)
        )));
    }

    #[test]
    fn other_content_types_are_not_checked() {
        let off = off_curve_address();
        assert!(validate_curve_membership(&content_tx(&off, Some("unlock_item"))));
        assert!(validate_curve_membership(&content_tx(&off, None)));
    }

    #[test]
    fn non_content_transactions_pass() {
        let tx = content_tx(&off_curve_address(), Some(CONTENT_TYPE_DONATION_CAMPAIGN_FEED))
            .to_builder()
            .tx_type(TransactionType::FAUCET)
            .build()
            .unwrap();
        assert!(validate_curve_membership(&tx));
    }

    #[test]
    fn non_canonical_encoding_is_accepted() {
        // y = p (2^255 - 19) encodes the same point as y = 0, non-canonically.
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0xed;
        bytes[31] = 0x7f;
        let recipient = bs58::encode(bytes).into_string();
        assert!(validate_curve_membership(&content_tx(
            &recipient,
            Some(CONTENT_TYPE_DONATION_CAMPAIGN_FEED)
        )));
    }

    #[test]
    fn extra_info_with_non_string_values_still_routes() {
        let sender = MmnKeypair::from_seed(&[1u8; 32]).address();
        let base = TransactionBuilder::new(TransactionType::UserContent)
            .sender(&sender)
            .recipient(&off_curve_address())
            .amount(1u64)
            .nonce(1)
            .timestamp(1_700_000_000)
            .build()
            .unwrap();
        let raw = format!(
            r#"{{"type":"{CONTENT_TYPE_DONATION_CAMPAIGN_FEED}","campaign_id":42}}"#
        );
        let tx: Transaction = serde_json::from_value({
            let mut v = serde_json::to_value(&base).unwrap();
            v["extra_info"] = serde_json::Value::String(raw);
            v
        })
        .unwrap();
        assert!(!validate_curve_membership(&tx));
    }

    #[test]
    fn unparsable_extra_info_fails() {
        let base = content_tx(&MmnKeypair::generate().address(), None);
        let mut v = serde_json::to_value(&base).unwrap();
        v["extra_info"] = serde_json::Value::String("not json".into());
        let tx: Transaction = serde_json::from_value(v).unwrap();
        assert!(!validate_curve_membership(&tx));
    }
}
