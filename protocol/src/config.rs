//! # Protocol Configuration & Constants
//!
//! Every magic number the trust core depends on lives here. Key lengths,
//! the canonical separator, the expected circuit shape and the proof cache
//! defaults all have to agree with what ledger nodes do, so changing any of
//! them is a wire-compatibility decision, not a refactor.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature algorithm used for every transaction signature.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 seed (secret key) length in bytes. Any other private key length
/// is rejected at signing time.
pub const SEED_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Decoded length of a base58 address. Addresses are raw Ed25519 public
/// keys (or SHA-256 digests of a user id), so both are 32 bytes.
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Canonical Encoding
// ---------------------------------------------------------------------------

/// Field separator of the canonical transaction encoding.
pub const CANONICAL_SEPARATOR: u8 = b'|';

/// Escape byte for separator and escape occurrences inside free-form fields.
pub const CANONICAL_ESCAPE: u8 = b'\\';

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Decimal places of the native token. `1` token is `10^6` base units.
pub const NATIVE_DECIMALS: u32 = 6;

/// Amounts are 256-bit unsigned integers on the ledger.
pub const MAX_AMOUNT_BITS: u64 = 256;

// ---------------------------------------------------------------------------
// Zero-Knowledge Parameters
// ---------------------------------------------------------------------------

/// ZKP curve. Proofs, witnesses and the verifying key all live on BN254.
pub const ZKP_CURVE: &str = "BN254";

/// Number of public inputs the identity-binding circuit exposes. A witness
/// with any other arity belongs to a different circuit.
pub const ZK_PUBLIC_INPUT_COUNT: usize = 4;

/// Public input slot holding the field-encoded embedded public key.
pub const ZK_PUBLIC_KEY_INDEX: usize = 2;

/// Public input slot holding the field-encoded sender.
pub const ZK_SENDER_INDEX: usize = 3;

/// Size of one serialized scalar in a public witness (big-endian).
pub const ZK_SCALAR_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Proof Cache
// ---------------------------------------------------------------------------

/// Number of independently locked cache shards. Must be a power of two.
pub const PROOF_CACHE_SHARDS: usize = 128;

/// How long a cached verdict stays valid.
pub const PROOF_CACHE_LIFE_WINDOW: Duration = Duration::from_secs(30 * 60);

/// How often the janitor sweeps expired verdicts.
pub const PROOF_CACHE_CLEAN_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Upper bound on cached verdicts across all shards (8192 per shard at the
/// default shard count).
pub const PROOF_CACHE_MAX_ENTRIES: usize = PROOF_CACHE_SHARDS * 8_192;

// ---------------------------------------------------------------------------
// User Content
// ---------------------------------------------------------------------------

/// Extra-info `type` of a donation campaign feed post.
pub const CONTENT_TYPE_DONATION_CAMPAIGN_FEED: &str = "donation_campaign_feed";

/// User-content subtypes whose recipient must be a genuine curve point.
/// These route value to the recipient, so an address that merely looks
/// well-formed is not enough.
pub const CONTENT_TYPES_REQUIRING_CURVE_ADDRESS: &[&str] = &[CONTENT_TYPE_DONATION_CAMPAIGN_FEED];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SEED_LENGTH, 32);
        assert_eq!(PUBLIC_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(ADDRESS_LENGTH, PUBLIC_KEY_LENGTH);
    }

    #[test]
    fn test_identity_slots_within_arity() {
        assert!(ZK_PUBLIC_KEY_INDEX < ZK_PUBLIC_INPUT_COUNT);
        assert!(ZK_SENDER_INDEX < ZK_PUBLIC_INPUT_COUNT);
        assert_ne!(ZK_PUBLIC_KEY_INDEX, ZK_SENDER_INDEX);
    }

    #[test]
    fn test_cache_windows_sanity() {
        // Sweeping less often than entries expire would let the cache hold
        // dead entries for longer than their own lifetime.
        assert!(PROOF_CACHE_CLEAN_WINDOW <= PROOF_CACHE_LIFE_WINDOW);
        assert!(PROOF_CACHE_SHARDS > 1 && PROOF_CACHE_SHARDS.is_power_of_two());
        assert!(PROOF_CACHE_MAX_ENTRIES >= PROOF_CACHE_SHARDS);
    }

    #[test]
    fn test_separator_and_escape_are_distinct() {
        assert_ne!(CANONICAL_SEPARATOR, CANONICAL_ESCAPE);
    }
}
