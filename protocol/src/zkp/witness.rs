//! Public witness binary codec.
//!
//! ```text
//! u32 BE  public count
//! u32 BE  secret count
//! u32 BE  vector length     (= public + secret)
//! length × 32-byte big-endian scalars, each < r
//! ```
//!
//! A public witness as sent by clients carries a secret count of zero. The
//! decoder is strict: short input, trailing bytes, a length that does not
//! add up, or a scalar at or above the field modulus are all errors.

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, PrimeField};
use thiserror::Error;

use crate::config::ZK_SCALAR_BYTES;

const HEADER_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WitnessError {
    #[error("witness truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("witness length {len} does not match {public} public + {secret} secret")]
    CountMismatch { public: u32, secret: u32, len: u32 },

    #[error("{0} trailing bytes after witness")]
    TrailingBytes(usize),

    #[error("witness scalar {0} is not reduced mod r")]
    NonCanonicalScalar(usize),
}

/// Encode `public` as a public-only witness (secret count zero).
pub fn encode_public_witness(public: &[Fr]) -> Vec<u8> {
    let count = public.len() as u32;
    let mut buf = Vec::with_capacity(HEADER_LEN + public.len() * ZK_SCALAR_BYTES);
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    for scalar in public {
        buf.extend_from_slice(&scalar_to_be_bytes(scalar));
    }
    buf
}

/// Decode a witness and return its public part.
pub fn decode_public_witness(data: &[u8]) -> Result<Vec<Fr>, WitnessError> {
    if data.len() < HEADER_LEN {
        return Err(WitnessError::Truncated {
            needed: HEADER_LEN,
            got: data.len(),
        });
    }
    let public = read_u32(&data[0..4]);
    let secret = read_u32(&data[4..8]);
    let len = read_u32(&data[8..12]);

    if u64::from(public) + u64::from(secret) != u64::from(len) {
        return Err(WitnessError::CountMismatch { public, secret, len });
    }

    let body = &data[HEADER_LEN..];
    let needed = len as usize * ZK_SCALAR_BYTES;
    if body.len() < needed {
        return Err(WitnessError::Truncated {
            needed: HEADER_LEN + needed,
            got: data.len(),
        });
    }
    if body.len() > needed {
        return Err(WitnessError::TrailingBytes(body.len() - needed));
    }

    let mut scalars = Vec::with_capacity(len as usize);
    for (i, chunk) in body.chunks_exact(ZK_SCALAR_BYTES).enumerate() {
        let scalar = scalar_from_be_bytes(chunk).ok_or(WitnessError::NonCanonicalScalar(i))?;
        scalars.push(scalar);
    }
    scalars.truncate(public as usize);
    Ok(scalars)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

fn scalar_to_be_bytes(scalar: &Fr) -> [u8; ZK_SCALAR_BYTES] {
    let mut out = [0u8; ZK_SCALAR_BYTES];
    let bytes = scalar.into_bigint().to_bytes_be();
    out[ZK_SCALAR_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// `None` unless `chunk` is 32 bytes encoding a value below the modulus.
fn scalar_from_be_bytes(chunk: &[u8]) -> Option<Fr> {
    if chunk.len() != ZK_SCALAR_BYTES {
        return None;
    }
    // Four little-endian-ordered u64 limbs from big-endian bytes.
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let end = ZK_SCALAR_BYTES - i * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&chunk[end - 8..end]);
        *limb = u64::from_be_bytes(word);
    }
    Fr::from_bigint(BigInt::new(limbs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    fn sample() -> Vec<Fr> {
        vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(u64::MAX),
            -Fr::from(1u64),
        ]
    }

    #[test]
    fn roundtrip_public_vector() {
        let encoded = encode_public_witness(&sample());
        assert_eq!(encoded.len(), 12 + 4 * 32);
        assert_eq!(decode_public_witness(&encoded).unwrap(), sample());
    }

    #[test]
    fn header_matches_client_layout() {
        // Clients ship "AAAABAAAAAAAAAAE..." for a four-input statement.
        let encoded = BASE64.encode(encode_public_witness(&sample()));
        assert!(encoded.starts_with("AAAABAAAAAAAAAAE"));
    }

    #[test]
    fn scalars_are_big_endian() {
        let encoded = encode_public_witness(&[Fr::from(0x0102u64)]);
        assert_eq!(&encoded[12 + 30..], &[0x01, 0x02]);
    }

    #[test]
    fn secret_part_is_dropped() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&scalar_to_be_bytes(&Fr::from(5u64)));
        data.extend_from_slice(&scalar_to_be_bytes(&Fr::from(6u64)));
        assert_eq!(decode_public_witness(&data).unwrap(), vec![Fr::from(5u64)]);
    }

    #[test]
    fn rejects_truncated_and_trailing() {
        let encoded = encode_public_witness(&sample());
        assert!(matches!(
            decode_public_witness(&encoded[..8]),
            Err(WitnessError::Truncated { .. })
        ));
        assert!(matches!(
            decode_public_witness(&encoded[..encoded.len() - 1]),
            Err(WitnessError::Truncated { .. })
        ));

        let mut long = encoded.clone();
        long.push(0);
        assert_eq!(decode_public_witness(&long), Err(WitnessError::TrailingBytes(1)));
    }

    #[test]
    fn rejects_count_mismatch() {
        let mut encoded = encode_public_witness(&sample());
        encoded[3] = 3;
        assert_eq!(
            decode_public_witness(&encoded),
            Err(WitnessError::CountMismatch {
                public: 3,
                secret: 0,
                len: 4
            })
        );
    }

    #[test]
    fn huge_declared_length_does_not_allocate() {
        let mut data = Vec::new();
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            decode_public_witness(&data),
            Err(WitnessError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_unreduced_scalar() {
        let mut encoded = encode_public_witness(&[Fr::from(1u64)]);
        for b in &mut encoded[12..] {
            *b = 0xff;
        }
        assert_eq!(
            decode_public_witness(&encoded),
            Err(WitnessError::NonCanonicalScalar(0))
        );
    }
}
