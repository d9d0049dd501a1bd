//! Canonical transaction encoding: the exact bytes every signature covers.
//!
//! Layout, one `'|'` between fields:
//!
//! ```text
//! type | sender | recipient | amount | text_data | nonce | extra_info
//! ```
//!
//! `type`, `amount` and `nonce` are decimal, and the addresses are base58,
//! so none of them can contain `'|'` or `'\'`. The two free-form fields are
//! escaped (`'\'` -> `"\\"`, `'|'` -> `"\|"`) so that no text can forge a
//! field boundary. Text without either character encodes byte-for-byte
//! like a plain delimiter join, which is what ledger nodes compute.
//!
//! Timestamp, proof and witness are not covered.

use super::builder::Transaction;
use crate::config::{CANONICAL_ESCAPE, CANONICAL_SEPARATOR};

/// Encode the authenticated fields of `tx`. Pure and infallible.
pub fn canonical_bytes(tx: &Transaction) -> Vec<u8> {
    let text = tx.text_data().as_bytes();
    let extra = tx.extra_info().as_bytes();
    let mut buf = Vec::with_capacity(
        tx.sender().len() + tx.recipient().len() + text.len() + extra.len() + 96,
    );

    buf.extend_from_slice(tx.tx_type().code().to_string().as_bytes());
    buf.push(CANONICAL_SEPARATOR);
    buf.extend_from_slice(tx.sender().as_bytes());
    buf.push(CANONICAL_SEPARATOR);
    buf.extend_from_slice(tx.recipient().as_bytes());
    buf.push(CANONICAL_SEPARATOR);
    buf.extend_from_slice(tx.amount().to_string().as_bytes());
    buf.push(CANONICAL_SEPARATOR);
    push_escaped(&mut buf, text);
    buf.push(CANONICAL_SEPARATOR);
    buf.extend_from_slice(tx.nonce().to_string().as_bytes());
    buf.push(CANONICAL_SEPARATOR);
    push_escaped(&mut buf, extra);

    buf
}

fn push_escaped(buf: &mut Vec<u8>, field: &[u8]) {
    for &b in field {
        if b == CANONICAL_SEPARATOR || b == CANONICAL_ESCAPE {
            buf.push(CANONICAL_ESCAPE);
        }
        buf.push(b);
    }
}
