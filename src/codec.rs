//! Entry id codec
//!
//! Self-describing variable-length encoding for entry ids, used as the value
//! format of the index.
//!
//! ## Wire Format
//! ```text
//! ┌───────────┬───────────┬──────────────────────────────┐
//! │ k (3 bit) │ hi (5 bit)│  k-1 bytes, big-endian       │
//! └───────────┴───────────┴──────────────────────────────┘
//! ```
//!
//! `k` is the total byte count (1..=8, with 8 stored as 0). The id is the
//! 5 high bits followed by the remaining bytes, so a k-byte value holds ids
//! below `32 * 256^(k-1)`. The largest encodable id is [`MAX_ENTRY_ID`].

use crate::error::{CasseqError, Result};

/// Maximum number of bytes in an encoded id
pub const MAX_ENCODED_LEN: usize = 8;

/// Largest id representable by the encoding (`2^61 - 1`)
pub const MAX_ENTRY_ID: u64 = (1 << 61) - 1;

/// Payload bits in the leading byte
const LEAD_BITS: u32 = 5;
const LEAD_MASK: u8 = 0x1f;

/// Byte count needed to encode `entry_id`, or `None` if it is out of range
pub fn encoded_len(entry_id: u64) -> Option<usize> {
    (1..=MAX_ENCODED_LEN).find(|&k| {
        let payload_bits = LEAD_BITS + 8 * (k as u32 - 1);
        entry_id >> payload_bits == 0
    })
}

/// Encode an entry id using the smallest byte count that fits.
pub fn encode_entry_id(entry_id: u64) -> Result<Vec<u8>> {
    let len = encoded_len(entry_id).ok_or(CasseqError::IdOverflow(entry_id))?;

    let mut blob = vec![0u8; len];
    let mut rest = entry_id;
    for byte in blob[1..].iter_mut().rev() {
        *byte = (rest & 0xff) as u8;
        rest >>= 8;
    }

    // 8 doesn't fit in three bits; it wraps to 0
    let tag = (len & 0x07) as u8;
    blob[0] = (tag << LEAD_BITS) | (rest as u8 & LEAD_MASK);

    Ok(blob)
}

/// Decode one entry id from the front of `blob`.
///
/// Returns the id and the unconsumed suffix.
pub fn decode_entry_id(blob: &[u8]) -> Result<(u64, &[u8])> {
    let lead = *blob
        .first()
        .ok_or_else(|| CasseqError::Codec("empty input".to_string()))?;

    let len = match (lead >> LEAD_BITS) as usize {
        0 => MAX_ENCODED_LEN,
        k => k,
    };

    if blob.len() < len {
        return Err(CasseqError::Codec(format!(
            "truncated id: need {} bytes, have {}",
            len,
            blob.len()
        )));
    }

    let entry_id = blob[1..len]
        .iter()
        .fold(u64::from(lead & LEAD_MASK), |acc, &b| (acc << 8) | u64::from(b));

    Ok((entry_id, &blob[len..]))
}
