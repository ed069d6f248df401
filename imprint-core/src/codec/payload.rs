//! Watermark payload framing and forward error correction.
//!
//! The payload is a fixed-size frame so the extractor never needs to know
//! the identifier length up front:
//!
//! ```text
//! | len (1 byte) | crc16 (2 bytes) | identifier (32 bytes, zero padded) |
//! ```
//!
//! Frame bits are repetition-coded (x3, consecutive copies) before
//! embedding, and the decoder combines soft votes across all copies. The
//! CRC-16 gate means a corrupted payload decodes to `None` rather than to a
//! wrong identifier.

use crate::error::{ImprintError, Result};

/// Maximum identifier length the payload frame can carry, in bytes.
pub const MAX_IDENTIFIER_BYTES: usize = 32;

/// Fixed frame size: length prefix + CRC-16 + padded identifier.
pub const FRAME_BYTES: usize = 1 + 2 + MAX_IDENTIFIER_BYTES;

const FRAME_BITS: usize = FRAME_BYTES * 8;

/// Repetition factor of the inner FEC.
pub const REPETITION: usize = 3;

/// Total embedded payload size in bits (one complete copy).
pub const PAYLOAD_BITS: usize = FRAME_BITS * REPETITION;

/// CRC-16/CCITT-FALSE over the length prefix and identifier bytes.
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Encode an identifier into the repetition-coded payload bit sequence.
///
/// Returns `PAYLOAD_BITS` bits, each 0 or 1.
pub fn encode(identifier: &str) -> Result<Vec<u8>> {
    let id = identifier.as_bytes();
    if id.is_empty() {
        return Err(ImprintError::InvalidContent("empty identifier".into()));
    }
    if id.len() > MAX_IDENTIFIER_BYTES {
        return Err(ImprintError::InvalidContent(format!(
            "identifier is {} bytes, watermark payload carries at most {}",
            id.len(),
            MAX_IDENTIFIER_BYTES
        )));
    }

    let mut frame = Vec::with_capacity(FRAME_BYTES);
    frame.push(id.len() as u8);
    let mut checked = Vec::with_capacity(1 + id.len());
    checked.push(id.len() as u8);
    checked.extend_from_slice(id);
    frame.extend_from_slice(&crc16(&checked).to_be_bytes());
    frame.extend_from_slice(id);
    frame.resize(FRAME_BYTES, 0);

    let mut bits = Vec::with_capacity(PAYLOAD_BITS);
    for byte in frame {
        for shift in (0..8).rev() {
            let bit = (byte >> shift) & 1;
            for _ in 0..REPETITION {
                bits.push(bit);
            }
        }
    }
    debug_assert_eq!(bits.len(), PAYLOAD_BITS);
    Ok(bits)
}

/// Decode accumulated per-position soft votes back into an identifier.
///
/// `votes[i]` is the signed vote sum for payload bit `i` (positive means 1)
/// accumulated across all tiled copies of the payload. Returns `None` when
/// the frame fails its CRC or structural checks; corruption never yields a
/// wrong identifier.
pub fn decode(votes: &[i32]) -> Option<String> {
    if votes.len() != PAYLOAD_BITS {
        return None;
    }

    // Collapse repetition copies by summing their votes, then threshold.
    let mut frame = [0u8; FRAME_BYTES];
    for (pos, chunk) in votes.chunks(REPETITION).enumerate() {
        let total: i32 = chunk.iter().sum();
        if total > 0 {
            frame[pos / 8] |= 1 << (7 - (pos % 8));
        }
    }

    let len = frame[0] as usize;
    if len == 0 || len > MAX_IDENTIFIER_BYTES {
        return None;
    }
    let stored_crc = u16::from_be_bytes([frame[1], frame[2]]);
    let id_bytes = &frame[3..3 + len];

    let mut checked = Vec::with_capacity(1 + len);
    checked.push(frame[0]);
    checked.extend_from_slice(id_bytes);
    if crc16(&checked) != stored_crc {
        return None;
    }

    String::from_utf8(id_bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_to_votes(bits: &[u8]) -> Vec<i32> {
        bits.iter().map(|&b| if b == 1 { 1 } else { -1 }).collect()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let bits = encode("c-1").unwrap();
        assert_eq!(bits.len(), PAYLOAD_BITS);
        assert_eq!(decode(&bits_to_votes(&bits)).as_deref(), Some("c-1"));
    }

    #[test]
    fn roundtrip_max_length_identifier() {
        let id = "a".repeat(MAX_IDENTIFIER_BYTES);
        let bits = encode(&id).unwrap();
        assert_eq!(decode(&bits_to_votes(&bits)).as_deref(), Some(id.as_str()));
    }

    #[test]
    fn oversized_identifier_rejected() {
        let id = "a".repeat(MAX_IDENTIFIER_BYTES + 1);
        assert!(matches!(encode(&id), Err(ImprintError::InvalidContent(_))));
    }

    #[test]
    fn survives_minority_bit_flips() {
        let bits = encode("content-7f3a").unwrap();
        let mut votes = bits_to_votes(&bits);
        // Flip one vote in each repetition triple's first slot: the other
        // two copies still carry the bit.
        for chunk in votes.chunks_mut(REPETITION) {
            chunk[0] = -chunk[0];
        }
        assert_eq!(decode(&votes).as_deref(), Some("content-7f3a"));
    }

    #[test]
    fn corruption_yields_none_not_wrong_id() {
        let bits = encode("c-1").unwrap();
        let mut votes = bits_to_votes(&bits);
        for v in votes.iter_mut() {
            *v = -*v;
        }
        assert_eq!(decode(&votes), None);
    }

    #[test]
    fn garbage_votes_fail_crc() {
        let votes: Vec<i32> = (0..PAYLOAD_BITS as i32).map(|i| if i % 3 == 0 { 1 } else { -1 }).collect();
        assert_eq!(decode(&votes), None);
    }
}
