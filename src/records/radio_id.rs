//! Radio ID records: 32 bytes, up to 250.
//!
//! Unlike every other BCD field in the image, the radio ID is stored
//! little-endian — the original firmware's one inconsistency here.

use crate::error::{CodecError, RecordKind};
use crate::model::RadioId;
use crate::strings;

pub const SIZE: usize = 32;

/// Decode a 32-byte radio ID record.
pub fn decode(buf: &[u8], _index: usize) -> Result<RadioId, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::RadioId,
            address: 0,
            detail: "radio ID record has the wrong length",
        });
    }
    let id = crate::bcd::decode_le(&buf[0..4]) as u32;
    let name = strings::decode(&buf[5..21]);
    Ok(RadioId { name, id })
}

/// Encode a radio ID into a fresh 32-byte record.
pub fn encode(radio_id: &RadioId) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    crate::bcd::encode_le(radio_id.id as u64, &mut buf[0..4]);
    strings::encode(&radio_id.name, &mut buf[5..21]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let radio_id = RadioId { name: "N0CALL".to_string(), id: 1_234_567 };
        let buf = encode(&radio_id);
        let decoded = decode(&buf, 0).unwrap();
        assert_eq!(decoded, radio_id);
    }

    #[test]
    fn little_endian_digit_order_differs_from_big_endian() {
        let radio_id = RadioId { name: String::new(), id: 12_345_678 };
        let buf = encode(&radio_id);
        let mut be = [0u8; 4];
        crate::bcd::encode_be(12_345_678, &mut be);
        assert_ne!(&buf[0..4], &be);
    }
}
