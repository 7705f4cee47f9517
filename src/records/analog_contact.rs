//! Analog contact records: 48 bytes, banked 2 per 0x40000-byte stride.

use crate::error::{CodecError, RecordKind};
use crate::model::AnalogContact;
use crate::strings;

pub const SIZE: usize = 48;

/// Decode a 48-byte analog contact record. The dialed number is stored as
/// big-endian BCD over 7 bytes with an explicit digit count, so that an
/// odd number of digits round-trips without a spurious trailing zero.
pub fn decode(buf: &[u8], _index: usize) -> Result<AnalogContact, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::AnalogContact,
            address: 0,
            detail: "analog contact record has the wrong length",
        });
    }
    let digit_count = buf[7] as usize;
    let full = crate::bcd::decode_be(&buf[0..7]).to_string();
    let padded = format!("{:0>14}", full);
    let number = padded[14 - digit_count.min(14)..].to_string();
    let name = strings::decode(&buf[8..23]);
    Ok(AnalogContact { name, number })
}

/// Encode an analog contact into a fresh 48-byte record.
pub fn encode(contact: &AnalogContact) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    let digits: String = contact.number.chars().filter(|c| c.is_ascii_digit()).collect();
    let value: u64 = digits.parse().unwrap_or(0);
    crate::bcd::encode_be(value, &mut buf[0..7]);
    buf[7] = digits.len() as u8;
    strings::encode(&contact.name, &mut buf[8..23]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_even_digit_count() {
        let contact = AnalogContact {
            name: "Repeater".to_string(),
            number: "1234567".to_string(),
        };
        let buf = encode(&contact);
        let decoded = decode(&buf, 0).unwrap();
        assert_eq!(decoded.number, "1234567");
        assert_eq!(decoded.name, "Repeater");
    }

    #[test]
    fn roundtrip_short_number_has_no_leading_junk() {
        let contact = AnalogContact {
            name: "Short".to_string(),
            number: "911".to_string(),
        };
        let buf = encode(&contact);
        let decoded = decode(&buf, 0).unwrap();
        assert_eq!(decoded.number, "911");
    }
}
