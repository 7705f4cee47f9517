//! The DMR-ID to contact index: a sorted auxiliary table kept consistent
//! with the primary contact bank on every encode.

use crate::model::{CallType, DigitalContact};

pub const ENTRY_SIZE: usize = 8;

/// The index key is built from the *BCD encoding* of the ID, not its raw
/// binary value — same as the 4-byte BCD field the contact record itself
/// stores the ID in, reinterpreted as a big-endian integer. For IDs whose
/// decimal digits are all below `0xA` in every nibble this happens to equal
/// the binary value, but it diverges for anything larger (e.g. ID 16 means
/// BCD byte `0x16`, not `0x10`).
fn shifted_key(id: u32, call_type: CallType) -> u32 {
    let mut buf = [0u8; 4];
    crate::bcd::encode_be(id as u64, &mut buf);
    let bcd = u32::from_be_bytes(buf);
    (bcd << 1) | (call_type == CallType::Group) as u32
}

/// Build the sorted DMR-ID index from the live contact list, returning one
/// 8-byte entry per contact: a little-endian shifted key followed by a
/// little-endian contact index.
pub fn build(contacts: &[DigitalContact]) -> Vec<u8> {
    let mut entries: Vec<(u32, u32)> = contacts
        .iter()
        .enumerate()
        .map(|(i, c)| (shifted_key(c.id, c.call_type), i as u32))
        .collect();
    entries.sort_by_key(|&(key, _)| key);

    let mut bytes = Vec::with_capacity(entries.len() * ENTRY_SIZE);
    for (key, index) in entries {
        bytes.extend_from_slice(&key.to_le_bytes());
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertType;

    fn contact(id: u32, call_type: CallType) -> DigitalContact {
        DigitalContact {
            name: String::new(),
            call_type,
            id,
            alert: AlertType::None,
        }
    }

    #[test]
    fn single_group_contact_key() {
        let bytes = build(&[contact(1, CallType::Group)]);
        assert_eq!(&bytes[0..4], &3u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0u32.to_le_bytes());
    }

    #[test]
    fn entries_are_sorted_ascending() {
        let bytes = build(&[contact(100, CallType::Private), contact(1, CallType::Private)]);
        let first_key = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let second_key = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        assert!(first_key < second_key);
    }

    #[test]
    fn private_and_group_with_same_id_get_distinct_keys() {
        let bytes = build(&[contact(5, CallType::Private), contact(5, CallType::Group)]);
        let first_key = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let second_key = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        assert_ne!(first_key, second_key);
    }

    #[test]
    fn s5_key_uses_bcd_encoding_not_raw_binary() {
        // ID 16,777,215 (max 24-bit) BCD-encodes to 0x16777215, not the raw
        // binary value 0x00FFFFFF — the shifted key must be built from the
        // former.
        let bytes = build(&[contact(16_777_215, CallType::Group)]);
        let key = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(key, (0x1677_7215u32 << 1) | 1);
    }
}
