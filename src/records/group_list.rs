//! RX group list records: 288 bytes, up to 250 lists.

use crate::error::{CodecError, RecordKind};
use crate::layout::GROUP_LIST_MEMBER_CAPACITY;
use crate::strings;

pub const SIZE: usize = 288;

/// A group list decoded with its member contact indices still raw (not yet
/// resolved against the contact table).
#[derive(Debug, Clone)]
pub struct RawGroupList {
    pub name: String,
    pub member_raw: Vec<u32>,
}

/// Decode a 288-byte group list record.
pub fn decode(buf: &[u8], _index: usize) -> Result<RawGroupList, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::GroupList,
            address: 0,
            detail: "group list record has the wrong length",
        });
    }
    let mut member_raw = Vec::new();
    for i in 0..GROUP_LIST_MEMBER_CAPACITY {
        let off = i * 4;
        let raw = u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);
        if raw == 0xFFFF_FFFF {
            break;
        }
        member_raw.push(raw);
    }
    let name = strings::decode(&buf[256..272]);
    Ok(RawGroupList { name, member_raw })
}

/// Encode a group list into a fresh 288-byte record. `members` are already
/// resolved contact indices.
pub fn encode(name: &str, members: &[u32]) -> [u8; SIZE] {
    let mut buf = [0xFFu8; SIZE];
    for (i, &member) in members.iter().take(GROUP_LIST_MEMBER_CAPACITY).enumerate() {
        let off = i * 4;
        buf[off..off + 4].copy_from_slice(&member.to_le_bytes());
    }
    strings::encode(name, &mut buf[256..272]);
    buf
}
