//! Scan list records: 144 bytes, 16 per bank.

use crate::error::{CodecError, RecordKind};
use crate::layout::SCAN_LIST_MEMBER_CAPACITY;
use crate::model::{PriorityChannel, RevertChannel, ScanTimers};
use crate::strings;

pub const SIZE: usize = 144;

const CURRENT_CHANNEL: u16 = 0x0000;
const OFF: u16 = 0xFFFF;

fn encode_priority(p: &RawPriority) -> u16 {
    match p {
        RawPriority::Off => OFF,
        RawPriority::Current => CURRENT_CHANNEL,
        RawPriority::Channel(raw) => raw + 1,
    }
}

/// Priority-channel field as written to or read from the image: either the
/// two sentinels, or a raw (not yet link-resolved) channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPriority {
    Off,
    Current,
    Channel(u16),
}

fn decode_raw_priority(raw: u16) -> RawPriority {
    match raw {
        OFF => RawPriority::Off,
        CURRENT_CHANNEL => RawPriority::Current,
        n => RawPriority::Channel(n - 1),
    }
}

fn decode_revert(byte: u8) -> RevertChannel {
    match byte {
        0 => RevertChannel::Selected,
        1 => RevertChannel::SelectedOrTalkback,
        2 => RevertChannel::Priority1,
        3 => RevertChannel::Priority2,
        4 => RevertChannel::LastCalled,
        5 => RevertChannel::LastUsed,
        6 => RevertChannel::Priority1Talkback,
        _ => RevertChannel::Priority2Talkback,
    }
}

fn encode_revert(r: RevertChannel) -> u8 {
    match r {
        RevertChannel::Selected => 0,
        RevertChannel::SelectedOrTalkback => 1,
        RevertChannel::Priority1 => 2,
        RevertChannel::Priority2 => 3,
        RevertChannel::LastCalled => 4,
        RevertChannel::LastUsed => 5,
        RevertChannel::Priority1Talkback => 6,
        RevertChannel::Priority2Talkback => 7,
    }
}

/// A scan list decoded with member and priority channel references left raw.
#[derive(Debug, Clone)]
pub struct RawScanList {
    pub name: String,
    pub priority_1_raw: RawPriority,
    pub priority_2_raw: RawPriority,
    pub revert: RevertChannel,
    pub timers: ScanTimers,
    pub member_raw: Vec<u16>,
}

/// Decode a 144-byte scan list record.
pub fn decode(buf: &[u8], _index: usize) -> Result<RawScanList, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::ScanList,
            address: 0,
            detail: "scan list record has the wrong length",
        });
    }
    let priority_1_raw = decode_raw_priority(u16::from_le_bytes([buf[2], buf[3]]));
    let priority_2_raw = decode_raw_priority(u16::from_le_bytes([buf[4], buf[5]]));
    let timers = ScanTimers {
        lookback_a_tenths: u16::from_le_bytes([buf[6], buf[7]]),
        lookback_b_tenths: u16::from_le_bytes([buf[8], buf[9]]),
        dropout_tenths: u16::from_le_bytes([buf[10], buf[11]]),
        dwell_tenths: u16::from_le_bytes([buf[12], buf[13]]),
    };
    let revert = decode_revert(buf[14]);
    let name = strings::decode(&buf[15..31]);

    let mut member_raw = Vec::new();
    for i in 0..SCAN_LIST_MEMBER_CAPACITY {
        let off = 32 + i * 2;
        let raw = u16::from_le_bytes([buf[off], buf[off + 1]]);
        if raw == OFF {
            break;
        }
        member_raw.push(raw);
    }

    Ok(RawScanList {
        name,
        priority_1_raw,
        priority_2_raw,
        revert,
        timers,
        member_raw,
    })
}

/// Encode a scan list into a fresh 144-byte record. Priority fields and
/// member list entries carry already-resolved channel indices.
pub fn encode(
    name: &str,
    priority_1: &RawPriority,
    priority_2: &RawPriority,
    revert: RevertChannel,
    timers: &ScanTimers,
    members: &[u16],
) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    let sel1 = !matches!(priority_1, RawPriority::Off);
    let sel2 = !matches!(priority_2, RawPriority::Off);
    buf[1] = match (sel1, sel2) {
        (false, false) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (true, true) => 3,
    };
    buf[2..4].copy_from_slice(&encode_priority(priority_1).to_le_bytes());
    buf[4..6].copy_from_slice(&encode_priority(priority_2).to_le_bytes());
    buf[6..8].copy_from_slice(&timers.lookback_a_tenths.to_le_bytes());
    buf[8..10].copy_from_slice(&timers.lookback_b_tenths.to_le_bytes());
    buf[10..12].copy_from_slice(&timers.dropout_tenths.to_le_bytes());
    buf[12..14].copy_from_slice(&timers.dwell_tenths.to_le_bytes());
    buf[14] = encode_revert(revert);
    strings::encode(name, &mut buf[15..31]);

    buf[32..32 + SCAN_LIST_MEMBER_CAPACITY * 2].chunks_exact_mut(2).for_each(|c| c.copy_from_slice(&OFF.to_le_bytes()));
    for (i, &member) in members.iter().take(SCAN_LIST_MEMBER_CAPACITY).enumerate() {
        let off = 32 + i * 2;
        buf[off..off + 2].copy_from_slice(&member.to_le_bytes());
    }
    buf
}

/// Turn a raw (un-link-resolved) priority field into its abstract form,
/// given the already-resolved channel index for a [`RawPriority::Channel`].
pub fn resolve_priority(raw: RawPriority, resolved_channel: Option<usize>) -> PriorityChannel {
    match raw {
        RawPriority::Off => PriorityChannel::Off,
        RawPriority::Current => PriorityChannel::Current,
        RawPriority::Channel(_) => resolved_channel.map(PriorityChannel::Channel).unwrap_or(PriorityChannel::Off),
    }
}
