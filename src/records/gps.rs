//! The single GPS system record: 48 bytes at a fixed address.

use crate::error::{CodecError, RecordKind};
use crate::model::{CallType, FixedLocation, GpsCoordinate, Power, Timeslot};

pub const SIZE: usize = 48;

fn decode_power(bits: u8) -> Power {
    match bits & 0x03 {
        0 => Power::Low,
        1 => Power::Mid,
        2 => Power::High,
        _ => Power::Turbo,
    }
}

fn encode_power(power: Power) -> u8 {
    match power {
        Power::Low => 0,
        Power::Mid => 1,
        Power::High => 2,
        Power::Turbo => 3,
    }
}

fn decode_call_type(byte: u8) -> Result<CallType, CodecError> {
    match byte {
        0 => Ok(CallType::Private),
        1 => Ok(CallType::Group),
        2 => Ok(CallType::AllCall),
        other => Err(CodecError::Unsupported {
            kind: RecordKind::GpsSystem,
            index: 0,
            field: "call_type",
            value: other as u32,
        }),
    }
}

fn encode_call_type(call_type: CallType) -> u8 {
    match call_type {
        CallType::Private => 0,
        CallType::Group => 1,
        CallType::AllCall => 2,
    }
}

/// A GPS system decoded with its destination contact left as a raw index.
#[derive(Debug, Clone)]
pub struct RawGpsSystem {
    pub target_contact_raw: u32,
    pub call_type: CallType,
    pub timeslot: Option<Timeslot>,
    pub manual_tx_interval_secs: u16,
    pub automatic_tx_interval_secs: Option<u16>,
    pub fixed_location: Option<FixedLocation>,
    pub power: Power,
}

fn decode_coordinate(deg: u8, min: u8, hundredths: u8, negative_flag: u8) -> GpsCoordinate {
    GpsCoordinate {
        degrees: deg as u16,
        minutes: min,
        hundredths_of_minute_seconds: hundredths,
        positive: negative_flag == 0,
    }
}

/// Decode the 48-byte GPS settings record.
///
/// Unlike the channel record's flag bytes, `enable_fixed_location` and the
/// north/south and east/west signs are each their own byte here (3, 6, and
/// 10), not bits packed into one flags byte — the latitude/longitude
/// degree fields are single bytes too (a degree value never exceeds 180).
pub fn decode(buf: &[u8]) -> Result<RawGpsSystem, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::GpsSystem,
            address: 0,
            detail: "GPS record has the wrong length",
        });
    }
    let manual_tx_interval_secs = buf[0] as u16;
    let auto_raw = buf[1];
    let automatic_tx_interval_secs = if auto_raw == 0 {
        None
    } else {
        Some(45 + 15 * auto_raw as u16)
    };

    let fixed_location = if buf[2] != 0 {
        Some(FixedLocation {
            latitude: decode_coordinate(buf[3], buf[4], buf[5], buf[6]),
            longitude: decode_coordinate(buf[7], buf[8], buf[9], buf[10]),
        })
    } else {
        None
    };

    let power = decode_power(buf[11]);
    let target_contact_raw = crate::bcd::decode_be(&buf[28..32]) as u32;
    let call_type = decode_call_type(buf[32])?;
    let timeslot = match buf[33] {
        0 => None,
        1 => Some(Timeslot::One),
        _ => Some(Timeslot::Two),
    };

    Ok(RawGpsSystem {
        target_contact_raw,
        call_type,
        timeslot,
        manual_tx_interval_secs,
        automatic_tx_interval_secs,
        fixed_location,
        power,
    })
}

/// Encode a GPS system into a fresh 48-byte record. `target_contact` is
/// the already-resolved contact index.
pub fn encode(
    manual_tx_interval_secs: u16,
    automatic_tx_interval_secs: Option<u16>,
    fixed_location: &Option<FixedLocation>,
    power: Power,
    target_contact: u32,
    call_type: CallType,
    timeslot: Option<Timeslot>,
) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    buf[0] = manual_tx_interval_secs.min(255) as u8;
    buf[1] = match automatic_tx_interval_secs {
        None => 0,
        Some(t) => (((t.max(45) - 45) / 15).min(255)) as u8,
    };

    // channel destination slots are not represented in the abstract model;
    // default every slot to "current channel" per the original firmware's
    // own default.
    for i in 0..8 {
        let off = 12 + i * 2;
        buf[off..off + 2].copy_from_slice(&0x0FA2u16.to_le_bytes());
    }

    if let Some(loc) = fixed_location {
        buf[2] = 0x01;
        buf[3] = loc.latitude.degrees as u8;
        buf[4] = loc.latitude.minutes;
        buf[5] = loc.latitude.hundredths_of_minute_seconds;
        buf[6] = if loc.latitude.positive { 0 } else { 1 };
        buf[7] = loc.longitude.degrees as u8;
        buf[8] = loc.longitude.minutes;
        buf[9] = loc.longitude.hundredths_of_minute_seconds;
        buf[10] = if loc.longitude.positive { 0 } else { 1 };
    }

    buf[11] = encode_power(power);
    crate::bcd::encode_be(target_contact as u64, &mut buf[28..32]);
    buf[32] = encode_call_type(call_type);
    buf[33] = match timeslot {
        None => 0,
        Some(Timeslot::One) => 1,
        Some(Timeslot::Two) => 2,
    };

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_interval_formula() {
        let buf = encode(30, Some(75), &None, Power::Low, 1, CallType::Private, None);
        let raw = decode(&buf).unwrap();
        assert_eq!(raw.automatic_tx_interval_secs, Some(75));
    }

    #[test]
    fn automatic_interval_off() {
        let buf = encode(30, None, &None, Power::Low, 1, CallType::Private, None);
        let raw = decode(&buf).unwrap();
        assert_eq!(raw.automatic_tx_interval_secs, None);
    }

    #[test]
    fn fixed_location_roundtrip() {
        let loc = FixedLocation {
            latitude: GpsCoordinate { degrees: 40, minutes: 30, hundredths_of_minute_seconds: 12, positive: true },
            longitude: GpsCoordinate { degrees: 73, minutes: 59, hundredths_of_minute_seconds: 1, positive: false },
        };
        let buf = encode(30, None, &Some(loc), Power::High, 2, CallType::Group, Some(Timeslot::Two));
        let raw = decode(&buf).unwrap();
        assert_eq!(raw.fixed_location, Some(loc));
        assert_eq!(raw.timeslot, Some(Timeslot::Two));
    }

    #[test]
    fn fixed_location_bytes_are_single_byte_degrees_and_separate_sign_bytes() {
        let loc = FixedLocation {
            latitude: GpsCoordinate { degrees: 40, minutes: 30, hundredths_of_minute_seconds: 12, positive: true },
            longitude: GpsCoordinate { degrees: 73, minutes: 59, hundredths_of_minute_seconds: 1, positive: false },
        };
        let buf = encode(30, None, &Some(loc), Power::High, 2, CallType::Group, Some(Timeslot::Two));
        assert_eq!(buf[2], 0x01);
        assert_eq!(buf[3], 40);
        assert_eq!(buf[4], 30);
        assert_eq!(buf[5], 12);
        assert_eq!(buf[6], 0);
        assert_eq!(buf[7], 73);
        assert_eq!(buf[8], 59);
        assert_eq!(buf[9], 1);
        assert_eq!(buf[10], 1);
        assert_eq!(buf[11], encode_power(Power::High));
    }
}
