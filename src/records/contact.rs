//! Digital contact records: 100 bytes, banked 4 per 0x40000-byte stride.

use crate::error::{CodecError, RecordKind};
use crate::model::{AlertType, CallType, DigitalContact};
use crate::strings;

pub const SIZE: usize = 100;

fn decode_call_type(byte: u8, index: usize) -> Result<CallType, CodecError> {
    match byte {
        0 => Ok(CallType::Private),
        1 => Ok(CallType::Group),
        2 => Ok(CallType::AllCall),
        other => Err(CodecError::Unsupported {
            kind: RecordKind::DigitalContact,
            index,
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

fn decode_alert_type(byte: u8) -> AlertType {
    match byte {
        1 => AlertType::Ring,
        2 => AlertType::Online,
        _ => AlertType::None,
    }
}

fn encode_alert_type(alert: AlertType) -> u8 {
    match alert {
        AlertType::None => 0,
        AlertType::Ring => 1,
        AlertType::Online => 2,
    }
}

/// Decode a 100-byte digital contact record.
pub fn decode(buf: &[u8], index: usize) -> Result<DigitalContact, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::DigitalContact,
            address: 0,
            detail: "digital contact record has the wrong length",
        });
    }
    let call_type = decode_call_type(buf[0], index)?;
    let name = strings::decode(&buf[1..17]);
    let id = crate::bcd::decode_be(&buf[35..39]) as u32;
    let alert = decode_alert_type(buf[39]);
    Ok(DigitalContact { name, call_type, id, alert })
}

/// Encode a digital contact into a fresh 100-byte record.
pub fn encode(contact: &DigitalContact) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    buf[0] = encode_call_type(contact.call_type);
    strings::encode(&contact.name, &mut buf[1..17]);
    crate::bcd::encode_be(contact.id as u64, &mut buf[35..39]);
    buf[39] = encode_alert_type(contact.alert);
    buf
}
