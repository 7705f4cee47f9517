//! Channel records: 64 bytes, banked 128 per 0x40000-byte stride.

use crate::error::{CodecError, RecordKind};
use crate::model::{
    Admit, AnalogChannelFields, Bandwidth, Channel, ChannelMode, DigitalChannelFields,
    DigitalChannelFlags, OptSignaling, Power, RepeaterMode, Timeslot,
};
use crate::strings;
use crate::tone::{Ctcss, Dcs};

pub const SIZE: usize = 0x40;

/// A channel decoded from raw bytes, with cross-references still expressed
/// as the raw slot indices read from the image (0xFF/0xFFFFFFFF = none).
/// [`crate::link::LinkContext`] turns these into `Option<Ref>`s.
#[derive(Debug, Clone)]
pub struct RawChannel {
    pub channel: Channel,
    pub contact_raw: u32,
    pub group_list_raw: u8,
    pub radio_id_raw: u8,
    pub gps_system_raw: u8,
    pub scan_list_raw: u8,
}

fn decode_mode(bits: u8) -> Result<u8, CodecError> {
    if bits <= 3 {
        Ok(bits)
    } else {
        unreachable!("2-bit field cannot exceed 3")
    }
}

fn decode_power(bits: u8) -> Power {
    match bits {
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

fn decode_repeater_mode(bits: u8) -> RepeaterMode {
    match bits {
        0 => RepeaterMode::Simplex,
        1 => RepeaterMode::Positive,
        _ => RepeaterMode::Negative,
    }
}

fn encode_repeater_mode(mode: RepeaterMode) -> u8 {
    match mode {
        RepeaterMode::Simplex => 0,
        RepeaterMode::Positive => 1,
        RepeaterMode::Negative => 2,
    }
}

fn decode_admit(bits: u8) -> Admit {
    match bits {
        0 => Admit::Always,
        1 => Admit::ColorCodeFree,
        _ => Admit::ChannelFree,
    }
}

fn encode_admit(admit: Admit) -> u8 {
    match admit {
        Admit::Always => 0,
        Admit::ColorCodeFree => 1,
        Admit::ChannelFree => 2,
    }
}

fn decode_opt_signaling(bits: u8) -> OptSignaling {
    match bits {
        0 => OptSignaling::Off,
        1 => OptSignaling::Dtmf,
        2 => OptSignaling::TwoTone,
        _ => OptSignaling::FiveTone,
    }
}

fn encode_opt_signaling(s: OptSignaling) -> u8 {
    match s {
        OptSignaling::Off => 0,
        OptSignaling::Dtmf => 1,
        OptSignaling::TwoTone => 2,
        OptSignaling::FiveTone => 3,
    }
}

fn decode_analog_fields(buf: &[u8], rx_ctcss_en: bool, tx_ctcss_en: bool, rx_dcs_en: bool, tx_dcs_en: bool, reverse: bool) -> AnalogChannelFields {
    let bandwidth = if buf[8] & 0x10 != 0 {
        Bandwidth::Wide25kHz
    } else {
        Bandwidth::Narrow12_5kHz
    };
    let tx_ctcss = tx_ctcss_en.then(|| Ctcss::decode(buf[10], u16::from_be_bytes([buf[16], buf[17]])).unwrap_or(Ctcss::Standard(0)));
    let rx_ctcss = rx_ctcss_en.then(|| Ctcss::decode(buf[11], u16::from_be_bytes([buf[16], buf[17]])).unwrap_or(Ctcss::Standard(0)));
    let tx_dcs = tx_dcs_en.then(|| Dcs::decode(u16::from_le_bytes([buf[12], buf[13]])));
    let rx_dcs = rx_dcs_en.then(|| Dcs::decode(u16::from_le_bytes([buf[14], buf[15]])));
    AnalogChannelFields {
        bandwidth,
        tx_ctcss,
        rx_ctcss,
        tx_dcs,
        rx_dcs,
        squelch_carrier: buf[25] & 0x10 == 0,
        reverse,
    }
}

fn encode_analog_fields(a: &AnalogChannelFields, buf: &mut [u8; SIZE]) -> (bool, bool, bool, bool, bool) {
    if a.bandwidth == Bandwidth::Wide25kHz {
        buf[8] |= 0x10;
    }
    buf[25] = if a.squelch_carrier { 0x00 } else { 0x10 };

    let mut custom_written = false;
    if let Some(tone) = a.tx_ctcss {
        let (idx, custom) = tone.encode();
        buf[10] = idx;
        if custom != 0 {
            buf[16..18].copy_from_slice(&custom.to_be_bytes());
            custom_written = true;
        }
    }
    if let Some(tone) = a.rx_ctcss {
        let (idx, custom) = tone.encode();
        buf[11] = idx;
        if custom != 0 && !custom_written {
            buf[16..18].copy_from_slice(&custom.to_be_bytes());
        }
    }
    if let Some(dcs) = a.tx_dcs {
        buf[12..14].copy_from_slice(&dcs.encode().to_le_bytes());
    }
    if let Some(dcs) = a.rx_dcs {
        buf[14..16].copy_from_slice(&dcs.encode().to_le_bytes());
    }

    (
        a.tx_ctcss.is_some(),
        a.rx_ctcss.is_some(),
        a.tx_dcs.is_some(),
        a.rx_dcs.is_some(),
        a.reverse,
    )
}

fn decode_digital_fields(buf: &[u8]) -> (DigitalChannelFields, u32, u8, u8, u8) {
    let color_code = buf[32];
    let timeslot = if buf[33] & 0x01 != 0 { Timeslot::Two } else { Timeslot::One };
    let admit = decode_admit(buf[26] & 0x03);
    let contact_raw = u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);
    let radio_id_raw = buf[24];
    let group_list_raw = buf[28];
    let gps_system_raw = buf[54];
    let aprs_enabled = buf[53] != 0;
    let dmr_encryption_index = buf[58];

    let flags = DigitalChannelFlags {
        sms_confirm: buf[33] & 0x02 != 0,
        simplex_tdma: buf[33] & 0x04 != 0,
        tdma_adaptive: buf[33] & 0x10 != 0,
        rx_gps: buf[33] & 0x20 != 0,
        enhanced_encryption: buf[33] & 0x40 != 0,
        work_alone: buf[33] & 0x80 != 0,
        ranging: buf[52] & 0x01 != 0,
        through_mode: buf[52] & 0x02 != 0,
        data_ack_forbid: buf[52] & 0x04 != 0,
        multiple_keys: buf[59] & 0x01 != 0,
        random_key: buf[59] & 0x02 != 0,
        sms_forbid: buf[59] & 0x04 != 0,
    };

    let fields = DigitalChannelFields {
        color_code,
        timeslot,
        admit,
        contact: None,
        group_list: None,
        radio_id: None,
        gps_system: None,
        aprs_enabled,
        dmr_encryption_index,
        flags,
    };
    (fields, contact_raw, radio_id_raw, group_list_raw, gps_system_raw)
}

fn encode_digital_fields(d: &DigitalChannelFields, buf: &mut [u8; SIZE]) {
    buf[32] = d.color_code;
    if d.timeslot == Timeslot::Two {
        buf[33] |= 0x01;
    }
    buf[26] |= encode_admit(d.admit) & 0x03;
    buf[53] = if d.aprs_enabled { 0x01 } else { 0x00 };
    buf[58] = d.dmr_encryption_index;

    if d.flags.sms_confirm {
        buf[33] |= 0x02;
    }
    if d.flags.simplex_tdma {
        buf[33] |= 0x04;
    }
    if d.flags.tdma_adaptive {
        buf[33] |= 0x10;
    }
    if d.flags.rx_gps {
        buf[33] |= 0x20;
    }
    if d.flags.enhanced_encryption {
        buf[33] |= 0x40;
    }
    if d.flags.work_alone {
        buf[33] |= 0x80;
    }
    if d.flags.ranging {
        buf[52] |= 0x01;
    }
    if d.flags.through_mode {
        buf[52] |= 0x02;
    }
    if d.flags.data_ack_forbid {
        buf[52] |= 0x04;
    }
    if d.flags.multiple_keys {
        buf[59] |= 0x01;
    }
    if d.flags.random_key {
        buf[59] |= 0x02;
    }
    if d.flags.sms_forbid {
        buf[59] |= 0x04;
    }

    buf[20..24].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    buf[24] = 0xFF;
    buf[28] = 0xFF;
    buf[54] = 0xFF;
}

/// Decode a 64-byte channel record. `buf` must be exactly [`SIZE`] bytes.
pub fn decode(buf: &[u8], index: usize) -> Result<RawChannel, CodecError> {
    if buf.len() != SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::Channel,
            address: 0,
            detail: "channel record has the wrong length",
        });
    }

    let mode_bits = decode_mode((buf[8]) & 0x03)?;
    let power = decode_power((buf[8] >> 2) & 0x03);
    let repeater_mode = decode_repeater_mode((buf[8] >> 6) & 0x03);

    let rx_frequency_hz = crate::bcd::decode_be(&buf[0..4]) as u32 * 10;
    let offset_magnitude_hz = crate::bcd::decode_be(&buf[4..8]) as u32 * 10;
    let tx_offset_hz = match repeater_mode {
        RepeaterMode::Simplex => 0,
        RepeaterMode::Positive => offset_magnitude_hz as i32,
        RepeaterMode::Negative => -(offset_magnitude_hz as i32),
    };

    let rx_ctcss_en = buf[9] & 0x01 != 0;
    let rx_dcs_en = buf[9] & 0x02 != 0;
    let tx_ctcss_en = buf[9] & 0x04 != 0;
    let tx_dcs_en = buf[9] & 0x08 != 0;
    let reverse = buf[9] & 0x10 != 0;
    let rx_only = buf[9] & 0x20 != 0;
    let call_confirm = buf[9] & 0x40 != 0;
    let talkaround = buf[9] & 0x80 != 0;

    let name = strings::decode(&buf[35..51]);
    let scan_list_raw = buf[27];
    let opt_signaling = decode_opt_signaling((buf[26] >> 4) & 0x03);

    let analog = decode_analog_fields(buf, rx_ctcss_en, tx_ctcss_en, rx_dcs_en, tx_dcs_en, reverse);
    let (digital, contact_raw, radio_id_raw, group_list_raw, gps_system_raw) = decode_digital_fields(buf);

    let mode = match mode_bits {
        0 => ChannelMode::Analog(analog),
        1 => ChannelMode::Digital(digital.clone()),
        2 => ChannelMode::MixedAnalogDigital(analog, digital.clone()),
        _ => ChannelMode::MixedDigitalAnalog(digital.clone(), analog),
    };

    let channel = Channel {
        name,
        rx_frequency_hz,
        tx_offset_hz,
        power,
        rx_only,
        call_confirm,
        talkaround,
        scan_list: None,
        opt_signaling,
        mode,
    };

    let _ = index;
    Ok(RawChannel {
        channel,
        contact_raw,
        group_list_raw,
        radio_id_raw,
        gps_system_raw,
        scan_list_raw,
    })
}

/// Encode a channel into a fresh 64-byte record. References are written as
/// the caller's already-resolved slot indices (`0xFF`/`0xFFFF_FFFF` = none).
pub fn encode(
    channel: &Channel,
    contact_index: Option<u32>,
    group_list_index: Option<u8>,
    radio_id_index: Option<u8>,
    gps_system_index: Option<u8>,
    scan_list_index: Option<u8>,
) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];

    let rx_units = (channel.rx_frequency_hz / 10) as u64;
    let tx_units = (channel.tx_offset_hz.unsigned_abs() / 10) as u64;
    crate::bcd::encode_be(rx_units, &mut buf[0..4]);
    crate::bcd::encode_be(tx_units, &mut buf[4..8]);

    let repeater_mode = if channel.tx_offset_hz == 0 {
        RepeaterMode::Simplex
    } else if channel.tx_offset_hz > 0 {
        RepeaterMode::Positive
    } else {
        RepeaterMode::Negative
    };

    let mode_bits = match &channel.mode {
        ChannelMode::Analog(_) => 0u8,
        ChannelMode::Digital(_) => 1,
        ChannelMode::MixedAnalogDigital(_, _) => 2,
        ChannelMode::MixedDigitalAnalog(_, _) => 3,
    };

    buf[8] = mode_bits | (encode_power(channel.power) << 2) | (encode_repeater_mode(repeater_mode) << 6);

    if channel.rx_only {
        buf[9] |= 0x20;
    }
    if channel.call_confirm {
        buf[9] |= 0x40;
    }
    if channel.talkaround {
        buf[9] |= 0x80;
    }

    strings::encode(&channel.name, &mut buf[35..51]);
    buf[27] = scan_list_index.unwrap_or(0xFF);
    buf[26] |= encode_opt_signaling(channel.opt_signaling) << 4;

    buf[20..24].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    buf[24] = 0xFF;
    buf[28] = 0xFF;
    buf[54] = 0xFF;

    let mut flags = 0u8;
    let analog_for = |a: &AnalogChannelFields, buf: &mut [u8; SIZE], flags: &mut u8| {
        let (tx_c, rx_c, tx_d, rx_d, rev) = encode_analog_fields(a, buf);
        if tx_c {
            *flags |= 0x04;
        }
        if rx_c {
            *flags |= 0x01;
        }
        if tx_d {
            *flags |= 0x08;
        }
        if rx_d {
            *flags |= 0x02;
        }
        if rev {
            *flags |= 0x10;
        }
    };

    match &channel.mode {
        ChannelMode::Analog(a) => analog_for(a, &mut buf, &mut flags),
        ChannelMode::Digital(d) => encode_digital_fields(d, &mut buf),
        ChannelMode::MixedAnalogDigital(a, d) => {
            analog_for(a, &mut buf, &mut flags);
            encode_digital_fields(d, &mut buf);
        }
        ChannelMode::MixedDigitalAnalog(d, a) => {
            encode_digital_fields(d, &mut buf);
            analog_for(a, &mut buf, &mut flags);
        }
    }
    buf[9] |= flags;

    if let Some(c) = contact_index {
        buf[20..24].copy_from_slice(&c.to_le_bytes());
    }
    if let Some(r) = radio_id_index {
        buf[24] = r;
    }
    if let Some(g) = group_list_index {
        buf[28] = g;
    }
    if let Some(s) = gps_system_index {
        buf[54] = s;
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bandwidth;

    fn simple_digital_channel() -> Channel {
        Channel {
            name: "CH1".to_string(),
            rx_frequency_hz: 439_000_000,
            tx_offset_hz: -7_600_000,
            power: Power::Low,
            rx_only: false,
            call_confirm: false,
            talkaround: false,
            scan_list: None,
            opt_signaling: OptSignaling::Off,
            mode: ChannelMode::Digital(DigitalChannelFields {
                color_code: 1,
                timeslot: Timeslot::Two,
                admit: Admit::ColorCodeFree,
                contact: None,
                group_list: None,
                radio_id: None,
                gps_system: None,
                aprs_enabled: false,
                dmr_encryption_index: 0,
                flags: DigitalChannelFlags::default(),
            }),
        }
    }

    #[test]
    fn digital_channel_roundtrip() {
        let channel = simple_digital_channel();
        let buf = encode(&channel, Some(0), Some(0), None, None, None);
        let raw = decode(&buf, 0).unwrap();
        assert_eq!(raw.channel.name, "CH1");
        assert_eq!(raw.channel.rx_frequency_hz, 439_000_000);
        assert_eq!(raw.channel.tx_offset_hz, -7_600_000);
        assert_eq!(raw.contact_raw, 0);
        assert_eq!(raw.group_list_raw, 0);
        match raw.channel.mode {
            ChannelMode::Digital(d) => {
                assert_eq!(d.color_code, 1);
                assert_eq!(d.timeslot, Timeslot::Two);
            }
            _ => panic!("expected digital mode"),
        }
    }

    #[test]
    fn aprs_and_encryption_fields_roundtrip() {
        let mut channel = simple_digital_channel();
        channel.mode = ChannelMode::Digital(DigitalChannelFields {
            color_code: 1,
            timeslot: Timeslot::Two,
            admit: Admit::ColorCodeFree,
            contact: None,
            group_list: None,
            radio_id: None,
            gps_system: None,
            aprs_enabled: true,
            dmr_encryption_index: 7,
            flags: DigitalChannelFlags {
                multiple_keys: true,
                random_key: false,
                sms_forbid: true,
                ..DigitalChannelFlags::default()
            },
        });
        let buf = encode(&channel, None, None, None, None, None);
        let raw = decode(&buf, 0).unwrap();
        match raw.channel.mode {
            ChannelMode::Digital(d) => {
                assert!(d.aprs_enabled);
                assert_eq!(d.dmr_encryption_index, 7);
                assert!(d.flags.multiple_keys);
                assert!(!d.flags.random_key);
                assert!(d.flags.sms_forbid);
            }
            _ => panic!("expected digital mode"),
        }
    }

    #[test]
    fn s1_scenario_frequency_bytes() {
        let channel = simple_digital_channel();
        let buf = encode(&channel, None, None, None, None, None);
        assert_eq!(&buf[0..4], &[0x43, 0x90, 0x00, 0x00]);
        assert_eq!(&buf[4..8], &[0x07, 0x60, 0x00, 0x00]);
        assert_eq!(buf[32], 0x01);
        assert_eq!(buf[33] & 0x01, 0x01);
    }

    #[test]
    fn simplex_has_zero_offset_and_mode() {
        let mut channel = simple_digital_channel();
        channel.tx_offset_hz = 0;
        let buf = encode(&channel, None, None, None, None, None);
        let raw = decode(&buf, 0).unwrap();
        assert_eq!(raw.channel.tx_offset_hz, 0);
    }

    #[test]
    fn analog_channel_tones_roundtrip() {
        let channel = Channel {
            name: "AN1".to_string(),
            rx_frequency_hz: 146_520_000,
            tx_offset_hz: 0,
            power: Power::High,
            rx_only: true,
            call_confirm: false,
            talkaround: false,
            scan_list: None,
            opt_signaling: OptSignaling::Off,
            mode: ChannelMode::Analog(AnalogChannelFields {
                bandwidth: Bandwidth::Wide25kHz,
                tx_ctcss: Some(Ctcss::Standard(1000)),
                rx_ctcss: None,
                tx_dcs: None,
                rx_dcs: Some(Dcs { code: 23, inverted: true }),
                squelch_carrier: true,
                reverse: false,
            }),
        };
        let buf = encode(&channel, None, None, None, None, None);
        let raw = decode(&buf, 0).unwrap();
        match raw.channel.mode {
            ChannelMode::Analog(a) => {
                assert_eq!(a.tx_ctcss, Some(Ctcss::Standard(1000)));
                assert_eq!(a.rx_dcs, Some(Dcs { code: 23, inverted: true }));
                assert_eq!(a.bandwidth, Bandwidth::Wide25kHz);
            }
            _ => panic!("expected analog mode"),
        }
        assert!(raw.channel.rx_only);
    }

    #[test]
    fn squelch_mode_uses_bit_4_of_byte_25() {
        let mut channel = Channel {
            name: "AN2".to_string(),
            rx_frequency_hz: 146_520_000,
            tx_offset_hz: 0,
            power: Power::High,
            rx_only: false,
            call_confirm: false,
            talkaround: false,
            scan_list: None,
            opt_signaling: OptSignaling::Off,
            mode: ChannelMode::Analog(AnalogChannelFields {
                bandwidth: Bandwidth::Narrow12_5kHz,
                tx_ctcss: None,
                rx_ctcss: None,
                tx_dcs: None,
                rx_dcs: None,
                squelch_carrier: false,
                reverse: false,
            }),
        };
        let buf = encode(&channel, None, None, None, None, None);
        assert_eq!(buf[25], 0x10);
        let raw = decode(&buf, 0).unwrap();
        match raw.channel.mode {
            ChannelMode::Analog(a) => assert!(!a.squelch_carrier),
            _ => panic!("expected analog mode"),
        }

        channel.mode = ChannelMode::Analog(AnalogChannelFields {
            bandwidth: Bandwidth::Narrow12_5kHz,
            tx_ctcss: None,
            rx_ctcss: None,
            tx_dcs: None,
            rx_dcs: None,
            squelch_carrier: true,
            reverse: false,
        });
        let buf = encode(&channel, None, None, None, None, None);
        assert_eq!(buf[25], 0x00);
    }

    #[test]
    fn opt_signaling_occupies_bits_4_5_of_byte_26() {
        let mut channel = simple_digital_channel();
        channel.opt_signaling = OptSignaling::FiveTone;
        let buf = encode(&channel, None, None, None, None, None);
        assert_eq!(buf[26] & 0x30, 0x30);
        assert_eq!(buf[26] & 0x03, 0x01);
        let raw = decode(&buf, 0).unwrap();
        assert_eq!(raw.channel.opt_signaling, OptSignaling::FiveTone);
    }
}
