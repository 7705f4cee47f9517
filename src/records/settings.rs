//! General settings and boot settings.
//!
//! The general-settings block (0xD0 bytes) is almost entirely undocumented
//! in the original firmware's own reference and is carried through
//! verbatim (see the design notes' open question); only the boot-settings
//! block's three ASCII fields are modelled.

use crate::error::{CodecError, RecordKind};
use crate::model::{Power, Settings};
use crate::strings;

pub const BOOT_SETTINGS_SIZE: usize = 0x30;

/// Decode the boot-settings block (intro lines + boot password) together
/// with the caller-supplied mic/squelch/VOX/TOT/power/speech fields, which
/// live in the opaque general-settings block at offsets this codec does not
/// claim to understand; callers obtain those from [`decode_radio_settings`]
/// once the relevant bytes are identified, or leave them at their defaults.
pub fn decode_boot_settings(buf: &[u8]) -> Result<(String, String, Option<String>), CodecError> {
    if buf.len() != BOOT_SETTINGS_SIZE {
        return Err(CodecError::CorruptImage {
            kind: RecordKind::BootSettings,
            address: 0,
            detail: "boot settings block has the wrong length",
        });
    }
    let intro_1 = strings::decode(&buf[0..16]);
    let intro_2 = strings::decode(&buf[16..32]);
    let password_raw = strings::decode(&buf[32..48]);
    let password = if password_raw.is_empty() { None } else { Some(password_raw) };
    Ok((intro_1, intro_2, password))
}

pub fn encode_boot_settings(intro_1: &str, intro_2: &str, password: &Option<String>) -> [u8; BOOT_SETTINGS_SIZE] {
    let mut buf = [0u8; BOOT_SETTINGS_SIZE];
    strings::encode(intro_1, &mut buf[0..16]);
    strings::encode(intro_2, &mut buf[16..32]);
    if let Some(p) = password {
        strings::encode(p, &mut buf[32..48]);
    }
    buf
}

/// Radio-wide settings that the codec does represent: a thin, well-known
/// slice of the general-settings block (mic level, squelch, VOX, TOT,
/// default power, speech synthesis) plus the boot settings. The remaining
/// bytes of the general-settings block are preserved as an opaque region by
/// the orchestrator and never interpreted here.
pub fn decode_radio_settings(
    general: &[u8],
    intro_1: String,
    intro_2: String,
    password: Option<String>,
) -> Settings {
    let mic_level = (general[0] & 0x0F).clamp(1, 10);
    let squelch = general[1].min(10);
    let vox = general[2].min(10);
    let tot_secs = general[3];
    let power = match general[4] & 0x03 {
        0 => Power::Low,
        1 => Power::Mid,
        2 => Power::High,
        _ => Power::Turbo,
    };
    let speech = general[5] & 0x01 != 0;

    Settings {
        intro_line_1: intro_1,
        intro_line_2: intro_2,
        boot_password: password,
        mic_level,
        squelch,
        vox,
        tot_secs,
        power,
        speech,
    }
}

pub fn encode_radio_settings(settings: &Settings, general: &mut [u8]) {
    general[0] = (general[0] & 0xF0) | (settings.mic_level & 0x0F);
    general[1] = settings.squelch;
    general[2] = settings.vox;
    general[3] = settings.tot_secs;
    general[4] = (general[4] & !0x03)
        | match settings.power {
            Power::Low => 0,
            Power::Mid => 1,
            Power::High => 2,
            Power::Turbo => 3,
        };
    general[5] = (general[5] & !0x01) | if settings.speech { 0x01 } else { 0x00 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_settings_roundtrip() {
        let buf = encode_boot_settings("Welcome", "Radio", &Some("12345".to_string()));
        let (l1, l2, pw) = decode_boot_settings(&buf).unwrap();
        assert_eq!(l1, "Welcome");
        assert_eq!(l2, "Radio");
        assert_eq!(pw, Some("12345".to_string()));
    }

    #[test]
    fn no_password_decodes_to_none() {
        let buf = encode_boot_settings("A", "B", &None);
        let (_, _, pw) = decode_boot_settings(&buf).unwrap();
        assert_eq!(pw, None);
    }

    #[test]
    fn radio_settings_roundtrip_within_general_block() {
        let settings = Settings {
            intro_line_1: "A".to_string(),
            intro_line_2: "B".to_string(),
            boot_password: None,
            mic_level: 5,
            squelch: 3,
            vox: 0,
            tot_secs: 60,
            power: Power::High,
            speech: true,
        };
        let mut general = [0u8; 0xD0];
        encode_radio_settings(&settings, &mut general);
        let decoded = decode_radio_settings(&general, "A".to_string(), "B".to_string(), None);
        assert_eq!(decoded.mic_level, 5);
        assert_eq!(decoded.vox, 0);
        assert!(decoded.vox_disabled());
        assert_eq!(decoded.power, Power::High);
        assert!(decoded.speech);
    }
}
