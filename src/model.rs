//! The abstract configuration model: what the codec maps to and from.
//!
//! None of these types know anything about addresses, bitmaps, or BCD —
//! that's the record codecs' job. Cross-references between objects are
//! plain indices into the relevant `Vec` on [`Configuration`]; it is the
//! caller's responsibility to keep those indices in range (the orchestrator
//! validates them during encode and drops dangling ones with a warning
//! during decode).

/// Index of a record within one of [`Configuration`]'s lists.
pub type Ref = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    Low,
    Mid,
    High,
    Turbo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    Narrow12_5kHz,
    Wide25kHz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterMode {
    Simplex,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admit {
    Always,
    ColorCodeFree,
    ChannelFree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptSignaling {
    Off,
    Dtmf,
    TwoTone,
    FiveTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogChannelFields {
    pub bandwidth: Bandwidth,
    pub tx_ctcss: Option<crate::tone::Ctcss>,
    pub rx_ctcss: Option<crate::tone::Ctcss>,
    pub tx_dcs: Option<crate::tone::Dcs>,
    pub rx_dcs: Option<crate::tone::Dcs>,
    pub squelch_carrier: bool,
    pub reverse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeslot {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalChannelFlags {
    pub sms_confirm: bool,
    pub simplex_tdma: bool,
    pub tdma_adaptive: bool,
    pub rx_gps: bool,
    pub enhanced_encryption: bool,
    pub work_alone: bool,
    pub ranging: bool,
    pub through_mode: bool,
    pub data_ack_forbid: bool,
    pub multiple_keys: bool,
    pub random_key: bool,
    pub sms_forbid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalChannelFields {
    pub color_code: u8,
    pub timeslot: Timeslot,
    pub admit: Admit,
    pub contact: Option<Ref>,
    pub group_list: Option<Ref>,
    pub radio_id: Option<Ref>,
    pub gps_system: Option<Ref>,
    pub aprs_enabled: bool,
    /// Digital encryption key slot, 1-32; 0 means encryption is off.
    pub dmr_encryption_index: u8,
    pub flags: DigitalChannelFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Analog(AnalogChannelFields),
    Digital(DigitalChannelFields),
    MixedAnalogDigital(AnalogChannelFields, DigitalChannelFields),
    MixedDigitalAnalog(DigitalChannelFields, AnalogChannelFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub rx_frequency_hz: u32,
    pub tx_offset_hz: i32,
    pub power: Power,
    pub rx_only: bool,
    pub call_confirm: bool,
    pub talkaround: bool,
    pub scan_list: Option<Ref>,
    pub opt_signaling: OptSignaling,
    pub mode: ChannelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Private,
    Group,
    AllCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    None,
    Ring,
    Online,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalContact {
    pub name: String,
    pub call_type: CallType,
    pub id: u32,
    pub alert: AlertType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogContact {
    pub name: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupList {
    pub name: String,
    pub members: Vec<Ref>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityChannel {
    Off,
    Current,
    Channel(Ref),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertChannel {
    Selected,
    SelectedOrTalkback,
    Priority1,
    Priority2,
    LastCalled,
    LastUsed,
    Priority1Talkback,
    Priority2Talkback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTimers {
    pub lookback_a_tenths: u16,
    pub lookback_b_tenths: u16,
    pub dropout_tenths: u16,
    pub dwell_tenths: u16,
}

impl Default for ScanTimers {
    fn default() -> Self {
        ScanTimers {
            lookback_a_tenths: 15,
            lookback_b_tenths: 25,
            dropout_tenths: 29,
            dwell_tenths: 29,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanList {
    pub name: String,
    pub priority_1: PriorityChannel,
    pub priority_2: PriorityChannel,
    pub revert: RevertChannel,
    pub timers: ScanTimers,
    pub members: Vec<Ref>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Zone {
    pub name: String,
    pub channels: Vec<Ref>,
    pub selected_a: Option<Ref>,
    pub selected_b: Option<Ref>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioId {
    pub name: String,
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsCoordinate {
    pub degrees: u16,
    pub minutes: u8,
    pub hundredths_of_minute_seconds: u8,
    pub positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLocation {
    pub latitude: GpsCoordinate,
    pub longitude: GpsCoordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsSystem {
    pub target_contact: Ref,
    pub call_type: CallType,
    pub timeslot: Option<Timeslot>,
    pub manual_tx_interval_secs: u16,
    pub automatic_tx_interval_secs: Option<u16>,
    pub fixed_location: Option<FixedLocation>,
    pub power: Power,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub intro_line_1: String,
    pub intro_line_2: String,
    pub boot_password: Option<String>,
    pub mic_level: u8,
    pub squelch: u8,
    pub vox: u8,
    pub tot_secs: u8,
    pub power: Power,
    pub speech: bool,
}

impl Settings {
    pub fn vox_disabled(&self) -> bool {
        self.vox == 0
    }

    pub fn tot_disabled(&self) -> bool {
        self.tot_secs == 0
    }
}

/// An opaque, unmodelled region of the image, preserved verbatim across a
/// decode/encode round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRegion {
    pub address: u32,
    pub bytes: Vec<u8>,
}

/// The full abstract configuration: every record list the codec knows how
/// to translate, plus whatever opaque regions were preserved from a
/// decoded image.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub channels: Vec<Channel>,
    pub vfo_a: Option<Channel>,
    pub vfo_b: Option<Channel>,
    pub digital_contacts: Vec<DigitalContact>,
    pub analog_contacts: Vec<AnalogContact>,
    pub group_lists: Vec<GroupList>,
    pub scan_lists: Vec<ScanList>,
    pub zones: Vec<Zone>,
    pub radio_ids: Vec<RadioId>,
    pub gps_systems: Vec<GpsSystem>,
    pub settings: Option<Settings>,
    pub opaque_regions: Vec<OpaqueRegion>,
}
