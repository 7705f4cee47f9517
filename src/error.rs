//! Crate-wide typed error type.

use std::fmt;

/// Kind of record a [`CodecError`] or [`Diagnostic`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Channel,
    VfoA,
    VfoB,
    DigitalContact,
    AnalogContact,
    GroupList,
    ScanList,
    Zone,
    ZoneChannelList,
    RadioId,
    GpsSystem,
    GeneralSettings,
    BootSettings,
    ContactIndex,
    Opaque,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Channel => "channel",
            RecordKind::VfoA => "VFO A",
            RecordKind::VfoB => "VFO B",
            RecordKind::DigitalContact => "digital contact",
            RecordKind::AnalogContact => "analog contact",
            RecordKind::GroupList => "group list",
            RecordKind::ScanList => "scan list",
            RecordKind::Zone => "zone",
            RecordKind::ZoneChannelList => "zone channel list",
            RecordKind::RadioId => "radio ID",
            RecordKind::GpsSystem => "GPS system",
            RecordKind::GeneralSettings => "general settings",
            RecordKind::BootSettings => "boot settings",
            RecordKind::ContactIndex => "contact index",
            RecordKind::Opaque => "opaque region",
        };
        f.write_str(s)
    }
}

/// Errors produced while encoding an abstract configuration into a codeplug
/// image, or while reading/writing the sparse image directly.
///
/// Decode-time problems with an individual record do not use this type:
/// they are collected as [`Diagnostic`]s instead, so that a partially
/// readable image still yields a usable configuration. `CodecError` is for
/// failures that make it impossible to produce any result at all: a caller
/// asking for bytes the image never allocated, or an abstract configuration
/// that cannot be represented in the radio's memory layout.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{kind} at index {index} exceeds the radio's capacity of {limit}")]
    CapacityExceeded {
        kind: RecordKind,
        index: usize,
        limit: usize,
    },

    #[error("frequency {hz} Hz for {kind} at index {index} cannot be represented in BCD")]
    InvalidFrequency {
        kind: RecordKind,
        index: usize,
        hz: i64,
    },

    #[error("{kind} at index {index} refers to an object that is not present in the configuration")]
    InvalidIndex { kind: RecordKind, index: usize },

    #[error("corrupt image: {detail} at address {address:#08X} ({kind})")]
    CorruptImage {
        kind: RecordKind,
        address: u32,
        detail: &'static str,
    },

    #[error("unsupported value {value} for field {field} of {kind} at index {index}")]
    Unsupported {
        kind: RecordKind,
        index: usize,
        field: &'static str,
        value: u32,
    },

    #[error("address range [{address:#08X}, {:#08X}) was never allocated", address + *len as u32)]
    Unallocated { address: u32, len: usize },

    #[error("address range [{address:#08X}, {:#08X}) overlaps an existing range with a different fill byte", address + *len as u32)]
    ConflictingAllocation { address: u32, len: usize },
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Expected, routine skip (an optional region that is simply empty).
    Debug,
    /// A record or reference was dropped; the decode is still usable.
    Warning,
}

/// A single recoverable issue discovered while decoding an image.
///
/// Decode never fails outright because one record is malformed: the bad
/// slot is treated as absent and a `Diagnostic` is appended to the
/// [`crate::orchestrator::DecodeOutcome`] returned to the caller. Every
/// diagnostic is also emitted through the `log` facade at a level matching
/// its [`Severity`], so a caller that does not inspect the diagnostics list
/// still sees them if it has installed a logger.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: RecordKind,
    pub index: usize,
    pub address: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: RecordKind, index: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            kind,
            index,
            address: None,
            message: message.into(),
        }
    }

    pub fn with_address(mut self, address: u32) -> Self {
        self.address = Some(address);
        self
    }

    pub fn emit(&self) {
        match self.severity {
            Severity::Debug => log::debug!(
                "{} #{}: {}{}",
                self.kind,
                self.index,
                self.message,
                self.address_suffix()
            ),
            Severity::Warning => log::warn!(
                "{} #{}: {}{}",
                self.kind,
                self.index,
                self.message,
                self.address_suffix()
            ),
        }
    }

    fn address_suffix(&self) -> String {
        match self.address {
            Some(addr) => format!(" (at {:#08X})", addr),
            None => String::new(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.kind, self.index, self.message)?;
        if let Some(addr) = self.address {
            write!(f, " (at {:#08X})", addr)?;
        }
        Ok(())
    }
}
