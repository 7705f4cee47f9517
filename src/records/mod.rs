//! Per-record-type codecs.
//!
//! Each submodule knows the byte-exact layout of one kind of record and
//! exposes `decode`/`encode` pairs that work on a fixed-size byte slice.
//! Cross-record references are decoded as raw indices (`RawXyz` structs)
//! and resolved later by [`crate::link`]; nothing in here touches the
//! sparse image or the presence masks directly, that's the orchestrator's
//! job.

pub mod analog_contact;
pub mod channel;
pub mod contact;
pub mod contact_index;
pub mod gps;
pub mod group_list;
pub mod radio_id;
pub mod scan_list;
pub mod settings;
pub mod zone;
