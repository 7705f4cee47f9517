//! Bidirectional codec between an abstract radio configuration and the
//! Anytone AT-D868UV binary codeplug image.
//!
//! The entry points are [`orchestrator::encode`] and [`orchestrator::decode`];
//! everything else in this crate exists to support those two functions:
//! [`image::SparseImage`] models the radio's sparse, block-addressed memory,
//! [`mask`] and [`bcd`]/[`strings`]/[`tone`] are the codec primitives each
//! record type is built from, and [`records`] holds one module per record
//! type. [`model`] is the configuration this crate maps to and from; it has
//! no knowledge of addresses or byte layout.

pub mod bcd;
pub mod error;
pub mod image;
pub mod layout;
pub mod link;
pub mod mask;
pub mod model;
pub mod orchestrator;
pub mod records;
pub mod strings;
pub mod tone;

pub use error::{CodecError, Diagnostic, RecordKind, Severity};
pub use model::Configuration;
pub use orchestrator::{decode, encode, CodecOptions, DecodeOutcome};
