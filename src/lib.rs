//! Sans-io decoder for the wire protocol of a NAU7802-class serial sensor
//! bridge.
//!
//! The bridge emits ASCII lines over serial-USB. Every payload byte of a
//! 24-bit ADC sample travels on its own marker line, identified by a fixed
//! envelope prefix (`[2AWA12A`, `[2AWA13A`, `[2AWA14A` for the three byte
//! positions) and carrying two hex digits after the `[2AR` value token.
//! Three in-order marker lines form one sample; anything else on the wire
//! is noise.
//!
//! [`SampleDecoder`] drives the whole pipeline: chunk reassembly into
//! lines, line classification, triplet reassembly and calibration. It is
//! transport-agnostic; read bytes from wherever they come from and pass
//! them to [`SampleDecoder::feed_bytes`].
//!
//! ```
//! use nau7802_proto::{divisor, Calibration, SampleDecoder};
//!
//! let mut decoder = SampleDecoder::new(Calibration::new(2_625_000, divisor(399_835)));
//! for reading in decoder.feed_bytes(b"[2AWA12A [2ARA00\n[2AWA13A [2ARA07\n[2AWA14A [2ARAF8\n") {
//!     println!("raw {} -> {:.3}", reading.raw, reading.value);
//! }
//! ```

mod buffer;
pub mod decoder;
mod nom_parser;
pub mod types;

pub use crate::decoder::{SampleDecoder, UnknownRolePolicy};
pub use crate::types::{
    divisor, Calibration, CalibratedReading, Error, MarkerRole, RawSample, ScaleDivisor,
};
