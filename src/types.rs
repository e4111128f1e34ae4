//! This module defines the calibration types and the conversion from raw
//! 24-bit bridge samples into calibrated readings.

use snafu::{ensure, OptionExt, Snafu};

use core::convert::{TryFrom, TryInto};
use core::ops::Deref;

/// Error type for this module
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The value isn't a valid scale divisor (zero, or out of range).
    #[snafu(display("Invalid scale divisor"))]
    InvalidScaleDivisor,
}

const fn invalid_scale_divisor() -> InvalidScaleDivisorSnafu {
    InvalidScaleDivisorSnafu
}

/// Gain multiplier applied to the raw 24-bit value before tare subtraction,
/// matching the bridge firmware's hardware gain step.
pub const SAMPLE_SCALE: i64 = 1000;

/// Tare offset the bridge ships with.
pub const DEFAULT_TARE: i64 = 2_625_000;

/// Divisor converting tared counts to grams for the stock load cell.
pub const DEFAULT_SCALE_DIVISOR: i64 = 399_835;

/// The ordinal position of a marker line within one sample triplet.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub enum MarkerRole {
    /// Carries the most significant byte of the sample.
    First,
    /// Carries the middle byte.
    Second,
    /// Carries the least significant byte.
    Third,
}

/// `ScaleDivisor` is a checked non-zero divisor, converting tared counts
/// into physical units.
///
/// ## Example
/// ```
/// use nau7802_proto::ScaleDivisor;
/// use std::convert::TryInto;
/// let div = ScaleDivisor::new(399_835).unwrap();
/// let div: ScaleDivisor = 399_835i64.try_into().unwrap();
/// ```
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct ScaleDivisor(i64);

/// Create a new [`ScaleDivisor`], panics if it is zero.
pub const fn divisor(d: i64) -> ScaleDivisor {
    if d != 0 {
        return ScaleDivisor(d);
    }
    panic!("Invalid scale divisor.")
}

impl ScaleDivisor {
    /// Create a new divisor, checking that it is non-zero.
    /// # Errors
    /// Returns [`Error::InvalidScaleDivisor`] if `divisor` is zero or can't
    /// be represented as `i64`.
    pub fn new(divisor: impl TryInto<i64>) -> Result<Self, Error> {
        let divisor = divisor
            .try_into()
            .ok()
            .with_context(invalid_scale_divisor)?;
        ensure!(divisor != 0, invalid_scale_divisor());
        Ok(Self(divisor))
    }
}

impl Deref for ScaleDivisor {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<i64> for ScaleDivisor {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for ScaleDivisor {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One reassembled 24-bit sample, before calibration.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct RawSample {
    /// The 24-bit value, first byte most significant.
    pub value: u32,
    /// Sequence number of the line that carried the first byte.
    pub seq: u64,
}

/// A calibrated reading, ready to hand to the display or logging sink.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct CalibratedReading {
    /// The physical value, in the unit the scale divisor was chosen for.
    pub value: f64,
    /// The raw 24-bit sample the reading was derived from.
    pub raw: u32,
    /// Sequence number captured when the triplet started.
    pub seq: u64,
}

/// The calibration parameters applied to every completed sample.
///
/// Conversion order is scale, then tare, then divide:
/// `value = (raw * sample_scale - tare) / divisor`.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Calibration {
    sample_scale: i64,
    tare: i64,
    divisor: ScaleDivisor,
}

impl Calibration {
    /// Create a calibration with the standard sample scale.
    pub const fn new(tare: i64, divisor: ScaleDivisor) -> Self {
        Self::with_sample_scale(SAMPLE_SCALE, tare, divisor)
    }

    /// Create a calibration with an explicit sample scale, for bridge
    /// firmware revisions that apply no gain step (scale 1).
    pub const fn with_sample_scale(sample_scale: i64, tare: i64, divisor: ScaleDivisor) -> Self {
        Self {
            sample_scale,
            tare,
            divisor,
        }
    }

    /// Convert one raw sample into a calibrated reading.
    ///
    /// The whole calibration is read in one call, so a tare or divisor
    /// update can never mix with stale values within a single reading.
    pub fn convert(&self, sample: RawSample) -> CalibratedReading {
        let scaled = i64::from(sample.value) * self.sample_scale;
        let tared = scaled - self.tare;
        CalibratedReading {
            value: tared as f64 / self.divisor.0 as f64,
            raw: sample.value,
            seq: sample.seq,
        }
    }

    /// Replace the tare offset. Takes effect on the next conversion.
    pub fn set_tare(&mut self, tare: i64) {
        self.tare = tare;
    }

    /// Replace the scale divisor. Takes effect on the next conversion.
    pub fn set_scale_divisor(&mut self, divisor: ScaleDivisor) {
        self.divisor = divisor;
    }

    /// The current tare offset.
    pub const fn tare(&self) -> i64 {
        self.tare
    }

    /// The gain multiplier applied before tare subtraction.
    pub const fn sample_scale(&self) -> i64 {
        self.sample_scale
    }

    /// The current scale divisor.
    pub const fn scale_divisor(&self) -> ScaleDivisor {
        self.divisor
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(DEFAULT_TARE, divisor(DEFAULT_SCALE_DIVISOR))
    }
}
