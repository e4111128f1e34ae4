//! See [`SampleDecoder`] for more details.

use log::{debug, trace};

use crate::buffer::Buffer;
use crate::nom_parser::{classify, LineToken};
use crate::types::{Calibration, CalibratedReading, MarkerRole, RawSample, ScaleDivisor};

/// Policy for marker lines whose envelope and payload parse, but whose
/// position prefix is not one of the three recognized markers.
///
/// The bridge firmware has never been observed emitting such lines, so it is
/// unclear whether they should count as protocol violations or as noise.
/// [`Reset`](UnknownRolePolicy::Reset) treats them as violations and is the
/// default; the two behaviors differ in how fast the decoder resynchronizes
/// after garbled input.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum UnknownRolePolicy {
    /// Discard any in-progress triplet and wait for the next first marker.
    Reset,
    /// Skip the line as if it were not protocol traffic.
    Ignore,
}

impl Default for UnknownRolePolicy {
    fn default() -> Self {
        Self::Reset
    }
}

/// The reassembly state machine, advancing one classified line at a time.
///
/// Payload bytes accumulate in the variant payloads, so the machine can
/// never hold more bytes than its position implies. `seq` is the sequence
/// number of the line that opened the triplet.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum TripletState {
    AwaitFirst,
    AwaitSecond { first: u8, seq: u64 },
    AwaitThird { first: u8, second: u8, seq: u64 },
}

impl TripletState {
    /// Advance by one classified line.
    ///
    /// Non-protocol lines leave the state untouched. Malformed lines,
    /// unrecognized position prefixes and out-of-order markers all discard
    /// the in-progress triplet; resynchronization starts at the very next
    /// line. A completed triplet is emitted and the machine cycles back to
    /// the initial state, so a single bad line never costs more than one
    /// sample.
    fn step(self, token: LineToken, line_seq: u64) -> (TripletState, Option<RawSample>) {
        use MarkerRole::{First, Second, Third};
        use TripletState::{AwaitFirst, AwaitSecond, AwaitThird};

        match (self, token) {
            (state, LineToken::NotProtocol) => (state, None),
            (_, LineToken::Malformed) | (_, LineToken::UnknownRole { .. }) => (AwaitFirst, None),
            (AwaitFirst, LineToken::Marker { role: First, value }) => (
                AwaitSecond {
                    first: value,
                    seq: line_seq,
                },
                None,
            ),
            (
                AwaitSecond { first, seq },
                LineToken::Marker {
                    role: Second,
                    value,
                },
            ) => (
                AwaitThird {
                    first,
                    second: value,
                    seq,
                },
                None,
            ),
            (
                AwaitThird { first, second, seq },
                LineToken::Marker { role: Third, value },
            ) => {
                let value = u32::from(first) << 16 | u32::from(second) << 8 | u32::from(value);
                (AwaitFirst, Some(RawSample { value, seq }))
            }
            // an out-of-order marker discards the partial triplet and is
            // itself consumed by the reset
            (_, LineToken::Marker { .. }) => (AwaitFirst, None),
        }
    }
}

/// Decoder for the sensor bridge byte stream.
///
/// Feed it transport chunks of any size and it hands back the calibrated
/// readings completed by those bytes. All protocol anomalies are handled
/// internally by resynchronizing, so feeding can never fail.
///
/// # Example
///
/// ```
/// use nau7802_proto::{Calibration, SampleDecoder};
///
/// let mut decoder = SampleDecoder::new(Calibration::default());
/// // chunk boundaries need not align with lines
/// assert!(decoder.feed_bytes(b"[2AWA12A [2ARA00\n[2AWA13A [2").is_empty());
/// let readings = decoder.feed_bytes(b"ARA07\n[2AWA14A [2ARAF8\n");
/// assert_eq!(readings.len(), 1);
/// assert_eq!(readings[0].raw, 0x0007F8);
/// ```
#[derive(Debug)]
pub struct SampleDecoder {
    buffer: Buffer,
    state: TripletState,
    calibration: Calibration,
    unknown_role_policy: UnknownRolePolicy,
    line_seq: u64,
}

impl SampleDecoder {
    /// Create a decoder with the default unknown-role policy.
    pub fn new(calibration: Calibration) -> Self {
        Self::with_policy(calibration, UnknownRolePolicy::default())
    }

    /// Create a decoder with an explicit unknown-role policy.
    pub fn with_policy(calibration: Calibration, policy: UnknownRolePolicy) -> Self {
        Self {
            buffer: Buffer::new(),
            state: TripletState::AwaitFirst,
            calibration,
            unknown_role_policy: policy,
            line_seq: 0,
        }
    }

    /// Feed one transport chunk, returning the readings it completed.
    ///
    /// Chunks may be empty and may split lines or triplets at any byte
    /// boundary; the remainder is carried over to the next call.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<CalibratedReading> {
        self.buffer.write(chunk);

        let mut readings = Vec::new();
        loop {
            let token = match self.buffer.next_line() {
                Some(line) => classify(line),
                None => break,
            };
            let line_seq = self.line_seq;
            self.line_seq += 1;

            if self.unknown_role_policy == UnknownRolePolicy::Ignore {
                if let LineToken::UnknownRole { value } = token {
                    trace!(
                        "line {}: skipping unrecognized marker prefix (payload {:#04x})",
                        line_seq,
                        value
                    );
                    continue;
                }
            }

            let (next, sample) = self.state.step(token, line_seq);
            if sample.is_none()
                && next == TripletState::AwaitFirst
                && self.state != TripletState::AwaitFirst
            {
                debug!("line {}: discarding partial triplet, resynchronizing", line_seq);
            }
            self.state = next;

            if let Some(sample) = sample {
                trace!("line {}: sample {:#08x} complete", line_seq, sample.value);
                readings.push(self.calibration.convert(sample));
            }
        }
        readings
    }

    /// Replace the tare offset. Applies to readings completed after this
    /// call; an already-emitted reading is never revised.
    pub fn set_tare(&mut self, tare: i64) {
        self.calibration.set_tare(tare);
    }

    /// Replace the scale divisor. Applies to readings completed after this
    /// call.
    pub fn set_scale_divisor(&mut self, divisor: ScaleDivisor) {
        self.calibration.set_scale_divisor(divisor);
    }

    /// The calibration currently applied to completed samples.
    pub const fn calibration(&self) -> Calibration {
        self.calibration
    }
}

#[cfg(test)]
mod step_tests {
    use super::TripletState::{AwaitFirst, AwaitSecond, AwaitThird};
    use super::*;
    use crate::nom_parser::LineToken;

    fn marker(role: MarkerRole, value: u8) -> LineToken {
        LineToken::Marker { role, value }
    }

    const MID_TRIPLET: TripletState = AwaitSecond { first: 7, seq: 3 };

    #[test]
    fn test_in_order_triplet_emits_sample() {
        let (state, out) = AwaitFirst.step(marker(MarkerRole::First, 0x00), 10);
        assert_eq!(state, AwaitSecond { first: 0x00, seq: 10 });
        assert_eq!(out, None);

        let (state, out) = state.step(marker(MarkerRole::Second, 0x07), 11);
        assert_eq!(
            state,
            AwaitThird {
                first: 0x00,
                second: 0x07,
                seq: 10
            }
        );
        assert_eq!(out, None);

        let (state, out) = state.step(marker(MarkerRole::Third, 0xF8), 12);
        assert_eq!(state, AwaitFirst);
        // seq is the one captured at the first marker
        assert_eq!(out, Some(RawSample { value: 2040, seq: 10 }));
    }

    #[test]
    fn test_non_protocol_preserves_state() {
        for state in [
            AwaitFirst,
            MID_TRIPLET,
            AwaitThird {
                first: 1,
                second: 2,
                seq: 0,
            },
        ]
        .iter()
        {
            let (next, out) = state.step(LineToken::NotProtocol, 99);
            assert_eq!(next, *state);
            assert_eq!(out, None);
        }
    }

    #[test]
    fn test_malformed_resets() {
        let (state, out) = MID_TRIPLET.step(LineToken::Malformed, 4);
        assert_eq!(state, AwaitFirst);
        assert_eq!(out, None);
    }

    #[test]
    fn test_unknown_role_resets() {
        let (state, out) = MID_TRIPLET.step(LineToken::UnknownRole { value: 0xAB }, 4);
        assert_eq!(state, AwaitFirst);
        assert_eq!(out, None);
    }

    #[test]
    fn test_out_of_order_marker_resets() {
        // third marker while waiting for the first
        let (state, out) = AwaitFirst.step(marker(MarkerRole::Third, 1), 0);
        assert_eq!((state, out), (AwaitFirst, None));

        // a duplicate first marker mid-triplet is consumed by the reset,
        // it does not open a new triplet
        let (state, out) = MID_TRIPLET.step(marker(MarkerRole::First, 1), 4);
        assert_eq!((state, out), (AwaitFirst, None));

        let (state, out) = MID_TRIPLET.step(marker(MarkerRole::Third, 1), 4);
        assert_eq!((state, out), (AwaitFirst, None));
    }
}
