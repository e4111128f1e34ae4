//! Classification of single wire lines into protocol tokens.
//!
//! The bridge frames each payload byte as an ASCII line: an envelope prefix
//! carrying the triplet position, and a value token carrying two hex digits
//! somewhere later in the same line.

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_until, take_while_m_n};
use nom::combinator::{map_res, value};
use nom::IResult;

use crate::types::MarkerRole;

type Char = u8;
type Buf = [u8];

/// Envelope prefix shared by all protocol lines.
const ENVELOPE: &Buf = b"[2AWA";
/// Per-position envelope prefixes, one per [`MarkerRole`].
const FIRST_MARKER: &Buf = b"[2AWA12A";
const SECOND_MARKER: &Buf = b"[2AWA13A";
const THIRD_MARKER: &Buf = b"[2AWA14A";
/// Token introducing the payload byte: `[2AR`, one echo character, then
/// exactly two hex digits.
const VALUE_MARKER: &Buf = b"[2AR";

#[derive(PartialEq, Debug, Copy, Clone)]
pub(crate) enum LineToken {
    /// The line is not bridge traffic at all.
    NotProtocol,
    /// Bridge traffic, but the payload byte can't be extracted.
    Malformed,
    /// Bridge traffic with a valid payload, but an unrecognized position
    /// prefix.
    UnknownRole { value: u8 },
    /// A well-formed marker line.
    Marker { role: MarkerRole, value: u8 },
}

/// Classify one trimmed line.
///
/// The payload byte is checked before the position prefix, so a line with a
/// broken value token counts as malformed even when its prefix is also
/// unrecognized.
pub(crate) fn classify(line: &Buf) -> LineToken {
    if !line.starts_with(ENVELOPE) {
        return LineToken::NotProtocol;
    }
    let value = match payload_byte(line) {
        Ok((_, value)) => value,
        Err(_) => return LineToken::Malformed,
    };
    match role(line) {
        Ok((_, role)) => LineToken::Marker { role, value },
        Err(_) => LineToken::UnknownRole { value },
    }
}

fn payload_byte(line: &Buf) -> IResult<&Buf, u8> {
    let (line, _) = take_until(VALUE_MARKER)(line)?;
    let (line, _) = tag(VALUE_MARKER)(line)?;
    let (line, _echo) = take(1usize)(line)?;
    hex_byte(line)
}

fn role(line: &Buf) -> IResult<&Buf, MarkerRole> {
    alt((
        value(MarkerRole::First, tag(FIRST_MARKER)),
        value(MarkerRole::Second, tag(SECOND_MARKER)),
        value(MarkerRole::Third, tag(THIRD_MARKER)),
    ))(line)
}

fn hex_byte(buf: &Buf) -> IResult<&Buf, u8> {
    map_res(
        map_res(
            take_while_m_n(2, 2, |c: Char| c.is_ascii_hexdigit()),
            core::str::from_utf8,
        ),
        |s| u8::from_str_radix(s, 16),
    )(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use MarkerRole::{First, Second, Third};

    #[test]
    fn test_marker_lines() {
        assert_eq!(
            classify(b"[2AWA12A [2ARA00"),
            LineToken::Marker {
                role: First,
                value: 0x00
            }
        );
        assert_eq!(
            classify(b"[2AWA13A [2ARA07"),
            LineToken::Marker {
                role: Second,
                value: 0x07
            }
        );
        assert_eq!(
            classify(b"[2AWA14A [2ARAF8"),
            LineToken::Marker {
                role: Third,
                value: 0xF8
            }
        );
    }

    #[test]
    fn test_hex_case_insensitive() {
        assert_eq!(
            classify(b"[2AWA12A [2ARAf8"),
            LineToken::Marker {
                role: First,
                value: 0xF8
            }
        );
        assert_eq!(
            classify(b"[2AWA12A [2ARAfE"),
            LineToken::Marker {
                role: First,
                value: 0xFE
            }
        );
    }

    #[test]
    fn test_trailing_garbage_ignored() {
        assert_eq!(
            classify(b"[2AWA12A [2ARA07 junk"),
            LineToken::Marker {
                role: First,
                value: 0x07
            }
        );
    }

    #[test]
    fn test_non_protocol_lines() {
        assert_eq!(classify(b""), LineToken::NotProtocol);
        assert_eq!(classify(b"hello world"), LineToken::NotProtocol);
        // the envelope must start the line
        assert_eq!(classify(b"x[2AWA12A [2ARA07"), LineToken::NotProtocol);
        assert_eq!(classify(b"[2AW"), LineToken::NotProtocol);
    }

    #[test]
    fn test_malformed_lines() {
        // no value token
        assert_eq!(classify(b"[2AWA12A"), LineToken::Malformed);
        // value token but no room for the payload
        assert_eq!(classify(b"[2AWA12A [2AR"), LineToken::Malformed);
        assert_eq!(classify(b"[2AWA12A [2ARA"), LineToken::Malformed);
        // one hex digit is not enough
        assert_eq!(classify(b"[2AWA12A [2ARA7"), LineToken::Malformed);
        // non-hex payload
        assert_eq!(classify(b"[2AWA12A [2ARAZ9"), LineToken::Malformed);
        assert_eq!(classify(b"[2AWA12A [2ARA+9"), LineToken::Malformed);
    }

    #[test]
    fn test_unknown_role_prefix() {
        assert_eq!(
            classify(b"[2AWA15A [2ARA07"),
            LineToken::UnknownRole { value: 0x07 }
        );
        // broken payload wins over the unknown prefix
        assert_eq!(classify(b"[2AWA15A [2ARAQQ"), LineToken::Malformed);
    }
}
