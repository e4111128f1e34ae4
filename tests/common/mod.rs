#![allow(dead_code)]

use nau7802_proto::{CalibratedReading, MarkerRole, SampleDecoder};

/// Build one well-formed marker line, CRLF-terminated like the bridge UART.
pub fn marker_line(role: MarkerRole, byte: u8) -> String {
    let digit = match role {
        MarkerRole::First => '2',
        MarkerRole::Second => '3',
        MarkerRole::Third => '4',
    };
    format!("[2AWA1{}A [2ARA{:02X}\r\n", digit, byte)
}

/// The three marker lines of one sample, in wire order.
pub fn triplet(b0: u8, b1: u8, b2: u8) -> String {
    let mut t = marker_line(MarkerRole::First, b0);
    t.push_str(&marker_line(MarkerRole::Second, b1));
    t.push_str(&marker_line(MarkerRole::Third, b2));
    t
}

/// Feed a transcript in fixed-size chunks.
pub fn feed_chunked(
    decoder: &mut SampleDecoder,
    transcript: &[u8],
    chunk_len: usize,
) -> Vec<CalibratedReading> {
    let mut readings = Vec::new();
    for chunk in transcript.chunks(chunk_len) {
        readings.extend(decoder.feed_bytes(chunk));
    }
    readings
}

/// The conversion the decoder is expected to perform.
pub fn expected_value(raw: u32, tare: i64, scale_divisor: i64) -> f64 {
    (i64::from(raw) * 1000 - tare) as f64 / scale_divisor as f64
}
