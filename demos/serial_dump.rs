//! Polls a serial port and prints one line per calibrated reading:
//! sequence number, raw 24-bit value, calibrated value.
//!
//! Usage: `serial_dump [port] [tare] [scale-divisor]`

use anyhow::{Context, Result};
use std::io::Read;
use std::time::Duration;

use nau7802_proto::types::{DEFAULT_SCALE_DIVISOR, DEFAULT_TARE};
use nau7802_proto::{divisor, Calibration, SampleDecoder, ScaleDivisor};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or("/dev/ttyUSB0".to_string());
    let tare = match args.next() {
        Some(arg) => arg.parse().context("Invalid tare")?,
        None => DEFAULT_TARE,
    };
    let scale_divisor = match args.next() {
        Some(arg) => ScaleDivisor::new(arg.parse::<i64>().context("Invalid scale divisor")?)?,
        None => divisor(DEFAULT_SCALE_DIVISOR),
    };

    // the bridge runs its UART at a fixed 921600 baud
    let mut serial = serialport::new(&port, 921_600)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;

    let mut decoder = SampleDecoder::new(Calibration::new(tare, scale_divisor));

    let mut buf = [0; 4096];
    loop {
        let len = match serial.read(&mut buf) {
            Ok(len) => len,
            Err(err) if err.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(err) => return Err(err).context("Serial read failed"),
        };
        for reading in decoder.feed_bytes(&buf[..len]) {
            println!("{}\t{}\t{:.3}", reading.seq, reading.raw, reading.value);
        }
    }
}
