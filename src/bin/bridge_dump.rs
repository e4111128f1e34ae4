use std::error::Error;
use std::io::{self, Read};

use nau7802_proto::{Calibration, SampleDecoder};

fn dump_main_loop() -> Result<(), Box<dyn Error>> {
    let mut decoder = SampleDecoder::new(Calibration::default());

    let mut buf = [0; 4096];
    loop {
        let len = io::stdin().read(&mut buf)?;
        if len == 0 {
            break;
        }
        for reading in decoder.feed_bytes(&buf[..len]) {
            println!("{}\t{}\t{:.3}", reading.seq, reading.raw, reading.value);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    dump_main_loop()
}
