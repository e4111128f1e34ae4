/// Carry buffer between transport reads.
///
/// Chunks arrive at arbitrary boundaries relative to line terminators, so
/// everything after the last `\n` stays buffered until the next write.
#[derive(Debug)]
pub(crate) struct Buffer {
    data: Vec<u8>,
    read_pos: usize,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer {
            data: Vec::with_capacity(100),
            read_pos: 0,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        // reclaim the consumed prefix so the buffer never holds more than
        // the unread residue plus the incoming chunk
        if self.read_pos > 0 {
            let len = self.data.len();
            self.data.copy_within(self.read_pos.., 0);
            self.data.truncate(len - self.read_pos);
            self.read_pos = 0;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Extract the next complete line, consuming it and its terminator.
    ///
    /// The returned slice is trimmed of leading and trailing ASCII
    /// whitespace, which also strips the `\r` of CRLF-terminated input.
    /// Returns `None` when no unconsumed `\n` remains.
    pub fn next_line(&mut self) -> Option<&[u8]> {
        let start = self.read_pos;
        let nl = self.data[start..].iter().position(|&b| b == b'\n')?;
        self.read_pos = start + nl + 1;
        Some(trim_ascii(&self.data[start..start + nl]))
    }
}

fn trim_ascii(mut line: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = line {
        if !first.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    while let [rest @ .., last] = line {
        if !last.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    line
}
