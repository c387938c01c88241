//! Line framing for newline-delimited JSON bodies.
//!
//! Network reads do not respect line boundaries: one read may carry several
//! lines, and a line (or a multi-byte UTF-8 sequence inside it) may be split
//! across reads. The decoder holds back the incomplete tail until the next
//! read completes it.

use thiserror::Error;

/// Longest line the decoder will hold while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line exceeds {limit} bytes without a newline")]
pub struct LineTooLong {
    pub limit: usize,
}

#[derive(Debug)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    max_line: usize,
}

impl Default for NdjsonDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self { buffer: Vec::new(), max_line }
    }

    /// Appends `chunk` and returns every line it completed, trimmed, with blank
    /// lines skipped. Fails once the unterminated tail outgrows the line limit;
    /// the buffered bytes are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, LineTooLong> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line {
            self.buffer = Vec::new();
            return Err(LineTooLong { limit: self.max_line });
        }
        Ok(lines)
    }

    /// Returns the unterminated trailing line, if any, once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(bytes);
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
