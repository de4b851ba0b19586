//! Newline framing over arbitrarily split network reads.
//!
//! Reads arrive in chunks of any size; a single record can span several
//! chunks and a chunk can carry several records. The framer works on raw
//! bytes so that a multi-byte character split across two reads is rebuilt
//! before it is decoded.

use bytes::BytesMut;

use crate::error::ProtocolError;

const DELIMITER: u8 = b'\n';

/// Accumulates chunks and hands out complete, delimiter-stripped records.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to contain no delimiter.
    scanned: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are accepted and change nothing.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete, non-empty record.
    ///
    /// Returns `None` when the buffer holds no further delimiter; the
    /// remaining bytes stay buffered for the next `push`.
    pub fn next_record(&mut self) -> Option<Result<String, ProtocolError>> {
        loop {
            let offset = self.buffer[self.scanned..]
                .iter()
                .position(|&b| b == DELIMITER);
            let Some(offset) = offset else {
                self.scanned = self.buffer.len();
                return None;
            };

            let end = self.scanned + offset;
            let mut line = self.buffer.split_to(end + 1);
            self.scanned = 0;

            line.truncate(end);
            if line.last() == Some(&b'\r') {
                line.truncate(end - 1);
            }
            if line.is_empty() {
                continue;
            }

            return Some(
                String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidUtf8 {
                    message: e.to_string(),
                }),
            );
        }
    }

    /// Iterate over every complete record currently buffered.
    pub fn records(&mut self) -> Records<'_> {
        Records { framer: self }
    }

    /// Number of bytes waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Take the undelimited tail left at end of stream.
    ///
    /// Returns `None` when nothing but whitespace is left. The buffer is
    /// empty afterwards.
    pub fn finish(&mut self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.buffer[..]).into_owned();
        self.buffer.clear();
        self.scanned = 0;

        let trimmed = tail.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Iterator returned by [`LineFramer::records`].
pub struct Records<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Records<'_> {
    type Item = Result<String, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_record()
    }
}
