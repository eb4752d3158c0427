//! Scanning of byte sequences made up of PEM blocks.
//!
//! Whitespace between blocks is skipped, but any other content outside of a
//! `-----BEGIN <LABEL>-----`/`-----END <LABEL>-----` pair is rejected. This is stricter than
//! OpenSSL's own PEM reader, which silently skips garbage between blocks.

use snafu::{ensure, ResultExt, Snafu};

const BEGIN_PREFIX: &[u8] = b"-----BEGIN ";
const END_PREFIX: &[u8] = b"-----END ";
const MARKER_SUFFIX: &[u8] = b"-----";

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum Error {
    #[snafu(display("expected a PEM BEGIN marker at byte offset {offset}"))]
    MissingBeginMarker { offset: usize },

    #[snafu(display("malformed PEM BEGIN marker at byte offset {offset}"))]
    MalformedBeginMarker { offset: usize },

    #[snafu(display("PEM block {label:?} at byte offset {offset} has no END marker"))]
    MissingEndMarker { label: String, offset: usize },

    #[snafu(display(
        "PEM block {begin:?} at byte offset {offset} is closed by a mismatched END marker {end:?}"
    ))]
    MismatchedEndMarker {
        begin: String,
        end: String,
        offset: usize,
    },
}

impl Error {
    /// Byte offset of the offending region in the scanned input.
    pub fn offset(&self) -> usize {
        match self {
            Error::MissingBeginMarker { offset }
            | Error::MalformedBeginMarker { offset }
            | Error::MissingEndMarker { offset, .. }
            | Error::MismatchedEndMarker { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum DecodeError {
    #[snafu(display("payload of PEM block at byte offset {offset} contains non-ASCII bytes"))]
    NonAsciiPayload { offset: usize },

    #[snafu(display("payload of PEM block at byte offset {offset} is not valid base64"))]
    InvalidBase64 {
        source: openssl::error::ErrorStack,
        offset: usize,
    },
}

/// A single PEM block, borrowed from the scanned input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PemBlock<'a> {
    label: &'a str,
    offset: usize,
    raw: &'a [u8],
    payload: &'a [u8],
}

impl<'a> PemBlock<'a> {
    /// The `<LABEL>` of the `-----BEGIN <LABEL>-----` marker, such as `CERTIFICATE`.
    pub fn label(&self) -> &'a str {
        self.label
    }

    /// Byte offset of the BEGIN marker in the scanned input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The block exactly as it appeared in the input, from the BEGIN marker up to and including
    /// the END marker. Line breaks inside the block are kept, the one after the END marker is not.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Decodes the base64 payload between the markers.
    pub fn decode_payload(&self) -> Result<Vec<u8>, DecodeError> {
        use decode_error::*;
        ensure!(
            self.payload.is_ascii(),
            NonAsciiPayloadSnafu {
                offset: self.offset
            }
        );
        let encoded = self
            .payload
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|&b| char::from(b))
            .collect::<String>();
        openssl::base64::decode_block(&encoded).context(InvalidBase64Snafu {
            offset: self.offset,
        })
    }
}

/// Lazily scans `input` for PEM blocks.
///
/// The iterator stops after yielding the first error.
pub fn pem_blocks(input: &[u8]) -> PemBlocks<'_> {
    PemBlocks {
        input,
        pos: 0,
        failed: false,
    }
}

pub struct PemBlocks<'a> {
    input: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Iterator for PemBlocks<'a> {
    type Item = Result<PemBlock<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.pos += self.input[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if self.pos >= self.input.len() {
            return None;
        }
        let block = self.scan_block();
        self.failed = block.is_err();
        Some(block)
    }
}

impl<'a> PemBlocks<'a> {
    /// Scans the block starting at `self.pos`, which must point at non-whitespace.
    fn scan_block(&mut self) -> Result<PemBlock<'a>, Error> {
        let offset = self.pos;
        let begin = Line::at(self.input, offset);
        ensure!(
            begin.content.starts_with(BEGIN_PREFIX),
            MissingBeginMarkerSnafu { offset }
        );
        let label = marker_label(begin.content, BEGIN_PREFIX)
            .and_then(|label| std::str::from_utf8(label).ok())
            .filter(|label| !label.is_empty())
            .ok_or(Error::MalformedBeginMarker { offset })?;

        let payload_start = begin.next;
        let mut cursor = begin.next;
        while cursor < self.input.len() {
            let line = Line::at(self.input, cursor);
            if line.content.starts_with(END_PREFIX) {
                let end_label = marker_label(line.content, END_PREFIX).unwrap_or(line.content);
                ensure!(
                    end_label == label.as_bytes(),
                    MismatchedEndMarkerSnafu {
                        begin: label,
                        end: String::from_utf8_lossy(end_label),
                        offset,
                    }
                );
                self.pos = line.next;
                return Ok(PemBlock {
                    label,
                    offset,
                    raw: &self.input[offset..line.content_end()],
                    payload: &self.input[payload_start..line.start],
                });
            }
            if line.content.starts_with(BEGIN_PREFIX) {
                break;
            }
            cursor = line.next;
        }
        MissingEndMarkerSnafu { label, offset }.fail()
    }
}

/// Extracts `<LABEL>` from `<prefix><LABEL>-----`.
fn marker_label<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    line.strip_prefix(prefix)?.strip_suffix(MARKER_SUFFIX)
}

struct Line<'a> {
    /// Offset of the first byte of the line.
    start: usize,
    /// Offset of `content` in the input.
    content_start: usize,
    /// The line without surrounding whitespace (including `\r`).
    content: &'a [u8],
    /// Offset of the first byte after the line break, or the input length for the last line.
    next: usize,
}

impl<'a> Line<'a> {
    fn at(input: &'a [u8], start: usize) -> Self {
        let (end, next) = match input[start..].iter().position(|&b| b == b'\n') {
            Some(len) => (start + len, start + len + 1),
            None => (input.len(), input.len()),
        };
        let line = &input[start..end];
        let leading = line.iter().take_while(|b| b.is_ascii_whitespace()).count();
        Line {
            start,
            content_start: start + leading,
            content: line[leading..].trim_ascii_end(),
            next,
        }
    }

    fn content_end(&self) -> usize {
        self.content_start + self.content.len()
    }
}
