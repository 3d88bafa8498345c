//! Capture line parser
//!
//! Parses the default `candump` text output, one frame per line:
//!
//! ```text
//!   can0  181   [8]  FF 00 00 00 00 00 00 00
//! ```
//!
//! Split on single spaces this gives the id as field 4 and the remainder of
//! the line, the space-separated payload bytes, as field 9.

use crate::types::{CanFrame, CodecError, Result, MAX_PAYLOAD, MAX_STANDARD_ID};
use std::io::BufRead;

const FIELD_COUNT: usize = 10;
const ID_FIELD: usize = 4;
const DATA_FIELD: usize = 9;

/// Parse one capture line into a frame.
pub fn parse_line(line: &str) -> Result<CanFrame> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, ' ').collect();
    if fields.len() < FIELD_COUNT {
        return Err(CodecError::ParseError(format!(
            "expected {} fields, found {}: {:?}",
            FIELD_COUNT,
            fields.len(),
            line
        )));
    }

    let id_str = fields[ID_FIELD];
    let id = u32::from_str_radix(id_str, 16)
        .map_err(|_| CodecError::ParseError(format!("invalid hex id: {:?}", id_str)))?;
    if id > MAX_STANDARD_ID {
        return Err(CodecError::ParseError(format!(
            "id 0x{:X} is not an 11-bit identifier",
            id
        )));
    }

    let data = parse_payload(fields[DATA_FIELD])?;
    Ok(CanFrame { id, data })
}

fn parse_payload(field: &str) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(MAX_PAYLOAD);
    for token in field.split(' ').filter(|t| !t.is_empty()) {
        if token.len() != 2 || !token.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(CodecError::ParseError(format!(
                "invalid payload byte: {:?}",
                token
            )));
        }
        if data.len() == MAX_PAYLOAD {
            return Err(CodecError::ParseError(format!(
                "payload longer than {} bytes",
                MAX_PAYLOAD
            )));
        }
        // two ASCII hex digits always fit in a u8
        data.push(u8::from_str_radix(token, 16).map_err(|_| {
            CodecError::ParseError(format!("invalid payload byte: {:?}", token))
        })?);
    }
    Ok(data)
}

/// Iterator over the frames of a capture stream
///
/// Yields one item per non-empty line; malformed lines come out as
/// [`CodecError::ParseError`] so the caller can skip them and continue.
pub struct CaptureReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> CaptureReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Number of the line most recently read (1-based)
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for CaptureReader<R> {
    type Item = Result<CanFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(&line));
        }
    }
}
