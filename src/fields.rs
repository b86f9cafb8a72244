//! Field splitting.
//!
//! Three modes, selected by the separator option rather than by byte
//! identity:
//!
//! 1. **Whitespace** (the AWK default): runs of spaces and tabs separate
//!    fields and collapse; leading and trailing runs produce no empty
//!    fields.
//! 2. **Single byte**: every occurrence divides the line; consecutive,
//!    leading and trailing separators produce empty fields.
//! 3. **Multi byte**: the separator string is matched exactly; empty
//!    fields as in mode 2.
//!
//! Field records carry offsets relative to the line start; the empty line
//! has no fields in any mode.

use crate::error::{Error, Result};
use crate::options::MAX_FIELD_SEP_LEN;
use crate::record::FieldRecord;
use crate::simd;

/// A validated separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSep {
    Whitespace,
    Byte(u8),
    Bytes(Vec<u8>),
}

impl FieldSep {
    /// Build from the options value. `None`, `" "` and the space/tab pair
    /// all select whitespace mode.
    pub fn from_option(separator: Option<&[u8]>) -> Result<Self> {
        let Some(sep) = separator else {
            return Ok(Self::Whitespace);
        };
        if sep.len() > MAX_FIELD_SEP_LEN {
            return Err(Error::FieldSepTooLong {
                len: sep.len(),
                limit: MAX_FIELD_SEP_LEN,
            });
        }
        match sep {
            b"" | b" " | b" \t" => Ok(Self::Whitespace),
            [byte] => Ok(Self::Byte(*byte)),
            bytes => Ok(Self::Bytes(bytes.to_vec())),
        }
    }
}

/// Split `line` into fields, appending records with the given `line_idx`.
/// Returns the field count.
pub fn split_line(line: &[u8], line_idx: u32, sep: &FieldSep, fields: &mut Vec<FieldRecord>) -> u32 {
    if line.is_empty() {
        return 0;
    }
    match sep {
        FieldSep::Whitespace => split_whitespace(line, line_idx, fields),
        FieldSep::Byte(byte) => split_single(line, line_idx, *byte, fields),
        FieldSep::Bytes(bytes) => split_multi(line, line_idx, bytes, fields),
    }
}

fn split_whitespace(line: &[u8], line_idx: u32, fields: &mut Vec<FieldRecord>) -> u32 {
    let mut count = 0;
    let mut pos = 0;

    while pos < line.len() {
        if simd::is_separator(line[pos], b" \t") {
            pos += 1;
            continue;
        }
        // The windowed probe skips 32 bytes at a time when the remaining
        // span holds no separator.
        let end = simd::find_space_tab(line, pos);
        count += 1;
        fields.push(FieldRecord {
            line_idx,
            field_idx: count,
            start_offset: pos as u32,
            end_offset: end as u32,
        });
        pos = end;
    }

    count
}

fn split_single(line: &[u8], line_idx: u32, sep: u8, fields: &mut Vec<FieldRecord>) -> u32 {
    let mut count = 0;
    let mut start = 0;

    for (i, &byte) in line.iter().enumerate() {
        if simd::is_separator(byte, &[sep]) {
            count += 1;
            fields.push(FieldRecord {
                line_idx,
                field_idx: count,
                start_offset: start as u32,
                end_offset: i as u32,
            });
            start = i + 1;
        }
    }
    // The span after the last separator is a field even when empty.
    count += 1;
    fields.push(FieldRecord {
        line_idx,
        field_idx: count,
        start_offset: start as u32,
        end_offset: line.len() as u32,
    });

    count
}

fn split_multi(line: &[u8], line_idx: u32, sep: &[u8], fields: &mut Vec<FieldRecord>) -> u32 {
    let mut count = 0;
    let mut start = 0;
    let mut pos = 0;

    while pos + sep.len() <= line.len() {
        if &line[pos..pos + sep.len()] == sep {
            count += 1;
            fields.push(FieldRecord {
                line_idx,
                field_idx: count,
                start_offset: start as u32,
                end_offset: pos as u32,
            });
            pos += sep.len();
            start = pos;
        } else {
            pos += 1;
        }
    }
    count += 1;
    fields.push(FieldRecord {
        line_idx,
        field_idx: count,
        start_offset: start as u32,
        end_offset: line.len() as u32,
    });

    count
}
