//! Result record layouts shared by the CPU and GPU paths.
//!
//! All offsets are unsigned 32-bit byte indices into the caller-supplied
//! input buffer. Records never copy line content; readers must keep the
//! input alive for as long as they hold the record arrays.

/// One selected line.
///
/// `match_start`/`match_end` are relative to `line_start` and are both zero
/// when the match concept does not apply (empty pattern, inverted match).
/// The layout is fixed: six `u32` fields plus an 8-byte tail so the struct
/// is 32 bytes on both host and device.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct MatchRecord {
    pub line_start: u32,
    pub line_end: u32,
    pub match_start: u32,
    pub match_end: u32,
    pub line_num: u32,
    pub field_count: u32,
    pub _pad: [u32; 2],
}

impl MatchRecord {
    pub fn new(line_start: u32, line_end: u32, match_start: u32, match_end: u32, line_num: u32) -> Self {
        Self {
            line_start,
            line_end,
            match_start,
            match_end,
            line_num,
            field_count: 0,
            _pad: [0; 2],
        }
    }

    /// The line slice this record describes.
    pub fn line<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.line_start as usize..self.line_end as usize]
    }

    /// The matched span, absolute in the input buffer.
    pub fn matched<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = (self.line_start + self.match_start) as usize;
        let end = (self.line_start + self.match_end) as usize;
        &input[start..end]
    }
}

/// One field of a selected line.
///
/// `line_idx` indexes the match-record array; `field_idx` is 1-indexed in
/// the AWK convention. Offsets are relative to the line start.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct FieldRecord {
    pub line_idx: u32,
    pub field_idx: u32,
    pub start_offset: u32,
    pub end_offset: u32,
}

impl FieldRecord {
    /// The field bytes, resolved against the owning match record.
    pub fn text<'a>(&self, input: &'a [u8], line: &MatchRecord) -> &'a [u8] {
        let start = (line.line_start + self.start_offset) as usize;
        let end = (line.line_start + self.end_offset) as usize;
        &input[start..end]
    }
}

/// One replacement site produced by the substitution engine.
///
/// `position` is absolute in the input buffer; `match_len` may differ per
/// match for regex patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstRecord {
    pub position: u32,
    pub match_len: u32,
    pub line_num: u32,
}
