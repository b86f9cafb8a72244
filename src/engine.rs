//! The per-line pipeline: delimit lines, test the pattern, split fields,
//! collect records.

use crate::error::Result;
use crate::fields::{self, FieldSep};
use crate::literal::LiteralMatcher;
use crate::options::Options;
use crate::record::{FieldRecord, MatchRecord};
use crate::regex::{self, Program};
use crate::simd;

/// A prepared pattern: the closed set of matchers the engine drives.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// The empty pattern selects every line.
    Empty,
    Literal(LiteralMatcher),
    Regex(Program),
}

impl Matcher {
    /// Leftmost match of the pattern within `line`, or `None`.
    pub fn find(&self, line: &[u8]) -> Option<(usize, usize)> {
        match self {
            Matcher::Empty => Some((0, 0)),
            Matcher::Literal(literal) => literal
                .find(line)
                .map(|start| (start, start + literal.pattern().len())),
            Matcher::Regex(program) => regex::find(program, line, 0),
        }
    }

    pub fn is_match(&self, line: &[u8]) -> bool {
        self.find(line).is_some()
    }

    /// Leftmost match at or after `from`, in absolute offsets. Used by the
    /// substitution engine, which scans whole buffers.
    pub fn find_at(&self, input: &[u8], from: usize) -> Option<(usize, usize)> {
        if from > input.len() {
            return None;
        }
        match self {
            Matcher::Empty => Some((from, from)),
            Matcher::Literal(literal) => literal
                .find(&input[from..])
                .map(|start| (from + start, from + start + literal.pattern().len())),
            Matcher::Regex(program) => regex::find(program, input, from),
        }
    }
}

/// Everything one scan produces. Records index into the caller's input
/// buffer, which must outlive them.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub matches: Vec<MatchRecord>,
    pub fields: Vec<FieldRecord>,
    /// True when a capacity bound dropped records.
    pub truncated: bool,
}

/// Scan `input` line by line, collecting a record per selected line and,
/// when `options.extract_fields` is set, the line's fields.
pub fn scan(input: &[u8], matcher: &Matcher, options: &Options) -> Result<ScanResult> {
    scan_bounded(input, matcher, options, usize::MAX, usize::MAX)
}

/// Capacity-bounded scan. Records past either bound are dropped, matching
/// the GPU contract's silent truncation; the reported counts are the array
/// lengths.
pub fn scan_bounded(
    input: &[u8],
    matcher: &Matcher,
    options: &Options,
    max_matches: usize,
    max_fields: usize,
) -> Result<ScanResult> {
    let sep = FieldSep::from_option(options.field_separator.as_deref())?;
    let mut result = ScanResult::default();

    let mut line_start = 0;
    let mut line_num: u32 = 0;

    // A trailing line without a newline is still a line; a trailing
    // newline does not open an empty final line.
    while line_start < input.len() {
        let line_end = simd::find_next_newline(input, line_start);
        let line = &input[line_start..line_end];

        let found = matcher.find(line);
        let selected = found.is_some() != options.invert_match;

        if selected {
            if result.matches.len() >= max_matches {
                result.truncated = true;
                break;
            }

            // Match offsets only apply to a positive, non-empty match.
            let (match_start, match_end) = match (&matcher, options.invert_match, found) {
                (Matcher::Empty, _, _) | (_, true, _) => (0, 0),
                (_, false, Some(span)) => span,
                (_, false, None) => (0, 0),
            };

            let line_idx = result.matches.len() as u32;
            let mut field_count = 0;
            if options.extract_fields {
                let before = result.fields.len();
                field_count = fields::split_line(line, line_idx, &sep, &mut result.fields);
                if result.fields.len() > max_fields {
                    result.fields.truncate(before);
                    result.truncated = true;
                    field_count = 0;
                }
            }

            let mut record = MatchRecord::new(
                line_start as u32,
                line_end as u32,
                match_start as u32,
                match_end as u32,
                line_num,
            );
            record.field_count = field_count;
            result.matches.push(record);
        }

        line_num += 1;
        line_start = line_end + 1;
    }

    Ok(result)
}
