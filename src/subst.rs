//! Whole-buffer substitution.
//!
//! Matching runs over the entire input rather than per line. The output
//! buffer is allocated at its exact final size and filled by a single
//! gather pass; replacement bytes are literal, with no back-reference
//! expansion.

use crate::engine::Matcher;
use crate::error::Result;
use crate::record::SubstRecord;

/// A substitution outcome: the rewritten buffer plus one record per
/// replacement site.
#[derive(Debug, Clone)]
pub struct Substitution {
    pub output: Vec<u8>,
    pub records: Vec<SubstRecord>,
}

/// Replace matches of `matcher` in `input` with `replacement`.
///
/// With `global` set, every non-overlapping match is replaced; otherwise
/// only the first. Zero-width matches advance by one byte so the scan
/// always terminates.
pub fn substitute(
    input: &[u8],
    matcher: &Matcher,
    replacement: &[u8],
    global: bool,
) -> Result<Substitution> {
    let records = collect_matches(input, matcher, global);

    let removed: usize = records.iter().map(|r| r.match_len as usize).sum();
    let added = replacement.len() * records.len();
    let mut output = Vec::with_capacity(input.len() - removed + added);

    let mut src = 0;
    for record in &records {
        let pos = record.position as usize;
        output.extend_from_slice(&input[src..pos]);
        output.extend_from_slice(replacement);
        src = pos + record.match_len as usize;
    }
    output.extend_from_slice(&input[src..]);

    Ok(Substitution { output, records })
}

/// Non-overlapping matches over the whole buffer, in ascending position.
fn collect_matches(input: &[u8], matcher: &Matcher, global: bool) -> Vec<SubstRecord> {
    let mut records = Vec::new();
    let mut pos = 0;
    let mut line_num: u32 = 0;
    let mut line_scan = 0;

    while pos <= input.len() {
        let Some((start, end)) = matcher.find_at(input, pos) else {
            break;
        };

        // Line numbers advance with the newlines crossed since the last
        // match.
        while line_scan < start {
            if input[line_scan] == b'\n' {
                line_num += 1;
            }
            line_scan += 1;
        }

        records.push(SubstRecord {
            position: start as u32,
            match_len: (end - start) as u32,
            line_num,
        });

        if !global {
            break;
        }
        // Skip past the match; a zero-width match advances one byte.
        pos = end.max(start + 1);
    }

    records
}
