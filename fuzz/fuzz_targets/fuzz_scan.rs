#![no_main]

use libfuzzer_sys::fuzz_target;

use grawk::{run_scan, BackendChoice, Options};

// Drive the full dispatch path over arbitrary buffers and check the record
// invariants the engine promises.
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.first().map(|&b| b as usize) else {
        return;
    };
    let rest = &data[1..];
    if split > rest.len() {
        return;
    }
    let (pattern, input) = rest.split_at(split);

    let options = Options::new().extract_fields(true);
    let Ok(result) = run_scan(input, pattern, &options, BackendChoice::Cpu) else {
        return;
    };

    let mut last_line = None;
    for m in &result.matches {
        assert!(m.match_start <= m.match_end);
        assert!(m.line_start + m.match_end <= m.line_end);
        assert!(m.line_end as usize <= input.len());
        if let Some(last) = last_line {
            assert!(m.line_num > last);
        }
        last_line = Some(m.line_num);
    }

    for f in &result.fields {
        let line = &result.matches[f.line_idx as usize];
        assert!(f.start_offset <= f.end_offset);
        assert!(line.line_start + f.end_offset <= line.line_end);
    }
});
