#![no_main]

use libfuzzer_sys::fuzz_target;

// Split the data into a pattern and a haystack; compilation may reject the
// pattern, but neither compilation nor execution may panic, and any match
// must lie inside the haystack.
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.first().map(|&b| b as usize) else {
        return;
    };
    let rest = &data[1..];
    if split > rest.len() {
        return;
    }
    let (pattern, haystack) = rest.split_at(split);

    if let Ok(program) = grawk::compile(pattern, false)
        && let Some((start, end)) = grawk::regex::find(&program, haystack, 0)
    {
        assert!(start <= end);
        assert!(end <= haystack.len());
    }
});
