#![no_main]

use libfuzzer_sys::fuzz_target;

use grawk::{run_substitution, Options};

// Replacing every match of the pattern with the pattern itself must give
// back the original buffer, and the exact-size allocation must hold.
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.first().map(|&b| b as usize) else {
        return;
    };
    let rest = &data[1..];
    if split > rest.len() {
        return;
    }
    let (pattern, input) = rest.split_at(split);
    if pattern.is_empty() || grawk::is_regex_pattern(pattern) {
        // The identity round-trip only holds for literal self-replacement.
        return;
    }

    let options = Options::new().global_substitution(true);
    let Ok(result) = run_substitution(input, pattern, pattern, &options) else {
        return;
    };
    assert_eq!(result.output, input);
});
