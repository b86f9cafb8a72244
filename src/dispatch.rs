//! Backend classification and selection.
//!
//! The backend set is closed: literal-CPU, regex-CPU, GPU-literal,
//! GPU-regex. Selection honours an explicit caller request when the
//! backend is available; `auto` keeps small inputs on the CPU. Every GPU
//! failure except an oversized explicit dispatch falls back silently to
//! the equivalent CPU path.

use crate::engine::{self, Matcher, ScanResult};
use crate::error::{Error, Result};
use crate::literal::LiteralMatcher;
use crate::options::{Options, MAX_GPU_BUFFER_SIZE, MIN_GPU_SIZE};
use crate::regex;
use crate::subst::{self, Substitution};

/// Caller's backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

/// The path a dispatch resolves to before any runtime fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    LiteralCpu,
    RegexCpu,
    GpuLiteral,
    GpuRegex,
}

/// Classify the pattern and compile it.
///
/// Patterns without metacharacters search literally; a pattern that looks
/// like a regex but fails to compile downgrades to a literal search over
/// the raw bytes. Length-limit violations propagate, since the literal
/// matcher shares the limit.
pub fn prepare_matcher(pattern: &[u8], options: &Options) -> Result<Matcher> {
    if pattern.is_empty() {
        return Ok(Matcher::Empty);
    }
    if regex::is_regex_pattern(pattern) {
        match regex::compile(pattern, options.case_insensitive) {
            Ok(program) => return Ok(Matcher::Regex(program)),
            Err(err @ Error::PatternTooLong { .. }) => return Err(err),
            Err(_) => {}
        }
    }
    Ok(Matcher::Literal(LiteralMatcher::new(
        pattern,
        options.case_insensitive,
    )?))
}

/// The backend a given workload resolves to.
pub fn classify(pattern: &[u8], input_len: usize, choice: BackendChoice) -> Backend {
    let regex = !pattern.is_empty() && regex::is_regex_pattern(pattern);
    let gpu = match choice {
        BackendChoice::Cpu => false,
        BackendChoice::Gpu => true,
        BackendChoice::Auto => {
            cfg!(feature = "gpu") && input_len >= MIN_GPU_SIZE && input_len <= MAX_GPU_BUFFER_SIZE
        }
    };
    match (regex, gpu) {
        (false, false) => Backend::LiteralCpu,
        (true, false) => Backend::RegexCpu,
        (false, true) => Backend::GpuLiteral,
        (true, true) => Backend::GpuRegex,
    }
}

/// Run a line scan on the selected backend.
pub fn run_scan(
    input: &[u8],
    pattern: &[u8],
    options: &Options,
    choice: BackendChoice,
) -> Result<ScanResult> {
    let matcher = prepare_matcher(pattern, options)?;

    let want_gpu = match choice {
        BackendChoice::Cpu => false,
        BackendChoice::Gpu => {
            if input.len() > MAX_GPU_BUFFER_SIZE {
                return Err(Error::InputTooLarge {
                    size: input.len(),
                    limit: MAX_GPU_BUFFER_SIZE,
                });
            }
            true
        }
        BackendChoice::Auto => input.len() >= MIN_GPU_SIZE && input.len() <= MAX_GPU_BUFFER_SIZE,
    };

    #[cfg(feature = "gpu")]
    if want_gpu
        && let Ok(result) = crate::gpu::scan(input, &matcher, options)
    {
        return Ok(result);
    }
    #[cfg(not(feature = "gpu"))]
    let _ = want_gpu;

    engine::scan(input, &matcher, options)
}

/// Run a substitution. Substitution always executes on the CPU; the GPU
/// kernel only reproduces the line scan.
pub fn run_substitution(
    input: &[u8],
    pattern: &[u8],
    replacement: &[u8],
    options: &Options,
) -> Result<Substitution> {
    let matcher = prepare_matcher(pattern, options)?;
    subst::substitute(input, &matcher, replacement, options.global_substitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_literal() {
        let matcher = prepare_matcher(b"plain", &Options::new()).unwrap();
        assert!(matches!(matcher, Matcher::Literal(_)));
    }

    #[test]
    fn test_prepare_regex() {
        let matcher = prepare_matcher(b"[0-9]+", &Options::new()).unwrap();
        assert!(matches!(matcher, Matcher::Regex(_)));
    }

    #[test]
    fn test_prepare_empty() {
        let matcher = prepare_matcher(b"", &Options::new()).unwrap();
        assert!(matches!(matcher, Matcher::Empty));
    }

    #[test]
    fn test_bad_regex_falls_back_to_literal() {
        // "a(b" fails to compile; the raw bytes search literally.
        let matcher = prepare_matcher(b"a(b", &Options::new()).unwrap();
        match matcher {
            Matcher::Literal(literal) => assert_eq!(literal.pattern(), b"a(b"),
            other => panic!("expected literal fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(b"abc", 10, BackendChoice::Cpu), Backend::LiteralCpu);
        assert_eq!(classify(b"a+", 10, BackendChoice::Cpu), Backend::RegexCpu);
        assert_eq!(classify(b"abc", 10, BackendChoice::Gpu), Backend::GpuLiteral);
        assert_eq!(classify(b"a+", 10, BackendChoice::Gpu), Backend::GpuRegex);
        // Small inputs stay on the CPU in auto mode.
        assert_eq!(classify(b"abc", 10, BackendChoice::Auto), Backend::LiteralCpu);
    }

    #[test]
    fn test_scan_cpu() {
        let input = b"one\ntwo\nthree\n";
        let result = run_scan(input, b"t", &Options::new(), BackendChoice::Cpu).unwrap();
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn test_explicit_gpu_oversized_input_errors() {
        // The size check precedes any device work, so this holds with or
        // without a GPU present.
        let input = vec![b'\n'; MAX_GPU_BUFFER_SIZE + 1];
        let err = run_scan(&input, b"x", &Options::new(), BackendChoice::Gpu).unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { .. }));
    }

    #[test]
    fn test_explicit_gpu_small_input_falls_back_without_device() {
        // An unavailable GPU downgrades silently to the CPU path.
        let result = run_scan(b"a\nb\n", b"a", &Options::new(), BackendChoice::Gpu).unwrap();
        assert_eq!(result.matches.len(), 1);
    }

    #[test]
    fn test_substitution_runs_on_cpu() {
        let result = run_substitution(b"a1b22c", b"[0-9]+", b"-", &Options::new().global_substitution(true)).unwrap();
        assert_eq!(result.output, b"a-b-c");
    }
}
