//! CLI integration tests for grawk
//!
//! These tests run the grawk binary and verify command-line behavior.

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Run grawk with the given arguments and input, returning stdout
fn run_grawk(args: &[&str], input: Option<&str>) -> Result<String, String> {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--quiet", "--"]);
    cmd.args(args);

    if input.is_some() {
        cmd.stdin(std::process::Stdio::piped());
    }
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| e.to_string())?;

    if let Some(input_str) = input
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin
            .write_all(input_str.as_bytes())
            .map_err(|e| e.to_string())?;
    }

    let output = child.wait_with_output().map_err(|e| e.to_string())?;

    if output.status.success() {
        String::from_utf8(output.stdout).map_err(|e| e.to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

#[test]
fn test_cli_help() {
    let output = run_grawk(&["--help"], None).unwrap();
    assert!(output.contains("Usage:"));
    assert!(output.contains("grawk"));
}

#[test]
fn test_cli_version() {
    let output = run_grawk(&["--version"], None).unwrap();
    assert!(output.contains("grawk"));
}

#[test]
fn test_cli_match_lines() {
    let output = run_grawk(&["error"], Some("ok\nerror here\nfine\n")).unwrap();
    assert_eq!(output, "error here\n");
}

#[test]
fn test_cli_no_match_is_success() {
    let output = run_grawk(&["missing"], Some("a\nb\n")).unwrap();
    assert_eq!(output, "");
}

#[test]
fn test_cli_invert() {
    let output = run_grawk(&["-v", "bad"], Some("good\nbad\nfine\n")).unwrap();
    assert_eq!(output, "good\nfine\n");
}

#[test]
fn test_cli_case_insensitive() {
    let output = run_grawk(&["-i", "error"], Some("ERROR one\nok\nError two\n")).unwrap();
    assert_eq!(output, "ERROR one\nError two\n");
}

#[test]
fn test_cli_line_numbers() {
    let output = run_grawk(&["-n", "b"], Some("a\nb\nc\nb\n")).unwrap();
    assert_eq!(output, "2:b\n4:b\n");
}

#[test]
fn test_cli_regex() {
    let output = run_grawk(&["[0-9]+"], Some("one\ntwo2\nthree\n4four\n")).unwrap();
    assert_eq!(output, "two2\n4four\n");
}

#[test]
fn test_cli_fields() {
    let output = run_grawk(&["-F:", "-f", "1,3", ""], Some("root:x:0:0\nbin:x:1:1\n")).unwrap();
    assert_eq!(output, "root 0\nbin 1\n");
}

#[test]
fn test_cli_fields_output_separator() {
    let output = run_grawk(&["-F:", "-O", "-", "-f", "1,2", ""], Some("a:b:c\n")).unwrap();
    assert_eq!(output, "a-b\n");
}

#[test]
fn test_cli_whitespace_fields() {
    let output = run_grawk(&["-f", "2", ""], Some("  one   two three \n")).unwrap();
    assert_eq!(output, "two\n");
}

#[test]
fn test_cli_substitution() {
    let output = run_grawk(&["-s", "universe", "-g", "world"], Some("hello world world")).unwrap();
    assert_eq!(output, "hello universe universe");
}

#[test]
fn test_cli_substitution_first_only() {
    let output = run_grawk(&["-s", "X", "a"], Some("aaa")).unwrap();
    assert_eq!(output, "Xaa");
}

#[test]
fn test_cli_file_input() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "alpha").unwrap();
    writeln!(file, "beta").unwrap();
    writeln!(file, "gamma").unwrap();

    let output = run_grawk(&["a$", file.path().to_str().unwrap()], None).unwrap();
    assert_eq!(output, "alpha\nbeta\ngamma\n");

    let output = run_grawk(&["^b", file.path().to_str().unwrap()], None).unwrap();
    assert_eq!(output, "beta\n");
}

#[test]
fn test_cli_backend_cpu() {
    let output = run_grawk(&["--backend", "cpu", "x"], Some("x\ny\n")).unwrap();
    assert_eq!(output, "x\n");
}

#[test]
fn test_cli_unknown_option() {
    let err = run_grawk(&["--bogus", "x"], None).unwrap_err();
    assert!(err.contains("unknown option"));
}

#[test]
fn test_cli_missing_pattern() {
    let err = run_grawk(&[], None).unwrap_err();
    assert!(err.contains("no pattern"));
}

#[test]
fn test_cli_bad_field_list() {
    let err = run_grawk(&["-f", "0", "x"], None).unwrap_err();
    assert!(err.contains("1-indexed"));
}
