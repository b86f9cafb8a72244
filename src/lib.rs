//! grawk - an AWK-style line matching and field extraction engine
//!
//! This crate scans a byte buffer line by line, tests each line against a
//! literal or regex pattern, optionally splits matching lines into fields,
//! and can rewrite the buffer through substitution. Matching runs on a
//! CPU path or, behind the `gpu` feature, on a compute kernel that
//! interprets the same compiled program; results are offset records into
//! the caller's buffer, never copies.
//!
//! # Example
//!
//! ```
//! use grawk::{run_scan, BackendChoice, Options};
//!
//! let input = b"hello world\nerror occurred\nall is well\n";
//! let result = run_scan(input, b"error", &Options::new(), BackendChoice::Cpu).unwrap();
//!
//! assert_eq!(result.matches.len(), 1);
//! assert_eq!(result.matches[0].line_num, 1);
//! assert_eq!(result.matches[0].matched(input), b"error");
//! ```
//!
//! # Field Extraction Example
//!
//! ```
//! use grawk::{run_scan, BackendChoice, Options};
//!
//! let input = b"root:x:0:0\nbin:x:1:1\n";
//! let options = Options::new()
//!     .extract_fields(true)
//!     .field_separator(&b":"[..]);
//! let result = run_scan(input, b"", &options, BackendChoice::Cpu).unwrap();
//!
//! assert_eq!(result.matches.len(), 2);
//! assert_eq!(result.fields.len(), 8);
//! let first = &result.fields[0];
//! assert_eq!(first.text(input, &result.matches[0]), b"root");
//! ```
//!
//! # Substitution Example
//!
//! ```
//! use grawk::{run_substitution, Options};
//!
//! let options = Options::new().global_substitution(true);
//! let result = run_substitution(b"hello world world", b"world", b"universe", &options).unwrap();
//!
//! assert_eq!(result.output, b"hello universe universe");
//! assert_eq!(result.records.len(), 2);
//! ```

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fields;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod literal;
pub mod options;
pub mod record;
pub mod regex;
pub mod simd;
pub mod subst;

pub use dispatch::{classify, prepare_matcher, run_scan, run_substitution, Backend, BackendChoice};
pub use engine::{scan, scan_bounded, Matcher, ScanResult};
pub use error::{Error, Result};
pub use fields::FieldSep;
pub use literal::LiteralMatcher;
pub use options::Options;
pub use record::{FieldRecord, MatchRecord, SubstRecord};
pub use regex::{compile, is_regex_pattern, Program};
pub use subst::{substitute, Substitution};
