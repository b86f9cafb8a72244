//! Regex compiler and executor.
//!
//! The compiler lowers an ERE-subset pattern into a flat NFA program
//! ([`Program`]) interpreted identically by the CPU executor and the GPU
//! kernel. See [`compiler`] for the dialect and [`exec`] for the match
//! semantics.

pub mod compiler;
pub mod exec;
pub mod program;

pub use compiler::{compile, is_regex_pattern};
pub use exec::{find, is_match};
pub use program::{ClassMask, Program, State, StateKind, CLASS_WORDS, NO_STATE};
