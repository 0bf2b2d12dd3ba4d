//! Recognize terminal escape sequences (CSI, OSC, charset and keypad
//! escapes) in a character stream, plus the tooling around it: ANSI
//! stripping and a pseudo-terminal session to capture real shell output.

#[macro_use]
extern crate log;

pub mod app;
pub mod config;
pub mod logging;
pub mod parser;
pub mod session;
pub mod strip;
pub mod utils;

pub use parser::{
    ScanOptions, ScanOutput, SequenceToken, SequenceTokenizer, UnterminatedPolicy, scan,
    scan_with,
};
pub use strip::strip_ansi;
