//! Splits terminal output into literal text and escape sequences.
//!
//! The scan is total: every input, however malformed, produces a token list.
//! Sequences are recognized, never interpreted.

pub mod sequence_token;
pub mod sequence_tokenizer;

use serde::Serialize;

pub use sequence_token::SequenceToken;
pub use sequence_tokenizer::{
    Introducer, ScanOptions, SequenceTokenizer, UnterminatedPolicy, UnterminatedSequence,
};

/// Result of an eager scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutput {
    pub tokens: Vec<SequenceToken>,
    pub unterminated: Vec<UnterminatedSequence>,
}

impl ScanOutput {
    /// Concatenation of every token payload, in order.
    pub fn reconstruct(&self) -> String {
        self.tokens.iter().map(SequenceToken::as_str).collect()
    }
}

/// Scan with the default options (unterminated CSI/OSC escapes are dropped).
pub fn scan(input: &str) -> Vec<SequenceToken> {
    SequenceTokenizer::new(input).collect()
}

pub fn scan_with(input: &str, options: ScanOptions) -> ScanOutput {
    let mut tokenizer = SequenceTokenizer::with_options(input, options);
    let tokens: Vec<_> = tokenizer.by_ref().collect();
    let unterminated = tokenizer.into_unterminated();
    if !unterminated.is_empty() {
        debug!(
            "Scanned {} tokens, {} unterminated sequences",
            tokens.len(),
            unterminated.len()
        );
    }
    ScanOutput {
        tokens,
        unterminated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_matches_tokenizer() {
        let input = "cd /tmp\x1b[0mls -la\n\x1b]0;title\x07pwd";
        assert_eq!(scan(input), SequenceTokenizer::new(input).collect::<Vec<_>>());
        assert_eq!(scan(input).len(), 5);
    }

    #[test]
    fn reconstruct_is_lossless_without_unterminated() {
        let input = "\x1b(B\x1b[1;32mok\x1b[m \x1b=\x1b]2;t\x1b\\";
        let out = scan_with(input, ScanOptions::default());
        assert!(out.unterminated.is_empty());
        assert_eq!(out.reconstruct(), input);
    }

    #[test]
    fn reconstruct_loses_dropped_escape() {
        let out = scan_with("a\x1b[1", ScanOptions::default());
        assert_eq!(out.reconstruct(), "a[1");
        assert_eq!(out.unterminated.len(), 1);
        assert_eq!(out.unterminated[0].position, 1);
    }

    #[test]
    fn preserve_policy_is_lossless() {
        let options = ScanOptions {
            unterminated: UnterminatedPolicy::PreserveAsUnknown,
        };
        let out = scan_with("a\x1b[1", options);
        assert_eq!(out.reconstruct(), "a\x1b[1");
        assert_eq!(out.unterminated.len(), 1);
    }

    #[test]
    fn output_serializes_as_tagged_tokens() {
        let out = scan_with("x\x1b=", ScanOptions::default());
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"tokens":[{"kind":"literal","text":"x"},{"kind":"keypad","text":"\u001b="}],"unterminated":[]}"#
        );
    }
}
