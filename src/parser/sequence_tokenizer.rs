use std::iter::FusedIterator;

use clap::ValueEnum;
use memchr::{memchr, memchr2};
use serde::{Deserialize, Serialize};

use crate::parser::sequence_token::SequenceToken;

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// What to do with an ESC whose CSI or OSC never terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnterminatedPolicy {
    /// Consume the ESC without emitting anything and resume right after it.
    #[default]
    Drop,
    /// Emit the ESC as `Unknown` and resume right after it. Keeps scans lossless.
    PreserveAsUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOptions {
    pub unterminated: UnterminatedPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Introducer {
    Csi, // ESC [
    Osc, // ESC ]
}

impl std::fmt::Display for Introducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Introducer::Csi => write!(f, "CSI"),
            Introducer::Osc => write!(f, "OSC"),
        }
    }
}

/// An escape whose introducer was found but whose terminator never was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnterminatedSequence {
    /// Character index of the ESC in the input.
    pub position: usize,
    pub introducer: Introducer,
}

/// Lazy tokenizer over a whole input. Yields tokens as they are recognized;
/// single pass, cannot be restarted.
pub struct SequenceTokenizer<'a> {
    input: &'a str,
    // Byte offset into `input`, always on a char boundary
    cursor: usize,
    // Same position counted in chars
    char_pos: usize,
    options: ScanOptions,
    unterminated: Vec<UnterminatedSequence>,
    // Earliest byte from which a CSI final byte / OSC terminator search has
    // failed. No later search can succeed either.
    csi_unterminated_from: Option<usize>,
    osc_unterminated_from: Option<usize>,
}

impl<'a> SequenceTokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ScanOptions::default())
    }

    pub fn with_options(input: &'a str, options: ScanOptions) -> Self {
        Self {
            input,
            cursor: 0,
            char_pos: 0,
            options,
            unterminated: Vec::new(),
            csi_unterminated_from: None,
            osc_unterminated_from: None,
        }
    }

    /// Unterminated CSI/OSC sequences seen so far, in input order.
    pub fn unterminated(&self) -> &[UnterminatedSequence] {
        &self.unterminated
    }

    pub fn into_unterminated(self) -> Vec<UnterminatedSequence> {
        self.unterminated
    }

    fn advance_to(&mut self, end: usize) {
        self.char_pos += self.input[self.cursor..end].chars().count();
        self.cursor = end;
    }

    /// Cut `input[cursor..end]` into a token and move past it
    fn take(&mut self, end: usize, make: fn(String) -> SequenceToken) -> SequenceToken {
        let text = self.input[self.cursor..end].to_string();
        self.advance_to(end);
        make(text)
    }

    /// Classify the escape sitting at the cursor. `None` means the ESC was
    /// consumed without producing a token.
    fn parse_escape_sequence(&mut self) -> Option<SequenceToken> {
        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.cursor;

        let token = match bytes.get(start + 1) {
            Some(b'[') => {
                let end = cached_search(&mut self.csi_unterminated_from, start + 2, |from| {
                    find_csi_end(bytes, from)
                });
                match end {
                    Some(end) => self.take(end, SequenceToken::Csi),
                    None => return self.unterminated_fallback(Introducer::Csi),
                }
            }
            Some(b']') => {
                let end = cached_search(&mut self.osc_unterminated_from, start + 2, |from| {
                    find_osc_end(bytes, from)
                });
                match end {
                    Some(end) => self.take(end, SequenceToken::Osc),
                    None => return self.unterminated_fallback(Introducer::Osc),
                }
            }
            Some(b'(' | b')') => match input[start + 2..].chars().next() {
                Some(designator) => {
                    self.take(start + 2 + designator.len_utf8(), SequenceToken::Charset)
                }
                None => self.take(start + 2, SequenceToken::Unknown),
            },
            Some(b'=' | b'>') => self.take(start + 2, SequenceToken::Keypad),
            _ => self.take(start + 1, SequenceToken::Unknown),
        };
        Some(token)
    }

    fn unterminated_fallback(&mut self, introducer: Introducer) -> Option<SequenceToken> {
        debug!(
            "Unterminated {introducer} sequence at char {}, resuming after ESC",
            self.char_pos
        );
        self.unterminated.push(UnterminatedSequence {
            position: self.char_pos,
            introducer,
        });

        match self.options.unterminated {
            UnterminatedPolicy::Drop => {
                self.advance_to(self.cursor + 1);
                None
            }
            UnterminatedPolicy::PreserveAsUnknown => {
                Some(self.take(self.cursor + 1, SequenceToken::Unknown))
            }
        }
    }
}

impl Iterator for SequenceTokenizer<'_> {
    type Item = SequenceToken;

    fn next(&mut self) -> Option<SequenceToken> {
        let input = self.input;
        loop {
            let rest = &input[self.cursor..];
            if rest.is_empty() {
                return None;
            }

            match memchr(ESC, rest.as_bytes()) {
                None => return Some(self.take(input.len(), SequenceToken::Literal)),
                Some(0) => {
                    if let Some(token) = self.parse_escape_sequence() {
                        return Some(token);
                    }
                }
                Some(offset) => {
                    return Some(self.take(self.cursor + offset, SequenceToken::Literal));
                }
            }
        }
    }
}

impl FusedIterator for SequenceTokenizer<'_> {}

/// Run `search` from `from` unless a search from `failed_from` or earlier has
/// already come up empty. Keeps runs of unterminated introducers linear.
fn cached_search(
    failed_from: &mut Option<usize>,
    from: usize,
    search: impl FnOnce(usize) -> Option<usize>,
) -> Option<usize> {
    if failed_from.is_some_and(|failed| from >= failed) {
        return None;
    }
    let end = search(from);
    if end.is_none() {
        *failed_from = Some(from);
    }
    end
}

/// End (exclusive) of a CSI whose parameters start at `from`: one past the
/// first byte in 0x40..=0x7E.
fn find_csi_end(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|b| (0x40..=0x7e).contains(b))
        .map(|i| from + i + 1)
}

/// End (exclusive) of an OSC whose payload starts at `from`: one past BEL, or
/// past ESC `\`. An ESC not followed by `\` is payload.
fn find_osc_end(bytes: &[u8], mut from: usize) -> Option<usize> {
    while let Some(i) = memchr2(BEL, ESC, &bytes[from..]) {
        let at = from + i;
        if bytes[at] == BEL {
            return Some(at + 1);
        }
        if bytes.get(at + 1) == Some(&b'\\') {
            return Some(at + 2);
        }
        from = at + 1;
    }
    None
}
