use serde::Serialize;

/// One classified run of the input. Concatenating the payloads of a scan in
/// order gives back the input, minus escapes dropped for unterminated CSI/OSC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum SequenceToken {
    Literal(String), // Text without ESC
    Csi(String),     // ESC [ ... final
    Osc(String),     // ESC ] ... BEL | ESC \
    Charset(String), // ESC ( X | ESC ) X
    Keypad(String),  // ESC = | ESC >
    Unknown(String), // Lone ESC, or ESC ( / ESC ) cut off at end of input
}

impl SequenceToken {
    pub fn as_str(&self) -> &str {
        match self {
            SequenceToken::Literal(s)
            | SequenceToken::Csi(s)
            | SequenceToken::Osc(s)
            | SequenceToken::Charset(s)
            | SequenceToken::Keypad(s)
            | SequenceToken::Unknown(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            SequenceToken::Literal(s)
            | SequenceToken::Csi(s)
            | SequenceToken::Osc(s)
            | SequenceToken::Charset(s)
            | SequenceToken::Keypad(s)
            | SequenceToken::Unknown(s) => s,
        }
    }

    /// Tag name, matches the `kind` field of the JSON form.
    pub fn kind(&self) -> &'static str {
        match self {
            SequenceToken::Literal(_) => "literal",
            SequenceToken::Csi(_) => "csi",
            SequenceToken::Osc(_) => "osc",
            SequenceToken::Charset(_) => "charset",
            SequenceToken::Keypad(_) => "keypad",
            SequenceToken::Unknown(_) => "unknown",
        }
    }

    pub fn is_escape(&self) -> bool {
        !matches!(self, SequenceToken::Literal(_))
    }

    /// Length of the payload in characters.
    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_json_tag() {
        let token = SequenceToken::Csi("\x1b[31m".to_string());
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["kind"], token.kind());
        assert_eq!(json["text"], "\x1b[31m");
    }

    #[test]
    fn literal_is_not_escape() {
        assert!(!SequenceToken::Literal("abc".into()).is_escape());
        assert!(SequenceToken::Unknown("\x1b".into()).is_escape());
    }

    #[test]
    fn char_len_counts_characters() {
        assert_eq!(SequenceToken::Charset("\x1b(é".into()).char_len(), 3);
        assert_eq!(SequenceToken::Charset("\x1b(é".into()).as_str().len(), 4);
    }
}
