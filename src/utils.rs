use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::parser::{SequenceToken, UnterminatedSequence};

/// One line per token: tag, display width for literals, escaped payload.
pub fn describe_token(token: &SequenceToken) -> String {
    let width = match token {
        SequenceToken::Literal(text) => format!("{:>4}", text.width()),
        _ => "    ".to_string(),
    };
    format!(
        "{:<8}{width}  \"{}\"",
        token.kind(),
        escape_for_display(token.as_str())
    )
}

pub fn describe_unterminated(fragment: &UnterminatedSequence) -> String {
    format!(
        "unterminated {} sequence at char {}",
        fragment.introducer, fragment.position
    )
}

/// Render control characters as visible escapes so a payload can be printed
/// on one line without the terminal acting on it.
pub fn escape_for_display(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for ch in data.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c < ' ' || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

// Unix-like systems only
pub fn current_dir_of_process(pid: u32) -> Option<String> {
    #[cfg(unix)]
    {
        let cwd_link = format!("/proc/{pid}/cwd");
        std::fs::read_link(cwd_link)
            .ok()
            .map(|path| path.to_string_lossy().into_owned())
    }

    #[cfg(not(unix))]
    {
        warn!("current_dir_of_process is only implemented for Unix-like systems");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_controls() {
        assert_eq!(
            escape_for_display("a\x1b[0m\r\n\t\"\\\x7f"),
            "a\\x1b[0m\\r\\n\\t\\\"\\\\\\x7f"
        );
    }

    #[test]
    fn describes_literal_with_display_width() {
        let token = SequenceToken::Literal("日本".to_string());
        assert_eq!(describe_token(&token), "literal    4  \"日本\"");
    }

    #[test]
    fn describes_escape_without_width() {
        let token = SequenceToken::Csi("\x1b[31m".to_string());
        assert_eq!(describe_token(&token), "csi           \"\\x1b[31m\"");
    }

    #[test]
    fn describes_unterminated() {
        let fragment = UnterminatedSequence {
            position: 3,
            introducer: crate::parser::Introducer::Osc,
        };
        assert_eq!(
            describe_unterminated(&fragment),
            "unterminated OSC sequence at char 3"
        );
    }

    #[test]
    fn keeps_printable_unicode() {
        assert_eq!(escape_for_display("héllo ✓"), "héllo ✓");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_dir_of_self() {
        let expected = std::env::current_dir().unwrap();
        let found = current_dir_of_process(std::process::id()).unwrap();
        assert_eq!(found, expected.to_string_lossy());
    }
}
