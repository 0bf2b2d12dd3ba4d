const ESC: char = '\x1b';
const BEL: char = '\x07';
const BS: char = '\x08';

/// Remove escape sequences and control characters from terminal output,
/// leaving the text a user would read.
///
/// Unlike [`crate::parser::scan`], an unterminated CSI or OSC swallows the rest
/// of the input, and backspace erases the character before it.
pub fn strip_ansi(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;

    while cursor < chars.len() {
        match chars[cursor] {
            ESC => {
                cursor += 1;
                match chars.get(cursor) {
                    None => break,
                    Some('[') => {
                        cursor += 1;
                        while cursor < chars.len() && !('\x40'..='\x7e').contains(&chars[cursor]) {
                            cursor += 1;
                        }
                        // Final byte
                        cursor += 1;
                    }
                    Some(']') => {
                        cursor += 1;
                        while cursor < chars.len() {
                            if chars[cursor] == BEL {
                                cursor += 1;
                                break;
                            }
                            if chars[cursor] == ESC && chars.get(cursor + 1) == Some(&'\\') {
                                cursor += 2;
                                break;
                            }
                            cursor += 1;
                        }
                    }
                    Some('(' | ')') => cursor += 2,
                    Some(_) => cursor += 1,
                }
            }
            BS => {
                out.pop();
                cursor += 1;
            }
            ch if ch < ' ' && ch != '\n' && ch != '\t' => cursor += 1,
            ch => {
                out.push(ch);
                cursor += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_colors_and_titles() {
        let raw = "cd /tmp\x1b[0mls -la\n\x1b]0;title\x07pwd";
        assert_eq!(strip_ansi(raw), "cd /tmpls -la\npwd");
    }

    #[test]
    fn osc_with_string_terminator() {
        assert_eq!(strip_ansi("a\x1b]8;;url\x1b\\b"), "ab");
    }

    #[test]
    fn charset_and_keypad() {
        assert_eq!(strip_ansi("\x1b(Bx\x1b=y\x1b>"), "xy");
    }

    #[test]
    fn backspace_erases_previous_character() {
        assert_eq!(strip_ansi("abc\x08\x08d"), "ad");
        assert_eq!(strip_ansi("\x08a"), "a");
        assert_eq!(strip_ansi("é\x08"), "");
    }

    #[test]
    fn drops_control_characters_but_keeps_newline_and_tab() {
        assert_eq!(strip_ansi("a\r\n\tb\x07c"), "a\n\tbc");
    }

    #[test]
    fn unterminated_sequences_swallow_the_rest() {
        assert_eq!(strip_ansi("ok\x1b[12;"), "ok");
        assert_eq!(strip_ansi("ok\x1b]title"), "ok");
        assert_eq!(strip_ansi("ok\x1b"), "ok");
    }

    #[test]
    fn charset_at_end_of_input() {
        assert_eq!(strip_ansi("x\x1b("), "x");
    }
}
