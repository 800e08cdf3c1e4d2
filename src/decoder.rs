use std::borrow::Cow;
use std::path::Path;

use crate::program::Program;
use crate::token::{Opcode, Selector};

/// File extension that marks a source file as written in the hex dialect.
pub const HEX_EXTENSION: &str = "hmm";

/// Two-character command for each hex digit, indexed by the digit's value.
const HEX_COMMANDS: [&str; 16] = [
    ">A", ">B", "<A", "<B", "+A", "+B", "-A", "-B", ".A", ".B", ",A", ",B", "[A", "[B", "]A", "]B",
];

const HEX_DIGITS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// How raw source text is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Two-character commands written literally.
    #[default]
    Plain,
    /// One lowercase hex digit per command.
    Hex,
}

impl Dialect {
    /// Picks the dialect from a file name: `.hmm` files are hex, everything
    /// else is plain.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension() {
            Some(ext) if ext == HEX_EXTENSION => Dialect::Hex,
            _ => Dialect::Plain,
        }
    }

    pub fn is_hex(self) -> bool {
        self == Dialect::Hex
    }
}

/// Expand the hex dialect into plain MindMeld text.
///
/// Every `0`-`9`/`a`-`f` is replaced by its command from the fixed table;
/// all other characters pass through untouched. Replacements are never
/// rescanned. With `hex` off the input is returned as-is.
pub fn decode(text: &str, hex: bool) -> Cow<'_, str> {
    if !hex {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        match hex_value(ch) {
            Some(v) => out.push_str(HEX_COMMANDS[v]),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn hex_value(ch: char) -> Option<usize> {
    match ch {
        '0'..='9' => Some(ch as usize - '0' as usize),
        'a'..='f' => Some(ch as usize - 'a' as usize + 10),
        _ => None,
    }
}

/// Render a program in the hex dialect, one digit per token.
pub fn encode_hex(program: &Program) -> String {
    program
        .tokens()
        .iter()
        .map(|token| {
            let pair = match token.opcode {
                Opcode::Right => 0,
                Opcode::Left => 1,
                Opcode::Inc => 2,
                Opcode::Dec => 3,
                Opcode::Output => 4,
                Opcode::Input => 5,
                Opcode::Open => 6,
                Opcode::Close => 7,
            };
            HEX_DIGITS[pair * 2 + usize::from(token.selector == Selector::B)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_is_identity() {
        let text = "0123 +A hello ]B";
        let decoded = decode(text, false);
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_all_digits_in_order() {
        assert_eq!(
            decode("0123456789abcdef", true),
            ">A>B<A<B+A+B-A-B.A.B,A,B[A[B]A]B"
        );
    }

    #[test]
    fn test_non_digits_pass_through() {
        // Uppercase letters are not hex digits here, so they survive verbatim.
        assert_eq!(decode("4 x\nF5", true), "+A x\nF+B");
    }

    #[test]
    fn test_replacement_not_rescanned() {
        // Each digit expands on its own; output text is never decoded again.
        assert_eq!(decode("bbb", true), ",B,B,B");
    }

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path("prog.hmm"), Dialect::Hex);
        assert_eq!(Dialect::from_path("dir/prog.mm"), Dialect::Plain);
        assert_eq!(Dialect::from_path("prog.hmm.txt"), Dialect::Plain);
        assert_eq!(Dialect::from_path("prog"), Dialect::Plain);
    }

    #[test]
    fn test_encode_hex_inverts_decode() {
        let program = Program::from_source("+A+A[A-A>B.B<B]B,A", Dialect::Plain).unwrap();
        let hex = encode_hex(&program);
        assert_eq!(hex, "44c6193fa");
        let again = Program::from_source(&hex, Dialect::Hex).unwrap();
        assert_eq!(again, program);
    }

    #[test]
    fn test_encode_every_command_matches_table() {
        let program = Program::from_source("0123456789abcdef", Dialect::Hex).unwrap();
        assert_eq!(program.to_string(), HEX_COMMANDS.concat());
        assert_eq!(encode_hex(&program), "0123456789abcdef");
    }

    #[test]
    fn test_encode_empty() {
        let program = Program::from_source("", Dialect::Plain).unwrap();
        assert_eq!(encode_hex(&program), "");
    }
}
