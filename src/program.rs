use std::fmt;

use tracing::debug;

use crate::decoder::{decode, Dialect};
use crate::sanitizer::sanitize;
use crate::token::{Opcode, Selector, Token};

/// Reasons a command stream cannot be turned into a runnable program.
///
/// Offsets in the pairing errors are byte offsets into the sanitized
/// stream; bracket positions are token indices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("opcode '{opcode}' at offset {index} is not followed by a tape selector")]
    MissingSelector { index: usize, opcode: char },
    #[error("tape selector '{selector}' at offset {index} has no opcode before it")]
    StraySelector { index: usize, selector: Selector },
    #[error("byte {byte:#04x} at offset {index} is not a MindMeld command")]
    InvalidByte { index: usize, byte: u8 },
    #[error("unmatched '[' at instruction {index}")]
    UnmatchedOpen { index: usize },
    #[error("unmatched ']' at instruction {index}")]
    UnmatchedClose { index: usize },
}

/// An immutable, indexed instruction stream with its brackets pre-paired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    tokens: Vec<Token>,
    /// `jumps[i]` is the index of the bracket paired with token `i`, or
    /// `usize::MAX` when token `i` is not a bracket.
    jumps: Vec<usize>,
}

impl Program {
    /// Build a program from a dense command stream, as produced by
    /// [`sanitize`].
    pub fn parse(stream: &str) -> Result<Self, ProgramError> {
        let bytes = stream.as_bytes();
        let mut tokens = Vec::with_capacity(bytes.len() / 2);

        let mut i = 0;
        while i < bytes.len() {
            let Some(opcode) = Opcode::from_byte(bytes[i]) else {
                return Err(match Selector::from_byte(bytes[i]) {
                    Some(selector) => ProgramError::StraySelector { index: i, selector },
                    None => ProgramError::InvalidByte { index: i, byte: bytes[i] },
                });
            };
            let selector = bytes
                .get(i + 1)
                .and_then(|&b| Selector::from_byte(b))
                .ok_or(ProgramError::MissingSelector {
                    index: i,
                    opcode: opcode.as_byte() as char,
                })?;
            tokens.push(Token::new(opcode, selector));
            i += 2;
        }

        let jumps = build_bracket_table(&tokens)?;
        debug!(tokens = tokens.len(), "parsed program");
        Ok(Self { tokens, jumps })
    }

    /// Decode (if hex), sanitize and parse raw source text.
    pub fn from_source(text: &str, dialect: Dialect) -> Result<Self, ProgramError> {
        let decoded = decode(text, dialect.is_hex());
        Self::parse(&sanitize(&decoded))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }

    /// The structural partner of the bracket at `index`, ignoring selectors.
    /// `None` if `index` is out of range or not a bracket.
    pub fn matching(&self, index: usize) -> Option<usize> {
        self.jumps.get(index).copied().filter(|&j| j != usize::MAX)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Pair every `[` with its `]` by nesting depth. Selectors play no part:
/// `[A` may close with `]B`.
fn build_bracket_table(tokens: &[Token]) -> Result<Vec<usize>, ProgramError> {
    let mut table = vec![usize::MAX; tokens.len()];
    let mut stack = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match token.opcode {
            Opcode::Open => stack.push(i),
            Opcode::Close => {
                let open = stack.pop().ok_or(ProgramError::UnmatchedClose { index: i })?;
                table[open] = i;
                table[i] = open;
            }
            _ => {}
        }
    }
    // The innermost leftover is reported; any of them would do.
    if let Some(open) = stack.pop() {
        return Err(ProgramError::UnmatchedOpen { index: open });
    }

    Ok(table)
}
