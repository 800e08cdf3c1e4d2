use std::fmt;

/// The eight operations of the MindMeld instruction set.
///
/// Every opcode is written as its Brainfuck character followed by a
/// selector letter naming the data pointer it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `>`: move the pointer one cell forward.
    Right,
    /// `<`: move the pointer one cell backward.
    Left,
    /// `+`: increment the cell under the pointer.
    Inc,
    /// `-`: decrement the cell under the pointer.
    Dec,
    /// `.`: write the cell under the pointer to the console.
    Output,
    /// `,`: read a byte from the console into the cell and echo it.
    Input,
    /// `[`: skip past the matching close bracket if the cell is zero.
    Open,
    /// `]`: jump back to the matching open bracket if the cell is non-zero.
    Close,
}

const RIGHT: u8 = b'>';
const LEFT: u8 = b'<';
const INC: u8 = b'+';
const DEC: u8 = b'-';
const OUTPUT: u8 = b'.';
const INPUT: u8 = b',';
const OPEN: u8 = b'[';
const CLOSE: u8 = b']';

impl Opcode {
    pub const ALL: [Opcode; 8] = [
        Opcode::Right,
        Opcode::Left,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Output,
        Opcode::Input,
        Opcode::Open,
        Opcode::Close,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            RIGHT => Some(Opcode::Right),
            LEFT => Some(Opcode::Left),
            INC => Some(Opcode::Inc),
            DEC => Some(Opcode::Dec),
            OUTPUT => Some(Opcode::Output),
            INPUT => Some(Opcode::Input),
            OPEN => Some(Opcode::Open),
            CLOSE => Some(Opcode::Close),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::Right => RIGHT,
            Opcode::Left => LEFT,
            Opcode::Inc => INC,
            Opcode::Dec => DEC,
            Opcode::Output => OUTPUT,
            Opcode::Input => INPUT,
            Opcode::Open => OPEN,
            Opcode::Close => CLOSE,
        }
    }
}

/// Which of the two data pointers a token operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    A,
    B,
}

impl Selector {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Selector::A),
            b'B' => Some(Selector::B),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Selector::A => b'A',
            Selector::B => b'B',
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// One executable unit: an opcode bound to a data pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub opcode: Opcode,
    pub selector: Selector,
}

impl Token {
    pub const fn new(opcode: Opcode, selector: Selector) -> Self {
        Self { opcode, selector }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.opcode.as_byte() as char, self.selector)
    }
}

/// Returns true if the byte belongs to the command alphabet, i.e. it
/// survives sanitization.
pub fn is_command_byte(byte: u8) -> bool {
    Selector::from_byte(byte).is_some() || Opcode::from_byte(byte).is_some()
}
