use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read, Write};

/// Byte-at-a-time I/O for a running program.
///
/// Implementations must not echo input themselves; the machine echoes
/// every byte it reads.
pub trait Console {
    /// Block until one byte is available. `Ok(None)` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

/// Holds the terminal in raw mode: no line buffering, no echo.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// Map a byte typed at a raw-mode terminal to what the program sees.
///
/// Enter arrives as `\r` and becomes `\n`. Ctrl-D ends input and Ctrl-C
/// aborts the run, since raw mode no longer turns them into signals.
fn translate_keypress(byte: u8) -> io::Result<Option<u8>> {
    match byte {
        CTRL_C => Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted by Ctrl-C")),
        CTRL_D => Ok(None),
        b'\r' => Ok(Some(b'\n')),
        other => Ok(Some(other)),
    }
}

/// The process's stdin and stdout.
///
/// When stdin is a terminal each read puts it in raw mode for the duration,
/// so a keypress is delivered at once and the terminal does not echo it.
/// Output is flushed after every byte so a program's prompts appear before
/// it blocks on input.
pub struct StdConsole {
    stdin: io::Stdin,
    stdout: io::Stdout,
    interactive: bool,
}

impl StdConsole {
    pub fn new() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self {
            stdin,
            stdout: io::stdout(),
            interactive,
        }
    }

    fn read_raw(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.lock().read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if !self.interactive {
            return self.read_raw();
        }
        let _raw = RawModeGuard::enter()?;
        match self.read_raw()? {
            Some(byte) => translate_keypress(byte),
            None => Ok(None),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(&[byte])?;
        out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.lock().flush()
    }
}

/// An in-memory console: input is served from a queue, output is captured.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Bytes not yet consumed by the program.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}
