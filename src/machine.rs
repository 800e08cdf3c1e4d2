use std::io;

use tracing::{debug, trace};

use crate::console::Console;
use crate::program::{Program, ProgramError};
use crate::token::{Opcode, Selector};

/// Conventional Brainfuck memory size.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// What happens when a data pointer is moved off either end of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPolicy {
    /// Fail with [`ExecError::PointerRange`].
    #[default]
    Strict,
    /// Pointer arithmetic wraps modulo the tape length.
    Wrap,
}

/// What `,` stores when the console has no more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Leave the cell as it was.
    #[default]
    Unchanged,
    /// Store zero.
    Zero,
}

/// Configuration for a single program run.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Number of cells on the shared tape.
    pub tape_len: usize,
    pub pointer_policy: PointerPolicy,
    /// Maximum instructions to execute; `None` runs until the program ends.
    pub step_limit: Option<usize>,
    pub eof: EofPolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_len: DEFAULT_TAPE_LEN,
            pointer_policy: PointerPolicy::Strict,
            step_limit: None,
            eof: EofPolicy::Unchanged,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("data pointer {selector} left the tape at cell {position} (tape length {tape_len})")]
    PointerRange {
        selector: Selector,
        position: usize,
        tape_len: usize,
    },
    #[error("malformed program: {0}")]
    Malformed(#[from] ProgramError),
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The instruction pointer ran off the end of the program.
    Finished,
    /// The configured step limit was reached first.
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Instructions executed so far by this machine.
    pub steps: usize,
    pub halt: Halt,
}

/// The MindMeld virtual machine.
///
/// One tape of bytes is shared by two data pointers, A and B, both starting
/// at cell 0. Each token acts through the pointer its selector names, so A
/// and B may alias the same cell and observe each other's writes. Cell
/// arithmetic wraps modulo 256.
pub struct Machine {
    config: MachineConfig,
    tape: Vec<u8>,
    ptr_a: usize,
    ptr_b: usize,
    ip: usize,
    steps: usize,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let tape = vec![0u8; config.tape_len];
        Self {
            config,
            tape,
            ptr_a: 0,
            ptr_b: 0,
            ip: 0,
            steps: 0,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn pointer(&self, selector: Selector) -> usize {
        match selector {
            Selector::A => self.ptr_a,
            Selector::B => self.ptr_b,
        }
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Zero the tape and rewind every pointer, ready for another run.
    pub fn reset(&mut self) {
        self.tape.fill(0);
        self.ptr_a = 0;
        self.ptr_b = 0;
        self.ip = 0;
        self.steps = 0;
    }

    /// Execute `program` until it ends or the step limit is hit.
    ///
    /// Running again after a [`Halt::StepLimit`] resumes where it stopped;
    /// the limit counts total steps, so raise it first.
    pub fn run<C: Console>(
        &mut self,
        program: &Program,
        console: &mut C,
    ) -> Result<Outcome, ExecError> {
        debug!(
            tokens = program.len(),
            tape_len = self.tape.len(),
            "starting run"
        );

        let result = self.run_inner(program, console);
        console.flush()?;
        let outcome = result?;

        debug!(steps = outcome.steps, halt = ?outcome.halt, "run stopped");
        Ok(outcome)
    }

    fn run_inner<C: Console>(
        &mut self,
        program: &Program,
        console: &mut C,
    ) -> Result<Outcome, ExecError> {
        while self.ip < program.len() {
            if self.config.step_limit.is_some_and(|limit| self.steps >= limit) {
                return Ok(Outcome {
                    steps: self.steps,
                    halt: Halt::StepLimit,
                });
            }
            self.step(program, console)?;
        }
        Ok(Outcome {
            steps: self.steps,
            halt: Halt::Finished,
        })
    }

    /// Execute the single token under the instruction pointer.
    ///
    /// Returns `Ok(false)` without doing anything once the program is
    /// exhausted.
    pub fn step<C: Console>(
        &mut self,
        program: &Program,
        console: &mut C,
    ) -> Result<bool, ExecError> {
        let Some(token) = program.get(self.ip) else {
            return Ok(false);
        };
        self.steps += 1;
        let sel = token.selector;

        match token.opcode {
            Opcode::Right => self.move_pointer(sel, true)?,
            Opcode::Left => self.move_pointer(sel, false)?,
            Opcode::Inc => {
                let cell = self.cell_mut(sel)?;
                *cell = cell.wrapping_add(1);
            }
            Opcode::Dec => {
                let cell = self.cell_mut(sel)?;
                *cell = cell.wrapping_sub(1);
            }
            Opcode::Output => {
                let value = *self.cell_mut(sel)?;
                console.write_byte(value)?;
            }
            Opcode::Input => {
                let eof = self.config.eof;
                // Check the cell exists before blocking on input.
                self.cell_mut(sel)?;
                match console.read_byte()? {
                    Some(byte) => {
                        *self.cell_mut(sel)? = byte;
                        console.write_byte(byte)?;
                    }
                    None => {
                        if eof == EofPolicy::Zero {
                            *self.cell_mut(sel)? = 0;
                        }
                    }
                }
            }
            Opcode::Open => {
                if *self.cell_mut(sel)? == 0 {
                    let close = program
                        .matching(self.ip)
                        .ok_or(ProgramError::UnmatchedOpen { index: self.ip })?;
                    trace!(from = self.ip, to = close + 1, "skip loop");
                    self.ip = close + 1;
                    return Ok(true);
                }
            }
            Opcode::Close => {
                if *self.cell_mut(sel)? != 0 {
                    // Land on the '[' itself so it re-tests with its own selector.
                    let open = program
                        .matching(self.ip)
                        .ok_or(ProgramError::UnmatchedClose { index: self.ip })?;
                    trace!(from = self.ip, to = open, "repeat loop");
                    self.ip = open;
                    return Ok(true);
                }
            }
        }

        self.ip += 1;
        Ok(true)
    }

    fn move_pointer(&mut self, selector: Selector, forward: bool) -> Result<(), ExecError> {
        let len = self.tape.len();
        let position = self.pointer(selector);
        let out_of_range = ExecError::PointerRange {
            selector,
            position,
            tape_len: len,
        };

        let next = match self.config.pointer_policy {
            _ if len == 0 => return Err(out_of_range),
            PointerPolicy::Strict => {
                let next = if forward {
                    position.checked_add(1)
                } else {
                    position.checked_sub(1)
                };
                next.filter(|&n| n < len).ok_or(out_of_range)?
            }
            PointerPolicy::Wrap => {
                if forward {
                    (position + 1) % len
                } else {
                    (position + len - 1) % len
                }
            }
        };

        match selector {
            Selector::A => self.ptr_a = next,
            Selector::B => self.ptr_b = next,
        }
        Ok(())
    }

    fn cell_mut(&mut self, selector: Selector) -> Result<&mut u8, ExecError> {
        let position = self.pointer(selector);
        let tape_len = self.tape.len();
        self.tape.get_mut(position).ok_or(ExecError::PointerRange {
            selector,
            position,
            tape_len,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::console::BufferConsole;
    use proptest::prelude::*;

    fn any_program() -> impl Strategy<Value = String> {
        "([<>+\\-.,\\[\\]][AB]){0,64}"
    }

    proptest! {
        #[test]
        fn random_programs_never_panic(
            text in any_program(),
            input in prop::collection::vec(any::<u8>(), 0..16),
            wrap in any::<bool>(),
        ) {
            if let Ok(prog) = Program::parse(&text) {
                let mut machine = Machine::new(MachineConfig {
                    tape_len: 16,
                    pointer_policy: if wrap { PointerPolicy::Wrap } else { PointerPolicy::Strict },
                    step_limit: Some(4096),
                    ..Default::default()
                });
                let mut console = BufferConsole::new(&input);
                match machine.run(&prog, &mut console) {
                    Ok(outcome) => prop_assert!(outcome.steps <= 4096),
                    Err(e) => {
                        let range_error = matches!(e, ExecError::PointerRange { .. });
                        prop_assert!(!wrap && range_error, "unexpected error: {}", e);
                    }
                }
                prop_assert_eq!(machine.tape().len(), 16);
            }
        }

        #[test]
        fn pointers_stay_on_tape(text in any_program()) {
            if let Ok(prog) = Program::parse(&text) {
                let mut machine = Machine::new(MachineConfig {
                    tape_len: 8,
                    step_limit: Some(1024),
                    ..Default::default()
                });
                let mut console = BufferConsole::default();
                let _ = machine.run(&prog, &mut console);
                prop_assert!(machine.pointer(Selector::A) < 8);
                prop_assert!(machine.pointer(Selector::B) < 8);
            }
        }
    }
}
