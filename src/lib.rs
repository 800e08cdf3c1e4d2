//! An interpreter for MindMeld, a Brainfuck derivative with two data
//! pointers (A and B) sharing one tape.
//!
//! Source text flows through [`decoder::decode`] (hex dialect only),
//! [`sanitizer::sanitize`] and [`program::Program::parse`], and the
//! resulting program is run by a [`machine::Machine`] against a
//! [`console::Console`].

pub mod console;
pub mod decoder;
pub mod machine;
pub mod program;
pub mod sanitizer;
pub mod source;
pub mod token;

use std::path::Path;

use console::Console;
use decoder::Dialect;
use machine::{ExecError, Machine, MachineConfig, Outcome};
use program::{Program, ProgramError};
use source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Read and parse a source file, picking the dialect from its extension.
pub fn load_program(path: impl AsRef<Path>) -> Result<Program, Error> {
    let path = path.as_ref();
    let text = source::read_source(path)?;
    Ok(Program::from_source(&text, Dialect::from_path(path))?)
}

/// Parse `text` and run it to completion on a fresh machine.
pub fn run_source<C: Console>(
    text: &str,
    dialect: Dialect,
    config: MachineConfig,
    console: &mut C,
) -> Result<Outcome, Error> {
    let program = Program::from_source(text, dialect)?;
    let mut machine = Machine::new(config);
    Ok(machine.run(&program, console)?)
}
