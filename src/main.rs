use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mindmeld::console::{Console, StdConsole};
use mindmeld::decoder::{encode_hex, Dialect};
use mindmeld::machine::{
    EofPolicy, Halt, Machine, MachineConfig, Outcome, PointerPolicy, DEFAULT_TAPE_LEN,
};
use mindmeld::program::Program;
use mindmeld::source::read_source;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mindmeld", about = "Interpreter for MindMeld, a two-pointer Brainfuck derivative")]
struct Cli {
    /// Path to a MindMeld source file. Files ending in `.hmm` are read as hex.
    path: PathBuf,

    /// Treat the source as hex dialect regardless of its extension.
    #[arg(long, conflicts_with = "plain")]
    hex: bool,

    /// Treat the source as plain text regardless of its extension.
    #[arg(long)]
    plain: bool,

    /// Number of cells on the tape.
    #[arg(long, default_value_t = DEFAULT_TAPE_LEN)]
    tape_len: usize,

    /// Wrap data pointers around the tape ends instead of failing.
    #[arg(long)]
    wrap: bool,

    /// Stop after this many instructions.
    #[arg(long)]
    step_limit: Option<usize>,

    /// Store zero on end of input (default: leave the cell unchanged).
    #[arg(long)]
    eof_zero: bool,

    /// Print the sanitized instruction stream before running.
    #[arg(long)]
    print_instructions: bool,

    /// Print the program in hex dialect and exit without running it.
    #[arg(long)]
    emit_hex: bool,
}

impl Cli {
    fn dialect(&self) -> Dialect {
        if self.hex {
            Dialect::Hex
        } else if self.plain {
            Dialect::Plain
        } else {
            Dialect::from_path(&self.path)
        }
    }

    fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            tape_len: self.tape_len,
            pointer_policy: if self.wrap {
                PointerPolicy::Wrap
            } else {
                PointerPolicy::Strict
            },
            step_limit: self.step_limit,
            eof: if self.eof_zero {
                EofPolicy::Zero
            } else {
                EofPolicy::Unchanged
            },
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let text = read_source(&cli.path)?;
    let mut console = StdConsole::new();
    let outcome = run_program(cli, &text, &mut io::stdout(), &mut console)?;

    if let Some(outcome) = outcome.filter(|o| o.halt == Halt::StepLimit) {
        tracing::warn!(steps = outcome.steps, "step limit reached before the program finished");
    }
    Ok(())
}

/// Parse `text` and act on it as the flags say. Listings go to `out`;
/// returns `None` when the program was listed instead of executed.
fn run_program<W: Write, C: Console>(
    cli: &Cli,
    text: &str,
    out: &mut W,
    console: &mut C,
) -> anyhow::Result<Option<Outcome>> {
    let program = Program::from_source(text, cli.dialect())
        .with_context(|| format!("invalid program in {}", cli.path.display()))?;

    if cli.emit_hex {
        writeln!(out, "{}", encode_hex(&program))?;
        out.flush()?;
        return Ok(None);
    }
    if cli.print_instructions {
        writeln!(out, "{program}")?;
        out.flush()?;
    }

    let mut machine = Machine::new(cli.machine_config());
    Ok(Some(machine.run(&program, console)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmeld::console::BufferConsole;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mindmeld").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_emit_hex_lists_without_running() {
        let mut out = Vec::new();
        let mut console = BufferConsole::default();
        let outcome = run_program(
            &cli(&["--emit-hex", "p.mm"]),
            "+A +A .A",
            &mut out,
            &mut console,
        )
        .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(out, b"448\n".to_vec());
        assert!(console.output().is_empty());
    }

    #[test]
    fn test_print_instructions_then_runs() {
        let mut out = Vec::new();
        let mut console = BufferConsole::default();
        let outcome = run_program(
            &cli(&["--print-instructions", "p.mm"]),
            "bump +A and show .A",
            &mut out,
            &mut console,
        )
        .unwrap();
        assert_eq!(out, b"+A.A\n".to_vec());
        assert_eq!(outcome.map(|o| o.halt), Some(Halt::Finished));
        assert_eq!(console.output(), &[1]);
    }

    #[test]
    fn test_plain_run_lists_nothing() {
        let mut out = Vec::new();
        let mut console = BufferConsole::default();
        let outcome = run_program(&cli(&["p.hmm"]), "48", &mut out, &mut console).unwrap();
        assert!(out.is_empty());
        assert_eq!(outcome.map(|o| o.steps), Some(2));
        assert_eq!(console.output(), &[1]);
    }

    #[test]
    fn test_invalid_program_reports_path() {
        let mut out = Vec::new();
        let mut console = BufferConsole::default();
        let err = run_program(&cli(&["bad.mm"]), "[A", &mut out, &mut console).unwrap_err();
        assert!(format!("{err:#}").contains("invalid program in bad.mm"));
    }

    #[test]
    fn test_dialect_follows_extension() {
        let cli = Cli::try_parse_from(["mindmeld", "prog.hmm"]).unwrap();
        assert_eq!(cli.dialect(), Dialect::Hex);
        let cli = Cli::try_parse_from(["mindmeld", "prog.mm"]).unwrap();
        assert_eq!(cli.dialect(), Dialect::Plain);
    }

    #[test]
    fn test_dialect_flags_override_extension() {
        let cli = Cli::try_parse_from(["mindmeld", "--plain", "prog.hmm"]).unwrap();
        assert_eq!(cli.dialect(), Dialect::Plain);
        let cli = Cli::try_parse_from(["mindmeld", "--hex", "prog.txt"]).unwrap();
        assert_eq!(cli.dialect(), Dialect::Hex);
        assert!(Cli::try_parse_from(["mindmeld", "--hex", "--plain", "p"]).is_err());
    }

    #[test]
    fn test_machine_config_from_flags() {
        let cli = Cli::try_parse_from([
            "mindmeld",
            "--tape-len",
            "16",
            "--wrap",
            "--step-limit",
            "500",
            "--eof-zero",
            "p.mm",
        ])
        .unwrap();
        let config = cli.machine_config();
        assert_eq!(config.tape_len, 16);
        assert_eq!(config.pointer_policy, PointerPolicy::Wrap);
        assert_eq!(config.step_limit, Some(500));
        assert_eq!(config.eof, EofPolicy::Zero);
    }

    #[test]
    fn test_defaults() {
        let config = Cli::try_parse_from(["mindmeld", "p.mm"]).unwrap().machine_config();
        assert_eq!(config.tape_len, DEFAULT_TAPE_LEN);
        assert_eq!(config.pointer_policy, PointerPolicy::Strict);
        assert_eq!(config.step_limit, None);
        assert_eq!(config.eof, EofPolicy::Unchanged);
    }
}
