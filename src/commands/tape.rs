use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use tape_machine::{Machine, Program};

/// The amount of steps run when none is given.
pub const DEFAULT_ITERATIONS: usize = 100;

/// Runs `program` for at most `iterations` steps, drawing the tape after every one.
///
/// # Returns
/// The amount of steps executed.
pub fn execute<W: Write>(program: Program, iterations: usize, mut writer: W) -> Result<usize> {
    writeln!(writer, "loaded: {program}")?;
    writeln!(writer)?;

    let mut machine = Machine::new(program);
    writeln!(writer, "{machine}")?;

    for _ in 0..iterations {
        match machine.step()? {
            Some(command) => writeln!(writer, "{command}\n{machine}")?,
            None => {
                writeln!(writer, "halted")?;
                break;
            }
        }
    }

    Ok(machine.steps())
}

/// Reads a program file and runs it on stdout, see `execute`.
pub fn run(path: &Path, iterations: usize) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read program '{}'", path.display()))?;
    let program: Program = source
        .parse()
        .with_context(|| format!("invalid program '{}'", path.display()))?;

    execute(program, iterations, std::io::stdout().lock())?;
    Ok(())
}
