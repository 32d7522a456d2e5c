use std::fmt::{self, Display};

use log::debug;

use crate::{Command, Program, Result, TapeErr};

/// The amount of cells of the default tape.
pub const TAPE_SIZE: usize = 25;

/// Executes a `Program` over a bounded tape.
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    tape: Vec<bool>,
    head: usize,
    pc: usize,
    steps: usize,
}

impl Machine {
    /// Creates a new `Machine` with a blank `TAPE_SIZE` tape and the head in its middle.
    pub fn new(program: Program) -> Self {
        Self::with_tape_size(program, TAPE_SIZE)
    }

    /// Creates a new `Machine` with a blank tape of the given size, at least one cell.
    pub fn with_tape_size(program: Program, size: usize) -> Self {
        let size = size.max(1);

        Self {
            program,
            tape: vec![false; size],
            head: size / 2,
            pc: 0,
            steps: 0,
        }
    }

    pub fn tape(&self) -> &[bool] {
        &self.tape
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// The index of the next command to execute.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// The amount of commands executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether execution ran past the last command.
    pub fn is_halted(&self) -> bool {
        self.pc >= self.program.len()
    }

    /// Executes the next command.
    ///
    /// # Returns
    /// The executed command, `None` if the machine had already halted, or an error if the
    /// head moved off the tape.
    pub fn step(&mut self) -> Result<Option<Command>> {
        let Some(command) = self.program.get(self.pc) else {
            return Ok(None);
        };

        let out_of_bounds = TapeErr::HeadOutOfBounds {
            position: self.head,
            step: self.steps,
        };

        match command {
            Command::Left => {
                self.head = self.head.checked_sub(1).ok_or(out_of_bounds)?;
                self.pc += 1;
            }
            Command::Right => {
                if self.head + 1 >= self.tape.len() {
                    return Err(out_of_bounds);
                }
                self.head += 1;
                self.pc += 1;
            }
            Command::Star => {
                self.tape[self.head] = true;
                self.pc += 1;
            }
            Command::CondJump(target) => {
                self.pc = if self.tape[self.head] {
                    target
                } else {
                    self.pc + 1
                };
            }
        }

        self.steps += 1;
        if self.is_halted() {
            debug!(steps = self.steps; "tape machine halted");
        }

        Ok(Some(command))
    }

    /// Executes commands until the machine halts or `max_steps` commands ran.
    ///
    /// # Returns
    /// The amount of commands executed by this call.
    pub fn run(&mut self, max_steps: usize) -> Result<usize> {
        let mut executed = 0;
        while executed < max_steps && self.step()?.is_some() {
            executed += 1;
        }

        Ok(executed)
    }
}

impl Display for Machine {
    /// Draws the tape on one line and the head under it on the next.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<_> = self
            .tape
            .iter()
            .map(|&marked| if marked { "1" } else { "0" })
            .collect();
        writeln!(f, "{}", cells.join(" "))?;

        let marker: String = (0..self.tape.len())
            .map(|i| if i == self.head { "^_" } else { "__" })
            .collect();
        write!(f, "{marker}")
    }
}
