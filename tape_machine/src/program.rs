use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::TapeErr;

/// A single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Left,
    Right,
    /// Marks the cell under the head.
    Star,
    /// Jumps to the given instruction if the cell under the head is marked.
    CondJump(usize),
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Left => f.write_str("left"),
            Command::Right => f.write_str("right"),
            Command::Star => f.write_str("star"),
            Command::CondJump(target) => write!(f, "c_n {target}"),
        }
    }
}

/// A list of commands, executed in order unless a jump is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    commands: Vec<Command>,
}

impl Program {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(&self, index: usize) -> Option<Command> {
        self.commands.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromStr for Program {
    type Err = TapeErr;

    /// Parses whitespace-separated commands, `c_n` taking the jump target as next token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let mut commands = Vec::new();

        while let Some(token) = tokens.next() {
            let command = match token {
                "left" => Command::Left,
                "right" => Command::Right,
                "star" => Command::Star,
                "c_n" => {
                    let target = tokens.next().ok_or(TapeErr::MissingJump)?;
                    let target = target.parse().map_err(|_| TapeErr::InvalidJump {
                        target: target.to_string(),
                    })?;
                    Command::CondJump(target)
                }
                other => return Err(TapeErr::UnknownCommand(other.to_string())),
            };

            commands.push(command);
        }

        Ok(Self::new(commands))
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let commands: Vec<_> = self.commands.iter().map(Command::to_string).collect();
        f.write_str(&commands.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let program: Program = "left right\nstar c_n 0".parse().unwrap();
        assert_eq!(
            program.commands(),
            &[
                Command::Left,
                Command::Right,
                Command::Star,
                Command::CondJump(0)
            ]
        );
    }

    #[test]
    fn display_parses_back() {
        let program: Program = "star   right c_n 4\n left".parse().unwrap();
        assert_eq!(program.to_string(), "star right c_n 4 left");
        assert_eq!(program.to_string().parse::<Program>().unwrap(), program);
    }

    #[test]
    fn rejects_malformed_programs() {
        assert_eq!(
            "up".parse::<Program>(),
            Err(TapeErr::UnknownCommand("up".to_string()))
        );
        assert_eq!("star c_n".parse::<Program>(), Err(TapeErr::MissingJump));
        assert_eq!(
            "c_n -1".parse::<Program>(),
            Err(TapeErr::InvalidJump {
                target: "-1".to_string()
            })
        );
    }
}
