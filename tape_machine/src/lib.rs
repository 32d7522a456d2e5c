//! An interpreter for Wang B-machine programs: a head moving over a binary tape that can
//! only ever be marked, never erased.

mod error;
mod machine;
mod program;

pub use error::{Result, TapeErr};
pub use machine::{Machine, TAPE_SIZE};
pub use program::{Command, Program};
