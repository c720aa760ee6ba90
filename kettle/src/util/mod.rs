//! Process helpers shared by pipeline stages and the sandbox host runner.

mod process;

pub use process::{CommandRunner, ProcessRunner, StageCommand, exit_code};
