//! External process invocation for pipeline stages.

use async_trait::async_trait;
use kettle_shared::errors::{KettleError, KettleResult};
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl StageCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Runs stage commands to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` and return its exit code. `Err` means it never ran.
    async fn run(&self, command: &StageCommand) -> KettleResult<i32>;
}

/// Spawns real subprocesses, inheriting stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &StageCommand) -> KettleResult<i32> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|e| {
            let msg = format!("failed to spawn {}: {}", command.program.display(), e);
            tracing::error!("{}", msg);
            if e.kind() == std::io::ErrorKind::NotFound {
                KettleError::NotFound(msg)
            } else {
                KettleError::Internal(msg)
            }
        })?;

        let code = exit_code(status);
        tracing::debug!(program = %command.program.display(), code, "Process exited");
        Ok(code)
    }
}

/// Exit code of a finished process. Signal deaths map to `128 + signo`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_spaces() {
        let cmd = StageCommand::new("emcc")
            .arg("-s")
            .arg("INVOKE_MAIN=0")
            .arg("my file.cpp")
            .arg("");
        assert_eq!(cmd.to_string(), "emcc -s INVOKE_MAIN=0 'my file.cpp' ''");
    }

    #[test]
    fn test_builder() {
        let cmd = StageCommand::new("node")
            .args(["--stack-size=2048", "kettle.js"])
            .current_dir("/work")
            .envs([("DEBUG".to_string(), "1".to_string())]);
        assert_eq!(cmd.args, vec!["--stack-size=2048", "kettle.js"]);
        assert_eq!(cmd.working_dir, Some(PathBuf::from("/work")));
        assert_eq!(cmd.env.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let ok = StageCommand::new("sh").args(["-c", "exit 0"]);
        assert_eq!(ProcessRunner.run(&ok).await.unwrap(), 0);

        let failing = StageCommand::new("sh").args(["-c", "exit 7"]);
        assert_eq!(ProcessRunner.run(&failing).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_process_runner_missing_program() {
        let cmd = StageCommand::new("kettle-definitely-not-installed");
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, KettleError::NotFound(_)));
    }
}
