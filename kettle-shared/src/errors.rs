//! Error types for the bootstrap pipeline and the sandbox bridge.

use std::path::PathBuf;

/// Result alias used across kettle crates.
pub type KettleResult<T> = Result<T, KettleError>;

/// Exit code reported for failures that did not come from a stage process.
pub const GENERIC_FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum KettleError {
    /// Host OS/architecture has no toolchain release.
    #[error("toolchain resolution failed: {0}")]
    Resolution(String),

    /// Resource manifest or container could not be produced.
    #[error("resource bundling failed: {0}")]
    Bundler(String),

    /// An external stage process exited non-zero.
    #[error("stage '{stage}' failed with exit code {exit_code}")]
    BuildStage { stage: String, exit_code: i32 },

    /// Per-entry mount failure. Recovered inside the bridge's mount loop.
    #[error("mount of {} failed: {reason}", host_path.display())]
    Mount { host_path: PathBuf, reason: String },

    #[error("environment copy failed: {0}")]
    EnvironmentCopy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KettleError {
    /// Process exit code the CLI should terminate with for this error.
    ///
    /// Stage failures propagate the child's code verbatim. A stage that
    /// somehow reports 0 as failure still maps to a non-zero code.
    pub fn exit_code(&self) -> i32 {
        match self {
            KettleError::BuildStage { exit_code, .. } if *exit_code != 0 => *exit_code,
            _ => GENERIC_FAILURE_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stage_exit_code_propagates() {
        let err = KettleError::BuildStage {
            stage: "stage1".to_string(),
            exit_code: 42,
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.to_string(), "stage 'stage1' failed with exit code 42");
    }

    #[test]
    fn test_other_errors_map_to_generic_code() {
        assert_eq!(KettleError::Resolution("x".into()).exit_code(), 1);
        assert_eq!(KettleError::Bundler("x".into()).exit_code(), 1);
        let zero = KettleError::BuildStage {
            stage: "odd".into(),
            exit_code: 0,
        };
        assert_eq!(zero.exit_code(), 1);
    }

    #[test]
    fn test_mount_error_names_host_path() {
        let err = KettleError::Mount {
            host_path: PathBuf::from("/home"),
            reason: "permission denied".into(),
        };
        assert!(err.to_string().contains("/home"));
        assert!(err.to_string().contains("permission denied"));
    }
}
