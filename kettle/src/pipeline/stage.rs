//! Build stage records.
//!
//! Stages form a linear chain. The ledger refuses to start a stage unless
//! every predecessor has succeeded.

use crate::util::StageCommand;
use kettle_shared::errors::{KettleError, KettleResult};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStage {
    pub id: String,
    pub description: String,
    /// Rendered command line, for commands that ran.
    pub command: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub status: StageStatus,
    pub exit_code: Option<i32>,
}

impl BuildStage {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            command: None,
            working_dir: None,
            status: StageStatus::Pending,
            exit_code: None,
        }
    }
}

/// Ordered stage records for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct StageLedger {
    stages: Vec<BuildStage>,
}

impl StageLedger {
    pub fn new(stages: Vec<BuildStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[BuildStage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<BuildStage> {
        self.stages
    }

    /// Move stage `index` to `Running`.
    pub fn begin(&mut self, index: usize) -> KettleResult<()> {
        if index >= self.stages.len() {
            return Err(KettleError::Internal(format!("no stage at index {}", index)));
        }
        let (done, rest) = self.stages.split_at_mut(index);
        let stage = &mut rest[0];

        if let Some(blocker) = done.iter().find(|s| s.status != StageStatus::Succeeded) {
            return Err(KettleError::InvalidState(format!(
                "stage '{}' cannot start: predecessor '{}' is {:?}",
                stage.id, blocker.id, blocker.status
            )));
        }
        if stage.status != StageStatus::Pending {
            return Err(KettleError::InvalidState(format!(
                "stage '{}' cannot start from {:?}",
                stage.id, stage.status
            )));
        }

        stage.status = StageStatus::Running;
        Ok(())
    }

    pub fn record_command(&mut self, index: usize, command: &StageCommand) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.command = Some(command.to_string());
            stage.working_dir = command.working_dir.clone();
        }
    }

    pub fn finish(&mut self, index: usize, succeeded: bool, exit_code: Option<i32>) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.status = if succeeded {
                StageStatus::Succeeded
            } else {
                StageStatus::Failed
            };
            stage.exit_code = exit_code;
        }
    }
}
