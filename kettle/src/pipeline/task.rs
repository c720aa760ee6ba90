//! Generic task trait for pipeline execution.

use crate::util::StageCommand;
use async_trait::async_trait;
use kettle_shared::errors::KettleResult;

/// What a task did, as far as the stage ledger is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// External command the task ran, if any.
    pub command: Option<StageCommand>,
    /// Exit code of that command. Non-zero fails the stage.
    pub exit_code: Option<i32>,
}

impl TaskReport {
    /// Task finished without running an external process.
    pub fn completed() -> Self {
        Self::default()
    }

    /// Task ran `command`, which exited with `exit_code`.
    pub fn executed(command: StageCommand, exit_code: i32) -> Self {
        Self {
            command: Some(command),
            exit_code: Some(exit_code),
        }
    }
}

/// Trait for tasks that can be executed in a pipeline.
///
/// Tasks run with a shared context, which is cloned per task.
#[async_trait]
pub trait PipelineTask<Ctx>: Send + Sync {
    /// Execute the task with the shared pipeline context.
    async fn run(self: Box<Self>, ctx: Ctx) -> KettleResult<TaskReport>;

    /// Stable identifier, used for the stage record and metrics.
    fn name(&self) -> &str;

    /// Progress text printed when the stage starts.
    fn description(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
