//! Sequential pipeline executor.
//!
//! Runs a table of tasks in order. Each task is one build stage; the first
//! failure stops the run and leaves the remaining stages `Pending`.

use super::metrics::{PipelineMetrics, StageMetrics};
use super::stage::{BuildStage, StageLedger};
use super::task::BoxedTask;
use kettle_shared::errors::{KettleError, KettleResult};
use std::io::Write;
use std::time::Instant;

pub struct ExecutionPlan<Ctx> {
    tasks: Vec<BoxedTask<Ctx>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(tasks: Vec<BoxedTask<Ctx>>) -> Self {
        Self { tasks }
    }

    pub fn tasks(self) -> Vec<BoxedTask<Ctx>> {
        self.tasks
    }
}

pub struct Pipeline<Ctx> {
    tasks: Vec<BoxedTask<Ctx>>,
    progress: Box<dyn Write + Send>,
}

impl<Ctx> Pipeline<Ctx> {
    pub fn new(tasks: Vec<BoxedTask<Ctx>>) -> Self {
        Self {
            tasks,
            progress: Box::new(std::io::stdout()),
        }
    }

    /// Redirect the per-stage progress lines (stdout by default).
    pub fn with_progress(mut self, progress: Box<dyn Write + Send>) -> Self {
        self.progress = progress;
        self
    }
}

pub struct PipelineBuilder;

impl PipelineBuilder {
    pub fn from_plan<Ctx>(plan: ExecutionPlan<Ctx>) -> Pipeline<Ctx> {
        Pipeline::new(plan.tasks())
    }
}

/// Outcome of a pipeline run: stage records, timings and the first error.
#[derive(Debug)]
pub struct PipelineRun {
    pub stages: Vec<BuildStage>,
    pub metrics: PipelineMetrics,
    pub result: KettleResult<()>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> KettleResult<PipelineMetrics> {
        self.result.map(|()| self.metrics)
    }
}

/// Pipeline executor framework.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Execute a pipeline.
    ///
    /// Stages run strictly one after another. A task reporting a non-zero
    /// exit code fails its stage with [`KettleError::BuildStage`].
    pub async fn execute<Ctx>(pipeline: Pipeline<Ctx>, ctx: Ctx) -> PipelineRun
    where
        Ctx: Clone,
    {
        let Pipeline {
            tasks,
            mut progress,
        } = pipeline;

        let total = tasks.len();
        let total_start = Instant::now();
        let mut stage_metrics = Vec::with_capacity(total);
        let mut ledger = StageLedger::new(
            tasks
                .iter()
                .map(|task| BuildStage::new(task.name(), task.description()))
                .collect(),
        );
        let mut result = Ok(());

        for (index, task) in tasks.into_iter().enumerate() {
            if let Err(e) = ledger.begin(index) {
                result = Err(e);
                break;
            }

            let name = task.name().to_string();
            // Progress output is best effort.
            let _ = writeln!(progress, "==> [{}/{}] {}", index + 1, total, task.description());
            let _ = progress.flush();
            tracing::info!(stage = %name, index, "Stage started");

            let stage_start = Instant::now();
            let outcome = task.run(ctx.clone()).await;
            stage_metrics.push(StageMetrics {
                index,
                name: name.clone(),
                duration_ms: stage_start.elapsed().as_millis(),
            });

            let report = match outcome {
                Ok(report) => report,
                Err(e) => {
                    let exit_code = match &e {
                        KettleError::BuildStage { exit_code, .. } => Some(*exit_code),
                        _ => None,
                    };
                    ledger.finish(index, false, exit_code);
                    tracing::error!(stage = %name, error = %e, "Stage failed");
                    result = Err(e);
                    break;
                }
            };

            if let Some(command) = &report.command {
                ledger.record_command(index, command);
            }

            match report.exit_code {
                Some(code) if code != 0 => {
                    ledger.finish(index, false, Some(code));
                    tracing::error!(stage = %name, exit_code = code, "Stage process failed");
                    result = Err(KettleError::BuildStage {
                        stage: name,
                        exit_code: code,
                    });
                    break;
                }
                exit_code => {
                    ledger.finish(index, true, exit_code);
                    tracing::info!(stage = %name, "Stage succeeded");
                }
            }
        }

        PipelineRun {
            stages: ledger.into_stages(),
            metrics: PipelineMetrics {
                total_duration_ms: total_start.elapsed().as_millis(),
                stages: stage_metrics,
            },
            result,
        }
    }
}
