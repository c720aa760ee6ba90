//! Generic table-driven pipeline execution framework.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline → Tasks (one build stage each, run in order)
//!
//! - Pipeline: orchestrates execution and keeps the stage ledger
//! - Task: atomic unit of work, optionally running an external command
//! - BuildStage: status/exit-code record per task
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pipeline::{ExecutionPlan, PipelineBuilder, PipelineExecutor};
//!
//! let plan = ExecutionPlan::new(vec![Box::new(TaskA), Box::new(TaskB)]);
//! let pipeline = PipelineBuilder::from_plan(plan);
//! let run = PipelineExecutor::execute(pipeline, ctx).await;
//! let metrics = run.into_result()?;
//! println!("pipeline took {}ms", metrics.total_duration_ms);
//! ```

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod stage;
mod task;

pub use metrics::{PipelineMetrics, StageMetrics};
pub use pipeline::{ExecutionPlan, Pipeline, PipelineBuilder, PipelineExecutor, PipelineRun};
pub use stage::{BuildStage, StageLedger, StageStatus};
pub use task::{BoxedTask, PipelineTask, TaskReport};
