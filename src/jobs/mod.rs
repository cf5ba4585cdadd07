//! Ingest job orchestration.

mod runner;
mod tasks;

pub use runner::{run_job, JobDeps, RunReport, RunStatus};
pub use tasks::{build_task_list, page_sequence, Task};
