pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{plan_input, run_merge, run_merge_reported, InputPlan};
pub use types::{MergeReport, MergeStage, NoOpReporter, ProgressReporter};
