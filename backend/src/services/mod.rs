//! Orchestration on top of the models, storage and scheduling layers.
//!
//! - [`pipeline`]: the prompt chain behind `parse-and-map`
//! - [`dispatch`]: bulk term generation, run as a background job
//! - [`job_tracker`]: progress and logs for background jobs

pub mod dispatch;
pub mod job_tracker;
pub mod pipeline;

pub use dispatch::{dispatch_generation, DispatchSummary, GenerationRequest};
pub use job_tracker::{Job, JobStatus, JobTracker, LogEntry, LogLevel};
pub use pipeline::{
    generate_content, normalize_content_type, parse_and_map, PipelineError, PipelineResult,
    PromptAnalysis,
};
