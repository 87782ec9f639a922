//! In-memory progress tracking for background generation jobs.
//!
//! A job collects timestamped log lines while it runs; the SSE endpoint
//! polls [`JobTracker::logs_since`] to stream them out.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub job_id: String,
    /// What the job does, e.g. `generate-lesson-plans`.
    pub kind: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Summary written on completion.
    pub result: Option<serde_json::Value>,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Running
    }
}

/// How long a finished job stays queryable before it is dropped.
pub const DEFAULT_RETENTION_SECS: i64 = 60 * 60;

#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    retention: chrono::Duration,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self {
            jobs: Arc::default(),
            retention: chrono::Duration::seconds(DEFAULT_RETENTION_SECS),
        }
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Register a running job and return its id.
    ///
    /// Finished jobs past the retention period are dropped first.
    pub fn create_job(&self, kind: impl Into<String>) -> String {
        self.prune_finished();
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            kind: kind.into(),
            status: JobStatus::Running,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
            result: None,
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    /// Append a log line. Unknown ids and finished jobs are ignored.
    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id).filter(|j| !j.is_finished()) {
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    pub fn info(&self, job_id: &str, message: impl Into<String>) {
        self.log(job_id, LogLevel::Info, message);
    }

    pub fn success(&self, job_id: &str, message: impl Into<String>) {
        self.log(job_id, LogLevel::Success, message);
    }

    pub fn warning(&self, job_id: &str, message: impl Into<String>) {
        self.log(job_id, LogLevel::Warning, message);
    }

    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        self.finish(job_id, JobStatus::Completed, |job| job.result = result);
    }

    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        let message = error_message.into();
        self.finish(job_id, JobStatus::Failed, |job| {
            job.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message,
            })
        });
    }

    fn finish(&self, job_id: &str, status: JobStatus, update: impl FnOnce(&mut Job)) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(job_id).filter(|j| !j.is_finished()) {
            update(job);
            job.status = status;
            job.completed_at = Some(chrono::Utc::now());
        }
    }

    /// Drop finished jobs that completed more than the retention period ago.
    /// Running jobs are never dropped. Returns how many were removed.
    pub fn prune_finished(&self) -> usize {
        let cutoff = chrono::Utc::now() - self.retention;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.completed_at.map_or(true, |done| done > cutoff));
        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Log entries after the first `offset`, plus whether the job has finished.
    /// `None` when the job is unknown.
    pub fn logs_since(&self, job_id: &str, offset: usize) -> Option<(Vec<LogEntry>, bool)> {
        self.jobs.read().get(job_id).map(|job| {
            let fresh = job.logs.iter().skip(offset).cloned().collect();
            (fresh, job.is_finished())
        })
    }
}
