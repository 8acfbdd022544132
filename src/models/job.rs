//! Job queue data model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Retrying => "retrying",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "retrying" => Self::Retrying,
            _ => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub priority: i32,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,

    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: Option<DateTime<Utc>>,

    pub worker_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub manual: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    ///  invariant test: a processing job's bookkeeping must be internally
    /// consistent.
    pub fn processing_invariant_holds(&self, now: DateTime<Utc>) -> bool {
        if self.status != JobStatus::Processing {
            return true;
        }
        self.started_at.map(|s| s <= now).unwrap_or(false) && self.retry_count <= self.max_retries
    }

    /// Exponential backoff capped at 300s, per  `fail`.
    pub fn backoff_secs(retry_count: i32) -> i64 {
        let pow = 2i64.saturating_pow(retry_count.max(0) as u32);
        pow.min(300)
    }
}

/// Parameters accepted by `enqueue`.
#[derive(Debug, Clone)]
pub struct EnqueueJob {
    pub job_type: String,
    pub payload: serde_json::Value,
    pub priority: i32,
    pub max_retries: i32,
    pub depends_on: Vec<Uuid>,
    pub manual: bool,
}

impl EnqueueJob {
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            payload,
            priority: 5,
            max_retries: 3,
            depends_on: Vec::new(),
            manual: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, jobs: impl IntoIterator<Item = Uuid>) -> Self {
        self.depends_on.extend(jobs);
        self
    }
}

/// Transient, non-persisted progress report ( `progress`), broadcast only.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    pub current: u64,
    pub total: u64,
    pub percentage: f32,
    pub message: Option<String>,
    pub detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_caps_at_300_seconds() {
        assert_eq!(Job::backoff_secs(1), 2);
        assert_eq!(Job::backoff_secs(2), 4);
        assert_eq!(Job::backoff_secs(10), 300);
    }
}
