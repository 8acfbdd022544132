//! Poll-loop worker. Lifecycle mirrors the teacher's `Service` trait
//! (name/start/stop/health in `services/manager.rs`) without pulling in the
//! full services manager: one worker here does exactly one job, polling and
//! dispatching, so a bespoke start/stop pair is enough.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handler::{HandlerDependencies, JobOutcome, Registry};
use crate::models::job::JobStatus;
use crate::ws::ServerMessage;

pub struct JobWorker {
    id: String,
    deps: HandlerDependencies,
    registry: Arc<Registry>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobWorker {
    pub fn new(id: impl Into<String>, deps: HandlerDependencies, registry: Arc<Registry>, poll_interval: Duration) -> Self {
        Self {
            id: id.into(),
            deps,
            registry,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.id
    }

    /// Spawns the poll loop. Idempotent: a second call while already running
    /// is a no-op.
    pub async fn start(&self) -> crate::error::Result<()> {
        let mut guard = self.handle.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        let id = self.id.clone();
        let deps = self.deps.clone();
        let registry = self.registry.clone();
        let poll_interval = self.poll_interval;
        let running = self.running.clone();

        let task = tokio::spawn(async move {
            info!(worker = %id, "job worker started");
            while running.load(Ordering::SeqCst) {
                match run_once(&id, &deps, &registry).await {
                    Ok(true) => continue,
                    Ok(false) => tokio::time::sleep(poll_interval).await,
                    Err(e) => {
                        warn!(worker = %id, error = %e, "job worker poll failed");
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
            info!(worker = %id, "job worker stopped");
        });

        *guard = Some(task);
        Ok(())
    }

    pub async fn stop(&self) -> crate::error::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.handle.lock().await.take() {
            task.abort();
        }
        Ok(())
    }

    pub async fn health(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Picks up and runs at most one job. Returns `Ok(true)` when a job was found
/// (so the caller polls again immediately instead of sleeping), `Ok(false)`
/// when the queue was empty.
async fn run_once(worker_id: &str, deps: &HandlerDependencies, registry: &Registry) -> crate::error::Result<bool> {
    let Some(job) = deps.db.jobs().pick_next(worker_id).await? else {
        return Ok(false);
    };

    debug!(worker = worker_id, job_id = %job.id, job_type = %job.job_type, "picked up job");
    deps.broadcaster.broadcast(ServerMessage::JobStarted { job_id: job.id, job_type: job.job_type.clone() });

    let Some(handler) = registry.get(job.job_type.as_str()) else {
        let message = format!("no handler registered for job type '{}'", job.job_type);
        warn!(worker = worker_id, job_id = %job.id, "{message}");
        deps.db.jobs().fail(job.id, &message, true).await?;
        deps.broadcaster.broadcast(ServerMessage::JobFailed { job_id: job.id, job_type: job.job_type.clone(), error: message });
        return Ok(true);
    };

    match handler.handle(&job, deps).await {
        JobOutcome::Completed(result) => {
            deps.db.jobs().complete(job.id, result).await?;
            deps.broadcaster.broadcast(ServerMessage::JobCompleted { job_id: job.id, job_type: job.job_type.clone() });
        }
        JobOutcome::Failed { message, permanent } => {
            let status_before = job.status;
            deps.db.jobs().fail(job.id, &message, permanent).await?;
            if status_before != JobStatus::Retrying {
                deps.broadcaster.broadcast(ServerMessage::JobFailed { job_id: job.id, job_type: job.job_type.clone(), error: message });
            }
        }
    }

    Ok(true)
}
