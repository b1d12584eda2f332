//! The job manager: concurrent, cancellable, observable optimization runs.
//!
//! Each job executes on its own blocking task (the annealing loop is
//! CPU-bound and never suspends). The job table is a [`DashMap`], giving
//! many concurrent readers and exclusive writers per shard; per-record
//! mutation goes through an `RwLock` around the [`Job`] snapshot.
//!
//! Every optimizer callback funnels through the manager: it updates the
//! record's progress snapshot, forwards an event to the broadcaster buffer,
//! and reports the cancellation flag back to the optimizer. Cancellation is
//! cooperative — in-flight iterations complete and the run stops at the
//! next emission boundary.
//!
//! Events for one job are emitted from that job's task in order (`started`,
//! `progress*`, one terminal event) into an unbounded channel drained by a
//! single pump task, so per-job ordering survives fan-out. A slow sink
//! therefore buffers rather than drops; see the crate docs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task;

use scheduler_core::constraints::ConstraintEngine;
use scheduler_core::models::{
    Draw, OptimizationConfig, OptimizationOutcome, ProgressCallback, ProgressUpdate,
};
use scheduler_core::{SchedulerError, SimulatedAnnealing};

use crate::events;
use crate::ports::Broadcaster;

/// Lifecycle state of an optimization job.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

/// Snapshot of one optimization job.
#[derive(Serialize, Clone, Debug)]
pub struct Job {
    pub id: String,
    pub draw_id: i64,
    pub status: JobStatus,
    pub config: OptimizationConfig,
    /// Latest progress snapshot, absent until the first emission.
    pub progress: Option<ProgressUpdate>,
    /// Final result, present once the job completed.
    pub result: Option<OptimizationOutcome>,
    /// Error text, present once the job failed.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Counts of jobs by status.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
}

/// Table entry: the mutable record plus the cancellation handle. The handle
/// is never exposed to callers.
#[derive(Clone)]
struct JobEntry {
    record: Arc<RwLock<Job>>,
    cancel: Arc<AtomicBool>,
}

/// Owner of all in-flight and historical optimization jobs.
#[derive(Clone)]
pub struct JobManager {
    jobs: Arc<DashMap<String, JobEntry>>,
    event_tx: Option<mpsc::UnboundedSender<(&'static str, Value)>>,
}

impl JobManager {
    /// A manager without a broadcaster; events are dropped.
    pub fn new() -> Self {
        JobManager {
            jobs: Arc::new(DashMap::new()),
            event_tx: None,
        }
    }

    /// A manager forwarding events to the given broadcaster.
    ///
    /// Events are buffered through an unbounded channel and drained by a
    /// pump task, so emission never blocks a worker. Must be called from
    /// within a tokio runtime.
    pub fn with_broadcaster(broadcaster: Arc<dyn Broadcaster>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(&'static str, Value)>();
        tokio::spawn(async move {
            while let Some((message_type, payload)) = rx.recv().await {
                broadcaster.broadcast(message_type, payload).await;
            }
        });
        JobManager {
            jobs: Arc::new(DashMap::new()),
            event_tx: Some(tx),
        }
    }

    /// Starts an optimization job for the draw and returns its id.
    ///
    /// The id is `opt_{draw_id}_{unix_seconds}`; starting a second job for
    /// the same draw within the same second is rejected as a conflict
    /// rather than silently replacing the first record.
    pub fn start(
        &self,
        draw_id: i64,
        draw: Draw,
        engine: ConstraintEngine,
        config: OptimizationConfig,
    ) -> Result<String, SchedulerError> {
        let job_id = format!("opt_{}_{}", draw_id, Utc::now().timestamp());
        let job = Job {
            id: job_id.clone(),
            draw_id,
            status: JobStatus::Pending,
            config: config.clone(),
            progress: None,
            result: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        let entry = JobEntry {
            record: Arc::new(RwLock::new(job)),
            cancel: Arc::new(AtomicBool::new(false)),
        };
        if self.jobs.contains_key(&job_id) {
            return Err(SchedulerError::InvalidInput(format!(
                "job {job_id} already exists; a draw can start one job per second"
            )));
        }
        self.jobs.insert(job_id.clone(), entry.clone());
        info!("job {job_id}: queued for draw {draw_id}");

        let manager = self.clone();
        let id_for_task = job_id.clone();
        task::spawn_blocking(move || {
            manager.run_job(&id_for_task, entry, draw, engine, config);
        });

        Ok(job_id)
    }

    /// The worker body: marks the job running, drives the optimizer with a
    /// progress-and-cancellation callback, and settles the terminal state.
    fn run_job(
        &self,
        job_id: &str,
        entry: JobEntry,
        draw: Draw,
        engine: ConstraintEngine,
        config: OptimizationConfig,
    ) {
        let draw_id;
        {
            let mut job = entry.record.write().unwrap();
            if entry.cancel.load(Ordering::SeqCst) {
                // Cancelled before the run began; never emit `started`.
                job.status = JobStatus::Cancelled;
                job.completed_at.get_or_insert_with(Utc::now);
                let snapshot = job.clone();
                drop(job);
                self.emit(events::OPTIMIZATION_CANCELLED, events::cancelled(&snapshot, None));
                return;
            }
            job.status = JobStatus::Running;
            draw_id = job.draw_id;
            let snapshot = job.clone();
            drop(job);
            self.emit(events::OPTIMIZATION_STARTED, events::started(&snapshot));
        }

        let callback = self.progress_callback(job_id.to_string(), draw_id, &entry);
        let optimizer = SimulatedAnnealing::from_config(&config);
        let outcome = optimizer.optimize(&engine, &draw, Some(&callback));

        let mut job = entry.record.write().unwrap();
        job.completed_at.get_or_insert_with(Utc::now);
        // A cancel may have landed while the loop was finishing its last
        // iterations; cancelled beats completed.
        if entry.cancel.load(Ordering::SeqCst) {
            job.status = JobStatus::Cancelled;
            let snapshot = job.clone();
            drop(job);
            info!("job {job_id}: cancelled");
            self.emit(events::OPTIMIZATION_CANCELLED, events::cancelled(&snapshot, None));
            return;
        }
        match outcome {
            Ok(outcome) => {
                job.status = JobStatus::Completed;
                job.result = Some(outcome.clone());
                let snapshot = job.clone();
                drop(job);
                info!("job {job_id}: completed");
                self.emit(
                    events::OPTIMIZATION_COMPLETED,
                    events::completed(&snapshot, &outcome),
                );
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
                let snapshot = job.clone();
                drop(job);
                warn!("job {job_id}: failed: {e}");
                self.emit(
                    events::OPTIMIZATION_FAILED,
                    events::failed(&snapshot, snapshot.error.as_deref().unwrap_or("unknown")),
                );
            }
        }
    }

    /// Builds the optimizer callback: update the snapshot, forward the
    /// event, report whether the run should continue.
    fn progress_callback(
        &self,
        job_id: String,
        draw_id: i64,
        entry: &JobEntry,
    ) -> ProgressCallback {
        let record = entry.record.clone();
        let cancel = entry.cancel.clone();
        let manager = self.clone();
        Box::new(move |update: &ProgressUpdate| -> bool {
            {
                let mut job = record.write().unwrap();
                job.progress = Some(update.clone());
            }
            manager.emit(
                events::OPTIMIZATION_PROGRESS,
                events::progress(&job_id, draw_id, update),
            );
            !cancel.load(Ordering::SeqCst)
        })
    }

    /// The job snapshot, when the id is known.
    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs
            .get(job_id)
            .map(|entry| entry.record.read().unwrap().clone())
    }

    /// Cancels a job.
    ///
    /// A running (or still pending) job gets its flag set and is eagerly
    /// marked cancelled with a completion timestamp; the worker observes the
    /// flag at its next boundary. Cancelling a terminal job is a no-op.
    /// Returns the status after the call.
    pub fn cancel(&self, job_id: &str) -> Result<JobStatus, SchedulerError> {
        let entry = self
            .jobs
            .get(job_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| SchedulerError::NotFound(format!("job {job_id}")))?;

        let mut job = entry.record.write().unwrap();
        match job.status {
            JobStatus::Running | JobStatus::Pending => {
                entry.cancel.store(true, Ordering::SeqCst);
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                debug!("job {job_id}: cancel requested");
            }
            // Idempotent for terminal states.
            _ => {}
        }
        Ok(job.status)
    }

    /// All jobs, optionally filtered by status.
    pub fn list(&self, status: Option<JobStatus>) -> Vec<Job> {
        self.jobs
            .iter()
            .map(|entry| entry.record.read().unwrap().clone())
            .filter(|job| status.map_or(true, |s| job.status == s))
            .collect()
    }

    /// All jobs belonging to the given draw.
    pub fn by_draw(&self, draw_id: i64) -> Vec<Job> {
        self.jobs
            .iter()
            .map(|entry| entry.record.read().unwrap().clone())
            .filter(|job| job.draw_id == draw_id)
            .collect()
    }

    /// Drops terminal records older than `max_age`. Returns how many were
    /// removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.jobs.len();
        self.jobs.retain(|_, entry| {
            let job = entry.record.read().unwrap();
            match job.completed_at {
                Some(done) => done >= cutoff,
                None => true,
            }
        });
        let removed = before - self.jobs.len();
        if removed > 0 {
            debug!("cleaned up {removed} finished job(s)");
        }
        removed
    }

    /// Counts of jobs by status.
    pub fn stats(&self) -> JobStats {
        let mut stats = JobStats::default();
        for entry in self.jobs.iter() {
            match entry.record.read().unwrap().status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    fn emit(&self, message_type: &'static str, payload: Value) {
        if let Some(tx) = &self.event_tx {
            // The pump may be gone during shutdown; dropping the event then
            // is fine.
            let _ = tx.send((message_type, payload));
        }
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
