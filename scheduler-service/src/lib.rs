//! # Scheduler-Service: Job Orchestration for Fixture Optimization
//!
//! The async layer over [`scheduler_core`]: a job manager that runs
//! optimizations as concurrent, cancellable, observable tasks, the
//! repository and broadcaster ports to the outside world, and a service
//! facade wiring it all together.
//!
//! The HTTP surface, real persistence and the push channel live outside
//! this workspace; they talk to this crate through the [`ports`] traits.
//!
//! ## Slow-sink policy
//!
//! Broadcaster implementations may lag. Job workers never wait on them:
//! every event goes through an unbounded in-process buffer drained by a
//! single pump task, so events are **buffered, not dropped**, and per-job
//! ordering (`started`, `progress*`, terminal) is preserved.

pub mod events;
pub mod jobs;
pub mod ports;
pub mod service;

pub use jobs::{Job, JobManager, JobStats, JobStatus};
pub use ports::{Broadcaster, Repository, RepositoryError, RepositoryTx};
pub use service::{DrawService, ServiceError};
