//! Asynchronous job orchestration for schedule solving.
//!
//! A submitted schedule becomes a job: the [`JobOrchestrator`] seeds a
//! [`JobRecord`] in the [`JobRegistry`], hands the problem to a
//! [`SolverEngine`](schedule_solver::SolverEngine) and returns the job id
//! without waiting. The engine reports progress through a per-job sink that
//! replaces the job's record on every new best solution or failure. Callers
//! poll by id, may terminate early, and completed jobs beyond the retention
//! budget are evicted oldest first after every submission.

pub mod clock;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod registry;
pub mod retention;

pub use clock::MonotonicClock;
pub use error::OrchestratorError;
pub use job::{JobRecord, JobSnapshot, JobStatusSummary};
pub use orchestrator::JobOrchestrator;
pub use registry::JobRegistry;
pub use retention::{EvictionCandidate, RetentionPolicy};
