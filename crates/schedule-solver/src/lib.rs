//! Solver engine for leader schedules.
//!
//! The job layer talks to the engine only through [`SolverEngine`] and hands it
//! a [`SolutionSink`] per job. Everything the search produces, including
//! failures, comes back through the sink from the solver's own execution
//! context; nothing is returned to the caller of
//! [`SolverEngine::start_solving`].
//!
//! [`LocalSolverManager`] is the in-process implementation: it runs a
//! construction heuristic followed by local search on Tokio's blocking pool,
//! with a bounded number of concurrent runs.

use schedule_types::{JobId, LeaderSchedule, SolverStatus, ValidationError};
use std::sync::Arc;
use thiserror::Error;

pub mod constraints;
pub mod manager;
pub mod search;

pub use constraints::{
	analyze, calculate_score, ConstraintAnalysis, ConstraintMatch, FetchPolicy, ScoreAnalysis,
};
pub use manager::{LocalSolverManager, SolverManagerConfig};
pub use search::SearchConfig;

/// Errors raised inside a background solver run.
///
/// These never cross back to the submitter; they are delivered to
/// [`SolutionSink::failed`] and stored with the job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
	#[error("Problem rejected by solver: {0}")]
	InvalidProblem(#[from] ValidationError),

	#[error("Job {0} is already being solved")]
	AlreadySolving(JobId),

	#[error("Solver worker panicked: {0}")]
	Panicked(String),

	#[error("Solver run aborted: {0}")]
	Aborted(String),
}

/// Receives the progress of a single solver run.
///
/// Implementations are called from the solver's worker threads, concurrently
/// with anything else the process is doing.
pub trait SolutionSink: Send + Sync {
	/// A new best solution was found.
	fn best_solution(&self, solution: LeaderSchedule);

	/// The run ended abnormally. Called at most once, and never followed by
	/// another `best_solution`.
	fn failed(&self, job_id: &JobId, error: SolveError);
}

/// The background solver as seen by the job layer.
pub trait SolverEngine: Send + Sync {
	/// Schedules `problem` for solving and returns immediately.
	///
	/// The run is registered before this returns, so `status` reports
	/// `NotStarted` or `Running` from then on until the run is over.
	fn start_solving(&self, job_id: JobId, problem: LeaderSchedule, sink: Arc<dyn SolutionSink>);

	/// Current status of the run for `job_id`. Unknown ids are `NotSolving`.
	fn status(&self, job_id: &JobId) -> SolverStatus;

	/// Asks the run to stop at its next checkpoint. No-op if it is not solving.
	fn terminate_early(&self, job_id: &JobId);

	/// Asks every run to stop.
	fn terminate_all(&self);
}
