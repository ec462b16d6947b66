// schedule-core/src/error.rs

use schedule_solver::SolveError;
use schedule_types::{JobId, ValidationError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
	#[error("No schedule found for job {0}")]
	NotFound(JobId),

	#[error("Solving job {job_id} failed: {cause}")]
	SolverFailure { job_id: JobId, cause: SolveError },

	#[error("Invalid schedule: {0}")]
	InvalidProblem(#[from] ValidationError),
}

impl OrchestratorError {
	/// Job the error refers to, if any.
	pub fn job_id(&self) -> Option<JobId> {
		match self {
			Self::NotFound(job_id) | Self::SolverFailure { job_id, .. } => Some(*job_id),
			Self::InvalidProblem(_) => None,
		}
	}
}
