use serde::{Deserialize, Serialize};
use std::fmt;

/// Solver-side state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
	/// Accepted, waiting for a free solver slot.
	NotStarted,
	/// Actively searching.
	Running,
	/// Finished, terminated, failed or unknown to the solver.
	NotSolving,
}

impl SolverStatus {
	pub fn is_solving(&self) -> bool {
		!matches!(self, SolverStatus::NotSolving)
	}
}

impl fmt::Display for SolverStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotStarted => write!(f, "NOT_STARTED"),
			Self::Running => write!(f, "RUNNING"),
			Self::NotSolving => write!(f, "NOT_SOLVING"),
		}
	}
}
