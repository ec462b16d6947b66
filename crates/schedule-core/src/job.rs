//! Job records and the read-only views handed to callers.

use chrono::{DateTime, Utc};
use schedule_solver::SolveError;
use schedule_types::{HardSoftScore, JobId, LeaderSchedule, SolverStatus};
use serde::Serialize;
use std::sync::Arc;

/// State of one job at one point in time.
///
/// Records are never changed in place. Every transition builds a new record
/// and swaps it into the registry, so a reader holding an `Arc<JobRecord>`
/// always sees one consistent state.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
	result: Arc<LeaderSchedule>,
	submitted_at: DateTime<Utc>,
	created_at: DateTime<Utc>,
	failure: Option<SolveError>,
}

impl JobRecord {
	/// Record seeded at submission, holding the problem as given.
	pub fn seeded(problem: LeaderSchedule, submitted_at: DateTime<Utc>) -> Self {
		Self {
			result: Arc::new(problem),
			submitted_at,
			created_at: submitted_at,
			failure: None,
		}
	}

	/// Successor record carrying a better solution.
	pub fn improved(&self, solution: LeaderSchedule, at: DateTime<Utc>) -> Self {
		Self {
			result: Arc::new(solution),
			submitted_at: self.submitted_at,
			created_at: at,
			failure: None,
		}
	}

	/// Terminal successor record. The last good result is kept for diagnostics.
	pub fn failed(&self, error: SolveError, at: DateTime<Utc>) -> Self {
		Self {
			result: self.result.clone(),
			submitted_at: self.submitted_at,
			created_at: at,
			failure: Some(error),
		}
	}

	/// Problem or best solution so far. Check [`failure`](Self::failure) before trusting it.
	pub fn result(&self) -> &LeaderSchedule {
		&self.result
	}

	/// When the job was submitted. Shared by every record of the job.
	pub fn submitted_at(&self) -> DateTime<Utc> {
		self.submitted_at
	}

	/// When this record was created.
	pub fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	pub fn failure(&self) -> Option<&SolveError> {
		self.failure.as_ref()
	}

	pub fn is_failed(&self) -> bool {
		self.failure.is_some()
	}
}

/// Latest schedule of a job together with its live solver status.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
	pub job_id: JobId,
	/// Copy of the stored result with `solver_status` filled in.
	pub schedule: LeaderSchedule,
	pub status: SolverStatus,
	pub submitted_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
	pub(crate) fn new(job_id: JobId, record: &JobRecord, status: SolverStatus) -> Self {
		let mut schedule = record.result().clone();
		schedule.solver_status = Some(status);
		Self {
			job_id,
			schedule,
			status,
			submitted_at: record.submitted_at(),
			updated_at: record.created_at(),
		}
	}
}

/// Lightweight polling view of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatusSummary {
	pub job_id: JobId,
	pub score: Option<HardSoftScore>,
	pub status: SolverStatus,
}
