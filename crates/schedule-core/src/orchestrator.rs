// schedule-core/src/orchestrator.rs

use crate::{
	clock::MonotonicClock,
	error::OrchestratorError,
	job::{JobRecord, JobSnapshot, JobStatusSummary},
	registry::JobRegistry,
	retention::RetentionPolicy,
};
use dashmap::DashSet;
use schedule_solver::{FetchPolicy, ScoreAnalysis, SolutionSink, SolveError, SolverEngine};
use schedule_types::{validate_schedule, JobId, LeaderSchedule, SolverStatus};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Public job operations over a registry and a solver engine.
///
/// None of the operations wait for solving; they only touch the registry and
/// ask the engine for status.
pub struct JobOrchestrator {
	registry: Arc<JobRegistry>,
	engine: Arc<dyn SolverEngine>,
	retention: RetentionPolicy,
	clock: Arc<MonotonicClock>,
	/// Jobs seeded in the registry whose engine run is not registered yet.
	launching: DashSet<JobId>,
}

impl JobOrchestrator {
	pub fn new(
		registry: Arc<JobRegistry>,
		engine: Arc<dyn SolverEngine>,
		retention: RetentionPolicy,
	) -> Self {
		info!(
			max_completed_jobs = retention.max_completed_jobs(),
			"Creating job orchestrator"
		);
		Self {
			registry,
			engine,
			retention,
			clock: Arc::new(MonotonicClock::new()),
			launching: DashSet::new(),
		}
	}

	/// Starts solving `problem` in the background and returns its job id.
	///
	/// Only a problem that fails validation is rejected. Anything that goes
	/// wrong later is stored with the job.
	#[instrument(skip_all, fields(leaders = problem.leaders.len(), groups = problem.groups.len()))]
	pub fn submit(&self, problem: LeaderSchedule) -> Result<JobId, OrchestratorError> {
		validate_schedule(&problem)?;

		let job_id = JobId::new();
		self.launching.insert(job_id);
		self.registry
			.put(job_id, JobRecord::seeded(problem.clone(), self.clock.now()));

		let sink = Arc::new(JobSink {
			job_id,
			registry: self.registry.clone(),
			clock: self.clock.clone(),
		});
		self.engine.start_solving(job_id, problem, sink);
		self.launching.remove(&job_id);
		info!(%job_id, "Job submitted");

		self.evict_completed();
		Ok(job_id)
	}

	/// Latest schedule of the job along with its live status.
	pub fn get_latest(&self, job_id: &JobId) -> Result<JobSnapshot, OrchestratorError> {
		let record = self.healthy_record(job_id)?;
		let status = self.engine.status(job_id);
		Ok(JobSnapshot::new(*job_id, &record, status))
	}

	/// Score and status only, for frequent polling.
	pub fn get_status(&self, job_id: &JobId) -> Result<JobStatusSummary, OrchestratorError> {
		let record = self.healthy_record(job_id)?;
		Ok(JobStatusSummary {
			job_id: *job_id,
			score: record.result().score,
			status: self.engine.status(job_id),
		})
	}

	/// Asks the engine to stop the job, then reports its latest state.
	///
	/// Stopping is cooperative, so the returned status may still be
	/// `Running` for a short while.
	#[instrument(skip(self))]
	pub fn terminate(&self, job_id: &JobId) -> Result<JobSnapshot, OrchestratorError> {
		self.engine.terminate_early(job_id);
		self.get_latest(job_id)
	}

	/// Ids of all tracked jobs.
	///
	/// Retention is applied first, so completed jobs past the budget are not listed.
	pub fn list(&self) -> Vec<JobId> {
		self.evict_completed();
		self.registry.keys()
	}

	/// Scores `problem` with a per-constraint breakdown without creating a job.
	pub fn analyze(
		&self,
		problem: &LeaderSchedule,
		policy: FetchPolicy,
	) -> Result<ScoreAnalysis, OrchestratorError> {
		validate_schedule(problem)?;
		Ok(schedule_solver::analyze(problem, policy))
	}

	/// Asks every run to stop. Records stay queryable.
	pub fn shutdown(&self) {
		info!(jobs = self.registry.len(), "Stopping all jobs");
		self.engine.terminate_all();
	}

	fn healthy_record(&self, job_id: &JobId) -> Result<Arc<JobRecord>, OrchestratorError> {
		let record = self
			.registry
			.get(job_id)
			.ok_or(OrchestratorError::NotFound(*job_id))?;

		match record.failure() {
			Some(cause) => Err(OrchestratorError::SolverFailure {
				job_id: *job_id,
				cause: cause.clone(),
			}),
			None => Ok(record),
		}
	}

	fn evict_completed(&self) {
		let evicted = self.retention.enforce(&self.registry, |job_id| {
			!self.launching.contains(job_id)
				&& self.engine.status(job_id) == SolverStatus::NotSolving
		});
		if !evicted.is_empty() {
			debug!(count = evicted.len(), "Evicted completed jobs");
		}
	}
}

/// Routes one job's solver progress into the registry.
struct JobSink {
	job_id: JobId,
	registry: Arc<JobRegistry>,
	clock: Arc<MonotonicClock>,
}

impl SolutionSink for JobSink {
	fn best_solution(&self, solution: LeaderSchedule) {
		let score = solution.score;
		let at = self.clock.now();
		if self
			.registry
			.update(&self.job_id, |previous| previous.improved(solution, at))
		{
			debug!(job_id = %self.job_id, ?score, "Recorded new best solution");
		} else {
			warn!(job_id = %self.job_id, "Dropping solution for untracked job");
		}
	}

	fn failed(&self, job_id: &JobId, cause: SolveError) {
		error!(%job_id, error = %cause, "Job failed");
		let at = self.clock.now();
		if !self
			.registry
			.update(&self.job_id, |previous| previous.failed(cause, at))
		{
			warn!(job_id = %self.job_id, "Dropping failure for untracked job");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use schedule_types::{Group, Leader};
	use std::sync::Mutex;

	/// Engine that accepts runs and never reports them as solving.
	#[derive(Default)]
	struct IdleEngine {
		started: Mutex<Vec<JobId>>,
	}

	impl SolverEngine for IdleEngine {
		fn start_solving(&self, job_id: JobId, _problem: LeaderSchedule, _sink: Arc<dyn SolutionSink>) {
			self.started.lock().unwrap().push(job_id);
		}

		fn status(&self, _job_id: &JobId) -> SolverStatus {
			SolverStatus::NotSolving
		}

		fn terminate_early(&self, _job_id: &JobId) {}

		fn terminate_all(&self) {}
	}

	fn problem() -> LeaderSchedule {
		LeaderSchedule::new(vec![Leader::new("a", 1)], vec![Group::new("Kerels", 1, 1)])
	}

	#[test]
	fn test_invalid_problem_creates_no_job() {
		let registry = Arc::new(JobRegistry::new());
		let engine = Arc::new(IdleEngine::default());
		let orchestrator = JobOrchestrator::new(registry.clone(), engine.clone(), RetentionPolicy::new(2));

		let result = orchestrator.submit(LeaderSchedule::default());

		assert!(matches!(result, Err(OrchestratorError::InvalidProblem(_))));
		assert!(registry.is_empty());
		assert!(engine.started.lock().unwrap().is_empty());
	}

	#[test]
	fn test_completed_jobs_are_capped_after_submit() {
		let registry = Arc::new(JobRegistry::new());
		let engine = Arc::new(IdleEngine::default());
		let orchestrator = JobOrchestrator::new(registry.clone(), engine.clone(), RetentionPolicy::new(1));

		let ids: Vec<_> = (0..3).map(|_| orchestrator.submit(problem()).unwrap()).collect();

		assert_eq!(registry.keys(), vec![ids[2]]);
		assert_eq!(engine.started.lock().unwrap().as_slice(), ids.as_slice());
	}
}
