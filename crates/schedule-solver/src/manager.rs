//! In-process solver manager.
//!
//! Each accepted problem gets a run entry holding its status and stop flag.
//! A Tokio task waits for one of the solver slots, then drives the search on
//! the blocking pool and routes errors and panics to the run's sink. Runs are
//! dropped from the table once they are over, which is what makes finished
//! jobs report `NotSolving`.

use crate::{
	search::{self, SearchConfig},
	SolutionSink, SolveError, SolverEngine,
};
use dashmap::{mapref::entry::Entry, DashMap};
use schedule_types::{JobId, LeaderSchedule, SolverStatus};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Configuration of the solver manager.
#[derive(Debug, Clone)]
pub struct SolverManagerConfig {
	/// Number of problems solved at the same time. Further runs wait.
	pub parallel_solver_count: usize,
	pub search: SearchConfig,
}

impl Default for SolverManagerConfig {
	fn default() -> Self {
		Self {
			parallel_solver_count: 2,
			search: SearchConfig::default(),
		}
	}
}

const NOT_STARTED: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

struct SolverRun {
	state: AtomicU8,
	stop: Arc<AtomicBool>,
}

impl SolverRun {
	fn new() -> Self {
		Self {
			state: AtomicU8::new(NOT_STARTED),
			stop: Arc::new(AtomicBool::new(false)),
		}
	}

	fn status(&self) -> SolverStatus {
		match self.state.load(Ordering::Acquire) {
			NOT_STARTED => SolverStatus::NotStarted,
			RUNNING => SolverStatus::Running,
			_ => SolverStatus::NotSolving,
		}
	}

	/// Moves a queued run to `to`. Fails if the run already left the queue.
	fn leave_queue(&self, to: u8) -> bool {
		self.state
			.compare_exchange(NOT_STARTED, to, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
	}

	fn request_stop(&self) {
		self.stop.store(true, Ordering::Release);
	}

	fn stop_requested(&self) -> bool {
		self.stop.load(Ordering::Acquire)
	}
}

/// Runs searches on the Tokio runtime it was created with.
pub struct LocalSolverManager {
	runs: Arc<DashMap<JobId, Arc<SolverRun>>>,
	slots: Arc<Semaphore>,
	search: SearchConfig,
	runtime: Handle,
}

impl LocalSolverManager {
	pub fn new(config: SolverManagerConfig, runtime: Handle) -> Self {
		let slots = config.parallel_solver_count.max(1);
		info!(parallel_solver_count = slots, "Creating solver manager");
		Self {
			runs: Arc::new(DashMap::new()),
			slots: Arc::new(Semaphore::new(slots)),
			search: config.search,
			runtime,
		}
	}

	/// Number of runs that are scheduled or solving.
	#[cfg(test)]
	fn active_runs(&self) -> usize {
		self.runs.len()
	}
}

impl SolverEngine for LocalSolverManager {
	fn start_solving(&self, job_id: JobId, problem: LeaderSchedule, sink: Arc<dyn SolutionSink>) {
		let run = Arc::new(SolverRun::new());
		let registered = match self.runs.entry(job_id) {
			Entry::Occupied(_) => false,
			Entry::Vacant(vacant) => {
				vacant.insert(run.clone());
				true
			}
		};
		if !registered {
			warn!(%job_id, "Rejecting duplicate solve request");
			sink.failed(&job_id, SolveError::AlreadySolving(job_id));
			return;
		}

		let runs = self.runs.clone();
		let slots = self.slots.clone();
		let search_config = self.search.clone();

		self.runtime.spawn(async move {
			let permit = match slots.acquire_owned().await {
				Ok(permit) => permit,
				Err(e) => {
					sink.failed(&job_id, SolveError::Aborted(e.to_string()));
					runs.remove(&job_id);
					return;
				}
			};

			if run.stop_requested() || !run.leave_queue(RUNNING) {
				debug!(%job_id, "Run terminated before it started");
				runs.remove(&job_id);
				return;
			}
			info!(%job_id, "Solving started");

			let stop = run.stop.clone();
			let worker_sink = sink.clone();
			let outcome = tokio::task::spawn_blocking(move || {
				search::solve(problem, &search_config, &stop, |best| {
					worker_sink.best_solution(best.clone())
				})
			})
			.await;
			drop(permit);

			// The sink hears about a failure before the run stops reporting as solving.
			match outcome {
				Ok(Ok(best)) => {
					info!(%job_id, score = ?best.score, "Solving ended");
				}
				Ok(Err(e)) => {
					error!(%job_id, error = %e, "Solving failed");
					sink.failed(&job_id, e);
				}
				Err(join_error) => {
					let e = if join_error.is_panic() {
						SolveError::Panicked(panic_message(join_error.into_panic()))
					} else {
						SolveError::Aborted(join_error.to_string())
					};
					error!(%job_id, error = %e, "Solver worker died");
					sink.failed(&job_id, e);
				}
			}

			runs.remove(&job_id);
		});
	}

	fn status(&self, job_id: &JobId) -> SolverStatus {
		self.runs
			.get(job_id)
			.map(|run| run.status())
			.unwrap_or(SolverStatus::NotSolving)
	}

	fn terminate_early(&self, job_id: &JobId) {
		let Some(run) = self.runs.get(job_id).map(|r| Arc::clone(r.value())) else {
			debug!(%job_id, "Terminate requested for a job that is not solving");
			return;
		};
		run.request_stop();
		info!(%job_id, "Termination requested");

		// A queued run will never call its sink once cancelled; stop reporting it now.
		if run.leave_queue(CANCELLED) {
			self.runs.remove(job_id);
		}
	}

	fn terminate_all(&self) {
		info!(runs = self.runs.len(), "Terminating all solver runs");
		for run in self.runs.iter() {
			run.request_stop();
		}
	}
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}
