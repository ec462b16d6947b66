//! Bounded retention of completed jobs.

use crate::registry::JobRegistry;
use chrono::{DateTime, Utc};
use schedule_types::JobId;
use tracing::debug;

/// A completed job that may be evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
	pub job_id: JobId,
	pub submitted_at: DateTime<Utc>,
}

/// Keeps at most `max_completed_jobs` completed jobs, dropping the oldest
/// submissions first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
	max_completed_jobs: usize,
}

impl Default for RetentionPolicy {
	fn default() -> Self {
		Self::new(2)
	}
}

impl RetentionPolicy {
	pub fn new(max_completed_jobs: usize) -> Self {
		Self { max_completed_jobs }
	}

	pub fn max_completed_jobs(&self) -> usize {
		self.max_completed_jobs
	}

	/// Picks the candidates to drop, oldest submission first.
	///
	/// Equal timestamps are ordered by the id's string form.
	pub fn select_evictions(&self, mut candidates: Vec<EvictionCandidate>) -> Vec<JobId> {
		let excess = candidates.len().saturating_sub(self.max_completed_jobs);
		if excess == 0 {
			return Vec::new();
		}

		candidates.sort_by(|a, b| {
			a.submitted_at
				.cmp(&b.submitted_at)
				.then_with(|| a.job_id.to_string().cmp(&b.job_id.to_string()))
		});
		candidates
			.into_iter()
			.take(excess)
			.map(|candidate| candidate.job_id)
			.collect()
	}

	/// Evicts surplus completed jobs from `registry`.
	///
	/// `is_completed` decides which ids are candidates at all; ids it rejects
	/// are never touched. Ids that vanished from the registry since the key
	/// snapshot are skipped.
	pub fn enforce<F>(&self, registry: &JobRegistry, is_completed: F) -> Vec<JobId>
	where
		F: Fn(&JobId) -> bool,
	{
		let candidates = registry
			.keys()
			.into_iter()
			.filter(|job_id| is_completed(job_id))
			.filter_map(|job_id| {
				registry.get(&job_id).map(|record| EvictionCandidate {
					job_id,
					submitted_at: record.submitted_at(),
				})
			})
			.collect();

		let evicted = self.select_evictions(candidates);
		for job_id in &evicted {
			registry.remove(job_id);
			debug!(%job_id, "Evicted completed job");
		}
		evicted
	}
}
