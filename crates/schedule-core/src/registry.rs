//! Concurrent job registry.

use crate::job::JobRecord;
use dashmap::DashMap;
use schedule_types::JobId;
use std::sync::Arc;

/// Maps each tracked job to its latest record.
///
/// Every operation locks at most one shard for the duration of a pointer swap
/// or clone, so solver callbacks and callers can hit the registry from any
/// thread without coordinating.
#[derive(Debug, Default)]
pub struct JobRegistry {
	jobs: DashMap<JobId, Arc<JobRecord>>,
}

impl JobRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces the record for `job_id`.
	pub fn put(&self, job_id: JobId, record: JobRecord) {
		self.jobs.insert(job_id, Arc::new(record));
	}

	/// Replaces the record for `job_id` with one derived from the current record.
	///
	/// Returns `false` and leaves the registry untouched when the job is not
	/// tracked, so a late callback can never bring back an evicted job.
	pub fn update<F>(&self, job_id: &JobId, next: F) -> bool
	where
		F: FnOnce(&JobRecord) -> JobRecord,
	{
		match self.jobs.get_mut(job_id) {
			Some(mut entry) => {
				let record = next(entry.value());
				*entry.value_mut() = Arc::new(record);
				true
			}
			None => false,
		}
	}

	pub fn get(&self, job_id: &JobId) -> Option<Arc<JobRecord>> {
		self.jobs.get(job_id).map(|entry| Arc::clone(entry.value()))
	}

	/// Snapshot of the tracked ids, in no particular order.
	pub fn keys(&self) -> Vec<JobId> {
		self.jobs.iter().map(|entry| *entry.key()).collect()
	}

	/// Removes the record for `job_id`. Removing an unknown id is a no-op.
	pub fn remove(&self, job_id: &JobId) -> Option<Arc<JobRecord>> {
		self.jobs.remove(job_id).map(|(_, record)| record)
	}

	pub fn contains(&self, job_id: &JobId) -> bool {
		self.jobs.contains_key(job_id)
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}
}
