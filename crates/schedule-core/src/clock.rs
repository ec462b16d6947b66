//! Strictly increasing timestamps.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Wall-clock source that never hands out the same or an earlier instant twice.
///
/// Jobs are ordered by these timestamps, so two submissions landing on the
/// same clock tick (or a clock step backwards) must still order the way they
/// happened.
#[derive(Debug, Default)]
pub struct MonotonicClock {
	last_nanos: AtomicI64,
}

impl MonotonicClock {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn now(&self) -> DateTime<Utc> {
		let wall = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
		let previous = self
			.last_nanos
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
				Some(wall.max(last.saturating_add(1)))
			})
			.unwrap_or_else(|last| last);
		DateTime::from_timestamp_nanos(wall.max(previous.saturating_add(1)))
	}
}
