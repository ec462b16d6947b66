//! Job identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier handed out when a schedule is submitted.
///
/// Backed by a random v4 UUID, so identifiers are never reused within or
/// across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
	pub fn new() -> Self {
		Self(uuid::Uuid::new_v4())
	}

	pub fn from_bytes(bytes: [u8; 16]) -> Self {
		Self(uuid::Uuid::from_bytes(bytes))
	}
}

impl Default for JobId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for JobId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		uuid::Uuid::parse_str(s).map(Self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_job_id_generation() {
		let id1 = JobId::new();
		let id2 = JobId::new();
		assert_ne!(id1, id2);

		let bytes = [7u8; 16];
		assert_eq!(JobId::from_bytes(bytes), JobId::from_bytes(bytes));
	}

	#[test]
	fn test_job_id_round_trips_through_string() {
		let id = JobId::new();
		let parsed: JobId = id.to_string().parse().unwrap();
		assert_eq!(parsed, id);
		assert!("not-a-job".parse::<JobId>().is_err());
	}
}
