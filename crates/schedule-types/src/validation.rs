//! Structural checks applied to a schedule before it is accepted for solving.

use crate::domain::LeaderSchedule;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Schedule has no groups")]
	NoGroups,

	#[error("Schedule has no leaders")]
	NoLeaders,

	#[error("Duplicate group name: {0}")]
	DuplicateGroup(String),

	#[error("Duplicate leader name: {0}")]
	DuplicateLeader(String),

	#[error("Group {name} has min_leaders {min} above max_leaders {max}")]
	InvalidCapacity { name: String, min: u32, max: u32 },

	#[error("Leader {leader} is assigned to unknown group {group}")]
	UnknownGroup { leader: String, group: String },
}

/// Rejects schedules the solver cannot work with.
///
/// Colleague references to unknown leaders are allowed; scoring ignores them.
pub fn validate_schedule(schedule: &LeaderSchedule) -> Result<(), ValidationError> {
	if schedule.groups.is_empty() {
		return Err(ValidationError::NoGroups);
	}
	if schedule.leaders.is_empty() {
		return Err(ValidationError::NoLeaders);
	}

	let mut group_names = HashSet::new();
	for group in &schedule.groups {
		if !group_names.insert(group.name.as_str()) {
			return Err(ValidationError::DuplicateGroup(group.name.clone()));
		}
		if group.min_leaders > group.max_leaders {
			return Err(ValidationError::InvalidCapacity {
				name: group.name.clone(),
				min: group.min_leaders,
				max: group.max_leaders,
			});
		}
	}

	let mut leader_names = HashSet::new();
	for leader in &schedule.leaders {
		if !leader_names.insert(leader.name.as_str()) {
			return Err(ValidationError::DuplicateLeader(leader.name.clone()));
		}
		if let Some(group) = &leader.group {
			if !group_names.contains(group.as_str()) {
				return Err(ValidationError::UnknownGroup {
					leader: leader.name.clone(),
					group: group.clone(),
				});
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::{Group, Leader};

	fn schedule() -> LeaderSchedule {
		LeaderSchedule::new(
			vec![Leader::new("a", 0), Leader::new("b", 1)],
			vec![Group::new("Kerels", 1, 2)],
		)
	}

	#[test]
	fn test_valid_schedule() {
		assert_eq!(validate_schedule(&schedule()), Ok(()));
	}

	#[test]
	fn test_empty_parts_rejected() {
		let mut s = schedule();
		s.groups.clear();
		assert_eq!(validate_schedule(&s), Err(ValidationError::NoGroups));

		let mut s = schedule();
		s.leaders.clear();
		assert_eq!(validate_schedule(&s), Err(ValidationError::NoLeaders));
	}

	#[test]
	fn test_duplicates_rejected() {
		let mut s = schedule();
		s.leaders.push(Leader::new("a", 3));
		assert_eq!(
			validate_schedule(&s),
			Err(ValidationError::DuplicateLeader("a".into()))
		);

		let mut s = schedule();
		s.groups.push(Group::new("Kerels", 0, 1));
		assert_eq!(
			validate_schedule(&s),
			Err(ValidationError::DuplicateGroup("Kerels".into()))
		);
	}

	#[test]
	fn test_capacity_and_assignment_checked() {
		let mut s = schedule();
		s.groups[0].min_leaders = 3;
		assert!(matches!(
			validate_schedule(&s),
			Err(ValidationError::InvalidCapacity { .. })
		));

		let mut s = schedule();
		s.leaders[0].group = Some("Nowhere".into());
		assert!(matches!(
			validate_schedule(&s),
			Err(ValidationError::UnknownGroup { .. })
		));
	}

	#[test]
	fn test_unknown_colleague_tolerated() {
		let mut s = schedule();
		s.leaders[0].preferred_leaders = vec!["ghost".into()];
		assert!(validate_schedule(&s).is_ok());
	}
}
