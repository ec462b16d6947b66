//! Leader scheduling domain model.

use crate::{score::HardSoftScore, status::SolverStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How strongly a leader wants to work with a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affinity {
	Low,
	Medium,
	High,
}

impl Affinity {
	/// Ranked choice (0 = first) to affinity. Anything past the third choice has none.
	pub fn from_rank(rank: usize) -> Option<Self> {
		match rank {
			0 => Some(Self::High),
			1 => Some(Self::Medium),
			2 => Some(Self::Low),
			_ => None,
		}
	}
}

/// A group that needs between `min_leaders` and `max_leaders` leaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
	pub name: String,
	pub min_leaders: u32,
	pub max_leaders: u32,
}

impl Group {
	pub fn new(name: impl Into<String>, min_leaders: u32, max_leaders: u32) -> Self {
		Self {
			name: name.into(),
			min_leaders,
			max_leaders,
		}
	}
}

/// A leader to be placed in exactly one group.
///
/// Colleague preferences reference other leaders by name so the schedule
/// stays a plain tree when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
	pub name: String,
	#[serde(default)]
	pub experience: u32,
	#[serde(default)]
	pub group_affinities: BTreeMap<String, Affinity>,
	#[serde(default)]
	pub preferred_leaders: Vec<String>,
	#[serde(default)]
	pub unwanted_leaders: Vec<String>,
	/// Planning variable, filled in by the solver.
	#[serde(default)]
	pub group: Option<String>,
}

impl Leader {
	pub fn new(name: impl Into<String>, experience: u32) -> Self {
		Self {
			name: name.into(),
			experience,
			group_affinities: BTreeMap::new(),
			preferred_leaders: Vec::new(),
			unwanted_leaders: Vec::new(),
			group: None,
		}
	}

	pub fn with_affinity(mut self, group: impl Into<String>, affinity: Affinity) -> Self {
		self.group_affinities.insert(group.into(), affinity);
		self
	}

	pub fn with_preferred(mut self, names: &[&str]) -> Self {
		self.preferred_leaders = names.iter().map(|n| n.to_string()).collect();
		self
	}

	pub fn with_unwanted(mut self, names: &[&str]) -> Self {
		self.unwanted_leaders = names.iter().map(|n| n.to_string()).collect();
		self
	}

	pub fn affinity_for(&self, group: &str) -> Option<Affinity> {
		self.group_affinities.get(group).copied()
	}
}

/// Problem instance and solution in one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaderSchedule {
	#[serde(default)]
	pub leaders: Vec<Leader>,
	#[serde(default)]
	pub groups: Vec<Group>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<HardSoftScore>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub solver_status: Option<SolverStatus>,
}

impl LeaderSchedule {
	pub fn new(leaders: Vec<Leader>, groups: Vec<Group>) -> Self {
		Self {
			leaders,
			groups,
			score: None,
			solver_status: None,
		}
	}

	pub fn leader(&self, name: &str) -> Option<&Leader> {
		self.leaders.iter().find(|l| l.name == name)
	}

	/// Leaders currently assigned to `group`.
	pub fn members_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Leader> + 'a {
		self.leaders
			.iter()
			.filter(move |l| l.group.as_deref() == Some(group))
	}

	pub fn unassigned_count(&self) -> usize {
		self.leaders.iter().filter(|l| l.group.is_none()).count()
	}
}
