//! Constraint definitions and score calculation.
//!
//! Every constraint is a plain function over an [`Assignment`] view of the
//! schedule. [`calculate_score`] is what the search uses; [`analyze`] reports
//! the same numbers broken down per constraint.

use schedule_types::{Affinity, HardSoftScore, LeaderSchedule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GROUP_MINIMUM: &str = "group-minimum";
pub const GROUP_MAXIMUM: &str = "group-maximum";
pub const UNASSIGNED_LEADER: &str = "unassigned-leader";
pub const UNWANTED_COLLEAGUE: &str = "unwanted-colleague";
pub const GROUP_AFFINITY: &str = "group-affinity";
pub const PREFERRED_COLLEAGUE: &str = "preferred-colleague";
pub const EXPERIENCED_LEADER: &str = "experienced-leader";

/// How much detail [`analyze`] reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchPolicy {
	/// Totals plus every individual match.
	#[default]
	FetchAll,
	/// Totals only.
	FetchShallow,
}

/// One place where a constraint fired, with the leaders and groups involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintMatch {
	pub score: HardSoftScore,
	pub justification: Vec<String>,
}

/// Score impact and number of matches of one constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintAnalysis {
	pub name: String,
	pub score: HardSoftScore,
	pub match_count: usize,
	/// Present only for [`FetchPolicy::FetchAll`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub matches: Option<Vec<ConstraintMatch>>,
}

/// Total score of a schedule with its per-constraint breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAnalysis {
	pub score: HardSoftScore,
	pub constraints: Vec<ConstraintAnalysis>,
}

impl ScoreAnalysis {
	pub fn constraint(&self, name: &str) -> Option<&ConstraintAnalysis> {
		self.constraints.iter().find(|c| c.name == name)
	}
}

/// Lookup tables shared by all constraints.
struct Assignment<'a> {
	schedule: &'a LeaderSchedule,
	group_of: HashMap<&'a str, &'a str>,
	staffing: HashMap<&'a str, Vec<u32>>,
}

impl<'a> Assignment<'a> {
	fn new(schedule: &'a LeaderSchedule) -> Self {
		let mut group_of = HashMap::with_capacity(schedule.leaders.len());
		let mut staffing: HashMap<&str, Vec<u32>> = schedule
			.groups
			.iter()
			.map(|g| (g.name.as_str(), Vec::new()))
			.collect();

		for leader in &schedule.leaders {
			if let Some(group) = leader.group.as_deref() {
				group_of.insert(leader.name.as_str(), group);
				if let Some(members) = staffing.get_mut(group) {
					members.push(leader.experience);
				}
			}
		}

		Self {
			schedule,
			group_of,
			staffing,
		}
	}

	fn same_group(&self, a: &str, b: &str) -> bool {
		match (self.group_of.get(a), self.group_of.get(b)) {
			(Some(ga), Some(gb)) => ga == gb,
			_ => false,
		}
	}

	fn headcount(&self, group: &str) -> u32 {
		self.staffing.get(group).map_or(0, |m| m.len() as u32)
	}
}

/// Receives every match of one constraint.
///
/// `justification` is only called by tallies that keep the matches, so the
/// search never pays for building names.
trait Tally {
	fn record(&mut self, score: HardSoftScore, justification: &dyn Fn() -> Vec<String>);
}

#[derive(Default)]
struct Totals {
	score: HardSoftScore,
	match_count: usize,
}

impl Tally for Totals {
	fn record(&mut self, score: HardSoftScore, _justification: &dyn Fn() -> Vec<String>) {
		self.score += score;
		self.match_count += 1;
	}
}

#[derive(Default)]
struct Matches {
	totals: Totals,
	matches: Vec<ConstraintMatch>,
}

impl Tally for Matches {
	fn record(&mut self, score: HardSoftScore, justification: &dyn Fn() -> Vec<String>) {
		self.totals.record(score, justification);
		self.matches.push(ConstraintMatch {
			score,
			justification: justification(),
		});
	}
}

type Constraint = fn(&Assignment<'_>, &mut dyn Tally);

const CONSTRAINTS: [(&str, Constraint); 7] = [
	(GROUP_MINIMUM, group_minimum),
	(GROUP_MAXIMUM, group_maximum),
	(UNASSIGNED_LEADER, unassigned_leader),
	(UNWANTED_COLLEAGUE, unwanted_colleague),
	(GROUP_AFFINITY, group_affinity),
	(PREFERRED_COLLEAGUE, preferred_colleague),
	(EXPERIENCED_LEADER, experienced_leader),
];

fn names(parts: &[&str]) -> Vec<String> {
	parts.iter().map(|p| p.to_string()).collect()
}

fn group_minimum(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for group in &a.schedule.groups {
		let count = a.headcount(&group.name);
		if count < group.min_leaders {
			tally.record(
				HardSoftScore::of_hard(-i64::from(group.min_leaders - count)),
				&|| names(&[group.name.as_str()]),
			);
		}
	}
}

fn group_maximum(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for group in &a.schedule.groups {
		let count = a.headcount(&group.name);
		if count > group.max_leaders {
			tally.record(
				HardSoftScore::of_hard(-i64::from(count - group.max_leaders)),
				&|| names(&[group.name.as_str()]),
			);
		}
	}
}

fn unassigned_leader(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for leader in a.schedule.leaders.iter().filter(|l| l.group.is_none()) {
		tally.record(HardSoftScore::of_hard(-1), &|| names(&[leader.name.as_str()]));
	}
}

fn unwanted_colleague(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for leader in &a.schedule.leaders {
		for other in &leader.unwanted_leaders {
			if a.same_group(&leader.name, other) {
				tally.record(HardSoftScore::of_hard(-1), &|| {
					names(&[leader.name.as_str(), other.as_str()])
				});
			}
		}
	}
}

fn group_affinity(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for leader in &a.schedule.leaders {
		let Some(group) = leader.group.as_deref() else {
			continue;
		};
		let weight = match leader.affinity_for(group) {
			Some(Affinity::High) => 3,
			Some(Affinity::Medium) => 2,
			Some(Affinity::Low) => 1,
			None => -3,
		};
		tally.record(HardSoftScore::of_soft(weight), &|| names(&[leader.name.as_str(), group]));
	}
}

fn preferred_colleague(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for leader in &a.schedule.leaders {
		for other in &leader.preferred_leaders {
			if a.same_group(&leader.name, other) {
				tally.record(HardSoftScore::of_soft(1), &|| {
					names(&[leader.name.as_str(), other.as_str()])
				});
			}
		}
	}
}

fn experienced_leader(a: &Assignment<'_>, tally: &mut dyn Tally) {
	for group in &a.schedule.groups {
		let inexperienced = a
			.staffing
			.get(group.name.as_str())
			.is_some_and(|members| !members.is_empty() && members.iter().all(|&exp| exp == 0));
		if inexperienced {
			tally.record(HardSoftScore::of_soft(-2), &|| {
				std::iter::once(group.name.clone())
					.chain(a.schedule.members_of(&group.name).map(|l| l.name.clone()))
					.collect()
			});
		}
	}
}

/// Score of `schedule` under all constraints.
pub fn calculate_score(schedule: &LeaderSchedule) -> HardSoftScore {
	let assignment = Assignment::new(schedule);
	let mut totals = Totals::default();
	for (_, constraint) in &CONSTRAINTS {
		constraint(&assignment, &mut totals);
	}
	totals.score
}

/// Score of `schedule` with a per-constraint breakdown.
pub fn analyze(schedule: &LeaderSchedule, policy: FetchPolicy) -> ScoreAnalysis {
	let assignment = Assignment::new(schedule);
	let constraints: Vec<ConstraintAnalysis> = CONSTRAINTS
		.iter()
		.map(|(name, constraint)| {
			let (totals, matches) = match policy {
				FetchPolicy::FetchAll => {
					let mut tally = Matches::default();
					constraint(&assignment, &mut tally);
					(tally.totals, Some(tally.matches))
				}
				FetchPolicy::FetchShallow => {
					let mut tally = Totals::default();
					constraint(&assignment, &mut tally);
					(tally, None)
				}
			};
			ConstraintAnalysis {
				name: name.to_string(),
				score: totals.score,
				match_count: totals.match_count,
				matches,
			}
		})
		.collect();
	let score = constraints
		.iter()
		.fold(HardSoftScore::ZERO, |acc, c| acc + c.score);

	ScoreAnalysis { score, constraints }
}

#[cfg(test)]
mod tests {
	use super::*;
	use schedule_types::{Group, Leader};

	fn assign(mut leader: Leader, group: &str) -> Leader {
		leader.group = Some(group.to_string());
		leader
	}

	#[test]
	fn test_capacity_constraints() {
		let schedule = LeaderSchedule::new(
			vec![
				assign(Leader::new("a", 1), "Toppers"),
				assign(Leader::new("b", 1), "Toppers"),
				assign(Leader::new("c", 1), "Toppers"),
			],
			vec![Group::new("Toppers", 1, 2), Group::new("Kerels", 2, 2)],
		);

		let analysis = analyze(&schedule, FetchPolicy::FetchAll);
		assert_eq!(
			analysis.constraint(GROUP_MAXIMUM).unwrap().score,
			HardSoftScore::of_hard(-1)
		);
		assert_eq!(
			analysis.constraint(GROUP_MINIMUM).unwrap().score,
			HardSoftScore::of_hard(-2)
		);
		assert_eq!(analysis.score.hard, -3);
	}

	#[test]
	fn test_unassigned_and_unwanted() {
		let schedule = LeaderSchedule::new(
			vec![
				assign(Leader::new("a", 1).with_unwanted(&["b"]), "Rakkers"),
				assign(Leader::new("b", 1), "Rakkers"),
				Leader::new("c", 0),
			],
			vec![Group::new("Rakkers", 0, 3)],
		);

		let analysis = analyze(&schedule, FetchPolicy::FetchAll);
		assert_eq!(analysis.constraint(UNASSIGNED_LEADER).unwrap().match_count, 1);
		assert_eq!(analysis.constraint(UNWANTED_COLLEAGUE).unwrap().match_count, 1);
		assert_eq!(analysis.score.hard, -2);
	}

	#[test]
	fn test_soft_constraints() {
		let schedule = LeaderSchedule::new(
			vec![
				assign(
					Leader::new("a", 0)
						.with_affinity("Speelclub", Affinity::High)
						.with_preferred(&["b", "ghost"]),
					"Speelclub",
				),
				assign(Leader::new("b", 0), "Speelclub"),
			],
			vec![Group::new("Speelclub", 2, 4)],
		);

		let analysis = analyze(&schedule, FetchPolicy::FetchAll);
		// a: +3 for high affinity, b: -3 for no affinity
		assert_eq!(
			analysis.constraint(GROUP_AFFINITY).unwrap().score,
			HardSoftScore::of_soft(0)
		);
		assert_eq!(
			analysis.constraint(PREFERRED_COLLEAGUE).unwrap().score,
			HardSoftScore::of_soft(1)
		);
		assert_eq!(
			analysis.constraint(EXPERIENCED_LEADER).unwrap().score,
			HardSoftScore::of_soft(-2)
		);
		assert_eq!(analysis.score, HardSoftScore::new(0, -1));
	}

	#[test]
	fn test_calculate_matches_analysis() {
		let schedule = LeaderSchedule::new(
			vec![
				assign(Leader::new("a", 2).with_affinity("Kerels", Affinity::Low), "Kerels"),
				Leader::new("b", 0).with_unwanted(&["a"]),
			],
			vec![Group::new("Kerels", 1, 2), Group::new("Aspiranten", 1, 2)],
		);
		assert_eq!(
			calculate_score(&schedule),
			analyze(&schedule, FetchPolicy::FetchShallow).score
		);
		assert_eq!(analyze(&schedule, FetchPolicy::FetchShallow).constraints.len(), 7);
	}

	#[test]
	fn test_fetch_all_lists_matches() {
		let schedule = LeaderSchedule::new(
			vec![
				assign(Leader::new("a", 0).with_unwanted(&["b"]), "Rakkers"),
				assign(Leader::new("b", 0), "Rakkers"),
				Leader::new("c", 1),
			],
			vec![Group::new("Rakkers", 0, 3), Group::new("Toppers", 1, 1)],
		);

		let analysis = analyze(&schedule, FetchPolicy::FetchAll);

		let unwanted = analysis.constraint(UNWANTED_COLLEAGUE).unwrap();
		let matches = unwanted.matches.as_ref().unwrap();
		assert_eq!(matches.len(), unwanted.match_count);
		assert_eq!(matches[0].justification, vec!["a", "b"]);
		assert_eq!(matches[0].score, HardSoftScore::of_hard(-1));

		let unassigned = analysis.constraint(UNASSIGNED_LEADER).unwrap();
		assert_eq!(unassigned.matches.as_ref().unwrap()[0].justification, vec!["c"]);

		let minimum = analysis.constraint(GROUP_MINIMUM).unwrap();
		assert_eq!(minimum.matches.as_ref().unwrap()[0].justification, vec!["Toppers"]);

		let experienced = analysis.constraint(EXPERIENCED_LEADER).unwrap();
		assert_eq!(
			experienced.matches.as_ref().unwrap()[0].justification,
			vec!["Rakkers", "a", "b"]
		);

		for constraint in &analysis.constraints {
			let matches = constraint.matches.as_ref().unwrap();
			let total = matches.iter().fold(HardSoftScore::ZERO, |acc, m| acc + m.score);
			assert_eq!(total, constraint.score, "{}", constraint.name);
		}
	}

	#[test]
	fn test_fetch_shallow_omits_matches() {
		let schedule = LeaderSchedule::new(
			vec![Leader::new("a", 0), Leader::new("b", 0)],
			vec![Group::new("Rakkers", 1, 2)],
		);

		let shallow = analyze(&schedule, FetchPolicy::FetchShallow);
		let full = analyze(&schedule, FetchPolicy::FetchAll);

		assert!(shallow.constraints.iter().all(|c| c.matches.is_none()));
		assert_eq!(shallow.score, full.score);
		assert_eq!(shallow.constraint(UNASSIGNED_LEADER).unwrap().match_count, 2);
		assert_eq!(
			full.constraint(UNASSIGNED_LEADER).unwrap().matches.as_ref().unwrap().len(),
			2
		);
	}
}
