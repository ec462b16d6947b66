//! Construction heuristic and local search.
//!
//! The search is synchronous and CPU-bound; callers run it on a blocking
//! worker. It polls a shared stop flag between steps so it can be terminated
//! cooperatively.

use crate::{constraints::calculate_score, SolveError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use schedule_types::{validate_schedule, HardSoftScore, LeaderSchedule};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Stopping conditions and randomness of a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
	/// Wall-clock budget of the whole run.
	pub spent_limit: Duration,
	/// Stop after this long without a new best solution.
	pub unimproved_spent_limit: Option<Duration>,
	/// Fixed seed for reproducible runs.
	pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			spent_limit: Duration::from_secs(30),
			unimproved_spent_limit: None,
			random_seed: None,
		}
	}
}

struct Termination<'a> {
	stop: &'a AtomicBool,
	started: Instant,
	last_improvement: Instant,
	config: &'a SearchConfig,
}

impl<'a> Termination<'a> {
	fn new(stop: &'a AtomicBool, config: &'a SearchConfig) -> Self {
		let now = Instant::now();
		Self {
			stop,
			started: now,
			last_improvement: now,
			config,
		}
	}

	fn improved(&mut self) {
		self.last_improvement = Instant::now();
	}

	fn is_terminated(&self) -> bool {
		if self.stop.load(Ordering::Acquire) {
			return true;
		}
		if self.started.elapsed() >= self.config.spent_limit {
			return true;
		}
		matches!(self.config.unimproved_spent_limit, Some(limit) if self.last_improvement.elapsed() >= limit)
	}
}

/// Solves `problem`, reporting every new best solution to `on_best`.
///
/// Returns the best solution found. If `stop` is already set on entry the
/// problem is returned untouched and `on_best` is never called.
pub fn solve<F>(
	problem: LeaderSchedule,
	config: &SearchConfig,
	stop: &AtomicBool,
	mut on_best: F,
) -> Result<LeaderSchedule, SolveError>
where
	F: FnMut(&LeaderSchedule),
{
	validate_schedule(&problem)?;

	let mut termination = Termination::new(stop, config);
	if termination.is_terminated() {
		return Ok(problem);
	}

	let mut working = problem;
	construct(&mut working, &termination);
	let mut current = calculate_score(&working);
	working.score = Some(current);
	let mut best = working.clone();
	on_best(&best);
	termination.improved();

	let mut rng = match config.random_seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};
	let mut steps: u64 = 0;

	while !termination.is_terminated() {
		let Some(undo) = random_move(&mut working, &mut rng) else {
			debug!("No moves available, ending search");
			break;
		};
		steps += 1;

		let score = calculate_score(&working);
		if score >= current {
			current = score;
			if Some(score) > best.score {
				working.score = Some(score);
				best = working.clone();
				on_best(&best);
				termination.improved();
				debug!(%score, steps, "New best solution");
			}
		} else {
			undo.apply(&mut working);
		}
	}

	debug!(steps, score = ?best.score, "Search finished");
	Ok(best)
}

/// Greedily places every unassigned leader in the group that scores best.
fn construct(schedule: &mut LeaderSchedule, termination: &Termination<'_>) {
	let group_names: Vec<String> = schedule.groups.iter().map(|g| g.name.clone()).collect();

	for index in 0..schedule.leaders.len() {
		if schedule.leaders[index].group.is_some() {
			continue;
		}
		if termination.is_terminated() {
			return;
		}

		let mut best: Option<(HardSoftScore, &String)> = None;
		for name in &group_names {
			schedule.leaders[index].group = Some(name.clone());
			let score = calculate_score(schedule);
			if best.map_or(true, |(s, _)| score > s) {
				best = Some((score, name));
			}
		}
		schedule.leaders[index].group = best.map(|(_, name)| name.clone());
	}
}

/// Previous assignments touched by a move.
struct Undo(Vec<(usize, Option<String>)>);

impl Undo {
	fn apply(self, schedule: &mut LeaderSchedule) {
		for (index, group) in self.0 {
			schedule.leaders[index].group = group;
		}
	}
}

/// Applies a random change or swap move and returns how to revert it.
///
/// `None` when the problem admits no move at all.
fn random_move(schedule: &mut LeaderSchedule, rng: &mut StdRng) -> Option<Undo> {
	let leader_count = schedule.leaders.len();
	let group_count = schedule.groups.len();
	if leader_count == 0 || group_count < 2 {
		return None;
	}

	if leader_count >= 2 && rng.gen_bool(0.5) {
		let a = rng.gen_range(0..leader_count);
		let b = rng.gen_range(0..leader_count);
		if a != b && schedule.leaders[a].group != schedule.leaders[b].group {
			let undo = Undo(vec![
				(a, schedule.leaders[a].group.clone()),
				(b, schedule.leaders[b].group.clone()),
			]);
			let group_a = schedule.leaders[a].group.take();
			schedule.leaders[a].group = schedule.leaders[b].group.take();
			schedule.leaders[b].group = group_a;
			return Some(undo);
		}
	}

	let index = rng.gen_range(0..leader_count);
	let target = schedule.groups[rng.gen_range(0..group_count)].name.clone();
	let undo = Undo(vec![(index, schedule.leaders[index].group.clone())]);
	schedule.leaders[index].group = Some(target);
	Some(undo)
}
