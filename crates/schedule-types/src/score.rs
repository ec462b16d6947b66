//! Two-level score used to rank schedules.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Hard constraints dominate soft ones: any schedule with a better hard score
/// beats every schedule with a worse one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HardSoftScore {
	pub hard: i64,
	pub soft: i64,
}

impl HardSoftScore {
	pub const ZERO: HardSoftScore = HardSoftScore { hard: 0, soft: 0 };

	pub fn new(hard: i64, soft: i64) -> Self {
		Self { hard, soft }
	}

	pub fn of_hard(hard: i64) -> Self {
		Self { hard, soft: 0 }
	}

	pub fn of_soft(soft: i64) -> Self {
		Self { hard: 0, soft }
	}

	/// No hard constraint is broken.
	pub fn is_feasible(&self) -> bool {
		self.hard >= 0
	}
}

impl Add for HardSoftScore {
	type Output = HardSoftScore;

	fn add(self, rhs: Self) -> Self::Output {
		HardSoftScore::new(self.hard + rhs.hard, self.soft + rhs.soft)
	}
}

impl AddAssign for HardSoftScore {
	fn add_assign(&mut self, rhs: Self) {
		self.hard += rhs.hard;
		self.soft += rhs.soft;
	}
}

impl fmt::Display for HardSoftScore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}hard/{}soft", self.hard, self.soft)
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid score '{0}', expected '<hard>hard/<soft>soft'")]
pub struct ScoreParseError(pub String);

impl FromStr for HardSoftScore {
	type Err = ScoreParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ScoreParseError(s.to_string());
		let (hard, soft) = s.trim().split_once('/').ok_or_else(err)?;
		let hard = hard
			.strip_suffix("hard")
			.and_then(|v| v.parse().ok())
			.ok_or_else(err)?;
		let soft = soft
			.strip_suffix("soft")
			.and_then(|v| v.parse().ok())
			.ok_or_else(err)?;
		Ok(Self { hard, soft })
	}
}

impl Serialize for HardSoftScore {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for HardSoftScore {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hard_dominates_soft() {
		assert!(HardSoftScore::new(0, -100) > HardSoftScore::new(-1, 100));
		assert!(HardSoftScore::new(-1, 5) > HardSoftScore::new(-1, 4));
	}

	#[test]
	fn test_display_and_parse() {
		let score = HardSoftScore::new(-2, 17);
		assert_eq!(score.to_string(), "-2hard/17soft");
		assert_eq!("-2hard/17soft".parse::<HardSoftScore>(), Ok(score));
		assert!("-2/17".parse::<HardSoftScore>().is_err());
		assert!("garbage".parse::<HardSoftScore>().is_err());
	}

	#[test]
	fn test_serialized_as_string() {
		let json = serde_json::to_string(&HardSoftScore::new(0, 3)).unwrap();
		assert_eq!(json, "\"0hard/3soft\"");
		let back: HardSoftScore = serde_json::from_str(&json).unwrap();
		assert!(back.is_feasible());
	}
}
