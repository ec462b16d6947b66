//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: ServiceConfig,
	#[serde(default)]
	pub jobs: JobsConfig,
	#[serde(default)]
	pub solver: SolverSettings,
	#[serde(default)]
	pub demo: DemoConfig,
}

/// HTTP listener and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	#[serde(default)]
	pub log_format: LogFormat,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			log_level: default_log_level(),
			log_format: LogFormat::default(),
		}
	}
}

impl ServiceConfig {
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

/// Job retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
	/// Completed jobs kept queryable. Running jobs do not count.
	#[serde(default = "default_max_completed_jobs")]
	pub max_completed_jobs_retained: usize,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			max_completed_jobs_retained: default_max_completed_jobs(),
		}
	}
}

/// Search limits and parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
	#[serde(default = "default_spent_limit_secs")]
	pub spent_limit_secs: u64,
	#[serde(default)]
	pub unimproved_spent_limit_secs: Option<u64>,
	#[serde(default = "default_parallel_solver_count")]
	pub parallel_solver_count: usize,
	#[serde(default)]
	pub random_seed: Option<u64>,
}

impl Default for SolverSettings {
	fn default() -> Self {
		Self {
			spent_limit_secs: default_spent_limit_secs(),
			unimproved_spent_limit_secs: None,
			parallel_solver_count: default_parallel_solver_count(),
			random_seed: None,
		}
	}
}

impl SolverSettings {
	pub fn spent_limit(&self) -> Duration {
		Duration::from_secs(self.spent_limit_secs)
	}

	pub fn unimproved_spent_limit(&self) -> Option<Duration> {
		self.unimproved_spent_limit_secs.map(Duration::from_secs)
	}
}

/// Demo problem source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
	/// Roster to build the demo problem from: a `.csv` survey export or a JSON
	/// array of entries. The built-in roster is used when unset.
	#[serde(default)]
	pub roster_path: Option<PathBuf>,
}

fn default_host() -> String {
	"0.0.0.0".to_string()
}

fn default_port() -> u16 {
	8080
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_completed_jobs() -> usize {
	2
}

fn default_spent_limit_secs() -> u64 {
	30
}

fn default_parallel_solver_count() -> usize {
	2
}
