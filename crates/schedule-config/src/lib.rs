// schedule-config/src/lib.rs

use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod loader;
pub mod types;

pub use types::{Config, DemoConfig, JobsConfig, LogFormat, ServiceConfig, SolverSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Unsupported config format: {0}")]
	UnsupportedFormat(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SCHEDULE_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the file if one was given, else defaults, then applies
	/// environment overrides and validates the result.
	pub async fn load(&self) -> Result<Config, ConfigError> {
		let mut config = match &self.file_path {
			Some(path) => self.load_from_file(path).await?,
			None => {
				info!("No configuration file given, using defaults");
				Config::default()
			}
		};

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, path: &Path) -> Result<Config, ConfigError> {
		info!("Loading configuration from {:?}", path);
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::FileNotFound(path.display().to_string())
			} else {
				ConfigError::IoError(e)
			}
		})?;

		let substituted_content = substitute_env_vars(&content)?;
		loader::parse(path, &substituted_content)
	}

	fn env_var(&self, name: &str) -> Option<String> {
		env::var(format!("{}{}", self.env_prefix, name)).ok()
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Some(host) = self.env_var("HOST") {
			debug!("Overriding host from environment");
			config.service.host = host;
		}

		if let Some(port) = self.env_var("PORT") {
			config.service.port = port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid port: {}", e)))?;
		}

		if let Some(log_level) = self.env_var("LOG_LEVEL") {
			config.service.log_level = log_level;
		}

		if let Some(max_jobs) = self.env_var("MAX_COMPLETED_JOBS") {
			config.jobs.max_completed_jobs_retained = max_jobs.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid completed job limit: {}", e))
			})?;
		}

		if let Some(spent_limit) = self.env_var("SPENT_LIMIT_SECS") {
			config.solver.spent_limit_secs = spent_limit.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid spent limit: {}", e))
			})?;
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the value of that environment variable.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
	if config.service.port == 0 {
		return Err(ConfigError::ValidationError(
			"Service port must be non-zero".to_string(),
		));
	}

	if config.solver.parallel_solver_count == 0 {
		return Err(ConfigError::ValidationError(
			"At least one parallel solver is required".to_string(),
		));
	}

	if config.solver.spent_limit_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Spent limit must be at least one second".to_string(),
		));
	}

	if config.solver.unimproved_spent_limit_secs == Some(0) {
		return Err(ConfigError::ValidationError(
			"Unimproved spent limit must be at least one second".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_without_file_uses_defaults() {
		let config = ConfigLoader::new()
			.with_env_prefix("SCHEDULE_TEST_DEFAULTS_")
			.load()
			.await
			.unwrap();
		assert_eq!(config, Config::default());
	}

	#[tokio::test]
	async fn test_load_toml_file() {
		let file = config_file(".toml", "[jobs]\nmax_completed_jobs_retained = 7\n");

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("SCHEDULE_TEST_TOML_")
			.load()
			.await
			.unwrap();
		assert_eq!(config.jobs.max_completed_jobs_retained, 7);
	}

	#[tokio::test]
	async fn test_env_substitution() {
		env::set_var("SCHEDULE_TEST_ROSTER_FILE", "/srv/roster.json");
		let file = config_file(
			".yaml",
			"demo:\n  roster_path: \"${SCHEDULE_TEST_ROSTER_FILE}\"\n",
		);

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("SCHEDULE_TEST_SUBST_")
			.load()
			.await
			.unwrap();
		assert_eq!(
			config.demo.roster_path.as_deref(),
			Some(Path::new("/srv/roster.json"))
		);
	}

	#[tokio::test]
	async fn test_missing_env_var_in_file() {
		let file = config_file(".toml", "[service]\nhost = \"${SCHEDULE_TEST_UNSET_HOST}\"\n");

		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(
			result,
			Err(ConfigError::EnvVarNotFound(name)) if name == "SCHEDULE_TEST_UNSET_HOST"
		));
	}

	#[tokio::test]
	async fn test_env_overrides() {
		env::set_var("SCHEDULE_TEST_OVR_PORT", "9090");
		env::set_var("SCHEDULE_TEST_OVR_MAX_COMPLETED_JOBS", "4");
		env::set_var("SCHEDULE_TEST_OVR_SPENT_LIMIT_SECS", "5");
		env::set_var("SCHEDULE_TEST_OVR_LOG_LEVEL", "debug");

		let config = ConfigLoader::new()
			.with_env_prefix("SCHEDULE_TEST_OVR_")
			.load()
			.await
			.unwrap();
		assert_eq!(config.service.port, 9090);
		assert_eq!(config.jobs.max_completed_jobs_retained, 4);
		assert_eq!(config.solver.spent_limit_secs, 5);
		assert_eq!(config.service.log_level, "debug");
	}

	#[tokio::test]
	async fn test_invalid_env_override() {
		env::set_var("SCHEDULE_TEST_BAD_PORT", "not-a-port");

		let result = ConfigLoader::new()
			.with_env_prefix("SCHEDULE_TEST_BAD_")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_missing_file() {
		let result = ConfigLoader::new()
			.with_file("/nonexistent/schedule.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
	}

	#[test]
	fn test_validation() {
		let mut config = Config::default();
		assert!(validate_config(&config).is_ok());

		config.solver.parallel_solver_count = 0;
		assert!(validate_config(&config).is_err());

		let mut config = Config::default();
		config.solver.spent_limit_secs = 0;
		assert!(validate_config(&config).is_err());

		let mut config = Config::default();
		config.service.port = 0;
		assert!(validate_config(&config).is_err());
	}
}
