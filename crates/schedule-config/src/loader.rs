//! Parsing configuration documents by format.

use crate::{types::Config, ConfigError};
use std::path::Path;

/// Parses `contents` in the format implied by the file extension of `path`.
pub fn parse(path: &Path, contents: &str) -> Result<Config, ConfigError> {
	match path.extension().and_then(|s| s.to_str()) {
		Some("toml") => from_toml(contents),
		Some("json") => from_json(contents),
		Some("yaml") | Some("yml") => from_yaml(contents),
		_ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
	}
}

pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
	toml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("TOML: {}", e)))
}

pub fn from_json(contents: &str) -> Result<Config, ConfigError> {
	serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(format!("JSON: {}", e)))
}

pub fn from_yaml(contents: &str) -> Result<Config, ConfigError> {
	serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("YAML: {}", e)))
}
