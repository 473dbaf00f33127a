//! Configuration module for the shorthand order entry service.
//!
//! Supports loading configuration from TOML files and validates that all
//! required values are properly set before the service starts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the order entry service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for shorthand resolution.
	#[serde(default)]
	pub resolver: ResolverConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
	/// Actor name recorded on history entries written by this service.
	#[serde(default = "default_actor")]
	pub actor: String,
}

fn default_actor() -> String {
	"System".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for shorthand resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
	/// Which similarity scorer implementation to use.
	#[serde(default = "default_similarity")]
	pub similarity: String,
	/// Minimum similarity for customer fuzzy candidates.
	#[serde(default = "default_customer_threshold")]
	pub customer_threshold: u8,
	/// Minimum similarity for product fuzzy candidates. Stricter than the
	/// customer threshold because product ambiguity is costlier.
	#[serde(default = "default_product_threshold")]
	pub product_threshold: u8,
	/// Maximum number of ranked alternatives returned per token.
	#[serde(default = "default_max_alternatives")]
	pub max_alternatives: usize,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			similarity: default_similarity(),
			customer_threshold: default_customer_threshold(),
			product_threshold: default_product_threshold(),
			max_alternatives: default_max_alternatives(),
		}
	}
}

fn default_similarity() -> String {
	"levenshtein".to_string()
}

fn default_customer_threshold() -> u8 {
	60
}

fn default_product_threshold() -> u8 {
	70
}

fn default_max_alternatives() -> usize {
	5
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host address to bind to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to listen on.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

impl Config {
	/// Loads configuration from a TOML file and validates it.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path)?;
		let config: Config = toml::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates cross-field constraints not expressible through serde.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"service.id must not be empty".to_string(),
			));
		}

		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"storage.primary '{}' has no matching entry in storage.implementations",
				self.storage.primary
			)));
		}

		for (name, value) in [
			("resolver.customer_threshold", self.resolver.customer_threshold),
			("resolver.product_threshold", self.resolver.product_threshold),
		] {
			if value > 100 {
				return Err(ConfigError::Validation(format!(
					"{} must be in 0..=100, got {}",
					name, value
				)));
			}
		}

		if self.resolver.max_alternatives == 0 {
			return Err(ConfigError::Validation(
				"resolver.max_alternatives must be at least 1".to_string(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn write_config(contents: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[test]
	fn loads_minimal_config_with_defaults() {
		let file = write_config(
			r#"
			[service]
			id = "order-entry-1"

			[storage]
			primary = "memory"

			[storage.implementations.memory]
			"#,
		);

		let config = Config::from_file(file.path()).unwrap();
		assert_eq!(config.service.actor, "System");
		assert_eq!(config.resolver.customer_threshold, 60);
		assert_eq!(config.resolver.product_threshold, 70);
		assert_eq!(config.resolver.max_alternatives, 5);
		assert_eq!(config.resolver.similarity, "levenshtein");
		assert!(config.api.is_none());
	}

	#[test]
	fn rejects_unknown_primary_backend() {
		let file = write_config(
			r#"
			[service]
			id = "order-entry-1"

			[storage]
			primary = "redis"

			[storage.implementations.memory]
			"#,
		);

		let result = Config::from_file(file.path());
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn rejects_threshold_above_100() {
		let file = write_config(
			r#"
			[service]
			id = "order-entry-1"

			[storage]
			primary = "memory"

			[storage.implementations.memory]

			[resolver]
			product_threshold = 130
			"#,
		);

		let result = Config::from_file(file.path());
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}
}
