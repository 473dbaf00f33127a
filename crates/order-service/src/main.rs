//! Main entry point for the shorthand order entry service.
//!
//! This binary wires the configured storage backend, the shorthand
//! resolution engine and the order lifecycle manager together and serves
//! them over the HTTP API.

use clap::Parser;
use order_config::Config;
use order_lifecycle::LifecycleService;
use order_resolver::{ResolverOptions, ShorthandResolver};
use order_storage::StorageService;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

mod server;

use server::AppState;

/// Command-line arguments for the order entry service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order entry service");

	let config = Config::from_file(&args.config)?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let state = build_state(&config)?;

	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);
	if !api_enabled {
		tracing::warn!("API server disabled in configuration, nothing to serve");
		return Ok(());
	}

	let api_config = config.api.as_ref().unwrap().clone();
	server::start_server(api_config, state).await?;

	tracing::info!("Stopped order entry service");
	Ok(())
}

/// Builds the shared application state from configuration: the configured
/// storage backend, the configured similarity scorer and the services on
/// top of them.
fn build_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
	let storage_config = config
		.storage
		.implementations
		.get(&config.storage.primary)
		.ok_or_else(|| {
			format!(
				"no configuration for storage backend '{}'",
				config.storage.primary
			)
		})?;

	let storage_factory = order_storage::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.storage.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown storage backend '{}'", config.storage.primary))?;

	let backend = storage_factory(storage_config)?;
	let storage = Arc::new(StorageService::new(backend));
	tracing::info!(backend = %config.storage.primary, "storage backend initialized");

	let scorer_factory = order_resolver::similarity::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.resolver.similarity)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown similarity scorer '{}'", config.resolver.similarity))?;

	let options = ResolverOptions {
		customer_threshold: config.resolver.customer_threshold,
		product_threshold: config.resolver.product_threshold,
		max_alternatives: config.resolver.max_alternatives,
	};

	let resolver = Arc::new(ShorthandResolver::new(
		Arc::clone(&storage),
		scorer_factory(),
		options,
	));
	let lifecycle = Arc::new(LifecycleService::new(
		Arc::clone(&storage),
		config.service.actor.clone(),
	));

	Ok(AppState {
		resolver,
		lifecycle,
		cache: Arc::new(Mutex::new(order_resolver::ResolutionCache::new())),
	})
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
	fn builds_state_from_minimal_config() {
		let file = write_config(
			r#"
			[service]
			id = "order-entry-test"

			[storage]
			primary = "memory"

			[storage.implementations.memory]
			"#,
		);

		let config = Config::from_file(file.path()).unwrap();
		let state = build_state(&config);
		assert!(state.is_ok(), "failed to build state: {:?}", state.err());
	}

	#[test]
	fn rejects_unknown_similarity_scorer() {
		let file = write_config(
			r#"
			[service]
			id = "order-entry-test"

			[storage]
			primary = "memory"

			[storage.implementations.memory]

			[resolver]
			similarity = "soundex"
			"#,
		);

		let config = Config::from_file(file.path()).unwrap();
		assert!(build_state(&config).is_err());
	}

	#[test]
	fn args_default_values() {
		let args = Args::parse_from(["order-service"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}
}
