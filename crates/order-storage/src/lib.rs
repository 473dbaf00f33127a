//! Storage module for the shorthand order entry system.
//!
//! This module provides abstractions for persistent storage of catalog and
//! order data, supporting different backend implementations such as
//! in-memory or file-based storage. The store is the single source of
//! truth; resolvers and the lifecycle manager only touch it through the
//! typed [`StorageService`].

use async_trait::async_trait;
use order_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A requested record does not exist.
	#[error("Not found")]
	NotFound,
	/// Serialization/deserialization failed.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The storage backend failed; the store may be unreachable.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Configuration validation failed.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Backends store raw bytes under `namespace:id` keys and must support
/// enumerating a whole namespace, which the resolvers use for fuzzy
/// candidate scans and the lifecycle queries use for per-customer listings.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes under the given key, creating or overwriting.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns the raw values of every record in a namespace.
	///
	/// Ordering is unspecified; callers sort as needed.
	async fn list_bytes(&self, namespace: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the service to wire the configured backend.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// Wraps a low-level backend and handles JSON serialization, key
/// composition and namespace scans.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value, creating or overwriting.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves every record in a namespace.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let raw = self.backend.list_bytes(namespace).await?;
		raw.iter()
			.map(|bytes| {
				serde_json::from_slice(bytes)
					.map_err(|e| StorageError::Serialization(e.to_string()))
			})
			.collect()
	}

	/// Updates an existing value in storage.
	///
	/// Returns `NotFound` if the record does not exist, making it
	/// semantically different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = Self::key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Removes a value from storage. Deleting a missing key is not an
	/// error.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Record {
		id: u32,
		label: String,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn typed_roundtrip() {
		let service = service();
		let record = Record {
			id: 7,
			label: "turkey".into(),
		};

		service.store("products", "7", &record).await.unwrap();
		let loaded: Record = service.retrieve("products", "7").await.unwrap();
		assert_eq!(loaded, record);
	}

	#[tokio::test]
	async fn update_requires_existing_record() {
		let service = service();
		let record = Record {
			id: 1,
			label: "salami".into(),
		};

		let result = service.update("products", "1", &record).await;
		assert!(matches!(result, Err(StorageError::NotFound)));

		service.store("products", "1", &record).await.unwrap();
		service.update("products", "1", &record).await.unwrap();
	}

	#[tokio::test]
	async fn retrieve_all_scans_single_namespace() {
		let service = service();
		for id in 1..=3u32 {
			let record = Record {
				id,
				label: format!("item-{}", id),
			};
			service
				.store("products", &id.to_string(), &record)
				.await
				.unwrap();
		}
		service
			.store(
				"customers",
				"1",
				&Record {
					id: 1,
					label: "other".into(),
				},
			)
			.await
			.unwrap();

		let mut all: Vec<Record> = service.retrieve_all("products").await.unwrap();
		all.sort_by_key(|r| r.id);
		assert_eq!(all.len(), 3);
		assert_eq!(all[2].label, "item-3");
	}
}
