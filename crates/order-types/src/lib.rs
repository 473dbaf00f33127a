//! Common types module for the shorthand order entry system.
//!
//! This module defines the core data types and structures shared across the
//! order entry components. It provides a centralized location for domain
//! types to ensure consistency between the resolver, lifecycle, storage and
//! service crates.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Catalog entities: customers, products, units and learned abbreviations.
pub mod catalog;
/// Persisted order entities and lifecycle status types.
pub mod order;
/// Transient parse results produced by the shorthand resolver.
pub mod parse;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage namespaces for persistent data collections.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use catalog::*;
pub use order::*;
pub use parse::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use validation::*;
