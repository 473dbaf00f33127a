//! Registry trait for self-registering implementations.
//!
//! Pluggable components (storage backends, similarity scorers) provide a
//! Registry struct implementing this trait, tying their configuration name
//! to a factory function.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this
	/// implementation, for example:
	/// - "memory" for storage.implementations.memory
	/// - "levenshtein" for resolver.similarity = "levenshtein"
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
