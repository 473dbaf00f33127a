//! Pluggable string-similarity scoring.
//!
//! Both resolvers fall back to fuzzy ranking when an exact abbreviation
//! match is absent. The scoring algorithm sits behind [`SimilarityScorer`]
//! so it can be swapped without touching resolver logic.

use order_types::ImplementationRegistry;

/// Scores two strings to a 0-100 similarity value.
///
/// 100 means identical, 0 means nothing in common. Inputs are expected to
/// be lowercased by the caller.
pub trait SimilarityScorer: Send + Sync {
	fn score(&self, a: &str, b: &str) -> u8;
}

fn scale(ratio: f64) -> u8 {
	(ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Edit-distance ratio scorer (normalized Levenshtein).
pub struct LevenshteinScorer;

impl SimilarityScorer for LevenshteinScorer {
	fn score(&self, a: &str, b: &str) -> u8 {
		scale(strsim::normalized_levenshtein(a, b))
	}
}

/// Jaro-Winkler scorer; favors matching prefixes, which suits short
/// operator shorthand.
pub struct JaroWinklerScorer;

impl SimilarityScorer for JaroWinklerScorer {
	fn score(&self, a: &str, b: &str) -> u8 {
		scale(strsim::jaro_winkler(a, b))
	}
}

/// Type alias for scorer factory functions.
pub type ScorerFactory = fn() -> Box<dyn SimilarityScorer>;

/// Registry entry for [`LevenshteinScorer`].
pub struct LevenshteinRegistry;

impl ImplementationRegistry for LevenshteinRegistry {
	const NAME: &'static str = "levenshtein";
	type Factory = ScorerFactory;

	fn factory() -> Self::Factory {
		|| Box::new(LevenshteinScorer)
	}
}

/// Registry entry for [`JaroWinklerScorer`].
pub struct JaroWinklerRegistry;

impl ImplementationRegistry for JaroWinklerRegistry {
	const NAME: &'static str = "jaro_winkler";
	type Factory = ScorerFactory;

	fn factory() -> Self::Factory {
		|| Box::new(JaroWinklerScorer)
	}
}

/// Get all registered similarity scorer implementations.
pub fn get_all_implementations() -> Vec<(&'static str, ScorerFactory)> {
	vec![
		(LevenshteinRegistry::NAME, LevenshteinRegistry::factory()),
		(JaroWinklerRegistry::NAME, JaroWinklerRegistry::factory()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_tokens_score_100() {
		assert_eq!(LevenshteinScorer.score("g18", "g18"), 100);
		assert_eq!(JaroWinklerScorer.score("sm", "sm"), 100);
	}

	#[test]
	fn single_edit_on_three_chars_scores_67() {
		// One substitution out of three characters.
		assert_eq!(LevenshteinScorer.score("g18", "g19"), 67);
	}

	#[test]
	fn disjoint_tokens_score_0() {
		assert_eq!(LevenshteinScorer.score("abc", "xyz"), 0);
	}

	#[test]
	fn registry_exposes_both_scorers() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert!(names.contains(&"levenshtein"));
		assert!(names.contains(&"jaro_winkler"));
	}
}
