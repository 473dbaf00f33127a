//! Customer token resolution.

use crate::cache::{CachedCustomer, ResolutionCache};
use crate::similarity::SimilarityScorer;
use crate::{optional, ResolverError};
use order_storage::StorageService;
use order_types::{
	Customer, CustomerAbbreviation, CustomerAlternative, CustomerResolution, ParsedCustomer,
	StorageKey,
};
use std::sync::Arc;

/// Resolves a customer token through the learned abbreviation table, with
/// fuzzy ranking as a fallback.
pub struct CustomerResolver {
	storage: Arc<StorageService>,
	scorer: Arc<dyn SimilarityScorer>,
	/// Minimum similarity for a fuzzy candidate to be offered.
	threshold: u8,
	/// Maximum number of ranked alternatives returned.
	max_alternatives: usize,
}

impl CustomerResolver {
	pub fn new(
		storage: Arc<StorageService>,
		scorer: Arc<dyn SimilarityScorer>,
		threshold: u8,
		max_alternatives: usize,
	) -> Self {
		Self {
			storage,
			scorer,
			threshold,
			max_alternatives,
		}
	}

	/// Resolves a customer token to a [`ParsedCustomer`].
	///
	/// Exact case-insensitive hits carry the stored confidence score and
	/// are memoized in the session cache. Misses fall back to fuzzy
	/// ranking over every stored abbreviation; those results are
	/// inconclusive and not cached.
	pub async fn resolve(
		&self,
		raw_input: &str,
		token: &str,
		cache: &mut ResolutionCache,
	) -> Result<ParsedCustomer, ResolverError> {
		let token = token.to_lowercase();

		if let Some(hit) = cache.customer(&token) {
			return Ok(resolved(raw_input, hit));
		}

		let abbreviations_ns = StorageKey::CustomerAbbreviations.as_str();
		if let Some(mapping) = optional(
			self.storage
				.retrieve::<CustomerAbbreviation>(abbreviations_ns, &token)
				.await,
		)? {
			let customer = self.fetch_customer(mapping.customer_id).await?;
			let hit = CachedCustomer {
				customer_id: customer.id,
				name: customer.name,
				code: customer.code,
				confidence: mapping.confidence_score,
			};
			let parsed = resolved(raw_input, &hit);
			cache.insert_customer(token, hit);
			return Ok(parsed);
		}

		tracing::debug!(token = %token, "no exact customer abbreviation, ranking fuzzy candidates");
		let alternatives = self.fuzzy_candidates(&token).await?;

		Ok(ParsedCustomer {
			raw_input: raw_input.to_string(),
			resolution: CustomerResolution::Unresolved { alternatives },
		})
	}

	/// Ranks every stored abbreviation by similarity to the token and
	/// returns the top candidates above the threshold.
	async fn fuzzy_candidates(
		&self,
		token: &str,
	) -> Result<Vec<CustomerAlternative>, ResolverError> {
		let mappings: Vec<CustomerAbbreviation> = self
			.storage
			.retrieve_all(StorageKey::CustomerAbbreviations.as_str())
			.await?;

		let mut scored: Vec<(u8, CustomerAbbreviation)> = mappings
			.into_iter()
			.filter_map(|mapping| {
				let similarity = self.scorer.score(token, &mapping.abbreviation.to_lowercase());
				(similarity > self.threshold).then_some((similarity, mapping))
			})
			.collect();

		// Similarity descending; stored confidence, then abbreviation, keep
		// the ordering stable.
		scored.sort_by(|a, b| {
			b.0.cmp(&a.0)
				.then(b.1.confidence_score.cmp(&a.1.confidence_score))
				.then(a.1.abbreviation.cmp(&b.1.abbreviation))
		});
		scored.truncate(self.max_alternatives);

		let mut alternatives = Vec::with_capacity(scored.len());
		for (similarity, mapping) in scored {
			match optional(
				self.storage
					.retrieve::<Customer>(
						StorageKey::Customers.as_str(),
						&mapping.customer_id.to_string(),
					)
					.await,
			)? {
				Some(customer) => alternatives.push(CustomerAlternative {
					customer_id: customer.id,
					name: customer.name,
					code: customer.code,
					abbreviation: mapping.abbreviation,
					similarity,
					confidence: mapping.confidence_score,
				}),
				None => {
					tracing::debug!(
						customer_id = mapping.customer_id,
						abbreviation = %mapping.abbreviation,
						"skipping candidate with missing customer record"
					);
				},
			}
		}

		Ok(alternatives)
	}

	async fn fetch_customer(&self, customer_id: i64) -> Result<Customer, ResolverError> {
		optional(
			self.storage
				.retrieve::<Customer>(StorageKey::Customers.as_str(), &customer_id.to_string())
				.await,
		)?
		.ok_or(ResolverError::DanglingReference {
			entity: "customer",
			id: customer_id.to_string(),
		})
	}
}

fn resolved(raw_input: &str, hit: &CachedCustomer) -> ParsedCustomer {
	ParsedCustomer {
		raw_input: raw_input.to_string(),
		resolution: CustomerResolution::Resolved {
			customer_id: hit.customer_id,
			name: hit.name.clone(),
			code: hit.code.clone(),
			confidence: hit.confidence,
		},
	}
}
