//! Product token resolution, scoped to a customer.
//!
//! The same shorthand code may resolve differently per customer; every
//! lookup here is filtered to one customer's learned abbreviations.

use crate::cache::{CachedProduct, ResolutionCache};
use crate::similarity::SimilarityScorer;
use crate::{optional, ResolverError};
use order_storage::StorageService;
use order_types::{
	ParsedItem, Product, ProductAbbreviation, ProductAlternative, ProductResolution, StorageKey,
	UnitOfMeasure,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Unit of measure reported when a product has no stored unit.
const DEFAULT_UOM: (&str, i64) = ("EA", 1);

/// Resolves quantity + code tokens against one customer's abbreviation
/// table, with customer-scoped fuzzy ranking as a fallback.
pub struct ProductResolver {
	storage: Arc<StorageService>,
	scorer: Arc<dyn SimilarityScorer>,
	/// Minimum similarity for a fuzzy candidate. Stricter than the
	/// customer threshold, since product ambiguity is costlier.
	threshold: u8,
	/// Maximum number of ranked alternatives returned.
	max_alternatives: usize,
}

impl ProductResolver {
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

	/// Resolves one item token within the given customer's scope.
	pub async fn resolve(
		&self,
		raw_input: &str,
		quantity: Decimal,
		code: &str,
		customer_id: i64,
		cache: &mut ResolutionCache,
	) -> Result<ParsedItem, ResolverError> {
		let code = code.to_lowercase();

		if let Some(hit) = cache.product(customer_id, &code) {
			return Ok(resolved(raw_input, quantity, hit));
		}

		let mapping_id = ProductAbbreviation::storage_id_for(customer_id, &code);
		if let Some(mapping) = optional(
			self.storage
				.retrieve::<ProductAbbreviation>(
					StorageKey::ProductAbbreviations.as_str(),
					&mapping_id,
				)
				.await,
		)? {
			let product = self.fetch_product(mapping.product_id).await?;
			let (uom, uom_id) = self.fetch_uom(product.uom_id).await?;
			let hit = CachedProduct {
				product_id: product.id,
				item_code: product.item_code,
				description: product.description,
				uom,
				uom_id,
				confidence: mapping.confidence_score,
			};
			let parsed = resolved(raw_input, quantity, &hit);
			cache.insert_product(customer_id, code, hit);
			return Ok(parsed);
		}

		tracing::debug!(
			code = %code,
			customer_id,
			"no exact product abbreviation, ranking fuzzy candidates"
		);
		let alternatives = self.fuzzy_candidates(&code, customer_id).await?;

		Ok(ParsedItem {
			raw_input: raw_input.to_string(),
			quantity,
			resolution: ProductResolution::Unresolved { alternatives },
		})
	}

	/// Ranks the customer's stored abbreviations by similarity to the code
	/// and returns the top candidates above the threshold.
	async fn fuzzy_candidates(
		&self,
		code: &str,
		customer_id: i64,
	) -> Result<Vec<ProductAlternative>, ResolverError> {
		let mappings: Vec<ProductAbbreviation> = self
			.storage
			.retrieve_all(StorageKey::ProductAbbreviations.as_str())
			.await?;

		let mut scored: Vec<(u8, ProductAbbreviation)> = mappings
			.into_iter()
			.filter(|mapping| mapping.customer_id == customer_id)
			.filter_map(|mapping| {
				let similarity = self.scorer.score(code, &mapping.abbreviation.to_lowercase());
				(similarity > self.threshold).then_some((similarity, mapping))
			})
			.collect();

		// Similarity descending, then confidence, usage and abbreviation
		// as stable secondary keys.
		scored.sort_by(|a, b| {
			b.0.cmp(&a.0)
				.then(b.1.confidence_score.cmp(&a.1.confidence_score))
				.then(b.1.usage_count.cmp(&a.1.usage_count))
				.then(a.1.abbreviation.cmp(&b.1.abbreviation))
		});
		scored.truncate(self.max_alternatives);

		let mut alternatives = Vec::with_capacity(scored.len());
		for (similarity, mapping) in scored {
			match optional(
				self.storage
					.retrieve::<Product>(
						StorageKey::Products.as_str(),
						&mapping.product_id.to_string(),
					)
					.await,
			)? {
				Some(product) => {
					let (uom, uom_id) = self.fetch_uom(product.uom_id).await?;
					alternatives.push(ProductAlternative {
						product_id: product.id,
						item_code: product.item_code,
						description: product.description,
						abbreviation: mapping.abbreviation,
						similarity,
						confidence: mapping.confidence_score,
						uom,
						uom_id,
					});
				},
				None => {
					tracing::debug!(
						product_id = mapping.product_id,
						abbreviation = %mapping.abbreviation,
						"skipping candidate with missing product record"
					);
				},
			}
		}

		Ok(alternatives)
	}

	async fn fetch_product(&self, product_id: i64) -> Result<Product, ResolverError> {
		optional(
			self.storage
				.retrieve::<Product>(StorageKey::Products.as_str(), &product_id.to_string())
				.await,
		)?
		.ok_or(ResolverError::DanglingReference {
			entity: "product",
			id: product_id.to_string(),
		})
	}

	/// Fetches the unit of measure, defaulting when the product has none
	/// stored.
	async fn fetch_uom(&self, uom_id: i64) -> Result<(String, i64), ResolverError> {
		Ok(optional(
			self.storage
				.retrieve::<UnitOfMeasure>(StorageKey::Units.as_str(), &uom_id.to_string())
				.await,
		)?
		.map(|uom| (uom.code, uom.id))
		.unwrap_or_else(|| (DEFAULT_UOM.0.to_string(), DEFAULT_UOM.1)))
	}
}

fn resolved(raw_input: &str, quantity: Decimal, hit: &CachedProduct) -> ParsedItem {
	ParsedItem {
		raw_input: raw_input.to_string(),
		quantity,
		resolution: ProductResolution::Resolved {
			product_id: hit.product_id,
			item_code: hit.item_code.clone(),
			description: hit.description.clone(),
			uom: hit.uom.clone(),
			uom_id: hit.uom_id,
			confidence: hit.confidence,
		},
	}
}
