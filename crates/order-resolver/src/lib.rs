//! Shorthand resolution engine for the order entry system.
//!
//! Turns terse operator input such as `g18\n1t2sm4rb` into a resolved
//! [`ParsedOrder`]: the customer token resolves through a learned
//! abbreviation table, each item token resolves within that customer's
//! scope, and fuzzy ranking with confidence scoring steps in when an exact
//! mapping is absent. Resolution problems are accumulated as diagnostics
//! and never abort the parse; only storage failures surface as errors.

use order_storage::{StorageError, StorageService};
use order_types::{
	Customer, CustomerResolution, ParsedCustomer, ParsedItem, ParsedOrder, StorageKey,
};
use std::sync::Arc;
use thiserror::Error;

/// Session-scoped memoization of successful lookups.
pub mod cache;
/// Customer token resolution.
pub mod customer;
/// Customer-scoped product token resolution.
pub mod product;
/// Pluggable string-similarity scoring.
pub mod similarity;
/// Raw shorthand tokenization.
pub mod tokenizer;

pub use cache::ResolutionCache;
pub use customer::CustomerResolver;
pub use product::ProductResolver;
pub use similarity::{ScorerFactory, SimilarityScorer};

/// Errors that can occur during shorthand resolution.
///
/// Unresolved tokens are not errors; they surface as diagnostics on the
/// parse result. These variants cover genuine failures that abort the
/// operation.
#[derive(Debug, Error)]
pub enum ResolverError {
	/// The store failed or is unreachable.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	/// An abbreviation points at a record that no longer exists.
	#[error("Referenced {entity} {id} missing from store")]
	DanglingReference { entity: &'static str, id: String },
}

/// Maps a storage miss to `None`, propagating every other failure.
pub(crate) fn optional<T>(result: Result<T, StorageError>) -> Result<Option<T>, StorageError> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(StorageError::NotFound) => Ok(None),
		Err(e) => Err(e),
	}
}

/// Tuning knobs for the resolvers.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
	/// Minimum similarity for customer fuzzy candidates.
	pub customer_threshold: u8,
	/// Minimum similarity for product fuzzy candidates.
	pub product_threshold: u8,
	/// Maximum number of ranked alternatives per token.
	pub max_alternatives: usize,
}

impl Default for ResolverOptions {
	fn default() -> Self {
		Self {
			customer_threshold: 60,
			product_threshold: 70,
			max_alternatives: 5,
		}
	}
}

/// The shorthand resolution engine.
///
/// One instance serves many sessions; per-session state lives in the
/// [`ResolutionCache`] the caller passes in.
pub struct ShorthandResolver {
	storage: Arc<StorageService>,
	customers: CustomerResolver,
	products: ProductResolver,
}

impl ShorthandResolver {
	pub fn new(
		storage: Arc<StorageService>,
		scorer: Box<dyn SimilarityScorer>,
		options: ResolverOptions,
	) -> Self {
		let scorer: Arc<dyn SimilarityScorer> = Arc::from(scorer);
		let customers = CustomerResolver::new(
			Arc::clone(&storage),
			Arc::clone(&scorer),
			options.customer_threshold,
			options.max_alternatives,
		);
		let products = ProductResolver::new(
			Arc::clone(&storage),
			scorer,
			options.product_threshold,
			options.max_alternatives,
		);
		Self {
			storage,
			customers,
			products,
		}
	}

	/// Parses the first customer block of the raw input into a
	/// [`ParsedOrder`].
	///
	/// Item tokens are resolved in left-to-right textual order under the
	/// resolved customer's scope. Unresolved tokens and malformed
	/// quantities become diagnostics; the parse always completes unless
	/// the store fails.
	pub async fn parse_order(
		&self,
		input: &str,
		cache: &mut ResolutionCache,
	) -> Result<ParsedOrder, ResolverError> {
		let tokenized = tokenizer::tokenize(input);

		if tokenized.customer_token.is_none()
			&& tokenized.items.is_empty()
			&& tokenized.diagnostics.is_empty()
		{
			let mut order = ParsedOrder::empty(input);
			order.diagnostics.push("empty input".to_string());
			return Ok(order);
		}

		let first_line = tokenizer::first_block(input)
			.lines()
			.next()
			.unwrap_or_default()
			.trim()
			.to_string();

		let customer = match &tokenized.customer_token {
			Some(token) => self.customers.resolve(&first_line, token, cache).await?,
			None => ParsedCustomer::unresolved(first_line),
		};

		let mut diagnostics = tokenized.diagnostics;
		let mut items = Vec::with_capacity(tokenized.items.len());

		for raw_item in &tokenized.items {
			let item = match customer.customer_id() {
				Some(customer_id) => {
					self.products
						.resolve(
							&raw_item.raw,
							raw_item.quantity,
							&raw_item.code,
							customer_id,
							cache,
						)
						.await?
				},
				// No customer scope to resolve against.
				None => ParsedItem::unresolved(raw_item.raw.clone(), raw_item.quantity),
			};

			if item.confidence() == 0 {
				diagnostics.push(format!("could not identify product: {}", item.raw_input));
			}
			items.push(item);
		}

		Ok(ParsedOrder {
			customer,
			items,
			raw_input: input.to_string(),
			diagnostics,
		})
	}

	/// Re-resolves every item of an already-parsed order under a corrected
	/// customer.
	///
	/// The correction is operator-asserted, so the customer confidence is
	/// forced to 100. Prior diagnostics mentioning the customer are
	/// dropped; all others are preserved. Applying the same correction
	/// twice yields the same order.
	pub async fn reparse_with_customer(
		&self,
		mut order: ParsedOrder,
		customer_id: i64,
		cache: &mut ResolutionCache,
	) -> Result<ParsedOrder, ResolverError> {
		let customer = match optional(
			self.storage
				.retrieve::<Customer>(StorageKey::Customers.as_str(), &customer_id.to_string())
				.await,
		)? {
			Some(customer) => customer,
			None => {
				order
					.diagnostics
					.push(format!("customer id {} not found", customer_id));
				return Ok(order);
			},
		};

		tracing::debug!(customer_id, "re-resolving order under corrected customer");

		// Entries scoped to the previous customer must not survive.
		cache.invalidate_products();

		order.customer.resolution = CustomerResolution::Resolved {
			customer_id: customer.id,
			name: customer.name,
			code: customer.code,
			confidence: 100,
		};

		let mut reparsed = Vec::with_capacity(order.items.len());
		for item in order.items {
			match tokenizer::reparse_item_token(&item.raw_input) {
				Some(raw_item) => {
					let resolved = self
						.products
						.resolve(
							&raw_item.raw,
							raw_item.quantity,
							&raw_item.code,
							customer_id,
							cache,
						)
						.await?;
					reparsed.push(resolved);
				},
				// Tokens that cannot be re-extracted pass through unchanged.
				None => reparsed.push(item),
			}
		}
		order.items = reparsed;

		order
			.diagnostics
			.retain(|d| !d.to_lowercase().contains("customer"));

		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_storage::implementations::memory::MemoryStorage;
	use order_types::{
		CustomerAbbreviation, Product, ProductAbbreviation, ProductResolution, UnitOfMeasure,
	};
	use rust_decimal_macros::dec;
	use similarity::LevenshteinScorer;

	async fn seeded_storage() -> Arc<StorageService> {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));

		for customer in [
			Customer {
				id: 1,
				name: "Graceful 18th".into(),
				code: "G18".into(),
				business_name: None,
				phone: None,
				email: None,
			},
			Customer {
				id: 2,
				name: "Main Street".into(),
				code: "MS".into(),
				business_name: None,
				phone: None,
				email: None,
			},
			Customer {
				id: 3,
				name: "Corner Pub".into(),
				code: "CP".into(),
				business_name: None,
				phone: None,
				email: None,
			},
		] {
			storage
				.store(
					StorageKey::Customers.as_str(),
					&customer.id.to_string(),
					&customer,
				)
				.await
				.unwrap();
		}

		for uom in [
			UnitOfMeasure {
				id: 1,
				code: "EA".into(),
				name: "Each".into(),
			},
			UnitOfMeasure {
				id: 2,
				code: "PC".into(),
				name: "Piece".into(),
			},
		] {
			storage
				.store(StorageKey::Units.as_str(), &uom.id.to_string(), &uom)
				.await
				.unwrap();
		}

		for product in [
			Product {
				id: 1,
				item_code: "TURKEY01".into(),
				description: "Sliced Turkey Breast".into(),
				uom_id: 2,
				price: dec!(10.50),
				vendor: None,
				category: None,
			},
			Product {
				id: 2,
				item_code: "SALAMI01".into(),
				description: "Genoa Salami".into(),
				uom_id: 2,
				price: dec!(8.25),
				vendor: None,
				category: None,
			},
			Product {
				id: 3,
				item_code: "ROAST01".into(),
				description: "Roast Beef".into(),
				uom_id: 2,
				price: dec!(9.75),
				vendor: None,
				category: None,
			},
			Product {
				id: 5,
				item_code: "TURKEY02".into(),
				description: "Smoked Turkey".into(),
				uom_id: 2,
				price: dec!(11.00),
				vendor: None,
				category: None,
			},
		] {
			storage
				.store(
					StorageKey::Products.as_str(),
					&product.id.to_string(),
					&product,
				)
				.await
				.unwrap();
		}

		for mapping in [
			CustomerAbbreviation {
				abbreviation: "g18".into(),
				customer_id: 1,
				confidence_score: 100,
			},
			CustomerAbbreviation {
				abbreviation: "ms".into(),
				customer_id: 2,
				confidence_score: 100,
			},
			CustomerAbbreviation {
				abbreviation: "cp".into(),
				customer_id: 3,
				confidence_score: 90,
			},
		] {
			storage
				.store(
					StorageKey::CustomerAbbreviations.as_str(),
					&mapping.storage_id(),
					&mapping,
				)
				.await
				.unwrap();
		}

		for mapping in [
			ProductAbbreviation {
				customer_id: 1,
				product_id: 1,
				abbreviation: "t".into(),
				confidence_score: 100,
				usage_count: 0,
				last_used: None,
			},
			ProductAbbreviation {
				customer_id: 1,
				product_id: 2,
				abbreviation: "sm".into(),
				confidence_score: 100,
				usage_count: 0,
				last_used: None,
			},
			ProductAbbreviation {
				customer_id: 1,
				product_id: 3,
				abbreviation: "rb".into(),
				confidence_score: 100,
				usage_count: 0,
				last_used: None,
			},
			ProductAbbreviation {
				customer_id: 1,
				product_id: 1,
				abbreviation: "turk".into(),
				confidence_score: 80,
				usage_count: 0,
				last_used: None,
			},
			ProductAbbreviation {
				customer_id: 2,
				product_id: 5,
				abbreviation: "t".into(),
				confidence_score: 100,
				usage_count: 0,
				last_used: None,
			},
		] {
			storage
				.store(
					StorageKey::ProductAbbreviations.as_str(),
					&mapping.storage_id(),
					&mapping,
				)
				.await
				.unwrap();
		}

		Arc::new(storage)
	}

	async fn resolver() -> ShorthandResolver {
		ShorthandResolver::new(
			seeded_storage().await,
			Box::new(LevenshteinScorer),
			ResolverOptions::default(),
		)
	}

	#[tokio::test]
	async fn exact_customer_hit_carries_stored_confidence() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver.parse_order("cp\n2rb", &mut cache).await.unwrap();
		match &parsed.customer.resolution {
			CustomerResolution::Resolved {
				customer_id,
				confidence,
				..
			} => {
				assert_eq!(*customer_id, 3);
				assert_eq!(*confidence, 90);
			},
			other => panic!("expected resolved customer, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn end_to_end_shorthand_example() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver
			.parse_order("g18\n1t2sm4rb", &mut cache)
			.await
			.unwrap();

		assert_eq!(parsed.customer.confidence(), 100);
		assert_eq!(parsed.customer.customer_id(), Some(1));
		assert!(parsed.diagnostics.is_empty());
		assert_eq!(parsed.items.len(), 3);

		let expectations = [
			(dec!(1), "Sliced Turkey Breast"),
			(dec!(2), "Genoa Salami"),
			(dec!(4), "Roast Beef"),
		];
		for (item, (quantity, description)) in parsed.items.iter().zip(expectations) {
			assert_eq!(item.quantity, quantity);
			assert_eq!(item.confidence(), 100);
			match &item.resolution {
				ProductResolution::Resolved {
					description: resolved,
					..
				} => assert_eq!(resolved, description),
				other => panic!("expected resolved item, got {:?}", other),
			}
		}
	}

	#[tokio::test]
	async fn unknown_customer_ranks_fuzzy_alternatives() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver.parse_order("g1\n1t", &mut cache).await.unwrap();

		assert_eq!(parsed.customer.confidence(), 0);
		match &parsed.customer.resolution {
			CustomerResolution::Unresolved { alternatives } => {
				assert_eq!(alternatives.len(), 1);
				assert_eq!(alternatives[0].customer_id, 1);
				// One edit against three characters.
				assert_eq!(alternatives[0].similarity, 67);
				assert!(alternatives[0].similarity > 60);
			},
			other => panic!("expected unresolved customer, got {:?}", other),
		}
		// No customer scope, so the item cannot resolve.
		assert_eq!(parsed.items[0].confidence(), 0);
		assert!(parsed
			.diagnostics
			.contains(&"could not identify product: 1t".to_string()));
	}

	#[tokio::test]
	async fn product_fuzzy_uses_stricter_threshold() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		// "tur" vs "turk" scores 75, above the product threshold; every
		// other stored abbreviation for this customer falls below 70.
		let parsed = resolver.parse_order("g18\n2tur", &mut cache).await.unwrap();
		let item = &parsed.items[0];
		assert_eq!(item.confidence(), 0);
		match &item.resolution {
			ProductResolution::Unresolved { alternatives } => {
				assert_eq!(alternatives.len(), 1);
				assert_eq!(alternatives[0].product_id, 1);
				assert_eq!(alternatives[0].similarity, 75);
			},
			other => panic!("expected unresolved item, got {:?}", other),
		}

		// "rbb" vs "rb" scores 67, below the product threshold.
		let parsed = resolver.parse_order("g18\n1rbb", &mut cache).await.unwrap();
		match &parsed.items[0].resolution {
			ProductResolution::Unresolved { alternatives } => assert!(alternatives.is_empty()),
			other => panic!("expected unresolved item, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn product_resolution_is_scoped_to_customer() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let for_g18 = resolver.parse_order("g18\n1t", &mut cache).await.unwrap();
		assert_eq!(for_g18.items[0].product_id(), Some(1));

		let for_ms = resolver.parse_order("ms\n1t", &mut cache).await.unwrap();
		assert_eq!(for_ms.items[0].product_id(), Some(5));

		// Corner Pub has no mappings at all; the same token stays
		// unresolved rather than borrowing another customer's mapping.
		let for_cp = resolver.parse_order("cp\n1t", &mut cache).await.unwrap();
		assert_eq!(for_cp.items[0].product_id(), None);
		match &for_cp.items[0].resolution {
			ProductResolution::Unresolved { alternatives } => assert!(alternatives.is_empty()),
			other => panic!("expected unresolved item, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn exact_hits_are_cached_fuzzy_results_are_not() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		resolver.parse_order("g18\n1t", &mut cache).await.unwrap();
		assert_eq!(cache.customer_entries(), 1);
		assert_eq!(cache.product_entries(), 1);

		// Fuzzy-only outcomes leave the cache untouched.
		resolver.parse_order("g1\n2tur", &mut cache).await.unwrap();
		assert_eq!(cache.customer_entries(), 1);
		assert_eq!(cache.product_entries(), 1);
	}

	#[tokio::test]
	async fn reparse_rescopes_items_and_is_idempotent() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver.parse_order("g18\n1t", &mut cache).await.unwrap();
		assert_eq!(parsed.items[0].product_id(), Some(1));

		let once = resolver
			.reparse_with_customer(parsed, 2, &mut cache)
			.await
			.unwrap();
		assert_eq!(once.customer.customer_id(), Some(2));
		assert_eq!(once.customer.confidence(), 100);
		assert_eq!(once.items[0].product_id(), Some(5));

		let twice = resolver
			.reparse_with_customer(once.clone(), 2, &mut cache)
			.await
			.unwrap();
		assert_eq!(once, twice);
	}

	#[tokio::test]
	async fn reparse_drops_customer_diagnostics_only() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let mut parsed = resolver.parse_order("g18\n1t", &mut cache).await.unwrap();
		parsed
			.diagnostics
			.push("customer id 99 not found".to_string());
		parsed
			.diagnostics
			.push("no products found in: ???".to_string());

		let reparsed = resolver
			.reparse_with_customer(parsed, 1, &mut cache)
			.await
			.unwrap();
		assert_eq!(
			reparsed.diagnostics,
			vec!["no products found in: ???".to_string()]
		);
	}

	#[tokio::test]
	async fn reparse_with_unknown_customer_leaves_order_intact() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver.parse_order("g18\n1t", &mut cache).await.unwrap();
		let reparsed = resolver
			.reparse_with_customer(parsed.clone(), 99, &mut cache)
			.await
			.unwrap();

		assert_eq!(reparsed.customer, parsed.customer);
		assert_eq!(reparsed.items, parsed.items);
		assert!(reparsed
			.diagnostics
			.contains(&"customer id 99 not found".to_string()));
	}

	#[tokio::test]
	async fn empty_input_yields_empty_skeleton() {
		let resolver = resolver().await;
		let mut cache = ResolutionCache::new();

		let parsed = resolver.parse_order("  \n ", &mut cache).await.unwrap();
		assert!(parsed.items.is_empty());
		assert_eq!(parsed.customer.confidence(), 0);
		assert_eq!(parsed.diagnostics, vec!["empty input".to_string()]);
	}
}
