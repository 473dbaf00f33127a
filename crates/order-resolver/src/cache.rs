//! Session-scoped resolution cache.
//!
//! Memoizes successful exact lookups for the lifetime of one parsing
//! session so repeated tokens skip the store. Fuzzy-fallback results are
//! never cached; an inconclusive match must be re-evaluated. The cache is
//! owned by the session and never shared across sessions, so one session's
//! entries cannot leak into another's resolution.

use std::collections::HashMap;

/// A memoized exact customer resolution.
#[derive(Debug, Clone)]
pub struct CachedCustomer {
	pub customer_id: i64,
	pub name: String,
	pub code: String,
	pub confidence: u8,
}

/// A memoized exact product resolution, scoped to one customer.
#[derive(Debug, Clone)]
pub struct CachedProduct {
	pub product_id: i64,
	pub item_code: String,
	pub description: String,
	pub uom: String,
	pub uom_id: i64,
	pub confidence: u8,
}

/// Cache for one parsing session.
#[derive(Debug, Default)]
pub struct ResolutionCache {
	customers: HashMap<String, CachedCustomer>,
	products: HashMap<(i64, String), CachedProduct>,
}

impl ResolutionCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Looks up a memoized customer by lowercase token.
	pub fn customer(&self, token: &str) -> Option<&CachedCustomer> {
		self.customers.get(token)
	}

	pub fn insert_customer(&mut self, token: impl Into<String>, hit: CachedCustomer) {
		self.customers.insert(token.into(), hit);
	}

	/// Looks up a memoized product by (customer, lowercase code).
	pub fn product(&self, customer_id: i64, code: &str) -> Option<&CachedProduct> {
		self.products.get(&(customer_id, code.to_string()))
	}

	pub fn insert_product(&mut self, customer_id: i64, code: impl Into<String>, hit: CachedProduct) {
		self.products.insert((customer_id, code.into()), hit);
	}

	/// Drops all memoized product entries.
	///
	/// Called when the customer context of a session changes, so entries
	/// scoped to the previous customer cannot survive a reparse.
	pub fn invalidate_products(&mut self) {
		self.products.clear();
	}

	#[cfg(test)]
	pub fn product_entries(&self) -> usize {
		self.products.len()
	}

	#[cfg(test)]
	pub fn customer_entries(&self) -> usize {
		self.customers.len()
	}
}
