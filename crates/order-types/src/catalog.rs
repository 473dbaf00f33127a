//! Catalog entities for the order entry system.
//!
//! These types mirror the persistence schema the resolver and lifecycle
//! components depend on: customers, products, units of measure, the learned
//! abbreviation tables and the per-customer ordering-frequency feedback.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer account that orders can be placed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
	/// Relational identity of the customer.
	pub id: i64,
	/// Display name, e.g. "Graceful 18th".
	pub name: String,
	/// Short customer code, e.g. "G18".
	pub code: String,
	/// Registered business name, if different from the display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub business_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

/// A unit of measure a product is sold in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOfMeasure {
	pub id: i64,
	/// Short code, e.g. "EA" or "PC".
	pub code: String,
	pub name: String,
}

/// A sellable product from the price catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
	/// Relational identity of the product.
	pub id: i64,
	/// Vendor item code, e.g. "TURKEY01".
	pub item_code: String,
	/// Human-readable description.
	pub description: String,
	/// Unit of measure this product is sold in.
	pub uom_id: i64,
	/// Current list price per unit, captured onto order lines at build time.
	pub price: Decimal,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vendor: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
}

/// A learned mapping from a shorthand token to a customer identity.
///
/// Abbreviations are unique per token, so an exact lookup resolves to at
/// most one customer. The confidence score is operator-asserted reliability
/// in the 0-100 range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAbbreviation {
	/// Lowercase shorthand token, e.g. "g18".
	pub abbreviation: String,
	/// Customer this token resolves to.
	pub customer_id: i64,
	/// Operator-asserted reliability (0-100).
	pub confidence_score: u8,
}

impl CustomerAbbreviation {
	/// Storage key for this mapping. Abbreviations are globally unique.
	pub fn storage_id(&self) -> String {
		self.abbreviation.to_lowercase()
	}
}

/// A learned mapping from a shorthand token to a product, scoped to one
/// customer. The same token may resolve differently per customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAbbreviation {
	/// Customer this mapping belongs to.
	pub customer_id: i64,
	/// Product this token resolves to.
	pub product_id: i64,
	/// Lowercase shorthand token, e.g. "rb".
	pub abbreviation: String,
	/// Operator-asserted reliability (0-100).
	pub confidence_score: u8,
	/// Number of confirmed deliveries that used this mapping.
	#[serde(default)]
	pub usage_count: u64,
	/// Timestamp of the most recent confirmed delivery using this mapping.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_used: Option<DateTime<Utc>>,
}

impl ProductAbbreviation {
	/// Storage key for this mapping, unique per (customer, abbreviation).
	pub fn storage_id(&self) -> String {
		Self::storage_id_for(self.customer_id, &self.abbreviation)
	}

	/// Builds the storage key for a (customer, abbreviation) pair.
	pub fn storage_id_for(customer_id: i64, abbreviation: &str) -> String {
		format!("{}:{}", customer_id, abbreviation.to_lowercase())
	}
}

/// Ordering-frequency feedback for a (customer, product) pair.
///
/// Incremented once per confirmed delivery; used to reinforce future
/// shorthand resolution for recurring customer-product pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerItem {
	pub customer_id: i64,
	pub product_id: i64,
	/// Count of confirmed deliveries for this pair.
	pub frequency_score: u64,
	/// Calendar date of the most recent delivery.
	pub last_ordered: NaiveDate,
}

impl CustomerItem {
	/// Storage key for this record, unique per (customer, product).
	pub fn storage_id(&self) -> String {
		Self::storage_id_for(self.customer_id, self.product_id)
	}

	/// Builds the storage key for a (customer, product) pair.
	pub fn storage_id_for(customer_id: i64, product_id: i64) -> String {
		format!("{}:{}", customer_id, product_id)
	}
}
