//! Storage namespaces for the order entry system.

use std::str::FromStr;

/// Storage namespaces for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Customer accounts keyed by customer id.
	Customers,
	/// Customer abbreviation mappings keyed by lowercase token.
	CustomerAbbreviations,
	/// Products keyed by product id.
	Products,
	/// Product abbreviation mappings keyed by `customer:token`.
	ProductAbbreviations,
	/// Units of measure keyed by uom id.
	Units,
	/// Order headers keyed by order id.
	Orders,
	/// Order line collections keyed by order id.
	OrderItems,
	/// Append-only history collections keyed by order id.
	OrderHistory,
	/// Order-number uniqueness index mapping number to order id.
	OrderByNumber,
	/// Daily order-number sequence counters keyed by `YYYYMMDD`.
	OrderSequences,
	/// Ordering-frequency feedback keyed by `customer:product`.
	CustomerItems,
}

impl StorageKey {
	/// Returns the string representation of the storage namespace.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Customers => "customers",
			StorageKey::CustomerAbbreviations => "customer_abbreviations",
			StorageKey::Products => "products",
			StorageKey::ProductAbbreviations => "product_abbreviations",
			StorageKey::Units => "units",
			StorageKey::Orders => "orders",
			StorageKey::OrderItems => "order_items",
			StorageKey::OrderHistory => "order_history",
			StorageKey::OrderByNumber => "order_by_number",
			StorageKey::OrderSequences => "order_sequences",
			StorageKey::CustomerItems => "customer_items",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Customers,
			Self::CustomerAbbreviations,
			Self::Products,
			Self::ProductAbbreviations,
			Self::Units,
			Self::Orders,
			Self::OrderItems,
			Self::OrderHistory,
			Self::OrderByNumber,
			Self::OrderSequences,
			Self::CustomerItems,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"customers" => Ok(Self::Customers),
			"customer_abbreviations" => Ok(Self::CustomerAbbreviations),
			"products" => Ok(Self::Products),
			"product_abbreviations" => Ok(Self::ProductAbbreviations),
			"units" => Ok(Self::Units),
			"orders" => Ok(Self::Orders),
			"order_items" => Ok(Self::OrderItems),
			"order_history" => Ok(Self::OrderHistory),
			"order_by_number" => Ok(Self::OrderByNumber),
			"order_sequences" => Ok(Self::OrderSequences),
			"customer_items" => Ok(Self::CustomerItems),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
