//! Transient parse results produced by the shorthand resolver.
//!
//! These types are created by one parse call and either discarded or
//! consumed by the order builder. Resolution outcomes are tagged variants so
//! an unresolved token can never be mistaken for a valid zero-confidence
//! match.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ranked candidate offered when exact customer resolution fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAlternative {
	pub customer_id: i64,
	pub name: String,
	pub code: String,
	/// The stored abbreviation that produced this candidate.
	pub abbreviation: String,
	/// Similarity of the input token to the abbreviation (0-100).
	pub similarity: u8,
	/// Stored confidence of the abbreviation mapping.
	pub confidence: u8,
}

/// A ranked candidate offered when exact product resolution fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAlternative {
	pub product_id: i64,
	pub item_code: String,
	pub description: String,
	/// The stored abbreviation that produced this candidate.
	pub abbreviation: String,
	/// Similarity of the input token to the abbreviation (0-100).
	pub similarity: u8,
	/// Stored confidence of the abbreviation mapping.
	pub confidence: u8,
	pub uom: String,
	pub uom_id: i64,
}

/// Outcome of resolving a customer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CustomerResolution {
	/// The token matched a stored abbreviation exactly, or was corrected by
	/// an operator (confidence 100).
	Resolved {
		customer_id: i64,
		name: String,
		code: String,
		confidence: u8,
	},
	/// No exact match; up to five fuzzy candidates ranked by similarity.
	Unresolved { alternatives: Vec<CustomerAlternative> },
}

/// Outcome of resolving a product token within a customer scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProductResolution {
	Resolved {
		product_id: i64,
		item_code: String,
		description: String,
		uom: String,
		uom_id: i64,
		confidence: u8,
	},
	/// No exact match; up to five fuzzy candidates ranked by similarity.
	Unresolved { alternatives: Vec<ProductAlternative> },
}

/// A parsed customer token with its resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCustomer {
	/// The raw input the token was extracted from.
	pub raw_input: String,
	pub resolution: CustomerResolution,
}

impl ParsedCustomer {
	/// Creates an unresolved customer with no candidates.
	pub fn unresolved(raw_input: impl Into<String>) -> Self {
		Self {
			raw_input: raw_input.into(),
			resolution: CustomerResolution::Unresolved {
				alternatives: Vec::new(),
			},
		}
	}

	/// Resolved customer id, if any.
	pub fn customer_id(&self) -> Option<i64> {
		match &self.resolution {
			CustomerResolution::Resolved { customer_id, .. } => Some(*customer_id),
			CustomerResolution::Unresolved { .. } => None,
		}
	}

	/// Resolution confidence; 0 means unresolved.
	pub fn confidence(&self) -> u8 {
		match &self.resolution {
			CustomerResolution::Resolved { confidence, .. } => *confidence,
			CustomerResolution::Unresolved { .. } => 0,
		}
	}
}

/// A parsed quantity + product-code token with its resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedItem {
	/// The raw token, e.g. "2sm".
	pub raw_input: String,
	/// Ordered quantity; always greater than zero.
	pub quantity: Decimal,
	pub resolution: ProductResolution,
}

impl ParsedItem {
	/// Creates an unresolved item with no candidates.
	pub fn unresolved(raw_input: impl Into<String>, quantity: Decimal) -> Self {
		Self {
			raw_input: raw_input.into(),
			quantity,
			resolution: ProductResolution::Unresolved {
				alternatives: Vec::new(),
			},
		}
	}

	/// Resolved product id, if any.
	pub fn product_id(&self) -> Option<i64> {
		match &self.resolution {
			ProductResolution::Resolved { product_id, .. } => Some(*product_id),
			ProductResolution::Unresolved { .. } => None,
		}
	}

	/// Resolution confidence; 0 means unresolved.
	pub fn confidence(&self) -> u8 {
		match &self.resolution {
			ProductResolution::Resolved { confidence, .. } => *confidence,
			ProductResolution::Unresolved { .. } => 0,
		}
	}
}

/// A complete parsed order: one customer, the items in textual order, the
/// original input and any non-fatal diagnostics accumulated while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOrder {
	pub customer: ParsedCustomer,
	pub items: Vec<ParsedItem>,
	pub raw_input: String,
	/// Non-fatal parsing diagnostics, never treated as errors.
	#[serde(default)]
	pub diagnostics: Vec<String>,
}

impl ParsedOrder {
	/// Creates an empty skeleton for error envelopes.
	pub fn empty(raw_input: impl Into<String>) -> Self {
		let raw_input = raw_input.into();
		Self {
			customer: ParsedCustomer::unresolved(raw_input.clone()),
			items: Vec::new(),
			raw_input,
			diagnostics: Vec::new(),
		}
	}
}
