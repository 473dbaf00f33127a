//! API types for HTTP endpoints and request/response structures.

use crate::{Order, OrderHistoryEntry, OrderItem, OrderStatus, ParsedOrder, TransitionAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to parse raw shorthand text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
	/// Raw shorthand input, e.g. "g18\n1t2sm4rb".
	pub input: String,
}

/// Request to re-resolve a previously parsed order under a corrected
/// customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReparseRequest {
	pub order: ParsedOrder,
	/// Operator-selected customer id; the correction is asserted, not
	/// inferred, so the resulting customer confidence is 100.
	pub customer_id: i64,
}

/// Request to persist a parsed order as a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOrderRequest {
	pub order: ParsedOrder,
}

/// Response after a draft order was persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOrderResponse {
	pub order_id: String,
	pub order_number: String,
}

/// Request to advance an order through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
	pub action: TransitionAction,
	#[serde(default)]
	pub notes: Option<String>,
	/// For delivery completion only: delivered quantity per order-item id.
	/// Items absent from the map default to their ordered quantity.
	#[serde(default)]
	pub delivered_quantities: Option<HashMap<String, Decimal>>,
}

/// Response to a lifecycle transition request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
	/// Whether the transition was applied. False means the guard rejected
	/// the request and nothing was written.
	pub applied: bool,
	/// The order's status after the request was handled.
	pub status: OrderStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// Complete order detail: header, lines and full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
	pub order: Order,
	pub items: Vec<OrderItem>,
	pub history: Vec<OrderHistoryEntry>,
}

/// One order in a customer's order-history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrderSummary {
	pub order: Order,
	pub item_count: usize,
	pub total_quantity: Decimal,
	/// Sum of delivered quantities; zero until delivery completes.
	pub total_delivered: Decimal,
}

/// Error envelope returned when an operation fails outright, e.g. the
/// store is unreachable. Carries an empty parse skeleton so callers always
/// receive the same response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
	pub error: String,
	pub order: ParsedOrder,
}

impl ErrorEnvelope {
	/// Builds an envelope for the given raw input and failure description.
	pub fn new(raw_input: impl Into<String>, error: impl Into<String>) -> Self {
		let error = error.into();
		let mut order = ParsedOrder::empty(raw_input);
		order.diagnostics.push(error.clone());
		Self { error, order }
	}
}
