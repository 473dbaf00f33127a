//! Persisted order entities and lifecycle status types.
//!
//! Orders move through a guarded lifecycle:
//! draft -> submitted -> out_for_delivery -> delivered -> archived.
//! Every status change appends exactly one history entry; history is never
//! mutated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a persisted order.
///
/// `Processing` is accepted as a predecessor of `OutForDelivery` but no
/// transition in this core produces it; it is treated as an externally-set
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	Draft,
	Submitted,
	Processing,
	OutForDelivery,
	Delivered,
	Archived,
}

impl OrderStatus {
	/// Returns the string representation used in storage and the API.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Draft => "draft",
			OrderStatus::Submitted => "submitted",
			OrderStatus::Processing => "processing",
			OrderStatus::OutForDelivery => "out_for_delivery",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Archived => "archived",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A lifecycle transition requested by an external caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
	Submit,
	StartDelivery,
	CompleteDelivery,
	Archive,
}

impl TransitionAction {
	/// The status this action moves an order into.
	pub fn target(&self) -> OrderStatus {
		match self {
			TransitionAction::Submit => OrderStatus::Submitted,
			TransitionAction::StartDelivery => OrderStatus::OutForDelivery,
			TransitionAction::CompleteDelivery => OrderStatus::Delivered,
			TransitionAction::Archive => OrderStatus::Archived,
		}
	}
}

impl fmt::Display for TransitionAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			TransitionAction::Submit => "submit",
			TransitionAction::StartDelivery => "start_delivery",
			TransitionAction::CompleteDelivery => "complete_delivery",
			TransitionAction::Archive => "archive",
		};
		f.write_str(s)
	}
}

/// A persisted order header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Human-facing order number, format `YYYYMMDD-NNNN`.
	pub order_number: String,
	pub customer_id: i64,
	/// Calendar date the order was entered.
	pub order_date: NaiveDate,
	pub status: OrderStatus,
	/// How the order was captured, e.g. "shorthand".
	pub order_method: String,
	pub subtotal: Decimal,
	pub total_amount: Decimal,
	/// The original shorthand input, kept for audit and replay.
	pub original_input: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub submitted_at: Option<DateTime<Utc>>,
	/// Planned delivery date, set when delivery starts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivery_date: Option<NaiveDate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered_date: Option<NaiveDate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub archived_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivery_notes: Option<String>,
}

/// A persisted order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
	/// Unique identifier for this line.
	pub id: String,
	pub order_id: String,
	pub product_id: i64,
	pub item_code: String,
	pub product_name: String,
	/// Ordered quantity; always greater than zero.
	pub quantity: Decimal,
	/// Set only when the order reaches delivered.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered_quantity: Option<Decimal>,
	pub uom_id: i64,
	/// Unit price captured from the catalog at order time.
	pub unit_price: Decimal,
	pub line_total: Decimal,
	/// The original shorthand token, kept for trend learning.
	pub customer_reference: String,
	/// 1-based position within the order.
	pub line_number: u32,
}

/// An append-only record of one status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
	pub order_id: String,
	/// None for the initial none -> draft entry.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub old_status: Option<OrderStatus>,
	pub new_status: OrderStatus,
	pub changed_by: String,
	pub notes: String,
	pub created_at: DateTime<Utc>,
}
