//! The guarded lifecycle state machine.
//!
//! Transitions are requested by action, not by target status, and the
//! guard decides from the order's *current persisted* status whether the
//! action applies. A rejected request is a typed outcome, not an error:
//! nothing is written and no history entry is recorded. Applied
//! transitions update the order header, append exactly one history entry
//! and, for completed deliveries, stamp delivered quantities on the line
//! items and reinforce the abbreviation-usage model.

use crate::{optional, LifecycleError, LifecycleService, TransitionOutcome};
use chrono::Utc;
use order_types::{Order, OrderHistoryEntry, OrderItem, OrderStatus, StorageKey, TransitionAction};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Whether `action` is permitted for an order currently in `current`.
///
/// Processing is an externally-set status; orders in it rejoin the
/// lifecycle at the delivery step.
fn permitted(current: OrderStatus, action: TransitionAction) -> bool {
	matches!(
		(current, action),
		(OrderStatus::Draft, TransitionAction::Submit)
			| (OrderStatus::Submitted, TransitionAction::StartDelivery)
			| (OrderStatus::Processing, TransitionAction::StartDelivery)
			| (OrderStatus::OutForDelivery, TransitionAction::CompleteDelivery)
			| (OrderStatus::Delivered, TransitionAction::Archive)
	)
}

impl LifecycleService {
	/// Applies a lifecycle action to a persisted order.
	///
	/// Returns [`TransitionOutcome::Rejected`] without writing anything
	/// when the order's current status does not permit the action. For
	/// [`TransitionAction::CompleteDelivery`], `delivered_quantities` maps
	/// line-item ids to actually-delivered quantities; lines absent from
	/// the map are recorded as delivered in full.
	pub async fn transition(
		&self,
		order_id: &str,
		action: TransitionAction,
		notes: Option<&str>,
		delivered_quantities: Option<&HashMap<String, Decimal>>,
	) -> Result<TransitionOutcome, LifecycleError> {
		let orders = StorageKey::Orders.as_str();

		let mut order = optional(self.storage.retrieve::<Order>(orders, order_id).await)?
			.ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;

		if !permitted(order.status, action) {
			tracing::debug!(
				order_id,
				current = %order.status,
				requested = ?action,
				"transition rejected by guard"
			);
			return Ok(TransitionOutcome::Rejected {
				current: order.status,
				requested: action,
			});
		}

		let now = Utc::now();
		let today = now.date_naive();
		let previous = order.status;

		order.status = action.target();
		order.updated_at = now;

		let default_notes = match action {
			TransitionAction::Submit => {
				order.submitted_at = Some(now);
				"Order submitted for processing".to_string()
			},
			TransitionAction::StartDelivery => {
				order.delivery_date = Some(today);
				format!("Out for delivery on {}", today)
			},
			TransitionAction::CompleteDelivery => {
				order.delivered_date = Some(today);
				order.delivered_at = Some(now);
				order.delivery_notes = notes.map(str::to_string);
				self.stamp_delivered_quantities(&order.id, delivered_quantities)
					.await?;
				format!("Delivered on {}", today)
			},
			TransitionAction::Archive => {
				order.archived_at = Some(now);
				"Order archived".to_string()
			},
		};

		let entry_notes = match notes {
			Some(extra) if !extra.is_empty() => format!("{}. {}", default_notes, extra),
			_ => default_notes,
		};

		self.storage.update(orders, order_id, &order).await?;
		self.append_history(&order, previous, entry_notes, now).await?;

		if action == TransitionAction::CompleteDelivery {
			self.record_delivery(&order, today).await?;
		}

		tracing::info!(
			order_id,
			order_number = %order.order_number,
			from = %previous,
			to = %order.status,
			"order transition applied"
		);

		Ok(TransitionOutcome::Applied(order))
	}

	/// Writes delivered quantities onto the order's line items. Lines not
	/// named in the map default to their ordered quantity.
	async fn stamp_delivered_quantities(
		&self,
		order_id: &str,
		delivered: Option<&HashMap<String, Decimal>>,
	) -> Result<(), LifecycleError> {
		let namespace = StorageKey::OrderItems.as_str();
		let mut items = self
			.storage
			.retrieve::<Vec<OrderItem>>(namespace, order_id)
			.await?;

		for item in &mut items {
			let quantity = delivered
				.and_then(|map| map.get(&item.id).copied())
				.unwrap_or(item.quantity);
			item.delivered_quantity = Some(quantity);
		}

		self.storage.update(namespace, order_id, &items).await?;
		Ok(())
	}

	/// Appends one history entry for an applied transition. History is
	/// append-only; existing entries are never rewritten.
	async fn append_history(
		&self,
		order: &Order,
		previous: OrderStatus,
		notes: String,
		now: chrono::DateTime<Utc>,
	) -> Result<(), LifecycleError> {
		let namespace = StorageKey::OrderHistory.as_str();
		let mut history = optional(
			self.storage
				.retrieve::<Vec<OrderHistoryEntry>>(namespace, &order.id)
				.await,
		)?
		.unwrap_or_default();

		history.push(OrderHistoryEntry {
			order_id: order.id.clone(),
			old_status: Some(previous),
			new_status: order.status,
			changed_by: self.actor.clone(),
			notes,
			created_at: now,
		});

		self.storage.store(namespace, &order.id, &history).await?;
		Ok(())
	}
}
