//! Draft order construction.
//!
//! Consumes a resolved [`ParsedOrder`] and persists it as a draft: order
//! header, line items with prices captured from the catalog, computed
//! totals, the order-number index entry and the initial none -> draft
//! history entry. The writes are staged; if any of them fails, everything
//! already written for this order is removed again so a partially-written
//! order is never visible.

use crate::{number, optional, LifecycleError, LifecycleService};
use chrono::Utc;
use order_types::{
	Order, OrderHistoryEntry, OrderItem, OrderStatus, ParsedOrder, Product, ProductResolution,
	StorageKey,
};
use rust_decimal::Decimal;
use uuid::Uuid;

impl LifecycleService {
	/// Persists a parsed order as a draft.
	///
	/// Only resolved items become order lines; unresolved items were
	/// already reported as diagnostics during parsing and are skipped
	/// here. Fails with [`LifecycleError::CustomerUnresolved`] when the
	/// parse has no customer identity to attach the order to.
	pub async fn build_draft(&self, parsed: &ParsedOrder) -> Result<Order, LifecycleError> {
		let customer_id = parsed
			.customer
			.customer_id()
			.ok_or(LifecycleError::CustomerUnresolved)?;

		let now = Utc::now();
		let today = now.date_naive();
		let order_number = number::next_order_number(&self.storage, today, now).await;
		let order_id = Uuid::new_v4().to_string();

		let mut items = Vec::new();
		let mut subtotal = Decimal::ZERO;
		let mut line_number: u32 = 1;

		for item in &parsed.items {
			let ProductResolution::Resolved {
				product_id,
				item_code,
				description,
				uom_id,
				..
			} = &item.resolution
			else {
				continue;
			};

			let unit_price = optional(
				self.storage
					.retrieve::<Product>(StorageKey::Products.as_str(), &product_id.to_string())
					.await,
			)?
			.map(|product| product.price)
			.unwrap_or(Decimal::ZERO);

			let line_total = item.quantity * unit_price;
			subtotal += line_total;

			items.push(OrderItem {
				id: Uuid::new_v4().to_string(),
				order_id: order_id.clone(),
				product_id: *product_id,
				item_code: item_code.clone(),
				product_name: description.clone(),
				quantity: item.quantity,
				delivered_quantity: None,
				uom_id: *uom_id,
				unit_price,
				line_total,
				customer_reference: item.raw_input.clone(),
				line_number,
			});
			line_number += 1;
		}

		let order = Order {
			id: order_id.clone(),
			order_number: order_number.clone(),
			customer_id,
			order_date: today,
			status: OrderStatus::Draft,
			order_method: "shorthand".to_string(),
			subtotal,
			total_amount: subtotal,
			original_input: parsed.raw_input.clone(),
			created_at: now,
			updated_at: now,
			submitted_at: None,
			delivery_date: None,
			delivered_date: None,
			delivered_at: None,
			archived_at: None,
			delivery_notes: None,
		};

		let history = vec![OrderHistoryEntry {
			order_id: order_id.clone(),
			old_status: None,
			new_status: OrderStatus::Draft,
			changed_by: self.actor.clone(),
			notes: "Order created from shorthand input".to_string(),
			created_at: now,
		}];

		self.commit_new_order(&order, &items, &history).await?;

		tracing::info!(
			order_id = %order.id,
			order_number = %order.order_number,
			customer_id,
			lines = items.len(),
			"draft order persisted"
		);

		Ok(order)
	}

	/// Writes all records belonging to a new order, removing everything
	/// already written if any single write fails. The header goes last so
	/// the order only becomes addressable once its lines, history and
	/// number index are in place.
	async fn commit_new_order(
		&self,
		order: &Order,
		items: &[OrderItem],
		history: &[OrderHistoryEntry],
	) -> Result<(), LifecycleError> {
		let mut written: Vec<(&'static str, String)> = Vec::new();

		let result = async {
			self.storage
				.store(StorageKey::OrderItems.as_str(), &order.id, &items.to_vec())
				.await?;
			written.push((StorageKey::OrderItems.as_str(), order.id.clone()));

			self.storage
				.store(
					StorageKey::OrderHistory.as_str(),
					&order.id,
					&history.to_vec(),
				)
				.await?;
			written.push((StorageKey::OrderHistory.as_str(), order.id.clone()));

			self.storage
				.store(
					StorageKey::OrderByNumber.as_str(),
					&order.order_number,
					&order.id,
				)
				.await?;
			written.push((StorageKey::OrderByNumber.as_str(), order.order_number.clone()));

			self.storage
				.store(StorageKey::Orders.as_str(), &order.id, order)
				.await?;

			Ok::<(), LifecycleError>(())
		}
		.await;

		if result.is_err() {
			for (namespace, id) in written {
				if let Err(e) = self.storage.remove(namespace, &id).await {
					tracing::warn!(
						namespace,
						id = %id,
						error = %e,
						"failed to undo partial order write"
					);
				}
			}
		}

		result
	}
}
