//! Order detail and customer-history queries.

use crate::{optional, LifecycleError, LifecycleService};
use order_types::{
	CustomerOrderSummary, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus,
	StorageKey,
};
use rust_decimal::Decimal;

impl LifecycleService {
	/// Loads an order with its line items and full history.
	pub async fn order_details(&self, order_id: &str) -> Result<OrderDetails, LifecycleError> {
		let order = optional(
			self.storage
				.retrieve::<Order>(StorageKey::Orders.as_str(), order_id)
				.await,
		)?
		.ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;

		let items = optional(
			self.storage
				.retrieve::<Vec<OrderItem>>(StorageKey::OrderItems.as_str(), order_id)
				.await,
		)?
		.unwrap_or_default();

		let history = optional(
			self.storage
				.retrieve::<Vec<OrderHistoryEntry>>(StorageKey::OrderHistory.as_str(), order_id)
				.await,
		)?
		.unwrap_or_default();

		Ok(OrderDetails {
			order,
			items,
			history,
		})
	}

	/// Lists a customer's orders, most recent first, with per-order line
	/// counts and quantity totals. An optional status narrows the listing
	/// to orders currently in that status.
	pub async fn customer_orders(
		&self,
		customer_id: i64,
		status: Option<OrderStatus>,
	) -> Result<Vec<CustomerOrderSummary>, LifecycleError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all::<Order>(StorageKey::Orders.as_str())
			.await?
			.into_iter()
			.filter(|order| order.customer_id == customer_id)
			.filter(|order| status.is_none_or(|wanted| order.status == wanted))
			.collect();

		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let mut summaries = Vec::with_capacity(orders.len());
		for order in orders {
			let items = optional(
				self.storage
					.retrieve::<Vec<OrderItem>>(StorageKey::OrderItems.as_str(), &order.id)
					.await,
			)?
			.unwrap_or_default();

			let total_quantity = items.iter().map(|item| item.quantity).sum();
			let total_delivered = items
				.iter()
				.filter_map(|item| item.delivered_quantity)
				.sum::<Decimal>();

			summaries.push(CustomerOrderSummary {
				item_count: items.len(),
				total_quantity,
				total_delivered,
				order,
			});
		}

		Ok(summaries)
	}
}
