//! Post-delivery reinforcement of the resolution model.
//!
//! A completed delivery is the strongest signal that the shorthand was
//! interpreted correctly, so each delivered line feeds back into the
//! durable records the resolver ranks by: the customer's item-frequency
//! record is upserted and every abbreviation the customer has for that
//! product gets its usage count bumped. Feedback failures are logged and
//! swallowed per line so a bad record cannot block the delivery itself.

use crate::{optional, LifecycleError, LifecycleService};
use chrono::{NaiveDate, Utc};
use order_types::{CustomerItem, Order, OrderItem, ProductAbbreviation, StorageKey};
use rust_decimal::Decimal;

impl LifecycleService {
	/// Records delivery feedback for every line item that was actually
	/// delivered. Lines with a zero delivered quantity carry no signal and
	/// must not reinforce anything.
	pub(crate) async fn record_delivery(
		&self,
		order: &Order,
		today: NaiveDate,
	) -> Result<(), LifecycleError> {
		let items = self
			.storage
			.retrieve::<Vec<OrderItem>>(StorageKey::OrderItems.as_str(), &order.id)
			.await?;

		let delivered: Vec<&OrderItem> = items
			.iter()
			.filter(|item| item.delivered_quantity.is_some_and(|q| q > Decimal::ZERO))
			.collect();

		for item in &delivered {
			if let Err(e) = self
				.bump_item_frequency(order.customer_id, item.product_id, today)
				.await
			{
				tracing::warn!(
					order_id = %order.id,
					product_id = item.product_id,
					error = %e,
					"failed to record item frequency"
				);
			}
			if let Err(e) = self
				.bump_abbreviation_usage(order.customer_id, item.product_id)
				.await
			{
				tracing::warn!(
					order_id = %order.id,
					product_id = item.product_id,
					error = %e,
					"failed to record abbreviation usage"
				);
			}
		}

		tracing::debug!(
			order_id = %order.id,
			customer_id = order.customer_id,
			lines = delivered.len(),
			"delivery feedback recorded"
		);
		Ok(())
	}

	/// Upserts the customer's frequency record for a delivered product.
	async fn bump_item_frequency(
		&self,
		customer_id: i64,
		product_id: i64,
		today: NaiveDate,
	) -> Result<(), LifecycleError> {
		let namespace = StorageKey::CustomerItems.as_str();
		let id = CustomerItem::storage_id_for(customer_id, product_id);

		let record = match optional(self.storage.retrieve::<CustomerItem>(namespace, &id).await)? {
			Some(mut existing) => {
				existing.frequency_score += 1;
				existing.last_ordered = today;
				existing
			},
			None => CustomerItem {
				customer_id,
				product_id,
				frequency_score: 1,
				last_ordered: today,
			},
		};

		self.storage.store(namespace, &id, &record).await?;
		Ok(())
	}

	/// Increments usage on every abbreviation this customer has for the
	/// delivered product. Customers commonly carry several shorthands for
	/// the same product; all of them earned the reinforcement.
	async fn bump_abbreviation_usage(
		&self,
		customer_id: i64,
		product_id: i64,
	) -> Result<(), LifecycleError> {
		let namespace = StorageKey::ProductAbbreviations.as_str();
		let now = Utc::now();

		for mut abbreviation in self
			.storage
			.retrieve_all::<ProductAbbreviation>(namespace)
			.await?
		{
			if abbreviation.customer_id != customer_id || abbreviation.product_id != product_id {
				continue;
			}
			abbreviation.usage_count += 1;
			abbreviation.last_used = Some(now);
			let id =
				ProductAbbreviation::storage_id_for(customer_id, &abbreviation.abbreviation);
			self.storage.store(namespace, &id, &abbreviation).await?;
		}

		Ok(())
	}
}
