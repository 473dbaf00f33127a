//! Daily order-number sequence generation.
//!
//! Order numbers follow `YYYYMMDD-NNNN` with a 4-digit daily sequence. The
//! sequence comes from a dedicated per-day counter record rather than a
//! max-plus-one scan over existing orders, and every candidate is checked
//! against the order-number index before being handed out, so a counter
//! that fell behind cannot reissue a taken number. If the store fails
//! while generating, a timestamp-based identifier is used instead; that
//! fallback is a degraded mode with weaker uniqueness, not a substitute
//! for the sequence.

use chrono::{DateTime, NaiveDate, Utc};
use order_storage::{StorageError, StorageService};
use order_types::StorageKey;
use serde::{Deserialize, Serialize};

/// Upper bound on index-collision retries per generation attempt.
const MAX_SEQUENCE_ATTEMPTS: u32 = 1000;

/// Per-day counter record.
#[derive(Debug, Serialize, Deserialize)]
struct DailySequence {
	/// Day key, `YYYYMMDD`.
	date: String,
	/// Last sequence number handed out for this day.
	last: u32,
}

/// Returns the next order number for the given day.
pub(crate) async fn next_order_number(
	storage: &StorageService,
	today: NaiveDate,
	now: DateTime<Utc>,
) -> String {
	match try_next(storage, today).await {
		Ok(number) => number,
		Err(e) => {
			let fallback = now.format("%Y%m%d-%H%M%S").to_string();
			tracing::warn!(
				error = %e,
				fallback = %fallback,
				"order number sequence unavailable, falling back to timestamp identifier"
			);
			fallback
		},
	}
}

async fn try_next(storage: &StorageService, today: NaiveDate) -> Result<String, StorageError> {
	let day = today.format("%Y%m%d").to_string();
	let sequences = StorageKey::OrderSequences.as_str();

	let mut last = match storage.retrieve::<DailySequence>(sequences, &day).await {
		Ok(sequence) => sequence.last,
		Err(StorageError::NotFound) => 0,
		Err(e) => return Err(e),
	};

	for _ in 0..MAX_SEQUENCE_ATTEMPTS {
		let candidate = last + 1;
		let number = format!("{}-{:04}", day, candidate);

		storage
			.store(
				sequences,
				&day,
				&DailySequence {
					date: day.clone(),
					last: candidate,
				},
			)
			.await?;

		if !storage
			.exists(StorageKey::OrderByNumber.as_str(), &number)
			.await?
		{
			return Ok(number);
		}

		tracing::debug!(number = %number, "order number already taken, advancing sequence");
		last = candidate;
	}

	Err(StorageError::Backend(format!(
		"order number space exhausted for {}",
		day
	)))
}
