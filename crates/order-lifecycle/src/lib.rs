//! Order lifecycle management for the shorthand order entry system.
//!
//! Turns a resolved parse result into a persisted draft order and advances
//! persisted orders through a guarded state machine:
//! draft -> submitted -> out_for_delivery -> delivered -> archived.
//! Every applied transition appends exactly one append-only history entry,
//! and a completed delivery feeds the abbreviation-usage model that
//! improves future resolution.

use order_storage::{StorageError, StorageService};
use order_types::{Order, OrderStatus, TransitionAction};
use std::sync::Arc;
use thiserror::Error;

/// Draft order construction from parse results.
mod builder;
/// Post-delivery reinforcement of the abbreviation-usage model.
mod feedback;
/// Daily order-number sequence generation.
mod number;
/// Order detail and customer history queries.
mod queries;
/// The guarded state machine.
mod state;

/// Errors that can occur during lifecycle operations.
///
/// Guard violations are deliberately not represented here; they are a
/// typed non-error outcome ([`TransitionOutcome::Rejected`]) so callers
/// can branch without special-casing error types.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// The store failed or is unreachable.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	/// The referenced order does not exist.
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	/// A draft cannot be built from a parse whose customer is unresolved.
	#[error("Parsed order has no resolved customer")]
	CustomerUnresolved,
}

/// Result of a lifecycle transition request.
#[derive(Debug)]
pub enum TransitionOutcome {
	/// The transition was applied; the updated order is returned.
	Applied(Order),
	/// The guard rejected the request. Nothing was written and no history
	/// entry was recorded.
	Rejected {
		current: OrderStatus,
		requested: TransitionAction,
	},
}

impl TransitionOutcome {
	/// Whether the transition was applied.
	pub fn applied(&self) -> bool {
		matches!(self, TransitionOutcome::Applied(_))
	}
}

/// Manages persisted orders: building drafts, advancing the lifecycle and
/// serving order queries. Durable entities are mutated only through this
/// service.
pub struct LifecycleService {
	storage: Arc<StorageService>,
	/// Actor recorded on history entries written by this service.
	actor: String,
}

impl LifecycleService {
	pub fn new(storage: Arc<StorageService>, actor: impl Into<String>) -> Self {
		Self {
			storage,
			actor: actor.into(),
		}
	}
}

/// Maps a storage miss to `None`, propagating every other failure.
pub(crate) fn optional<T>(result: Result<T, StorageError>) -> Result<Option<T>, StorageError> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(StorageError::NotFound) => Ok(None),
		Err(e) => Err(e),
	}
}
