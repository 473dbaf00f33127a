//! HTTP server for the shorthand order entry API.
//!
//! Exposes parsing, draft creation, lifecycle transitions and order
//! queries over a small JSON API. Failed operations return an
//! [`ErrorEnvelope`] carrying an empty parse skeleton so clients always
//! receive the same response shape.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
	routing::{get, post},
	Router,
};
use order_config::ApiConfig;
use order_lifecycle::{LifecycleError, LifecycleService, TransitionOutcome};
use order_resolver::{ResolutionCache, ResolverError, ShorthandResolver};
use order_types::{
	BuildOrderRequest, BuildOrderResponse, CustomerOrderSummary, ErrorEnvelope, OrderDetails,
	OrderStatus, ParseRequest, ParsedOrder, ReparseRequest, TransitionRequest, TransitionResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Shorthand resolution engine.
	pub resolver: Arc<ShorthandResolver>,
	/// Lifecycle manager for persisted orders.
	pub lifecycle: Arc<LifecycleService>,
	/// Session resolution cache shared by all requests of this process.
	pub cache: Arc<Mutex<ResolutionCache>>,
}

type ApiError = (StatusCode, Json<ErrorEnvelope>);

fn error_response(status: StatusCode, raw_input: &str, message: impl Into<String>) -> ApiError {
	(status, Json(ErrorEnvelope::new(raw_input, message)))
}

fn resolver_error(raw_input: &str, e: ResolverError) -> ApiError {
	tracing::error!(error = %e, "shorthand resolution failed");
	error_response(StatusCode::INTERNAL_SERVER_ERROR, raw_input, e.to_string())
}

fn lifecycle_error(raw_input: &str, e: LifecycleError) -> ApiError {
	let status = match &e {
		LifecycleError::OrderNotFound(_) => StatusCode::NOT_FOUND,
		LifecycleError::CustomerUnresolved => StatusCode::UNPROCESSABLE_ENTITY,
		LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
	};
	if status == StatusCode::INTERNAL_SERVER_ERROR {
		tracing::error!(error = %e, "lifecycle operation failed");
	}
	error_response(status, raw_input, e.to_string())
}

/// Builds the API router. Separated from [`start_server`] so tests can
/// exercise the routes without binding a socket.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders/parse", post(handle_parse))
				.route("/orders/reparse", post(handle_reparse))
				.route("/orders", post(handle_build_order))
				.route("/orders/{id}", get(handle_order_details))
				.route("/orders/{id}/transition", post(handle_transition))
				.route("/customers/{id}/orders", get(handle_customer_orders)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until the process is stopped.
pub async fn start_server(
	api_config: ApiConfig,
	state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order entry API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/orders/parse requests.
///
/// Parses raw shorthand into a resolved order preview. Unresolved tokens
/// come back as tagged variants with ranked alternatives, never as an
/// error status.
async fn handle_parse(
	State(state): State<AppState>,
	Json(request): Json<ParseRequest>,
) -> Result<Json<ParsedOrder>, ApiError> {
	let mut cache = state.cache.lock().await;
	state
		.resolver
		.parse_order(&request.input, &mut cache)
		.await
		.map(Json)
		.map_err(|e| resolver_error(&request.input, e))
}

/// Handles POST /api/orders/reparse requests.
///
/// Re-resolves a previously parsed order under an operator-selected
/// customer identity.
async fn handle_reparse(
	State(state): State<AppState>,
	Json(request): Json<ReparseRequest>,
) -> Result<Json<ParsedOrder>, ApiError> {
	let raw_input = request.order.raw_input.clone();
	let mut cache = state.cache.lock().await;
	state
		.resolver
		.reparse_with_customer(request.order, request.customer_id, &mut cache)
		.await
		.map(Json)
		.map_err(|e| resolver_error(&raw_input, e))
}

/// Handles POST /api/orders requests.
///
/// Persists a parsed order as a draft.
async fn handle_build_order(
	State(state): State<AppState>,
	Json(request): Json<BuildOrderRequest>,
) -> Result<Json<BuildOrderResponse>, ApiError> {
	let raw_input = request.order.raw_input.clone();
	let order = state
		.lifecycle
		.build_draft(&request.order)
		.await
		.map_err(|e| lifecycle_error(&raw_input, e))?;

	Ok(Json(BuildOrderResponse {
		order_id: order.id,
		order_number: order.order_number,
	}))
}

/// Handles POST /api/orders/{id}/transition requests.
///
/// Guard rejections are reported with 409 and `applied: false`; the order
/// is untouched in that case.
async fn handle_transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<TransitionRequest>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
	let outcome = state
		.lifecycle
		.transition(
			&id,
			request.action,
			request.notes.as_deref(),
			request.delivered_quantities.as_ref(),
		)
		.await
		.map_err(|e| lifecycle_error("", e))?;

	let response = match outcome {
		TransitionOutcome::Applied(order) => (
			StatusCode::OK,
			Json(TransitionResponse {
				applied: true,
				status: order.status,
				message: None,
			}),
		),
		TransitionOutcome::Rejected { current, requested } => (
			StatusCode::CONFLICT,
			Json(TransitionResponse {
				applied: false,
				status: current,
				message: Some(format!(
					"cannot {} an order in status {}",
					requested, current
				)),
			}),
		),
	};

	Ok(response)
}

/// Handles GET /api/orders/{id} requests.
async fn handle_order_details(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderDetails>, ApiError> {
	state
		.lifecycle
		.order_details(&id)
		.await
		.map(Json)
		.map_err(|e| lifecycle_error("", e))
}

/// Query parameters for the customer order listing.
#[derive(Debug, Deserialize)]
struct CustomerOrdersQuery {
	/// Restrict the listing to orders currently in this status.
	status: Option<OrderStatus>,
}

/// Handles GET /api/customers/{id}/orders requests.
///
/// Accepts an optional `?status=` filter, e.g. `?status=delivered`.
async fn handle_customer_orders(
	Path(id): Path<i64>,
	Query(query): Query<CustomerOrdersQuery>,
	State(state): State<AppState>,
) -> Result<Json<Vec<CustomerOrderSummary>>, ApiError> {
	state
		.lifecycle
		.customer_orders(id, query.status)
		.await
		.map(Json)
		.map_err(|e| lifecycle_error("", e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_resolver::ResolverOptions;
	use order_storage::implementations::memory::MemoryStorage;
	use order_storage::StorageService;
	use order_types::{Customer, CustomerAbbreviation, StorageKey, TransitionAction};

	async fn state() -> AppState {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));

		let customer = Customer {
			id: 1,
			name: "Graceful 18th".into(),
			code: "G18".into(),
			business_name: None,
			phone: None,
			email: None,
		};
		storage
			.store(StorageKey::Customers.as_str(), "1", &customer)
			.await
			.unwrap();
		let abbreviation = CustomerAbbreviation {
			abbreviation: "g18".into(),
			customer_id: 1,
			confidence_score: 100,
		};
		storage
			.store(
				StorageKey::CustomerAbbreviations.as_str(),
				&abbreviation.storage_id(),
				&abbreviation,
			)
			.await
			.unwrap();

		let scorer = order_resolver::similarity::get_all_implementations()
			.into_iter()
			.find(|(name, _)| *name == "levenshtein")
			.map(|(_, factory)| factory())
			.unwrap();

		AppState {
			resolver: Arc::new(ShorthandResolver::new(
				Arc::clone(&storage),
				scorer,
				ResolverOptions::default(),
			)),
			lifecycle: Arc::new(LifecycleService::new(storage, "System")),
			cache: Arc::new(Mutex::new(ResolutionCache::default())),
		}
	}

	#[tokio::test]
	async fn parse_endpoint_returns_resolved_customer() {
		let state = state().await;

		let Json(parsed) = handle_parse(
			State(state),
			Json(ParseRequest {
				input: "g18\n2xx".into(),
			}),
		)
		.await
		.unwrap();

		assert_eq!(parsed.customer.customer_id(), Some(1));
		assert_eq!(parsed.items.len(), 1);
		assert!(parsed.items[0].product_id().is_none());
	}

	#[tokio::test]
	async fn transition_on_missing_order_maps_to_not_found() {
		let state = state().await;

		let result = handle_transition(
			Path("missing".to_string()),
			State(state),
			Json(TransitionRequest {
				action: TransitionAction::Submit,
				notes: None,
				delivered_quantities: None,
			}),
		)
		.await;

		let (status, _) = result.err().unwrap();
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn build_order_rejects_unresolved_customer() {
		let state = state().await;

		let result = handle_build_order(
			State(state),
			Json(BuildOrderRequest {
				order: ParsedOrder::empty("zz"),
			}),
		)
		.await;

		let (status, Json(envelope)) = result.err().unwrap();
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert!(!envelope.error.is_empty());
		assert_eq!(envelope.order.raw_input, "zz");
	}
}
