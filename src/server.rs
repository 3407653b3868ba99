// 🌐 HTTP API - ledger views and record entry over JSON
// Only compiled with the `server` feature.
//
// Every GET recomputes from a fresh store snapshot; POSTs validate first
// and only append when the request is clean.

use crate::ledger::{load_view, record_expense, record_payment, LedgerView, RecordError};
use crate::store::RecordStore;
use crate::validation::{ExpenseRequest, PaymentRequest};
use anyhow::anyhow;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Box<dyn RecordStore>>>,
}

impl AppState {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn view(&self) -> anyhow::Result<LedgerView> {
        let store = self
            .store
            .lock()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        load_view(&**store)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        let body = ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            details: Vec::new(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

fn failure(status: StatusCode, error: String, details: Vec<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(error),
        details,
    };
    (status, Json(body)).into_response()
}

fn internal_error(context: &str, e: anyhow::Error) -> Response {
    tracing::error!("{}: {:#}", context, e);
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {}", context, e), Vec::new())
}

fn record_failure(e: RecordError) -> Response {
    match e {
        RecordError::Invalid(errors) => failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation failed".to_string(),
            errors.iter().map(|e| e.to_string()).collect(),
        ),
        RecordError::Store(e) => internal_error("Error saving record", e),
    }
}

/// One row of the balances table
#[derive(Serialize)]
struct BalanceEntry {
    person: String,
    amount: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/summary - Records, balances and settlement in one go
async fn get_summary(State(state): State<AppState>) -> Response {
    match state.view() {
        Ok(view) => ApiResponse::ok(view),
        Err(e) => internal_error("Error loading ledger", e),
    }
}

/// GET /api/expenses
async fn list_expenses(State(state): State<AppState>) -> Response {
    match state.view() {
        Ok(view) => ApiResponse::ok(view.expenses),
        Err(e) => internal_error("Error loading expenses", e),
    }
}

/// GET /api/payments
async fn list_payments(State(state): State<AppState>) -> Response {
    match state.view() {
        Ok(view) => ApiResponse::ok(view.payments),
        Err(e) => internal_error("Error loading payments", e),
    }
}

/// GET /api/balances - person / amount
async fn get_balances(State(state): State<AppState>) -> Response {
    match state.view() {
        Ok(view) => {
            let rows: Vec<BalanceEntry> = view
                .balances
                .into_iter()
                .map(|(person, amount)| BalanceEntry { person, amount })
                .collect();
            ApiResponse::ok(rows)
        }
        Err(e) => internal_error("Error computing balances", e),
    }
}

/// GET /api/settlement - debtor / creditor / amount
async fn get_settlement(State(state): State<AppState>) -> Response {
    match state.view() {
        Ok(view) => ApiResponse::ok(view.settlement),
        Err(e) => internal_error("Error computing settlement", e),
    }
}

/// POST /api/expenses
async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<ExpenseRequest>,
) -> Response {
    let mut store = match state.store.lock() {
        Ok(store) => store,
        Err(_) => return internal_error("Error saving record", anyhow!("record store lock poisoned")),
    };

    match record_expense(&mut **store, &request) {
        Ok(record) => ApiResponse::ok(record),
        Err(e) => record_failure(e),
    }
}

/// POST /api/payments
async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Response {
    let mut store = match state.store.lock() {
        Ok(store) => store,
        Err(_) => return internal_error("Error saving record", anyhow!("record store lock poisoned")),
    };

    match record_payment(&mut **store, &request) {
        Ok(record) => ApiResponse::ok(record),
        Err(e) => record_failure(e),
    }
}

/// Build the API router over a record store
pub fn router(store: Box<dyn RecordStore>) -> Router {
    let state = AppState::new(store);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/summary", get(get_summary))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/payments", get(list_payments).post(create_payment))
        .route("/balances", get(get_balances))
        .route("/settlement", get(get_settlement))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
