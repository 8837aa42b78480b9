// 🌐 HTTP API
// Statement upload and transaction listing over axum

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::{get_all_transactions, get_transactions_by_bank, SqliteSink, StoredTransaction};
use crate::error::{error_chain, ImportError};
use crate::service;

/// Largest accepted statement upload (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Unfinished SQL transactions roll back on drop, so a poisoned connection is intact
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }
}

/// Transaction response (flattened for API consumers)
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Display form, e.g. `-£25.50`
    pub amount: String,
    pub amount_minor: i64,
    pub currency: String,
    pub bank: String,
    pub category: Option<String>,
}

impl From<StoredTransaction> for TransactionResponse {
    fn from(stored: StoredTransaction) -> Self {
        let tx = stored.transaction;
        Self {
            id: stored.id,
            date: tx.date,
            amount: tx.amount.display(),
            amount_minor: tx.amount.minor_units,
            currency: tx.amount.currency,
            description: tx.description,
            bank: tx.bank,
            category: tx.category,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct BankQuery {
    bank: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error rendered as an `ApiResponse` with `success: false`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            details: None,
        }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &err {
            ImportError::InvalidBankType(_) => "Unsupported bank type",
            ImportError::ParseFailure(_) => "Failed to parse statement",
            ImportError::Storage(_) => "Failed to store transactions",
        };

        match &err {
            ImportError::Storage(source) => tracing::error!(error = ?source, "upload storage failure"),
            other => tracing::warn!(error = %error_chain(other), "upload rejected"),
        }

        // Storage internals stay in the server log
        let details = err.parse_error().map(|source| error_chain(source));
        Self {
            status,
            message: message.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /ping - Heartbeat
async fn ping() -> &'static str {
    "."
}

/// GET /transactions - Stored transactions, newest first (optional `?bank=`)
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<BankQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let conn = state.conn();

    let result = match query.bank.as_deref() {
        Some(bank) => get_transactions_by_bank(&conn, bank),
        None => get_all_transactions(&conn),
    };

    let transactions = result.map_err(|e| {
        tracing::error!(error = ?e, "failed to fetch transactions");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch transactions")
    })?;

    let response: Vec<TransactionResponse> = transactions.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /transactions/upload?bank=<id> - multipart form with a `file` field
async fn upload_transactions(
    State(state): State<AppState>,
    Query(query): Query<BankQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let bank = query
        .bank
        .filter(|bank| !bank.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing bank type parameter"))?;

    let mut multipart = multipart.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.body_text())
    })?;

    let mut file_data = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.body_text())
    })? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::bad_request("Failed to get file from form").with_details(e.body_text())
            })?;
            file_data = Some(bytes);
            break;
        }
    }
    let file_data = file_data.ok_or_else(|| ApiError::bad_request("Failed to get file from form"))?;

    tracing::info!(bank = %bank, bytes = file_data.len(), "statement upload received");

    let count = store_upload(&state, &bank, &file_data)?;

    Ok(Json(ApiResponse::ok(UploadResponse {
        message: format!("Successfully uploaded {} transactions", count),
        count,
    })))
}

fn store_upload(state: &AppState, bank: &str, mut file: &[u8]) -> Result<usize, ImportError> {
    let mut conn = state.conn();
    service::upload_transactions(&mut SqliteSink::new(&mut conn), bank, &mut file)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/transactions", get(list_transactions))
        .route("/transactions/upload", post(upload_transactions))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
