//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ValidationError};
use ledger::LedgerError;
use projections::QueryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Domain logic error.
    Domain(DomainError),
    /// Query layer error.
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Query(err) => query_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyExists { .. } | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Ledger(ledger_err) => ledger_status(ledger_err),
        DomainError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn query_error_to_response(err: QueryError) -> (StatusCode, String) {
    match err {
        QueryError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        QueryError::Domain(inner) => domain_error_to_response(inner),
        QueryError::Ledger(ref ledger_err) => (ledger_status(ledger_err), err.to_string()),
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Conflict { .. } => StatusCode::CONFLICT,
        LedgerError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Domain(err.into())
    }
}
