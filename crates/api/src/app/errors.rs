use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockledger_core::LedgerError;

pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::AlreadyExists(_) | LedgerError::InsufficientStock { .. } => StatusCode::CONFLICT,
        LedgerError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::LockTimeout(_) | LedgerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::warn!(error = %err, "request failed");
    }

    (
        status,
        axum::Json(json!({
            "success": false,
            "error": err.code(),
            "message": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
            "retryable": false,
        })),
    )
        .into_response()
}
