use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use idsync_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = err.code();
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, code, msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, code, msg),
        DomainError::Upstream(msg) => json_error(StatusCode::BAD_GATEWAY, code, msg),
        DomainError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, code, "Authentication required")
        }
        DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, code, "Access denied"),
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::SERVICE_UNAVAILABLE, code, "Storage unavailable")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
