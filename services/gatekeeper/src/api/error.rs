//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so error shapes stay uniform
//! across gatekeeper endpoints, and maps engine failures onto the status
//! codes callers key their retry behavior on.
//!
//! # Key invariants
//! - Denials are not HTTP errors: `/v1/authorize` returns a deny decision
//!   with `200`. The helpers here cover management surfaces and failures.
//! - Engine unavailability maps to `503` with a distinct, retryable code so
//!   callers can tell an outage from a refusal.
//! - Internal errors log details server-side but return generic messages.
use crate::api::types::ErrorResponse;
use crate::engine::GateError;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        body: ErrorResponse {
            code: "not_found".to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    // Caller provides a specific conflict code for precise client handling.
    ApiError {
        status: StatusCode::CONFLICT,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_validation_error(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorResponse {
            code: "validation_error".to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_unauthorized(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::UNAUTHORIZED,
        body: ErrorResponse {
            code: "unauthorized".to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_forbidden(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::FORBIDDEN,
        body: ErrorResponse {
            code: "forbidden".to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    // Log internal details server-side; return a generic message.
    tracing::error!(error = ?err, "gatekeeper storage error");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            code: "internal".to_string(),
            message: message.to_string(),
        },
    }
}

/// Map an engine failure to its retryable HTTP shape. Both variants are
/// denials in effect, but they are never conflated with `PolicyDenied`.
pub fn api_gate_error(err: &GateError) -> ApiError {
    let code = match err {
        GateError::Unavailable(_) => "unavailable",
        GateError::AuditWriteFailed(_) => "audit_write_failed",
    };
    ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        },
    }
}
