use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopworks_core::DomainError;
use shopworks_infra::StoreError;
use shopworks_orders::TransitionError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(domain) => domain_error_to_response(domain),
        StoreError::Transition(transition) => transition_error_to_response(transition),
        StoreError::Retryable(msg) => json_error(StatusCode::CONFLICT, "retryable_conflict", msg),
        StoreError::Corrupt(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "corrupt_data", msg)
        }
        StoreError::Database { .. } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            err.to_string(),
        ),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

fn transition_error_to_response(err: TransitionError) -> axum::response::Response {
    match &err {
        TransitionError::InsufficientStock(shortages) => {
            // One message per offending line so the front-end can render
            // field-level errors.
            let messages: Vec<String> = shortages.iter().map(ToString::to_string).collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({
                    "error": "insufficient_stock",
                    "message": err.to_string(),
                    "lines": messages,
                })),
            )
                .into_response()
        }
        TransitionError::InvalidTransition { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", err.to_string())
        }
        TransitionError::EmptyOrder => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "empty_order", err.to_string())
        }
        TransitionError::NotPending { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "not_pending", err.to_string())
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
