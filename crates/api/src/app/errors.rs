//! Mapping from service errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use spendtrack_infra::{Environment, IdentityError, LedgerError};

use crate::app::dto::Envelope;

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(Envelope::message(message))).into_response()
}

/// 500 with the underlying error as `details` outside production.
pub fn internal_error(message: &'static str, err: &dyn std::fmt::Display, env: Environment) -> Response {
    error!(error = %err, "{message}");
    let details = (!env.is_production()).then(|| err.to_string());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::message(message).with_details(details)),
    )
        .into_response()
}

/// `failure` is the operation-specific 500 message, e.g. "Failed to create expense".
pub fn ledger_error_to_response(err: LedgerError, failure: &'static str, env: Environment) -> Response {
    match err {
        LedgerError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(Envelope::message("Validation failed").with_errors(errors.into_messages())),
        )
            .into_response(),
        LedgerError::InvalidIdentifier => json_error(StatusCode::BAD_REQUEST, "Invalid expense id"),
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "Expense not found"),
        LedgerError::Persistence(e) => internal_error(failure, &e, env),
    }
}

pub fn identity_error_to_response(err: IdentityError, failure: &'static str, env: Environment) -> Response {
    match err {
        IdentityError::Credentials(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
        IdentityError::EmailTaken => json_error(StatusCode::CONFLICT, "Email already in use"),
        IdentityError::InvalidCredentials => json_error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        e @ (IdentityError::Password(_)
        | IdentityError::Token(_)
        | IdentityError::Persistence(_)
        | IdentityError::Task(_)) => internal_error(failure, &e, env),
    }
}

pub fn json_rejection_to_response(rejection: JsonRejection, env: Environment) -> Response {
    debug!(error = %rejection.body_text(), "rejected request body");
    let details = (!env.is_production()).then(|| rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::message("Invalid JSON body").with_details(details)),
    )
        .into_response()
}
