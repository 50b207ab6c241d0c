use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
};

use spendtrack_core::ExpensePayload;

use crate::app::dto::Envelope;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_expense).get(list_expenses))
        .route("/:id", put(update_expense).patch(update_expense).delete(delete_expense))
}

pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<ExpensePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection, services.environment),
    };

    match services.ledger.create(owner.user_id(), &payload).await {
        Ok(expense) => (StatusCode::CREATED, Json(Envelope::data("Expense created", expense))).into_response(),
        Err(e) => errors::ledger_error_to_response(e, "Failed to create expense", services.environment),
    }
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> Response {
    match services.ledger.list(owner.user_id()).await {
        Ok(expenses) => Json(Envelope::data("Expenses fetched", expenses)).into_response(),
        Err(e) => errors::ledger_error_to_response(e, "Failed to fetch expenses", services.environment),
    }
}

/// Full replacement of the mutable fields; PUT and PATCH behave the same.
pub async fn update_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Result<Json<ExpensePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection, services.environment),
    };

    match services.ledger.update(owner.user_id(), &id, &payload).await {
        Ok(expense) => Json(Envelope::data("Expense updated", expense)).into_response(),
        Err(e) => errors::ledger_error_to_response(e, "Failed to update expense", services.environment),
    }
}

pub async fn delete_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Response {
    match services.ledger.delete(owner.user_id(), &id).await {
        Ok(expense) => Json(Envelope::data("Expense deleted", expense)).into_response(),
        Err(e) => errors::ledger_error_to_response(e, "Failed to delete expense", services.environment),
    }
}
