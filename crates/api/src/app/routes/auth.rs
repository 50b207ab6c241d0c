use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use spendtrack_auth::{LoginRequest, SignupRequest};

use crate::app::dto::{Envelope, SessionBody, UserBody};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::OwnerContext;

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection, services.environment),
    };

    match services.identity.signup(&request).await {
        Ok(session) => (
            StatusCode::CREATED,
            Json(Envelope::data("User registered successfully", SessionBody::from(session))),
        )
            .into_response(),
        Err(e) => errors::identity_error_to_response(e, "Failed to register user", services.environment),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection, services.environment),
    };

    match services.identity.login(&request).await {
        Ok(session) => Json(Envelope::data("Login successful", SessionBody::from(session))).into_response(),
        Err(e) => errors::identity_error_to_response(e, "Failed to login", services.environment),
    }
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Response {
    Json(Envelope::message("Logout successful")).into_response()
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> Response {
    match services.identity.profile(owner.user_id()).await {
        Ok(Some(user)) => Json(Envelope::data_only(UserBody { user })).into_response(),
        Ok(None) => errors::json_error(StatusCode::UNAUTHORIZED, "Not authorized"),
        Err(e) => errors::identity_error_to_response(e, "Failed to load user", services.environment),
    }
}
