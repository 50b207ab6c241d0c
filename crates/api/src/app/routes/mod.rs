use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod expenses;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
}

/// Endpoints that require an [`OwnerContext`](crate::context::OwnerContext).
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .nest("/api/expenses", expenses::router())
}
