//! Owner-scoped storage ports and their adapters.
//!
//! Every expense read or mutation takes the owner id and uses it in its
//! selection predicate; there is no way to address another owner's record
//! through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use spendtrack_auth::User;
use spendtrack_core::{Expense, ExpenseDraft, ExpenseId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryExpenseStore, InMemoryUserStore};
pub use postgres::{PostgresExpenseStore, PostgresUserStore, connect, ensure_schema};

/// Storage-layer fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError>;

    /// All of `owner`'s records, newest-created first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Expense>, StoreError>;

    /// Atomically replace the mutable fields of the record matching both `owner`
    /// and `id`. `None` when nothing matches.
    async fn update_owned(
        &self,
        owner: UserId,
        id: ExpenseId,
        draft: ExpenseDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Expense>, StoreError>;

    /// Atomically remove the record matching both `owner` and `id`, returning
    /// its prior state. `None` when nothing matches.
    async fn delete_owned(&self, owner: UserId, id: ExpenseId) -> Result<Option<Expense>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is already taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

#[async_trait]
impl<S> ExpenseStore for Arc<S>
where
    S: ExpenseStore + ?Sized,
{
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError> {
        (**self).insert(expense).await
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Expense>, StoreError> {
        (**self).list_by_owner(owner).await
    }

    async fn update_owned(
        &self,
        owner: UserId,
        id: ExpenseId,
        draft: ExpenseDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Expense>, StoreError> {
        (**self).update_owned(owner, id, draft, updated_at).await
    }

    async fn delete_owned(&self, owner: UserId, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        (**self).delete_owned(owner, id).await
    }
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        (**self).insert(user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_by_id(id).await
    }
}
