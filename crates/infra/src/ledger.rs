//! Ownership-scoped expense operations.
//!
//! ```text
//! request (owner, raw id?, payload?)
//!   ↓
//! 1. Parse identifier            -> InvalidIdentifier
//!   ↓
//! 2. Validate + normalize payload -> Validation
//!   ↓
//! 3. Owner-scoped store call      -> NotFound / Persistence
//! ```
//!
//! Steps 1 and 2 never touch the store. "Exists but belongs to someone else"
//! and "does not exist" both come back as `NotFound`.

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use tracing::{error, info, instrument};

use spendtrack_core::{
    DomainError, Expense, ExpenseId, ExpensePayload, UserId, ValidationErrors, validate_expense,
};

use crate::store::{ExpenseStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("invalid expense id")]
    InvalidIdentifier,

    #[error("expense not found")]
    NotFound,

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidId(_) => Self::InvalidIdentifier,
        }
    }
}

impl From<ValidationErrors> for LedgerError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Expense operations over an injected store handle.
#[derive(Debug, Clone)]
pub struct ExpenseLedger<S> {
    store: S,
}

impl<S: ExpenseStore> ExpenseLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, payload), fields(owner_id = %owner))]
    pub async fn create(&self, owner: UserId, payload: &ExpensePayload) -> Result<Expense, LedgerError> {
        let now = now();
        let draft = validate_expense(payload, now)?;
        let expense = Expense::create(ExpenseId::new(), owner, draft, now);

        let stored = self.store.insert(expense).await.map_err(|e| {
            error!(error = %e, "failed to create expense");
            LedgerError::Persistence(e)
        })?;
        info!(expense_id = %stored.id, "expense created");
        Ok(stored)
    }

    #[instrument(skip(self), fields(owner_id = %owner))]
    pub async fn list(&self, owner: UserId) -> Result<Vec<Expense>, LedgerError> {
        self.store.list_by_owner(owner).await.map_err(|e| {
            error!(error = %e, "failed to fetch expenses");
            LedgerError::Persistence(e)
        })
    }

    #[instrument(skip(self, payload), fields(owner_id = %owner))]
    pub async fn update(
        &self,
        owner: UserId,
        raw_id: &str,
        payload: &ExpensePayload,
    ) -> Result<Expense, LedgerError> {
        let id: ExpenseId = raw_id.parse()?;
        let now = now();
        let draft = validate_expense(payload, now)?;

        let updated = self
            .store
            .update_owned(owner, id, draft, now)
            .await
            .map_err(|e| {
                error!(expense_id = %id, error = %e, "failed to update expense");
                LedgerError::Persistence(e)
            })?
            .ok_or(LedgerError::NotFound)?;
        info!(expense_id = %id, "expense updated");
        Ok(updated)
    }

    #[instrument(skip(self), fields(owner_id = %owner))]
    pub async fn delete(&self, owner: UserId, raw_id: &str) -> Result<Expense, LedgerError> {
        let id: ExpenseId = raw_id.parse()?;

        let deleted = self
            .store
            .delete_owned(owner, id)
            .await
            .map_err(|e| {
                error!(expense_id = %id, error = %e, "failed to delete expense");
                LedgerError::Persistence(e)
            })?
            .ok_or(LedgerError::NotFound)?;
        info!(expense_id = %id, "expense deleted");
        Ok(deleted)
    }
}

/// Microsecond precision, matching what Postgres `TIMESTAMPTZ` stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
