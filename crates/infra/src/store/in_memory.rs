//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use spendtrack_auth::User;
use spendtrack_core::{Expense, ExpenseDraft, ExpenseId, UserId};

use super::{ExpenseStore, StoreError, UserStore};

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
struct ExpenseTable {
    /// Insertion counter; breaks `created_at` ties so listing is strictly ordered.
    next_seq: u64,
    rows: HashMap<(UserId, ExpenseId), (u64, Expense)>,
}

/// Expense records keyed by `(owner, id)`.
///
/// The owner is part of the key itself, so a lookup under the wrong owner is
/// simply a miss.
#[derive(Debug, Default)]
pub struct InMemoryExpenseStore {
    inner: RwLock<ExpenseTable>,
}

impl InMemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for InMemoryExpenseStore {
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let key = (expense.owner, expense.id);
        if table.rows.contains_key(&key) {
            return Err(StoreError::Conflict(format!("expense {} already exists", expense.id)));
        }
        table.next_seq += 1;
        let seq = table.next_seq;
        table.rows.insert(key, (seq, expense.clone()));
        Ok(expense)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Expense>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        let mut rows: Vec<&(u64, Expense)> = table
            .rows
            .iter()
            .filter_map(|((o, _id), row)| if *o == owner { Some(row) } else { None })
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(rows.into_iter().map(|(_, e)| e.clone()).collect())
    }

    async fn update_owned(
        &self,
        owner: UserId,
        id: ExpenseId,
        draft: ExpenseDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Expense>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.get_mut(&(owner, id)).map(|(_, expense)| {
            expense.apply(draft, updated_at);
            expense.clone()
        }))
    }

    async fn delete_owned(&self, owner: UserId, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        Ok(table.rows.remove(&(owner, id)).map(|(_, expense)| expense))
    }
}

/// Users indexed by id, with a unique email index.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if table.by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        table.by_email.insert(user.email.clone(), user.id);
        table.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.by_id.get(&id).cloned())
    }
}
