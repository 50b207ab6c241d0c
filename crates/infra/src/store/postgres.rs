//! Postgres-backed stores.
//!
//! ## Ownership
//!
//! Every expense query carries `owner_id` in its WHERE clause. Update and delete
//! are single `... WHERE id = $1 AND owner_id = $2 RETURNING ...` statements, so
//! the match and the mutation happen atomically inside Postgres (last writer
//! wins on concurrent updates).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use spendtrack_auth::User;
use spendtrack_core::{Expense, ExpenseDraft, ExpenseId, UserId};

use super::{ExpenseStore, StoreError, UserStore};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users (id),
        title TEXT NOT NULL CHECK (char_length(title) BETWEEN 1 AND 100),
        amount DOUBLE PRECISION NOT NULL CHECK (amount > 0),
        category TEXT NOT NULL CHECK (char_length(category) BETWEEN 1 AND 40),
        date TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        seq BIGSERIAL NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS expenses_owner_created_idx
        ON expenses (owner_id, created_at DESC, seq DESC)
    "#,
];

const EXPENSE_COLUMNS: &str = "id, owner_id, title, amount, category, date, created_at, updated_at";

/// Open a connection pool. Gives up after ten seconds without a connection.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the tables if they do not exist yet. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Postgres-backed expense store.
#[derive(Debug, Clone)]
pub struct PostgresExpenseStore {
    pool: Arc<PgPool>,
}

impl PostgresExpenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ExpenseStore for PostgresExpenseStore {
    #[instrument(skip(self, expense), fields(owner_id = %expense.owner, expense_id = %expense.id), err)]
    async fn insert(&self, expense: Expense) -> Result<Expense, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO expenses (id, owner_id, title, amount, category, date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(expense.id.as_uuid())
        .bind(expense.owner.as_uuid())
        .bind(&expense.title)
        .bind(expense.amount)
        .bind(&expense.category)
        .bind(expense.date)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_expense", e))?;

        expense_from_row(&row).map_err(|e| map_sqlx_error("insert_expense", e))
    }

    #[instrument(skip(self), fields(owner_id = %owner), err)]
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Expense>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
            FROM expenses
            WHERE owner_id = $1
            ORDER BY created_at DESC, seq DESC
            "#
        ))
        .bind(owner.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_expenses", e))?;

        rows.iter()
            .map(|row| expense_from_row(row).map_err(|e| map_sqlx_error("list_expenses", e)))
            .collect()
    }

    #[instrument(skip(self, draft), fields(owner_id = %owner, expense_id = %id), err)]
    async fn update_owned(
        &self,
        owner: UserId,
        id: ExpenseId,
        draft: ExpenseDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Expense>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE expenses
            SET title = $3, amount = $4, category = $5, date = $6, updated_at = $7
            WHERE id = $1 AND owner_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(&draft.title)
        .bind(draft.amount)
        .bind(&draft.category)
        .bind(draft.date)
        .bind(updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_expense", e))?;

        row.as_ref()
            .map(expense_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("update_expense", e))
    }

    #[instrument(skip(self), fields(owner_id = %owner, expense_id = %id), err)]
    async fn delete_owned(&self, owner: UserId, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            DELETE FROM expenses
            WHERE id = $1 AND owner_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_expense", e))?;

        row.as_ref()
            .map(expense_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("delete_expense", e))
    }
}

/// Postgres-backed user store.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_user_by_email", e))
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_user_by_id", e))
    }
}

fn expense_from_row(row: &PgRow) -> Result<Expense, sqlx::Error> {
    Ok(Expense {
        id: ExpenseId::from_uuid(row.try_get::<Uuid, _>("id")?),
        owner: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
        title: row.try_get("title")?,
        amount: row.try_get("amount")?,
        category: row.try_get("category")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
