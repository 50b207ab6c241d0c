//! Service wiring: picks the storage backend and builds the application services.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use spendtrack_auth::Hs256JwtIssuer;
use spendtrack_infra::store::{self, ExpenseStore, UserStore};
use spendtrack_infra::{
    AppConfig, Environment, ExpenseLedger, IdentityService, InMemoryExpenseStore, InMemoryUserStore,
    PostgresExpenseStore, PostgresUserStore,
};

pub type SharedExpenseStore = Arc<dyn ExpenseStore>;
pub type SharedUserStore = Arc<dyn UserStore>;

pub struct AppServices {
    pub ledger: ExpenseLedger<SharedExpenseStore>,
    pub identity: IdentityService<SharedUserStore>,
    pub environment: Environment,
}

impl AppServices {
    pub fn new(config: &AppConfig, expenses: SharedExpenseStore, users: SharedUserStore) -> Self {
        let issuer = Hs256JwtIssuer::new(config.jwt_secret.clone().into_bytes(), config.jwt_ttl);
        Self {
            ledger: ExpenseLedger::new(expenses),
            identity: IdentityService::new(users, issuer),
            environment: config.environment,
        }
    }

    /// Volatile stores; everything is lost on restart.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryExpenseStore::new()),
            Arc::new(InMemoryUserStore::new()),
        )
    }
}

/// Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set; using in-memory stores");
        return Ok(AppServices::in_memory(config));
    };

    let pool = store::connect(url).await.context("failed to connect to Postgres")?;
    store::ensure_schema(&pool)
        .await
        .context("failed to prepare database schema")?;
    info!("connected to Postgres");

    Ok(AppServices::new(
        config,
        Arc::new(PostgresExpenseStore::new(pool.clone())),
        Arc::new(PostgresUserStore::new(pool)),
    ))
}
