//! Infrastructure layer: storage adapters, application services, configuration.

pub mod config;
pub mod identity;
pub mod ledger;
pub mod store;

pub use config::{AppConfig, ConfigError, DemoUserConfig, Environment};
pub use identity::{AuthSession, IdentityError, IdentityService};
pub use ledger::{ExpenseLedger, LedgerError};
pub use store::{
    ExpenseStore, InMemoryExpenseStore, InMemoryUserStore, PostgresExpenseStore, PostgresUserStore,
    StoreError, UserStore,
};
