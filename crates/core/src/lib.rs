//! `spendtrack-core`: expense domain building blocks.
//!
//! This crate contains **pure domain** code (no infrastructure concerns): the
//! expense record, its validation/normalization, identifiers and the domain
//! error taxonomy.

pub mod error;
pub mod expense;
pub mod id;

pub use error::{DomainError, ValidationErrors};
pub use expense::{ALLOWED_CATEGORIES, Expense, ExpenseDraft, ExpensePayload, validate_expense};
pub use id::{ExpenseId, UserId};
