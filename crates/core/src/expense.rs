//! Expense record and its validation/normalization contract.
//!
//! Every mutation (create *and* update) goes through [`validate_expense`]; there
//! are no divergent rules between the two. Checks run in a fixed order and stop
//! at the first failure:
//!
//! ```text
//! title -> amount -> category -> date
//! ```
//!
//! so a payload that is wrong in several ways always reports the same single
//! message.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::ValidationErrors;
use crate::id::{ExpenseId, UserId};

pub const TITLE_MAX_CHARS: usize = 100;
pub const CATEGORY_MAX_CHARS: usize = 40;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_TOO_LONG: &str = "Title cannot exceed 100 characters";
pub const AMOUNT_INVALID: &str = "Amount must be greater than 0";
pub const CATEGORY_INVALID: &str = "Category is invalid";
pub const CATEGORY_TOO_LONG: &str = "Category cannot exceed 40 characters";
pub const DATE_INVALID: &str = "Date is invalid";

/// Categories offered by clients. Advisory only: persistence accepts any
/// non-empty category.
pub const ALLOWED_CATEGORIES: [&str; 8] = [
    "Food",
    "Travel",
    "Shopping",
    "Entertainment",
    "Health",
    "Bills",
    "Education",
    "Other",
];

/// A persisted expense record.
///
/// # Invariants
/// - `amount > 0` and finite.
/// - `title` / `category` are trimmed and non-empty.
/// - `owner` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub owner: UserId,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Build a fresh record owned by `owner` from a validated draft.
    pub fn create(id: ExpenseId, owner: UserId, draft: ExpenseDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            title: draft.title,
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the mutable fields. `id`, `owner` and `created_at` are untouched.
    pub fn apply(&mut self, draft: ExpenseDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.amount = draft.amount;
        self.category = draft.category;
        self.date = draft.date;
        self.updated_at = now;
    }
}

/// Untrusted create/update input.
///
/// Fields are raw JSON values so that wrong types surface as validation
/// messages instead of deserialization failures. There is no `owner` field:
/// anything the client sends for it is dropped here.
///
/// `amount` keeps the unparsed JSON token, so a number outside the `f64`
/// range (`1e400`) reaches validation instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePayload {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub amount: Option<Box<RawValue>>,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub date: Value,
}

/// Normalized, record-ready expense fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}

/// Validate and normalize a payload.
///
/// `now` is used when the payload carries no date.
pub fn validate_expense(
    payload: &ExpensePayload,
    now: DateTime<Utc>,
) -> Result<ExpenseDraft, ValidationErrors> {
    let title = trimmed_text(&payload.title);
    if title.is_empty() {
        return Err(ValidationErrors::single(TITLE_REQUIRED));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationErrors::single(TITLE_TOO_LONG));
    }

    let amount = match coerce_amount(payload.amount.as_deref()) {
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => return Err(ValidationErrors::single(AMOUNT_INVALID)),
    };

    let category = trimmed_text(&payload.category);
    if category.is_empty() {
        return Err(ValidationErrors::single(CATEGORY_INVALID));
    }
    if category.chars().count() > CATEGORY_MAX_CHARS {
        return Err(ValidationErrors::single(CATEGORY_TOO_LONG));
    }

    let date = coerce_date(&payload.date, now).ok_or_else(|| ValidationErrors::single(DATE_INVALID))?;

    Ok(ExpenseDraft {
        title: title.to_string(),
        amount,
        category: category.to_string(),
        date,
    })
}

/// Only strings count as text; every other JSON type normalizes to "".
fn trimmed_text(value: &Value) -> &str {
    match value {
        Value::String(s) => s.trim(),
        _ => "",
    }
}

fn coerce_amount(raw: Option<&RawValue>) -> Option<f64> {
    let token = raw?.get();
    if token.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
        // Out-of-range numbers parse to infinity and fail the finiteness check.
        return token.parse::<f64>().ok();
    }
    match serde_json::from_str::<Value>(token).ok()? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Absent, `null`, `false`, `0` and blank strings mean "now". Numbers are epoch
/// milliseconds; fractions are truncated.
fn coerce_date(value: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match value {
        Value::Null | Value::Bool(false) => Some(now),
        Value::String(s) if s.trim().is_empty() => Some(now),
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => match n.as_f64()? {
            ms if ms == 0.0 => Some(now),
            ms if ms.is_finite() && ms.abs() < i64::MAX as f64 => {
                DateTime::from_timestamp_millis(ms.trunc() as i64)
            }
            _ => None,
        },
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
