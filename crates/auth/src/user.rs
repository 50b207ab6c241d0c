//! Identity record and signup/login input normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use spendtrack_core::UserId;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// A registered identity.
///
/// Created once (signup or demo bootstrap); never updated or deleted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Trimmed, lowercase, unique.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Name, email and password are required")]
    MissingSignupFields,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Email and password are required")]
    MissingLoginFields,
}

/// Raw signup body. Non-string fields count as missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub email: Value,
    #[serde(default)]
    pub password: Value,
}

/// Raw login body. Non-string fields count as missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Value,
    #[serde(default)]
    pub password: Value,
}

/// Validated signup input; the password is still plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

// Keep plaintext passwords out of logs.
impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl core::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignupRequest {
    pub fn normalize(&self) -> Result<NewUser, CredentialError> {
        let name = as_str(&self.name).trim();
        let email = normalize_email(as_str(&self.email));
        let password = as_str(&self.password);

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CredentialError::MissingSignupFields);
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(CredentialError::PasswordTooShort);
        }

        Ok(NewUser {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

impl LoginRequest {
    pub fn normalize(&self) -> Result<LoginCredentials, CredentialError> {
        let email = normalize_email(as_str(&self.email));
        let password = as_str(&self.password);

        if email.is_empty() || password.is_empty() {
            return Err(CredentialError::MissingLoginFields);
        }

        Ok(LoginCredentials {
            email,
            password: password.to_string(),
        })
    }
}

fn as_str(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}
