//! Response bodies.
//!
//! Every response shares one envelope: `{ message, data?, errors?, details? }`.
//! Absent parts are omitted rather than serialized as `null`.

use serde::Serialize;

use spendtrack_auth::UserProfile;
use spendtrack_infra::AuthSession;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    /// Diagnostic text; only populated outside production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data: Some(data),
            errors: None,
            details: None,
        }
    }

    pub fn data_only(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
            errors: None,
            details: None,
        }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
            errors: None,
            details: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

/// Body of a successful signup or login.
#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub user: UserProfile,
    pub token: String,
}

impl From<AuthSession> for SessionBody {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user,
            token: session.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_parts_are_omitted() {
        let body = serde_json::to_value(Envelope::message("Logout successful")).unwrap();
        assert_eq!(body, json!({"message": "Logout successful"}));
    }

    #[test]
    fn errors_and_details_serialize_when_present() {
        let body = serde_json::to_value(
            Envelope::message("Validation failed")
                .with_errors(vec!["Title is required".to_string()])
                .with_details(Some("boom".to_string())),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({"message": "Validation failed", "errors": ["Title is required"], "details": "boom"})
        );
    }

    #[test]
    fn data_only_has_no_message() {
        let body = serde_json::to_value(Envelope::data_only(json!({"n": 1}))).unwrap();
        assert_eq!(body, json!({"data": {"n": 1}}));
    }
}
