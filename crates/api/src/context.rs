use spendtrack_core::UserId;

/// Owner context for a request.
///
/// Derived from the bearer token only; request bodies never influence it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    user_id: UserId,
}

impl OwnerContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
