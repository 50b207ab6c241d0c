//! Identity service: signup, login, profile lookup and the demo bootstrap.

use chrono::{SubsecRound, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use spendtrack_auth::{
    CredentialError, Hs256JwtIssuer, LoginRequest, NewUser, PasswordError, SignupRequest,
    TokenIssueError, User, UserProfile, hash_password, verify_password,
};
use spendtrack_core::UserId;

use crate::config::DemoUserConfig;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Email already in use")]
    EmailTaken,

    /// Unknown email and wrong password are deliberately the same variant.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenIssueError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}

/// A freshly authenticated user plus their bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

pub struct IdentityService<U> {
    users: U,
    issuer: Hs256JwtIssuer,
}

impl<U: UserStore> IdentityService<U> {
    pub fn new(users: U, issuer: Hs256JwtIssuer) -> Self {
        Self { users, issuer }
    }

    #[instrument(skip(self, request))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthSession, IdentityError> {
        let new_user = request.normalize()?;
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let user = self.register(new_user).await?;
        info!(user_id = %user.id, "user registered");
        self.session_for(&user)
    }

    #[instrument(skip(self, request))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, IdentityError> {
        let credentials = request.normalize()?;
        let Some(user) = self.users.find_by_email(&credentials.email).await? else {
            return Err(IdentityError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&credentials.password, &hash))
            .await
            .map_err(|e| IdentityError::Task(e.to_string()))??;
        if !matches {
            warn!(user_id = %user.id, "login rejected");
            return Err(IdentityError::InvalidCredentials);
        }

        info!(user_id = %user.id, "login succeeded");
        self.session_for(&user)
    }

    /// `None` when the user behind a (valid) token no longer exists.
    pub async fn profile(&self, id: UserId) -> Result<Option<UserProfile>, IdentityError> {
        Ok(self.users.find_by_id(id).await?.map(|u| u.profile()))
    }

    /// Create the demo identity unless it already exists. Returns whether a user
    /// was created.
    #[instrument(skip(self, demo), fields(email = %demo.email))]
    pub async fn ensure_demo_user(&self, demo: &DemoUserConfig) -> Result<bool, IdentityError> {
        if self.users.find_by_email(&demo.email).await?.is_some() {
            info!("demo user ready");
            return Ok(false);
        }

        let new_user = NewUser {
            name: demo.name.clone(),
            email: demo.email.clone(),
            password: demo.password.clone(),
        };
        match self.register(new_user).await {
            Ok(_) => {
                info!("demo user created");
                Ok(true)
            }
            // Another instance won the race.
            Err(IdentityError::EmailTaken) => Ok(false),
            Err(e) => {
                error!(error = %e, "failed to create demo user");
                Err(e)
            }
        }
    }

    async fn register(&self, new_user: NewUser) -> Result<User, IdentityError> {
        let NewUser { name, email, password } = new_user;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| IdentityError::Task(e.to_string()))??;

        let user = User {
            id: UserId::new(),
            name,
            email,
            password_hash,
            created_at: Utc::now().trunc_subsecs(6),
        };

        match self.users.insert(user).await {
            Ok(user) => Ok(user),
            Err(StoreError::Conflict(_)) => Err(IdentityError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, IdentityError> {
        let token = self.issuer.issue(user.id, Utc::now())?;
        Ok(AuthSession {
            user: user.profile(),
            token,
        })
    }
}
