//! `spendtrack-auth`: identity and credential boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! normalize signup/login input, hash and verify passwords, and issue/verify
//! bearer tokens. Persistence of identities lives in `spendtrack-infra`.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtIssuer, Hs256JwtValidator, JwtValidator, TokenIssueError};
pub use password::{PasswordError, hash_password, verify_password};
pub use user::{
    CredentialError, LoginCredentials, LoginRequest, NewUser, SignupRequest, User, UserProfile,
    normalize_email,
};
