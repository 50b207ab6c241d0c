//! Configuration loading and representation.
//!
//! Everything comes from environment variables. [`AppConfig::from_lookup`] takes
//! the lookup as a closure so tests never touch the process environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use spendtrack_auth::normalize_email;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Identity created at startup when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct DemoUserConfig {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl core::fmt::Debug for DemoUserConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DemoUserConfig")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub environment: Environment,
    pub demo_user: DemoUserConfig,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_ttl", &self.jwt_ttl)
            .field("environment", &self.environment)
            .field("demo_user", &self.demo_user)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = get("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => 5000,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt_ttl = match get("JWT_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .and_then(Duration::try_hours)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "JWT_TTL_HOURS",
                    value: raw.clone(),
                    reason: "expected a positive number of hours".to_string(),
                })?,
            None => Duration::days(7),
        };

        let demo_user = DemoUserConfig {
            email: normalize_email(&get("DEMO_USER_EMAIL").unwrap_or_else(|| "demo@tracker.com".to_string())),
            password: get("DEMO_USER_PASSWORD").unwrap_or_else(|| "password123".to_string()),
            name: get("DEMO_USER_NAME").unwrap_or_else(|| "Demo User".to_string()),
        };

        Ok(Self {
            bind_addr,
            port,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            jwt_ttl,
            environment,
            demo_user,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
