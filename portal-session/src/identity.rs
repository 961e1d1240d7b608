//! User identity types

use crate::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Portal role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Support,
    Merchant,
    Viewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Support => write!(f, "support"),
            Role::Merchant => write!(f, "merchant"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "support" => Ok(Role::Support),
            "merchant" => Ok(Role::Merchant),
            "viewer" => Ok(Role::Viewer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl UserProfile {
    /// Display name derived from an email address: its local part, or the
    /// whole address when there is no usable local part
    pub fn name_from_email(email: &str) -> String {
        match email.split_once('@') {
            Some((local, _)) if !local.trim().is_empty() => local.trim().to_string(),
            _ => email.trim().to_string(),
        }
    }
}

/// Login input that passed validation
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validate an email/password pair; blank values are rejected
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> SessionResult<Self> {
        let email = email.into();
        let password = password.into();

        if email.trim().is_empty() {
            return Err(SessionError::validation("email", "Email is required"));
        }
        if password.trim().is_empty() {
            return Err(SessionError::validation("password", "Password is required"));
        }

        Ok(Self { email, password })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity and token issued by an authenticator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub user: UserProfile,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}
