//! Portal Session - client-side login state
//!
//! - [`Session`]: immutable login state, changed only through [`Session::apply`]
//! - [`Authenticator`]: the seam to an identity service; only
//!   [`SimulatedAuthenticator`] ships
//! - [`SessionStore`]: owns the current session, mirrors it to a
//!   [`portal_storage::DurableStore`] and rehydrates from it

pub mod authenticator;
pub mod identity;
pub mod state;
pub mod store;

pub use authenticator::{Authenticator, SimulatedAuthenticator};
pub use identity::{AuthGrant, Credentials, Role, UserProfile};
pub use state::{Session, SessionEvent, SessionSnapshot};
pub use store::SessionStore;

use portal_core::PortalError;

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Login timed out after {duration_ms} ms")]
    Timeout { duration_ms: u64 },

    #[error("Core error: {0}")]
    Core(#[from] PortalError),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create a validation error for `field`
    pub fn validation<S: Into<String>>(field: &str, message: S) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            SessionError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
