//! Session state and its transitions

use crate::identity::{AuthGrant, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input to [`Session::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn(AuthGrant),
    LoggedOut,
}

/// Current login state
///
/// User and token live in one `Option`, so a session is either fully signed
/// in or fully signed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    grant: Option<AuthGrant>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Next state after `event`
    pub fn apply(self, event: SessionEvent) -> Session {
        match event {
            SessionEvent::LoggedIn(grant) => Session { grant: Some(grant) },
            SessionEvent::LoggedOut => Session { grant: None },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.grant.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.grant.as_ref().map(|g| &g.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.grant.as_ref().map(|g| g.token.as_str())
    }

    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.grant.as_ref().map(|g| g.issued_at)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user().cloned(),
            token: self.token().map(str::to_string),
            is_authenticated: self.is_authenticated(),
            authenticated_at: self.authenticated_at(),
        }
    }
}

/// Flat, serializable view of a [`Session`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub authenticated_at: Option<DateTime<Utc>>,
}
