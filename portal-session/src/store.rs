//! Session Store - owns the current session and keeps it durable
//!
//! Every state change goes through [`Session::apply`] and is committed in a
//! single assignment, then published to subscribers. The token and user
//! record are mirrored to the durable store as a side effect; persistence
//! failures are contained there and never fail a login or logout.

use crate::authenticator::Authenticator;
use crate::identity::{AuthGrant, Credentials, UserProfile};
use crate::state::{Session, SessionEvent, SessionSnapshot};
use crate::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use portal_core::{performance::measure_async, with_timeout, PortalError, SessionConfig};
use portal_storage::DurableStore;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// User record persisted next to the token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredIdentity {
    user: UserProfile,
    issued_at: DateTime<Utc>,
}

/// Explicit session owner, passed to whatever needs login state
pub struct SessionStore<A: Authenticator> {
    authenticator: A,
    storage: DurableStore,
    token_key: String,
    user_key: String,
    login_timeout_ms: u64,
    state: Session,
    notifier: watch::Sender<Session>,
}

impl<A: Authenticator> std::fmt::Debug for SessionStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("storage", &self.storage)
            .field("token_key", &self.token_key)
            .field("user_key", &self.user_key)
            .field("login_timeout_ms", &self.login_timeout_ms)
            .field("is_authenticated", &self.state.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl<A: Authenticator> SessionStore<A> {
    /// Create a signed-out store without reading persisted state
    pub fn new(authenticator: A, storage: DurableStore, config: &SessionConfig) -> Self {
        let (notifier, _) = watch::channel(Session::signed_out());
        Self {
            authenticator,
            storage,
            token_key: config.token_key.clone(),
            user_key: config.user_key.clone(),
            login_timeout_ms: config.login_timeout_ms,
            state: Session::signed_out(),
            notifier,
        }
    }

    /// Create a store and rehydrate it from persisted state
    ///
    /// Both the token and the user record must be present and readable;
    /// anything less leaves the store signed out and removes the leftovers.
    pub fn restore(authenticator: A, storage: DurableStore, config: &SessionConfig) -> Self {
        let mut store = Self::new(authenticator, storage, config);

        let token: Option<String> = store
            .storage
            .get::<Option<String>>(&store.token_key, None)
            .filter(|t| !t.is_empty());
        let identity: Option<StoredIdentity> = store.storage.get(&store.user_key, None);

        match (token, identity) {
            (Some(token), Some(identity)) => {
                info!(email = %identity.user.email, "Restored persisted session");
                store.commit(SessionEvent::LoggedIn(AuthGrant {
                    user: identity.user,
                    token,
                    issued_at: identity.issued_at,
                }));
            }
            (None, None) => {
                debug!("No persisted session");
            }
            (token, identity) => {
                warn!(
                    has_token = token.is_some(),
                    has_user = identity.is_some(),
                    "Discarding partial persisted session"
                );
                store.forget_persisted();
            }
        }

        store
    }

    pub fn session(&self) -> &Session {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn storage(&self) -> &DurableStore {
        &self.storage
    }

    /// Receiver that sees the session after every commit
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.notifier.subscribe()
    }

    /// Current user, or an authentication error when signed out
    pub fn require_user(&self) -> SessionResult<&UserProfile> {
        self.state
            .user()
            .ok_or_else(|| SessionError::authentication("Not signed in"))
    }

    /// Sign in with `email` and `password`
    ///
    /// Blank input fails with a validation error before the authenticator
    /// is called. On any error the current session is left untouched.
    pub async fn login(&mut self, email: &str, password: &str) -> SessionResult<UserProfile> {
        let credentials = Credentials::new(email, password)?;
        info!(email = %credentials.email(), "Signing in");

        let attempt = measure_async(
            "session_login",
            with_timeout(
                self.authenticator.authenticate(&credentials),
                self.login_timeout_ms,
                "login",
            ),
        )
        .await;

        let grant = match attempt {
            Ok(result) => result?,
            Err(PortalError::Timeout { duration_ms, .. }) => {
                warn!(email = %credentials.email(), duration_ms, "Sign-in timed out");
                return Err(SessionError::Timeout { duration_ms });
            }
            Err(other) => return Err(other.into()),
        };

        let user = grant.user.clone();
        self.persist(&grant);
        self.commit(SessionEvent::LoggedIn(grant));

        info!(email = %user.email, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Sign out and drop persisted credentials; always succeeds
    pub fn logout(&mut self) {
        let email = self.state.user().map(|u| u.email.clone());
        self.commit(SessionEvent::LoggedOut);
        self.forget_persisted();

        match email {
            Some(email) => info!(email = %email, "Signed out"),
            None => debug!("Sign-out requested while signed out"),
        }
    }

    fn commit(&mut self, event: SessionEvent) {
        let current = std::mem::take(&mut self.state);
        self.state = current.apply(event);
        self.notifier.send_replace(self.state.clone());
    }

    /// Replace the persisted pair; on any failure nothing is left behind
    fn persist(&self, grant: &AuthGrant) {
        self.forget_persisted();

        let identity = StoredIdentity {
            user: grant.user.clone(),
            issued_at: grant.issued_at,
        };
        let written = self
            .storage
            .try_set(&self.user_key, &identity)
            .and_then(|()| self.storage.try_set(&self.token_key, &grant.token));

        if let Err(e) = written {
            warn!(
                email = %grant.user.email,
                error = %e,
                "Failed to persist session; it will not survive a restart"
            );
            self.forget_persisted();
        }
    }

    fn forget_persisted(&self) {
        self.storage.remove(&self.token_key);
        self.storage.remove(&self.user_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::SimulatedAuthenticator;
    use crate::identity::Role;
    use async_trait::async_trait;
    use std::time::Duration;

    fn config() -> SessionConfig {
        SessionConfig {
            simulated_latency_ms: 0,
            login_timeout_ms: 1_000,
            ..SessionConfig::default()
        }
    }

    fn instant_auth() -> SimulatedAuthenticator {
        SimulatedAuthenticator::new(Duration::ZERO, Role::Admin)
    }

    struct RejectingAuthenticator;

    #[async_trait]
    impl Authenticator for RejectingAuthenticator {
        async fn authenticate(&self, _credentials: &Credentials) -> SessionResult<AuthGrant> {
            Err(SessionError::authentication("Invalid credentials"))
        }
    }

    #[tokio::test]
    async fn test_login_commits_and_persists() {
        let storage = DurableStore::in_memory();
        let mut store = SessionStore::new(instant_auth(), storage.clone(), &config());

        let user = store.login("alice@example.com", "pw123").await.unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert!(store.is_authenticated());
        assert_eq!(store.require_user().unwrap(), &user);
        assert_eq!(
            storage.get::<Option<String>>("auth_token", None).as_deref(),
            store.session().token()
        );
        assert!(storage.contains("auth_user"));
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_state() {
        let storage = DurableStore::in_memory();
        let mut store = SessionStore::new(RejectingAuthenticator, storage.clone(), &config());

        let err = store.login("alice@example.com", "wrong").await.unwrap_err();

        assert!(matches!(err, SessionError::Authentication { .. }));
        assert!(!store.is_authenticated());
        assert!(!storage.contains("auth_token"));
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let mut store = SessionStore::new(instant_auth(), DurableStore::in_memory(), &config());
        let mut rx = store.subscribe();
        assert!(!rx.borrow().is_authenticated());

        store.login("alice@example.com", "pw123").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.logout();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_authenticated());
    }

    #[test]
    fn test_require_user_when_signed_out() {
        let store = SessionStore::new(instant_auth(), DurableStore::in_memory(), &config());
        assert!(matches!(
            store.require_user(),
            Err(SessionError::Authentication { .. })
        ));
    }
}
