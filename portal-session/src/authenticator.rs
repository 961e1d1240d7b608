//! Authentication seam

use crate::identity::{AuthGrant, Credentials, Role, UserProfile};
use crate::SessionResult;
use async_trait::async_trait;
use chrono::Utc;
use portal_core::{config_error, SessionConfig};
use std::time::Duration;
use tracing::debug;

/// Turns credentials into an identity and token
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> SessionResult<AuthGrant>;
}

#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for Box<T> {
    async fn authenticate(&self, credentials: &Credentials) -> SessionResult<AuthGrant> {
        (**self).authenticate(credentials).await
    }
}

/// Local stand-in for an identity service
///
/// Accepts any credentials after an artificial delay. The token is
/// `mock-jwt-token-<unix millis>`; it is a placeholder and carries no
/// security meaning.
#[derive(Debug, Clone)]
pub struct SimulatedAuthenticator {
    latency: Duration,
    role: Role,
}

impl Default for SimulatedAuthenticator {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Role::Admin)
    }
}

impl SimulatedAuthenticator {
    pub fn new(latency: Duration, role: Role) -> Self {
        Self { latency, role }
    }

    /// Build from `session.simulated_latency_ms` and `session.default_role`
    pub fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        let role = config
            .default_role
            .parse::<Role>()
            .map_err(|e| config_error!(e, "simulated_authenticator"))?;
        Ok(Self::new(
            Duration::from_millis(config.simulated_latency_ms),
            role,
        ))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

#[async_trait]
impl Authenticator for SimulatedAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> SessionResult<AuthGrant> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let issued_at = Utc::now();
        let user = UserProfile {
            id: uuid::Uuid::new_v4().to_string(),
            email: credentials.email().to_string(),
            name: UserProfile::name_from_email(credentials.email()),
            role: self.role,
        };

        debug!(email = %user.email, role = %user.role, "Simulated login accepted");

        Ok(AuthGrant {
            user,
            token: format!("mock-jwt-token-{}", issued_at.timestamp_millis()),
            issued_at,
        })
    }
}
