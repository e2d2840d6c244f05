//! Signed-in user, cached token, and role-based route guarding.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::types::UserAccount;

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    /// Where a freshly signed-in user of this role lands.
    pub fn landing_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Staff => "/staff",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `POST /users/login`: the account plus its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(flatten)]
    pub user: UserAccount,
}

impl AuthSession {
    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// The currently signed-in user, if any.
///
/// Shared between surfaces; reads vastly outnumber sign-in/out.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<AuthSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session restored from elsewhere (e.g. a token cache).
    pub fn restored(session: AuthSession) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    pub fn sign_in(&self, session: AuthSession) -> &'static str {
        let landing = session.role().landing_route();
        tracing::info!(user = %session.user.email, role = %session.role(), "signed in");
        if let Ok(mut current) = self.current.write() {
            *current = Some(session);
        }
        landing
    }

    pub fn logout(&self) -> Option<AuthSession> {
        let previous = self.current.write().ok().and_then(|mut current| current.take());
        if let Some(session) = &previous {
            tracing::info!(user = %session.user.email, "signed out");
        }
        previous
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    /// Allow only a signed-in user whose role is among `allowed`.
    ///
    /// An empty `allowed` admits any signed-in user.
    pub fn guard(&self, allowed: &[Role]) -> RouteDecision {
        match self.current() {
            None => RouteDecision::Redirect(LOGIN_ROUTE),
            Some(session) if allowed.is_empty() || allowed.contains(&session.role()) => {
                RouteDecision::Allow
            }
            Some(session) => {
                tracing::debug!(role = %session.role(), "route refused for role");
                RouteDecision::Redirect(LOGIN_ROUTE)
            }
        }
    }
}
