//! Identity session for the single tenant.
//!
//! [`SessionHub`] owns the current [`Session`] and talks to an
//! [`IdentityProvider`]. Interested parties observe transitions through a
//! [`SessionSubscription`], which yields the current state first and then
//! every later transition.

mod error;
pub mod policy;

pub use error::*;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::models::{Identity, LoginRequest, RegisterRequest, Session};

/// External authentication service.
pub trait IdentityProvider: Send + Sync + 'static {
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    fn logout(&self, identity: &Identity)
        -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Holds the current session and publishes its transitions.
pub struct SessionHub<P> {
    provider: Arc<P>,
    state: Arc<watch::Sender<Session>>,
}

impl<P> Clone for SessionHub<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: IdentityProvider> SessionHub<P> {
    pub fn new(provider: Arc<P>) -> Self {
        let (state, _) = watch::channel(Session::Anonymous);
        Self {
            provider,
            state: Arc::new(state),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.state.subscribe(),
            primed: false,
        }
    }

    /// Log in with email and password.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<Identity, AuthFailure> {
        policy::check_login(request)?;

        let identity = self
            .provider
            .login(request.email.trim(), &request.password)
            .await
            .map_err(|e| {
                warn!(code = %e, "Login rejected");
                AuthFailure::from_provider(AuthAction::Login, &e)
            })?;

        info!(uid = %identity.uid, "User logged in");
        self.publish(Session::Authenticated {
            identity: identity.clone(),
        });
        Ok(identity)
    }

    /// Create an account and sign it in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Identity, AuthFailure> {
        policy::check_registration(request)?;

        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let identity = self
            .provider
            .register(request.email.trim(), &request.password, display_name)
            .await
            .map_err(|e| {
                warn!(code = %e, "Registration rejected");
                AuthFailure::from_provider(AuthAction::Register, &e)
            })?;

        info!(uid = %identity.uid, "Account registered");
        self.publish(Session::Authenticated {
            identity: identity.clone(),
        });
        Ok(identity)
    }

    /// Log out. Logging out an anonymous session is a no-op.
    pub async fn deauthenticate(&self) -> Result<(), AuthFailure> {
        let Some(identity) = self.current().identity().cloned() else {
            return Ok(());
        };

        self.provider.logout(&identity).await.map_err(|e| {
            warn!(code = %e, "Logout failed");
            AuthFailure::from_provider(AuthAction::Logout, &e)
        })?;

        info!(uid = %identity.uid, "User logged out");
        self.publish(Session::Anonymous);
        Ok(())
    }

    fn publish(&self, session: Session) {
        self.state.send_replace(session);
    }
}

/// Cancellable stream of session states.
///
/// The first [`next`](Self::next) resolves immediately with the current
/// state. Transitions that happen faster than the subscriber reads them
/// collapse to the latest one. Dropping the subscription cancels it.
pub struct SessionSubscription {
    rx: watch::Receiver<Session>,
    primed: bool,
}

impl SessionSubscription {
    /// Wait for the next session state. Returns `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Session> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }

        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}
