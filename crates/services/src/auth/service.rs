use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{AuthProvider, AuthSession, AuthState, Credentials, SignUpOutcome};
use crate::error::AuthError;

/// Upper bound for any single provider call.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle returned by `AuthService::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Wraps an `AuthProvider` with a timeout and publishes `AuthState` changes.
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    timeout: Duration,
    state: Mutex<AuthState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl AuthService {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            timeout: AUTH_TIMEOUT,
            state: Mutex::new(AuthState {
                session: None,
                loading: true,
            }),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn current_session(&self) -> Option<AuthSession> {
        self.state().session
    }

    /// Restore the previous session and leave the loading state.
    ///
    /// Loading ends even when the provider fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider fails or times out.
    pub async fn initialize(&self) -> Result<Option<AuthSession>, AuthError> {
        let restored = self
            .guarded("restore", self.provider.current_session())
            .await;
        let session = restored.as_ref().ok().cloned().flatten();
        self.publish(AuthState {
            session,
            loading: false,
        });
        restored
    }

    /// # Errors
    ///
    /// Returns `AuthError` for rejected credentials, timeouts, or provider failures.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let session = self.guarded("login", self.provider.login(credentials)).await?;
        tracing::info!(email = session.email(), "signed in");
        self.publish(AuthState {
            session: Some(session.clone()),
            loading: false,
        });
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `AuthError` for invalid credentials, timeouts, or provider failures.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let outcome = self
            .guarded("sign_up", self.provider.sign_up(credentials))
            .await?;
        match &outcome {
            SignUpOutcome::Active(session) => {
                tracing::info!(email = session.email(), "account created");
                self.publish(AuthState {
                    session: Some(session.clone()),
                    loading: false,
                });
            }
            SignUpOutcome::PendingConfirmation { email } => {
                tracing::info!(email = %email, "account awaiting confirmation");
            }
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the provider fails or times out; the local
    /// session is kept then.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.guarded("logout", self.provider.logout()).await?;
        tracing::info!("signed out");
        self.publish(AuthState {
            session: None,
            loading: false,
        });
        Ok(())
    }

    /// Register a callback for every state change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn guarded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.inspect_err(|err| tracing::debug!(operation, error = %err, "auth call rejected")),
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.timeout, "auth call timed out");
                Err(AuthError::Timeout(self.timeout))
            }
        }
    }

    fn publish(&self, next: AuthState) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *state = next.clone();
        }
        // Listeners run without any lock held so they may call back in.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }
}
