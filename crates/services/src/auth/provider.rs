use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{AuthSession, Credentials, SignUpOutcome};
use crate::error::AuthError;

/// Identity backend the app signs in through.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError` for rejected credentials or an unreachable backend.
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError` for invalid or already registered credentials.
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError` if the backend cannot be reached.
    async fn logout(&self) -> Result<(), AuthError>;

    /// The session restored from the previous run, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the backend cannot be reached.
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError>;
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct LocalState {
    accounts: HashMap<String, Account>,
    current: Option<AuthSession>,
}

/// In-process provider holding accounts in memory.
#[derive(Debug, Default)]
pub struct LocalAuthProvider {
    state: Mutex<LocalState>,
    require_confirmation: bool,
    latency: Duration,
}

impl LocalAuthProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New accounts stay unconfirmed until `confirm_email` is called.
    #[must_use]
    pub fn requiring_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Simulated round-trip delay for every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pre-register a confirmed account.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.accounts.insert(
                account_key(email),
                Account {
                    password: password.to_string(),
                    confirmed: true,
                },
            );
        }
        self
    }

    /// Mark a pending account as confirmed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown address.
    pub fn confirm_email(&self, email: &str) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(&account_key(email))
            .ok_or(AuthError::InvalidCredentials)?;
        account.confirmed = true;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LocalState>, AuthError> {
        self.state
            .lock()
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        credentials.validate_for_login()?;
        self.round_trip().await;

        let mut state = self.lock()?;
        let account = state
            .accounts
            .get(&account_key(credentials.email()))
            .filter(|account| account.password == credentials.password())
            .ok_or(AuthError::InvalidCredentials)?;
        if !account.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let session = AuthSession::new(credentials.email());
        state.current = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        credentials.validate_for_sign_up()?;
        self.round_trip().await;

        let mut state = self.lock()?;
        let key = account_key(credentials.email());
        if state.accounts.contains_key(&key) {
            return Err(AuthError::AlreadyRegistered);
        }
        state.accounts.insert(
            key,
            Account {
                password: credentials.password().to_string(),
                confirmed: !self.require_confirmation,
            },
        );

        if self.require_confirmation {
            return Ok(SignUpOutcome::PendingConfirmation {
                email: credentials.email().to_string(),
            });
        }
        let session = AuthSession::new(credentials.email());
        state.current = Some(session.clone());
        Ok(SignUpOutcome::Active(session))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.round_trip().await;
        self.lock()?.current = None;
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        self.round_trip().await;
        Ok(self.lock()?.current.clone())
    }
}
