//! Authentication boundary: credentials, the signed-in session, and the
//! provider seam the app authenticates through.

mod provider;
mod service;

pub use provider::{AuthProvider, LocalAuthProvider};
pub use service::{AUTH_TIMEOUT, AuthService, SubscriptionId};

use serde::Serialize;

use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// E-mail and password as typed on the login or sign-up screen.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Shape checks for a login attempt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::InvalidCredentials` for an empty password.
    pub fn validate_for_login(&self) -> Result<(), AuthError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    /// Shape checks for a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword`.
    pub fn validate_for_sign_up(&self) -> Result<(), AuthError> {
        validate_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
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

fn validate_email(email: &str) -> Result<(), AuthError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(AuthError::InvalidEmail),
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    email: String,
    display_name: String,
}

impl AuthSession {
    /// The display name defaults to the part of the address before `@`.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        let display_name = email
            .split_once('@')
            .map_or(email.as_str(), |(local, _)| local)
            .to_string();
        Self {
            email,
            display_name,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Result of registering a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Signed in right away.
    Active(AuthSession),
    /// The provider wants the address confirmed before the first login.
    PendingConfirmation { email: String },
}

/// Snapshot published to subscribers whenever authentication changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<AuthSession>,
    /// True until the stored session has been restored.
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
