//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use lingo_core::model::UnitId;
use lingo_core::{CatalogError, LookupError, SessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::navigation::RecoveryAction;

/// Errors emitted by `PreferencesService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreferencesServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonFlowError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Preferences(#[from] PreferencesServiceError),
    #[error("could not save lesson progress: {0}")]
    Progress(#[from] ProgressServiceError),
}

impl LessonFlowError {
    /// The single action offered to the learner alongside the message.
    #[must_use]
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            LessonFlowError::Lookup(LookupError::SetupIncomplete) => RecoveryAction::FinishSetup,
            LessonFlowError::Lookup(_) | LessonFlowError::Preferences(_) => {
                RecoveryAction::ReturnHome
            }
            LessonFlowError::Session(SessionError::OutOfLives | SessionError::Finished) => {
                RecoveryAction::ReturnHome
            }
            LessonFlowError::Session(_) => RecoveryAction::Dismiss,
            LessonFlowError::Progress(_) => RecoveryAction::Retry,
        }
    }
}

/// Errors emitted by `OverviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OverviewError {
    #[error("subject and level must be chosen first")]
    SetupIncomplete,
    #[error("unit {0} is locked")]
    UnitLocked(UnitId),
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),
    #[error(transparent)]
    Preferences(#[from] PreferencesServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

impl OverviewError {
    #[must_use]
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            OverviewError::SetupIncomplete => RecoveryAction::FinishSetup,
            OverviewError::UnitLocked(_) | OverviewError::UnknownUnit(_) => RecoveryAction::Dismiss,
            OverviewError::Preferences(_) | OverviewError::Progress(_) => RecoveryAction::Retry,
        }
    }
}

/// Errors emitted by the authentication boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("enter a valid e-mail address")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("e-mail or password is incorrect")]
    InvalidCredentials,
    #[error("an account already exists for this e-mail")]
    AlreadyRegistered,
    #[error("confirm your e-mail address before signing in")]
    EmailNotConfirmed,
    #[error("authentication timed out after {0:?}")]
    Timeout(Duration),
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    #[must_use]
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            AuthError::Timeout(_) | AuthError::Unavailable(_) => RecoveryAction::Retry,
            _ => RecoveryAction::Dismiss,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
