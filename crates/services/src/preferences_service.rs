use std::sync::Arc;

use lingo_core::model::{Level, Preferences, Subject};
use storage::repository::PreferencesRepository;

use crate::error::PreferencesServiceError;

/// Reads and merges the learner's subject/level choice.
#[derive(Clone)]
pub struct PreferencesService {
    repo: Arc<dyn PreferencesRepository>,
}

impl PreferencesService {
    #[must_use]
    pub fn new(repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted preferences (or the empty record on first run).
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn load(&self) -> Result<Preferences, PreferencesServiceError> {
        let preferences = self.repo.get_preferences().await?;
        Ok(preferences.unwrap_or_default())
    }

    /// Whether both subject and level are chosen.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn has_completed_setup(&self) -> Result<bool, PreferencesServiceError> {
        Ok(self.load().await?.is_complete())
    }

    /// Merge a subject choice into the stored record. The level is kept.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` if persistence fails.
    pub async fn set_subject(&self, subject: Subject) -> Result<Preferences, PreferencesServiceError> {
        let updated = self.load().await?.with_subject(subject);
        self.repo.save_preferences(&updated).await?;
        tracing::debug!(subject = subject.code(), "subject selected");
        Ok(updated)
    }

    /// Merge a level choice into the stored record.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` if persistence fails.
    pub async fn set_level(&self, level: Level) -> Result<Preferences, PreferencesServiceError> {
        let updated = self.load().await?.with_level(level);
        self.repo.save_preferences(&updated).await?;
        tracing::debug!(level = level.code(), "level selected");
        Ok(updated)
    }

    /// Reset both fields and remove the persisted record.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` if the record cannot be removed.
    pub async fn clear(&self) -> Result<(), PreferencesServiceError> {
        self.repo.clear_preferences().await?;
        tracing::debug!("preferences cleared");
        Ok(())
    }
}
