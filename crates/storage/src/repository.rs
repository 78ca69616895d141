use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingo_core::model::{CompletionRecord, LessonId, Preferences, ProgressRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the learner's subject/level choice.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Fetch the stored preferences, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read or decoded.
    async fn get_preferences(&self) -> Result<Option<Preferences>, StorageError>;

    /// Replace the stored preferences with the full record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError>;

    /// Remove the stored record entirely.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be removed.
    async fn clear_preferences(&self) -> Result<(), StorageError>;
}

/// Repository contract for XP totals and completed lessons.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the progress record; an empty record on first run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read or decoded.
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError>;

    /// Mark a lesson complete and add its XP in one atomic write.
    ///
    /// A lesson that is already complete is left as is and awards no XP.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; nothing is applied then.
    async fn record_completion(
        &self,
        lesson_id: &LessonId,
        xp_earned: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError>;

    /// Drop all progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the reset fails.
    async fn reset_progress(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    preferences: Arc<Mutex<Option<Preferences>>>,
    progress: Arc<Mutex<ProgressRecord>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a connection error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("writes are disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn get_preferences(&self) -> Result<Option<Preferences>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*preferences);
        Ok(())
    }

    async fn clear_preferences(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn record_completion(
        &self,
        lesson_id: &LessonId,
        xp_earned: u32,
        _completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError> {
        self.check_writable()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.apply_completion(lesson_id, xp_earned))
    }

    async fn reset_progress(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = ProgressRecord::new();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub preferences: Arc<dyn PreferencesRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self::from_repository(repo)
    }

    /// Use one repository value for every record kind.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: PreferencesRepository + ProgressRepository + Clone + 'static,
    {
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            preferences,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::model::{Level, Subject};
    use lingo_core::time::fixed_now;

    #[tokio::test]
    async fn preferences_start_empty_and_clear() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_preferences().await.unwrap(), None);

        let prefs = Preferences::new(Some(Subject::Html), Some(Level::Beginner));
        repo.save_preferences(&prefs).await.unwrap();
        assert_eq!(repo.get_preferences().await.unwrap(), Some(prefs));

        repo.clear_preferences().await.unwrap();
        assert_eq!(repo.get_preferences().await.unwrap(), None);
    }

    #[tokio::test]
    async fn completion_is_idempotent() {
        let repo = InMemoryRepository::new();
        let id = LessonId::new("js-beginner-1");

        let first = repo.record_completion(&id, 10, fixed_now()).await.unwrap();
        let second = repo.record_completion(&id, 10, fixed_now()).await.unwrap();

        assert_eq!(first.new_total_xp, 10);
        assert_eq!(second.new_total_xp, 10);
        assert!(!second.newly_completed);
        assert_eq!(repo.load_progress().await.unwrap().completed().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_progress_untouched() {
        let repo = InMemoryRepository::new();
        repo.set_fail_writes(true);
        let id = LessonId::new("js-beginner-1");
        assert!(matches!(
            repo.record_completion(&id, 10, fixed_now()).await,
            Err(StorageError::Connection(_))
        ));
        repo.set_fail_writes(false);
        assert_eq!(repo.load_progress().await.unwrap(), ProgressRecord::new());
    }
}
