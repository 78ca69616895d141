use std::sync::Arc;

use lingo_core::Clock;
use lingo_core::model::{CompletionRecord, LessonId, ProgressRecord};
use serde::Serialize;
use storage::repository::ProgressRepository;

use crate::auth::AuthSession;
use crate::error::ProgressServiceError;

/// Profile header data: who is signed in and how much XP they have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub total_xp: u64,
}

/// Score persistence: XP totals and completed lessons.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError` on storage failures.
    pub async fn load(&self) -> Result<ProgressRecord, ProgressServiceError> {
        Ok(self.repo.load_progress().await?)
    }

    /// Add a lesson's XP and mark it complete.
    ///
    /// Submitting the same lesson again returns the unchanged total.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the write fails. Nothing is applied then.
    pub async fn record_completion(
        &self,
        lesson_id: &LessonId,
        xp_earned: u32,
    ) -> Result<CompletionRecord, ProgressServiceError> {
        let record = self
            .repo
            .record_completion(lesson_id, xp_earned, self.clock.now())
            .await
            .inspect_err(|err| tracing::warn!(lesson_id = %lesson_id, error = %err, "failed to record completion"))?;

        tracing::info!(
            lesson_id = %lesson_id,
            xp_awarded = record.xp_awarded,
            total_xp = record.new_total_xp,
            newly_completed = record.newly_completed,
            "lesson completion recorded"
        );
        Ok(record)
    }

    /// Explicit reset of all progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the reset fails.
    pub async fn reset(&self) -> Result<(), ProgressServiceError> {
        self.repo.reset_progress().await?;
        tracing::info!("progress reset");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError` on storage failures.
    pub async fn profile(&self, session: &AuthSession) -> Result<UserProfile, ProgressServiceError> {
        let progress = self.load().await?;
        Ok(UserProfile {
            email: session.email().to_string(),
            name: session.display_name().to_string(),
            total_xp: progress.total_xp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> (InMemoryRepository, ProgressService) {
        let repo = InMemoryRepository::new();
        let service = ProgressService::new(fixed_clock(), Arc::new(repo.clone()));
        (repo, service)
    }

    #[tokio::test]
    async fn duplicate_submission_keeps_total() {
        let (_repo, service) = service();
        let id = LessonId::new("html-beginner-1");
        let once = service.record_completion(&id, 10).await.unwrap();
        let twice = service.record_completion(&id, 10).await.unwrap();
        assert_eq!(once.new_total_xp, twice.new_total_xp);
        assert_eq!(service.load().await.unwrap().total_xp(), 10);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let (_repo, service) = service();
        service
            .record_completion(&LessonId::new("css-beginner-1"), 10)
            .await
            .unwrap();
        service.reset().await.unwrap();
        assert_eq!(service.load().await.unwrap(), ProgressRecord::new());
    }

    #[tokio::test]
    async fn profile_combines_session_and_xp() {
        let (_repo, service) = service();
        service
            .record_completion(&LessonId::new("js-beginner-1"), 10)
            .await
            .unwrap();
        let session = AuthSession::new("ana@example.com");
        let profile = service.profile(&session).await.unwrap();
        assert_eq!(
            profile,
            UserProfile {
                email: "ana@example.com".into(),
                name: "ana".into(),
                total_xp: 10,
            }
        );
    }
}
