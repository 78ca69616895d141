use std::sync::Arc;

use lingo_core::model::{CompletionRecord, LessonId};
use lingo_core::session::{Advance, LessonOutcome};
use lingo_core::{Catalog, LessonSession, OutcomePolicy};

use crate::error::LessonFlowError;
use crate::navigation::Route;
use crate::preferences_service::PreferencesService;
use crate::progress_service::ProgressService;

/// Result of continuing past a checked answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueResult {
    pub advance: Advance,
    /// Present when a successful finish was persisted.
    pub completion: Option<CompletionRecord>,
    /// Where the learner goes next.
    pub route: Route,
}

/// Orchestrates lesson start and the persisted finish.
///
/// Answer selection, checking and skipping are pure session transitions and
/// go straight to `LessonSession`; only the finish touches storage.
#[derive(Clone)]
pub struct LessonFlowService {
    catalog: Arc<Catalog>,
    preferences: Arc<PreferencesService>,
    progress: Arc<ProgressService>,
    policy: OutcomePolicy,
}

impl LessonFlowService {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        preferences: Arc<PreferencesService>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            catalog,
            preferences,
            progress,
            policy: OutcomePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: OutcomePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> OutcomePolicy {
        self.policy
    }

    /// Start a new attempt at a lesson from the learner's current subject and level.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::Lookup` when setup is incomplete or the lesson
    /// is not in the catalog, or `LessonFlowError::Preferences` on storage failures.
    pub async fn start_lesson(&self, lesson_id: &LessonId) -> Result<LessonSession, LessonFlowError> {
        let preferences = self.preferences.load().await?;
        let lesson = self
            .catalog
            .find_lesson_for(&preferences, lesson_id)
            .inspect_err(|err| tracing::debug!(lesson_id = %lesson_id, error = %err, "lesson lookup failed"))?
            .clone();

        tracing::debug!(
            lesson_id = %lesson_id,
            questions = lesson.question_count(),
            policy = %self.policy,
            "lesson attempt started"
        );
        Ok(LessonSession::new(lesson, self.policy))
    }

    /// Continue past the checked answer and persist a successful finish.
    ///
    /// If persistence fails the session stays finished; call
    /// `finalize_completion` to retry.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::Session` for invalid transitions and
    /// `LessonFlowError::Progress` if the completion cannot be saved.
    pub async fn continue_lesson(
        &self,
        session: &mut LessonSession,
    ) -> Result<ContinueResult, LessonFlowError> {
        let advance = session.continue_lesson()?;
        let (completion, route) = match &advance {
            Advance::Next { .. } => (None, Route::Lesson(session.lesson().id().clone())),
            Advance::Finished(outcome) => {
                tracing::debug!(lesson_id = %outcome.lesson_id(), success = outcome.is_success(), "lesson attempt finished");
                (self.persist(outcome).await?, Route::from_outcome(outcome))
            }
        };

        Ok(ContinueResult {
            advance,
            completion,
            route,
        })
    }

    /// Retry persisting a finished attempt.
    ///
    /// Safe to call more than once: replays never award XP twice.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::Session` if the attempt has not finished, or
    /// `LessonFlowError::Progress` if the write fails again.
    pub async fn finalize_completion(
        &self,
        session: &LessonSession,
    ) -> Result<Option<CompletionRecord>, LessonFlowError> {
        let outcome = session
            .outcome()
            .ok_or(lingo_core::SessionError::NotChecked)?;
        self.persist(outcome).await
    }

    async fn persist(
        &self,
        outcome: &LessonOutcome,
    ) -> Result<Option<CompletionRecord>, LessonFlowError> {
        match outcome {
            LessonOutcome::Success {
                lesson_id,
                xp_earned,
                ..
            } => Ok(Some(
                self.progress.record_completion(lesson_id, *xp_earned).await?,
            )),
            LessonOutcome::PartialFailure { .. } => Ok(None),
        }
    }
}
