use std::sync::Arc;
use std::time::Duration;

use lingo_core::{Catalog, OutcomePolicy};
use storage::repository::Storage;

use crate::Clock;
use crate::auth::{AUTH_TIMEOUT, AuthProvider, AuthService, LocalAuthProvider};
use crate::error::AppServicesError;
use crate::overview_service::OverviewService;
use crate::preferences_service::PreferencesService;
use crate::progress_service::ProgressService;
use crate::sessions::LessonFlowService;

/// Tunables applied when the services are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub outcome_policy: OutcomePolicy,
    pub auth_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            outcome_policy: OutcomePolicy::default(),
            auth_timeout: AUTH_TIMEOUT,
        }
    }
}

/// Assembles app-facing services over one storage backend and the built-in catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    preferences: Arc<PreferencesService>,
    progress: Arc<ProgressService>,
    lesson_flow: Arc<LessonFlowService>,
    overview: Arc<OverviewService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Accounts are per-process: they live in a fresh `LocalAuthProvider`,
    /// so no session is restored on start. Only preferences and progress
    /// are stored in the database.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: AppConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::assemble(storage, clock, config, Arc::new(LocalAuthProvider::new()))
    }

    /// Build services over in-memory storage with the given auth provider.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the built-in catalog is invalid.
    pub fn in_memory(
        clock: Clock,
        config: AppConfig,
        auth_provider: Arc<dyn AuthProvider>,
    ) -> Result<Self, AppServicesError> {
        Self::assemble(Storage::in_memory(), clock, config, auth_provider)
    }

    /// Build services over an already opened storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the built-in catalog is invalid.
    pub fn assemble(
        storage: Storage,
        clock: Clock,
        config: AppConfig,
        auth_provider: Arc<dyn AuthProvider>,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(Catalog::builtin()?);
        tracing::debug!(lessons = catalog.lesson_count(), "catalog loaded");

        let preferences = Arc::new(PreferencesService::new(Arc::clone(&storage.preferences)));
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        let lesson_flow = Arc::new(
            LessonFlowService::new(
                Arc::clone(&catalog),
                Arc::clone(&preferences),
                Arc::clone(&progress),
            )
            .with_policy(config.outcome_policy),
        );
        let overview = Arc::new(OverviewService::new(
            Arc::clone(&catalog),
            Arc::clone(&preferences),
            Arc::clone(&progress),
        ));
        let auth = Arc::new(AuthService::new(auth_provider).with_timeout(config.auth_timeout));

        Ok(Self {
            catalog,
            preferences,
            progress,
            lesson_flow,
            overview,
            auth,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<PreferencesService> {
        Arc::clone(&self.preferences)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn lesson_flow(&self) -> Arc<LessonFlowService> {
        Arc::clone(&self.lesson_flow)
    }

    #[must_use]
    pub fn overview(&self) -> Arc<OverviewService> {
        Arc::clone(&self.overview)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }
}
