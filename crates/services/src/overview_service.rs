use std::sync::Arc;

use lingo_core::catalog::list_by_unit;
use lingo_core::model::{Lesson, LessonId, Level, ProgressRecord, Subject, UnitId};
use lingo_core::unlock::unit_statuses;
use lingo_core::{Catalog, UNIT_COUNT, UnitStatus};
use serde::Serialize;

use crate::error::OverviewError;
use crate::preferences_service::PreferencesService;
use crate::progress_service::ProgressService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonOverview {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub completed: bool,
}

impl LessonOverview {
    fn of(lesson: &Lesson, progress: &ProgressRecord) -> Self {
        Self {
            id: lesson.id().clone(),
            title: lesson.title().to_string(),
            description: lesson.description().to_string(),
            xp_reward: lesson.xp_reward(),
            completed: progress.is_completed(lesson.id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOverview {
    pub unit: UnitId,
    pub status: UnitStatus,
    pub lessons: Vec<LessonOverview>,
}

/// Home screen data: every unit of the chosen subject and level with its
/// unlock status and lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogOverview {
    pub subject: Subject,
    pub level: Level,
    pub total_xp: u64,
    pub units: Vec<UnitOverview>,
}

impl CatalogOverview {
    #[must_use]
    pub fn unit(&self, unit: UnitId) -> Option<&UnitOverview> {
        self.units.iter().find(|overview| overview.unit == unit)
    }
}

/// Builds the home screen from catalog, preferences and progress.
#[derive(Clone)]
pub struct OverviewService {
    catalog: Arc<Catalog>,
    preferences: Arc<PreferencesService>,
    progress: Arc<ProgressService>,
}

impl OverviewService {
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
        }
    }

    /// # Errors
    ///
    /// Returns `OverviewError::SetupIncomplete` before both choices are made,
    /// or a storage error.
    pub async fn overview(&self) -> Result<CatalogOverview, OverviewError> {
        let (subject, level) = self
            .preferences
            .load()
            .await?
            .selection()
            .ok_or(OverviewError::SetupIncomplete)?;
        let progress = self.progress.load().await?;
        let lessons = self.catalog.list_by_subject_level(subject, level);

        let units = unit_statuses(progress.completed(), lessons, UNIT_COUNT)
            .into_iter()
            .map(|(unit, status)| UnitOverview {
                unit,
                status,
                lessons: list_by_unit(lessons, unit)
                    .into_iter()
                    .map(|lesson| LessonOverview::of(lesson, &progress))
                    .collect(),
            })
            .collect();

        Ok(CatalogOverview {
            subject,
            level,
            total_xp: progress.total_xp(),
            units,
        })
    }

    /// The lessons of an open unit.
    ///
    /// # Errors
    ///
    /// Returns `OverviewError::UnitLocked` for a locked unit and
    /// `OverviewError::UnknownUnit` outside `1..=UNIT_COUNT`.
    pub async fn open_unit(&self, unit: UnitId) -> Result<UnitOverview, OverviewError> {
        let overview = self.overview().await?;
        let unit_overview = overview
            .unit(unit)
            .ok_or(OverviewError::UnknownUnit(unit))?;
        if !unit_overview.status.is_open() {
            tracing::debug!(unit = unit.value(), "locked unit requested");
            return Err(OverviewError::UnitLocked(unit));
        }
        Ok(unit_overview.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, Storage};

    async fn service(subject: Option<Subject>) -> (ProgressService, OverviewService) {
        let storage = Storage::from_repository(InMemoryRepository::new());
        let preferences = PreferencesService::new(storage.preferences);
        if let Some(subject) = subject {
            preferences.set_subject(subject).await.unwrap();
            preferences.set_level(Level::Beginner).await.unwrap();
        }
        let progress = ProgressService::new(fixed_clock(), storage.progress);
        let overview = OverviewService::new(
            Arc::new(Catalog::builtin().unwrap()),
            Arc::new(preferences),
            Arc::new(progress.clone()),
        );
        (progress, overview)
    }

    #[tokio::test]
    async fn requires_setup() {
        let (_, overview) = service(None).await;
        assert!(matches!(
            overview.overview().await,
            Err(OverviewError::SetupIncomplete)
        ));
    }

    #[tokio::test]
    async fn fresh_learner_sees_only_first_unit_open() {
        let (_, overview) = service(Some(Subject::Javascript)).await;
        let home = overview.overview().await.unwrap();
        assert_eq!(home.total_xp, 0);
        assert_eq!(home.units.len(), UNIT_COUNT as usize);

        let statuses: Vec<_> = home.units.iter().map(|unit| unit.status).collect();
        assert_eq!(
            statuses,
            vec![
                UnitStatus::Available,
                UnitStatus::Locked,
                UnitStatus::Locked,
                UnitStatus::Locked,
                UnitStatus::Locked,
            ]
        );
        assert_eq!(home.units[0].lessons.len(), 2);
        assert!(matches!(
            overview.open_unit(UnitId::new(2)).await,
            Err(OverviewError::UnitLocked(_))
        ));
        assert!(matches!(
            overview.open_unit(UnitId::new(9)).await,
            Err(OverviewError::UnknownUnit(_))
        ));
    }

    #[tokio::test]
    async fn finishing_unit_one_opens_unit_two() {
        let (progress, overview) = service(Some(Subject::Javascript)).await;
        for id in ["js-beginner-1", "js-beginner-2"] {
            progress
                .record_completion(&LessonId::new(id), 10)
                .await
                .unwrap();
        }

        let home = overview.overview().await.unwrap();
        assert_eq!(home.total_xp, 20);
        assert_eq!(home.units[0].status, UnitStatus::Completed);
        assert_eq!(home.units[1].status, UnitStatus::Available);
        assert!(home.units[0].lessons.iter().all(|lesson| lesson.completed));

        let unit_two = overview.open_unit(UnitId::new(2)).await.unwrap();
        assert_eq!(unit_two.lessons[0].id, LessonId::new("js-beginner-3"));
    }

    #[tokio::test]
    async fn overview_serializes_for_display() {
        let (_, overview) = service(Some(Subject::Html)).await;
        let home = overview.overview().await.unwrap();
        let json = serde_json::to_value(&home).unwrap();
        assert_eq!(json["subject"], "html");
        assert_eq!(json["units"][0]["status"], "available");
        assert_eq!(json["units"][0]["lessons"][0]["id"], "html-beginner-1");
        assert_eq!(json["units"][4]["lessons"].as_array().unwrap().len(), 0);
    }
}
