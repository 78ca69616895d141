//! Static lesson catalog keyed by subject and level.

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{Lesson, LessonDraft, LessonError, LessonId, Level, Preferences, Subject, UnitId};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Lesson(#[from] LessonError),

    #[error("lesson id {0} appears more than once")]
    DuplicateLesson(LessonId),
}

/// Why a lesson lookup came back empty.
///
/// Both cases are routine: callers send the learner to a recovery screen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LookupError {
    #[error("subject and level must be chosen first")]
    SetupIncomplete,

    #[error("lesson not found: {0}")]
    LessonNotFound(LessonId),
}

type CatalogDraft = BTreeMap<Subject, BTreeMap<Level, Vec<LessonDraft>>>;

/// Read-only table mapping (subject, level) to an ordered list of lessons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    lessons: BTreeMap<(Subject, Level), Vec<Lesson>>,
}

impl Catalog {
    /// Build a catalog from already validated lessons.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateLesson` if a lesson id appears twice
    /// anywhere in the catalog.
    pub fn new(
        entries: impl IntoIterator<Item = (Subject, Level, Vec<Lesson>)>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut lessons: BTreeMap<(Subject, Level), Vec<Lesson>> = BTreeMap::new();
        for (subject, level, list) in entries {
            for lesson in &list {
                if !seen.insert(lesson.id().clone()) {
                    return Err(CatalogError::DuplicateLesson(lesson.id().clone()));
                }
            }
            lessons.entry((subject, level)).or_default().extend(list);
        }
        Ok(Self { lessons })
    }

    /// Parse and validate catalog JSON shaped as `{subject: {level: [lesson, ...]}}`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON, invalid lessons, or duplicate ids.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let draft: CatalogDraft = serde_json::from_str(raw)?;
        let mut entries = Vec::new();
        for (subject, levels) in draft {
            for (level, drafts) in levels {
                let lessons = drafts
                    .into_iter()
                    .map(LessonDraft::validate)
                    .collect::<Result<Vec<_>, _>>()?;
                entries.push((subject, level, lessons));
            }
        }
        Self::new(entries)
    }

    /// The catalog bundled with the application.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Lessons for a subject and level in catalog order; empty when none exist.
    #[must_use]
    pub fn list_by_subject_level(&self, subject: Subject, level: Level) -> &[Lesson] {
        self.lessons
            .get(&(subject, level))
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find_lesson(&self, subject: Subject, level: Level, lesson_id: &LessonId) -> Option<&Lesson> {
        self.list_by_subject_level(subject, level)
            .iter()
            .find(|lesson| lesson.id() == lesson_id)
    }

    /// Look up a lesson through the learner's current preferences.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::SetupIncomplete` when subject or level is unset,
    /// and `LookupError::LessonNotFound` when the id is not in that list.
    pub fn find_lesson_for(
        &self,
        preferences: &Preferences,
        lesson_id: &LessonId,
    ) -> Result<&Lesson, LookupError> {
        let (subject, level) = preferences.selection().ok_or(LookupError::SetupIncomplete)?;
        self.find_lesson(subject, level, lesson_id)
            .ok_or_else(|| LookupError::LessonNotFound(lesson_id.clone()))
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.values().map(Vec::len).sum()
    }
}

/// Lessons belonging to `unit`, in catalog order.
#[must_use]
pub fn list_by_unit(lessons: &[Lesson], unit: UnitId) -> Vec<&Lesson> {
    lessons.iter().filter(|lesson| lesson.unit() == unit).collect()
}
