use std::collections::BTreeSet;

use crate::model::ids::LessonId;

/// Persisted learner progress: total XP and the set of completed lessons.
///
/// Both fields only grow, except through an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    total_xp: u64,
    completed: BTreeSet<LessonId>,
}

/// Result of recording one lesson completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub lesson_id: LessonId,
    /// XP actually added; zero when the lesson was already completed.
    pub xp_awarded: u32,
    pub new_total_xp: u64,
    pub newly_completed: bool,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_persisted(total_xp: u64, completed: impl IntoIterator<Item = LessonId>) -> Self {
        Self {
            total_xp,
            completed: completed.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<LessonId> {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed.contains(lesson_id)
    }

    /// Merge a lesson completion into the record.
    ///
    /// Replaying a lesson that is already in the completed set awards nothing.
    pub fn apply_completion(&mut self, lesson_id: &LessonId, xp_earned: u32) -> CompletionRecord {
        let newly_completed = self.completed.insert(lesson_id.clone());
        let xp_awarded = if newly_completed { xp_earned } else { 0 };
        self.total_xp = self.total_xp.saturating_add(u64::from(xp_awarded));

        CompletionRecord {
            lesson_id: lesson_id.clone(),
            xp_awarded,
            new_total_xp: self.total_xp,
            newly_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_completion_awards_xp() {
        let mut record = ProgressRecord::new();
        let result = record.apply_completion(&LessonId::new("html-beginner-1"), 10);
        assert!(result.newly_completed);
        assert_eq!(result.xp_awarded, 10);
        assert_eq!(result.new_total_xp, 10);
        assert!(record.is_completed(&LessonId::new("html-beginner-1")));
    }

    #[test]
    fn replay_does_not_award_twice() {
        let mut record = ProgressRecord::new();
        let id = LessonId::new("html-beginner-1");
        let first = record.apply_completion(&id, 10);
        let second = record.apply_completion(&id, 10);

        assert_eq!(first.new_total_xp, second.new_total_xp);
        assert!(!second.newly_completed);
        assert_eq!(second.xp_awarded, 0);
        assert_eq!(record.completed().len(), 1);
    }

    #[test]
    fn totals_accumulate_across_lessons() {
        let mut record = ProgressRecord::from_persisted(25, [LessonId::new("css-beginner-1")]);
        let result = record.apply_completion(&LessonId::new("css-beginner-2"), 15);
        assert_eq!(result.new_total_xp, 40);
        assert_eq!(record.completed().len(), 2);
    }
}
