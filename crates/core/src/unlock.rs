//! Linear unit unlock chain derived from completed lessons.
//!
//! Unit completion is never stored: a unit is completed when it has at least
//! one lesson and every one of its lessons is in the completed set. Unit 1 is
//! always open; every later unit opens once its predecessor is completed. An
//! empty unit can never complete, so it blocks every unit after it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Lesson, LessonId, UnitId};

/// Number of units shown on the catalog overview.
pub const UNIT_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Locked,
    Available,
    Completed,
}

impl UnitStatus {
    /// Whether the learner may open the unit.
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, UnitStatus::Locked)
    }
}

#[must_use]
pub fn is_unit_completed(unit: UnitId, completed: &BTreeSet<LessonId>, lessons: &[Lesson]) -> bool {
    let mut unit_lessons = lessons.iter().filter(|lesson| lesson.unit() == unit).peekable();
    if unit_lessons.peek().is_none() {
        return false;
    }
    unit_lessons.all(|lesson| completed.contains(lesson.id()))
}

#[must_use]
pub fn unit_status(unit: UnitId, completed: &BTreeSet<LessonId>, lessons: &[Lesson]) -> UnitStatus {
    if is_unit_completed(unit, completed, lessons) {
        return UnitStatus::Completed;
    }
    if unit == UnitId::FIRST {
        return UnitStatus::Available;
    }
    match unit.previous() {
        Some(previous) if is_unit_completed(previous, completed, lessons) => UnitStatus::Available,
        _ => UnitStatus::Locked,
    }
}

/// Statuses for units `1..=unit_count`, in ascending order.
#[must_use]
pub fn unit_statuses(
    completed: &BTreeSet<LessonId>,
    lessons: &[Lesson],
    unit_count: u32,
) -> Vec<(UnitId, UnitStatus)> {
    (1..=unit_count)
        .map(UnitId::new)
        .map(|unit| (unit, unit_status(unit, completed, lessons)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lesson::fixtures::lesson;

    fn five_units() -> Vec<Lesson> {
        vec![
            lesson("u1-a", 1, 2),
            lesson("u1-b", 1, 1),
            lesson("u2-a", 2, 1),
            lesson("u3-a", 3, 1),
            lesson("u4-a", 4, 1),
            lesson("u5-a", 5, 1),
        ]
    }

    fn done(ids: &[&str]) -> BTreeSet<LessonId> {
        ids.iter().map(|id| LessonId::new(*id)).collect()
    }

    fn statuses(completed: &BTreeSet<LessonId>, lessons: &[Lesson]) -> Vec<UnitStatus> {
        unit_statuses(completed, lessons, UNIT_COUNT)
            .into_iter()
            .map(|(_, status)| status)
            .collect()
    }

    #[test]
    fn fresh_learner_only_has_unit_one() {
        use UnitStatus::{Available, Locked};
        assert_eq!(
            statuses(&BTreeSet::new(), &five_units()),
            vec![Available, Locked, Locked, Locked, Locked]
        );
    }

    #[test]
    fn finishing_unit_one_opens_unit_two() {
        use UnitStatus::{Available, Completed, Locked};
        assert_eq!(
            statuses(&done(&["u1-a", "u1-b"]), &five_units()),
            vec![Completed, Available, Locked, Locked, Locked]
        );
    }

    #[test]
    fn partially_completed_unit_stays_available() {
        use UnitStatus::{Available, Locked};
        assert_eq!(
            statuses(&done(&["u1-a"]), &five_units()),
            vec![Available, Locked, Locked, Locked, Locked]
        );
    }

    #[test]
    fn unit_one_is_never_locked() {
        let lessons = five_units();
        for completed in [done(&[]), done(&["u2-a"]), done(&["u1-a", "u1-b", "u5-a"])] {
            assert_ne!(
                unit_status(UnitId::FIRST, &completed, &lessons),
                UnitStatus::Locked
            );
        }
        assert_eq!(
            unit_status(UnitId::FIRST, &BTreeSet::new(), &[]),
            UnitStatus::Available
        );
    }

    #[test]
    fn later_unit_is_available_iff_predecessor_completed() {
        let lessons = five_units();
        let completed = done(&["u1-a", "u1-b", "u2-a", "u4-a"]);
        assert_eq!(unit_status(UnitId::new(3), &completed, &lessons), UnitStatus::Available);
        // Unit 5 opens because unit 4 is done, even though unit 3 is not.
        assert_eq!(unit_status(UnitId::new(5), &completed, &lessons), UnitStatus::Available);
        // Completed wins over the predecessor rule.
        assert_eq!(unit_status(UnitId::new(4), &completed, &lessons), UnitStatus::Completed);
    }

    #[test]
    fn empty_unit_blocks_the_rest_of_the_chain() {
        use UnitStatus::{Available, Completed, Locked};
        let lessons = vec![lesson("u1", 1, 1), lesson("u3", 3, 1)];
        let completed = done(&["u1", "u3"]);
        assert!(!is_unit_completed(UnitId::new(2), &completed, &lessons));
        assert_eq!(
            statuses(&completed, &lessons),
            vec![Completed, Available, Completed, Available, Locked]
        );
    }

    #[test]
    fn open_statuses() {
        assert!(UnitStatus::Available.is_open());
        assert!(UnitStatus::Completed.is_open());
        assert!(!UnitStatus::Locked.is_open());
    }
}
