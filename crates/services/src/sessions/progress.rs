use lingo_core::LessonSession;
use lingo_core::session::SessionPhase;

/// Aggregated view of lesson attempt progress, useful for the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub question_number: usize,
    pub total: usize,
    pub percent: u32,
    pub lives: u8,
    pub correct: u32,
    pub wrong: u32,
    pub phase: SessionPhase,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &LessonSession) -> Self {
        Self {
            question_number: session.question_index() + 1,
            total: session.total_questions(),
            percent: session.progress_percent(),
            lives: session.lives(),
            correct: session.correct_count(),
            wrong: session.wrong_count(),
            phase: session.phase(),
        }
    }
}
