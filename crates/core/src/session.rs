//! One attempt at a lesson: question pointer, pending answer, lives and tally.
//!
//! ```text
//! Answering --select--> Selected --check--> Checked --continue--> Answering (next)
//!                                              |                   Finished (last)
//!                                              +--lives hit 0--> OutOfLives (dead end)
//! ```
//!
//! Nothing here is persisted; dropping the session discards the attempt.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{Answer, Lesson, LessonId, Question};

pub const STARTING_LIVES: u8 = 3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("select an answer before checking")]
    NoSelection,

    #[error("answer already checked; continue to the next question")]
    AlreadyChecked,

    #[error("answer has not been checked yet")]
    NotChecked,

    #[error("answer does not fit the current question")]
    InvalidAnswer,

    #[error("no lives left; return to the catalog")]
    OutOfLives,

    #[error("lesson attempt already finished")]
    Finished,
}

//
// ─── OUTCOME POLICY ────────────────────────────────────────────────────────────
//

/// Decides how a fully answered lesson is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutcomePolicy {
    /// Reaching the end of the question list is always a success.
    #[default]
    ReachTheEnd,
    /// Any wrong answer turns the finish into a partial failure.
    PerfectRun,
}

impl OutcomePolicy {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            OutcomePolicy::ReachTheEnd => "reach-the-end",
            OutcomePolicy::PerfectRun => "perfect-run",
        }
    }
}

impl fmt::Display for OutcomePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OutcomePolicy {
    type Err = crate::model::ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reach-the-end" => Ok(OutcomePolicy::ReachTheEnd),
            "perfect-run" => Ok(OutcomePolicy::PerfectRun),
            other => Err(crate::model::ParseCodeError::new("outcome policy", other)),
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Answering,
    Selected,
    Checked,
    OutOfLives,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Correct,
    Incorrect,
}

/// Popup shown after checking an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub explanation: Option<String>,
}

/// Returned by `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub correct: bool,
    pub lives: u8,
    pub out_of_lives: bool,
}

/// Terminal result of an attempt that reached the end of its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LessonOutcome {
    Success {
        lesson_id: LessonId,
        xp_earned: u32,
        correct: u32,
        wrong: u32,
        total: u32,
        accuracy: u32,
    },
    PartialFailure {
        lesson_id: LessonId,
        correct: u32,
        wrong: u32,
        total: u32,
        accuracy: u32,
    },
}

impl LessonOutcome {
    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        match self {
            LessonOutcome::Success { lesson_id, .. }
            | LessonOutcome::PartialFailure { lesson_id, .. } => lesson_id,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, LessonOutcome::Success { .. })
    }

    #[must_use]
    pub fn accuracy(&self) -> u32 {
        match self {
            LessonOutcome::Success { accuracy, .. }
            | LessonOutcome::PartialFailure { accuracy, .. } => *accuracy,
        }
    }
}

/// Returned by `continue_lesson`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished(LessonOutcome),
}

/// `round(correct / total * 100)`, with an empty lesson scoring 0.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    let rounded = (correct * 200 + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of a single lesson attempt.
#[derive(Debug, Clone)]
pub struct LessonSession {
    lesson: Lesson,
    policy: OutcomePolicy,
    phase: SessionPhase,
    index: usize,
    selection: Option<Answer>,
    lives: u8,
    correct: u32,
    wrong: u32,
    feedback: Option<Feedback>,
    outcome: Option<LessonOutcome>,
}

impl LessonSession {
    #[must_use]
    pub fn new(lesson: Lesson, policy: OutcomePolicy) -> Self {
        Self {
            lesson,
            policy,
            phase: SessionPhase::Answering,
            index: 0,
            selection: None,
            lives: STARTING_LIVES,
            correct: 0,
            wrong: 0,
            feedback: None,
            outcome: None,
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn policy(&self) -> OutcomePolicy {
        self.policy
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// 0-based index of the current question.
    #[must_use]
    pub fn question_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.lesson.question_count()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.lesson.questions()[self.index]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.total_questions()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Answer> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn lives(&self) -> u8 {
        self.lives
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&LessonOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn is_out_of_lives(&self) -> bool {
        self.phase == SessionPhase::OutOfLives
    }

    /// Progress bar value: `(index + 1) / total` as a percentage.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let total = self.total_questions().max(1);
        let done = (self.index + 1).min(total);
        u32::try_from(done * 100 / total).unwrap_or(100)
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Finished => Err(SessionError::Finished),
            SessionPhase::OutOfLives => Err(SessionError::OutOfLives),
            SessionPhase::Answering | SessionPhase::Selected | SessionPhase::Checked => Ok(()),
        }
    }

    /// Choose (or replace) the pending answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyChecked` after checking,
    /// `SessionError::InvalidAnswer` if the answer does not fit the question,
    /// or a terminal-state error.
    pub fn select_answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.phase == SessionPhase::Checked {
            return Err(SessionError::AlreadyChecked);
        }
        if !self.current_question().accepts(&answer) {
            return Err(SessionError::InvalidAnswer);
        }
        self.selection = Some(answer);
        self.phase = SessionPhase::Selected;
        Ok(())
    }

    /// Grade the pending answer and reveal feedback.
    ///
    /// A wrong answer costs a life (never below zero). Losing the last life
    /// before the final question ends the attempt in `OutOfLives`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` without a pending answer,
    /// `SessionError::AlreadyChecked` on a second check, or a terminal-state error.
    pub fn check(&mut self) -> Result<CheckResult, SessionError> {
        self.ensure_active()?;
        if self.phase == SessionPhase::Checked {
            return Err(SessionError::AlreadyChecked);
        }
        let answer = self.selection.as_ref().ok_or(SessionError::NoSelection)?;
        let question = self.current_question();
        let correct = question.is_correct(answer);
        let explanation = question.explanation().map(str::to_owned);

        if correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.wrong = self.wrong.saturating_add(1);
            self.lives = self.lives.saturating_sub(1);
        }

        self.feedback = Some(Feedback {
            kind: if correct {
                FeedbackKind::Correct
            } else {
                FeedbackKind::Incorrect
            },
            explanation,
        });

        let out_of_lives = self.lives == 0 && !self.is_last_question();
        self.phase = if out_of_lives {
            SessionPhase::OutOfLives
        } else {
            SessionPhase::Checked
        };

        Ok(CheckResult {
            correct,
            lives: self.lives,
            out_of_lives,
        })
    }

    /// Move past the current question without answering it.
    ///
    /// Returns `false` (and changes nothing) on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyChecked` once the answer has been revealed,
    /// or a terminal-state error.
    pub fn skip(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.phase == SessionPhase::Checked {
            return Err(SessionError::AlreadyChecked);
        }
        if self.is_last_question() {
            return Ok(false);
        }
        self.advance();
        Ok(true)
    }

    /// Dismiss feedback and go to the next question, or finish the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotChecked` before the answer is checked, or a
    /// terminal-state error.
    pub fn continue_lesson(&mut self) -> Result<Advance, SessionError> {
        self.ensure_active()?;
        if self.phase != SessionPhase::Checked {
            return Err(SessionError::NotChecked);
        }
        self.feedback = None;

        if !self.is_last_question() {
            self.advance();
            return Ok(Advance::Next { index: self.index });
        }

        let outcome = self.build_outcome();
        self.phase = SessionPhase::Finished;
        self.outcome = Some(outcome.clone());
        Ok(Advance::Finished(outcome))
    }

    /// Leave the attempt. Nothing is recorded.
    pub fn abandon(self) -> LessonId {
        self.lesson.id().clone()
    }

    fn advance(&mut self) {
        self.index += 1;
        self.selection = None;
        self.feedback = None;
        self.phase = SessionPhase::Answering;
    }

    fn build_outcome(&self) -> LessonOutcome {
        let total = u32::try_from(self.total_questions()).unwrap_or(u32::MAX);
        let accuracy = accuracy_percent(self.correct, total);
        let lesson_id = self.lesson.id().clone();

        let success = match self.policy {
            OutcomePolicy::ReachTheEnd => true,
            OutcomePolicy::PerfectRun => self.wrong == 0,
        };

        if success {
            LessonOutcome::Success {
                lesson_id,
                xp_earned: self.lesson.xp_reward(),
                correct: self.correct,
                wrong: self.wrong,
                total,
                accuracy,
            }
        } else {
            LessonOutcome::PartialFailure {
                lesson_id,
                correct: self.correct,
                wrong: self.wrong,
                total,
                accuracy,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lesson::fixtures::lesson;

    const RIGHT: Answer = Answer::Choice(0);
    const WRONG: Answer = Answer::Choice(1);

    fn answer(session: &mut LessonSession, answer: Answer) -> Advance {
        session.select_answer(answer).unwrap();
        session.check().unwrap();
        session.continue_lesson().unwrap()
    }

    #[test]
    fn mixed_answers_still_succeed_when_reaching_the_end() {
        let mut session = LessonSession::new(lesson("l", 1, 3), OutcomePolicy::ReachTheEnd);
        assert_eq!(answer(&mut session, RIGHT), Advance::Next { index: 1 });
        assert_eq!(answer(&mut session, WRONG), Advance::Next { index: 2 });
        let Advance::Finished(outcome) = answer(&mut session, RIGHT) else {
            panic!("expected finish");
        };

        assert_eq!(
            outcome,
            LessonOutcome::Success {
                lesson_id: LessonId::new("l"),
                xp_earned: 10,
                correct: 2,
                wrong: 1,
                total: 3,
                accuracy: 67,
            }
        );
        assert!(session.is_finished());
    }

    #[test]
    fn all_wrong_two_questions_reaches_success() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::ReachTheEnd);
        assert_eq!(session.lives(), 3);
        answer(&mut session, WRONG);
        assert_eq!(session.lives(), 2);
        let Advance::Finished(outcome) = answer(&mut session, WRONG) else {
            panic!("expected finish");
        };
        assert_eq!(session.lives(), 1);
        assert!(outcome.is_success());
        assert_eq!(outcome.accuracy(), 0);
    }

    #[test]
    fn perfect_run_policy_reports_partial_failure() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::PerfectRun);
        answer(&mut session, RIGHT);
        let Advance::Finished(outcome) = answer(&mut session, WRONG) else {
            panic!("expected finish");
        };
        assert_eq!(
            outcome,
            LessonOutcome::PartialFailure {
                lesson_id: LessonId::new("l"),
                correct: 1,
                wrong: 1,
                total: 2,
                accuracy: 50,
            }
        );
    }

    #[test]
    fn perfect_run_without_mistakes_succeeds() {
        let mut session = LessonSession::new(lesson("l", 1, 1), OutcomePolicy::PerfectRun);
        let Advance::Finished(outcome) = answer(&mut session, RIGHT) else {
            panic!("expected finish");
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.accuracy(), 100);
    }

    #[test]
    fn k_checks_finish_exactly_once() {
        for k in 1..=3 {
            let mut session = LessonSession::new(lesson("l", 1, k), OutcomePolicy::ReachTheEnd);
            let mut finished = 0;
            for _ in 0..k {
                if let Advance::Finished(_) = answer(&mut session, RIGHT) {
                    finished += 1;
                }
            }
            assert_eq!(finished, 1);
            assert_eq!(session.select_answer(RIGHT), Err(SessionError::Finished));
            assert_eq!(session.continue_lesson(), Err(SessionError::Finished));
            assert_eq!(session.skip(), Err(SessionError::Finished));
        }
    }

    #[test]
    fn lives_track_wrong_answers() {
        let sequences: [&[bool]; 4] = [
            &[true, true, true, true],
            &[false, true, false, true],
            &[false, false, true, true],
            &[true, false, true, false],
        ];
        for sequence in sequences {
            let mut session = LessonSession::new(lesson("l", 1, 4), OutcomePolicy::ReachTheEnd);
            let mut wrong = 0_u8;
            for is_right in sequence {
                session.select_answer(if *is_right { RIGHT } else { WRONG }).unwrap();
                session.check().unwrap();
                if !is_right {
                    wrong += 1;
                }
                assert_eq!(session.lives(), STARTING_LIVES.saturating_sub(wrong));
                if session.is_out_of_lives() || session.is_finished() {
                    break;
                }
                session.continue_lesson().unwrap();
            }
        }
    }

    #[test]
    fn losing_last_life_early_is_a_dead_end() {
        let mut session = LessonSession::new(lesson("l", 1, 5), OutcomePolicy::ReachTheEnd);
        answer(&mut session, WRONG);
        answer(&mut session, WRONG);
        session.select_answer(WRONG).unwrap();
        let result = session.check().unwrap();

        assert_eq!(
            result,
            CheckResult {
                correct: false,
                lives: 0,
                out_of_lives: true,
            }
        );
        assert_eq!(session.phase(), SessionPhase::OutOfLives);
        assert_eq!(session.continue_lesson(), Err(SessionError::OutOfLives));
        assert_eq!(session.skip(), Err(SessionError::OutOfLives));
        assert_eq!(session.select_answer(RIGHT), Err(SessionError::OutOfLives));
        assert_eq!(session.abandon(), LessonId::new("l"));
    }

    #[test]
    fn losing_last_life_on_final_question_still_finishes() {
        let mut session = LessonSession::new(lesson("l", 1, 3), OutcomePolicy::ReachTheEnd);
        answer(&mut session, WRONG);
        answer(&mut session, WRONG);
        session.select_answer(WRONG).unwrap();
        let result = session.check().unwrap();
        assert!(!result.out_of_lives);
        assert_eq!(result.lives, 0);
        assert!(matches!(
            session.continue_lesson(),
            Ok(Advance::Finished(LessonOutcome::Success { wrong: 3, .. }))
        ));
    }

    #[test]
    fn check_requires_selection_and_happens_once() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::ReachTheEnd);
        assert_eq!(session.check(), Err(SessionError::NoSelection));
        assert_eq!(session.continue_lesson(), Err(SessionError::NotChecked));

        session.select_answer(WRONG).unwrap();
        session.select_answer(RIGHT).unwrap();
        assert_eq!(session.selection(), Some(&RIGHT));
        assert!(session.check().unwrap().correct);

        assert_eq!(session.check(), Err(SessionError::AlreadyChecked));
        assert_eq!(session.select_answer(WRONG), Err(SessionError::AlreadyChecked));
        assert_eq!(
            session.feedback().map(|f| f.kind),
            Some(FeedbackKind::Correct)
        );
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn invalid_answers_are_rejected() {
        let mut session = LessonSession::new(lesson("l", 1, 1), OutcomePolicy::ReachTheEnd);
        assert_eq!(
            session.select_answer(Answer::Choice(9)),
            Err(SessionError::InvalidAnswer)
        );
        assert_eq!(
            session.select_answer(Answer::Text("right".into())),
            Err(SessionError::InvalidAnswer)
        );
        assert_eq!(session.phase(), SessionPhase::Answering);
    }

    #[test]
    fn skip_advances_without_touching_counters() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::ReachTheEnd);
        session.select_answer(WRONG).unwrap();
        assert_eq!(session.skip(), Ok(true));
        assert_eq!(session.question_index(), 1);
        assert_eq!(session.selection(), None);
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!((session.correct_count(), session.wrong_count()), (0, 0));
        assert_eq!(session.lives(), STARTING_LIVES);

        assert_eq!(session.skip(), Ok(false));
        assert_eq!(session.question_index(), 1);

        session.select_answer(RIGHT).unwrap();
        session.check().unwrap();
        assert_eq!(session.skip(), Err(SessionError::AlreadyChecked));
    }

    #[test]
    fn skipped_questions_lower_accuracy() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::ReachTheEnd);
        session.skip().unwrap();
        let Advance::Finished(outcome) = answer(&mut session, RIGHT) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.accuracy(), 50);
    }

    #[test]
    fn continue_clears_feedback() {
        let mut session = LessonSession::new(lesson("l", 1, 2), OutcomePolicy::ReachTheEnd);
        session.select_answer(RIGHT).unwrap();
        session.check().unwrap();
        assert!(session.feedback().is_some());
        session.continue_lesson().unwrap();
        assert!(session.feedback().is_none());
        assert_eq!(session.progress_percent(), 100);
    }

    #[test]
    fn accuracy_rounds_half_up() {
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(1, 8), 13);
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn outcome_policy_codes() {
        assert_eq!("perfect-run".parse::<OutcomePolicy>(), Ok(OutcomePolicy::PerfectRun));
        assert_eq!(
            OutcomePolicy::ReachTheEnd.code().parse::<OutcomePolicy>(),
            Ok(OutcomePolicy::ReachTheEnd)
        );
        assert!("lenient".parse::<OutcomePolicy>().is_err());
    }
}
