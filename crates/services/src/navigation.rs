//! Screen routing and the guard applied before every screen is shown.

use std::fmt;

use lingo_core::model::{LessonId, Preferences};
use lingo_core::session::LessonOutcome;

use crate::auth::AuthState;

/// Every screen the learner can land on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Loading,
    Login,
    SignUp,
    SubjectSelection,
    LevelSelection,
    Home,
    Lesson(LessonId),
    LessonSuccess {
        xp_earned: u32,
        accuracy: u32,
    },
    LessonResult {
        correct: u32,
        wrong: u32,
        total: u32,
        lesson_id: LessonId,
    },
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Loading => "/loading".into(),
            Route::Login => "/login".into(),
            Route::SignUp => "/signup".into(),
            Route::SubjectSelection => "/subject".into(),
            Route::LevelSelection => "/level".into(),
            Route::Home => "/".into(),
            Route::Lesson(id) => format!("/lesson/{id}"),
            Route::LessonSuccess { .. } => "/lesson-success".into(),
            Route::LessonResult { .. } => "/lesson-result".into(),
        }
    }

    /// Screens reachable without a signed-in session.
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Loading | Route::Login | Route::SignUp)
    }

    /// Screens that need both subject and level chosen.
    #[must_use]
    pub fn requires_setup(&self) -> bool {
        matches!(
            self,
            Route::Home | Route::Lesson(_) | Route::LessonSuccess { .. } | Route::LessonResult { .. }
        )
    }

    /// The terminal screen for a finished attempt.
    #[must_use]
    pub fn from_outcome(outcome: &LessonOutcome) -> Self {
        match outcome {
            LessonOutcome::Success {
                xp_earned, accuracy, ..
            } => Route::LessonSuccess {
                xp_earned: *xp_earned,
                accuracy: *accuracy,
            },
            LessonOutcome::PartialFailure {
                lesson_id,
                correct,
                wrong,
                total,
                ..
            } => Route::LessonResult {
                correct: *correct,
                wrong: *wrong,
                total: *total,
                lesson_id: lesson_id.clone(),
            },
        }
    }

    /// A fresh attempt at the same lesson, from the result screen.
    #[must_use]
    pub fn retry_target(&self) -> Option<Route> {
        match self {
            Route::LessonResult { lesson_id, .. } => Some(Route::Lesson(lesson_id.clone())),
            _ => None,
        }
    }

    /// The one action offered on terminal screens.
    #[must_use]
    pub fn recovery(&self) -> Option<RecoveryAction> {
        match self {
            Route::LessonSuccess { .. } => Some(RecoveryAction::ReturnHome),
            Route::LessonResult { .. } => Some(RecoveryAction::Retry),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Single follow-up action attached to an error or terminal screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    ReturnHome,
    Retry,
    Dismiss,
    FinishSetup,
}

impl RecoveryAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RecoveryAction::ReturnHome => "Back to home",
            RecoveryAction::Retry => "Try again",
            RecoveryAction::Dismiss => "OK",
            RecoveryAction::FinishSetup => "Finish setup",
        }
    }

    /// Where the action leads, or `None` to stay on the current screen.
    #[must_use]
    pub fn target(self, preferences: &Preferences) -> Option<Route> {
        match self {
            RecoveryAction::ReturnHome => Some(Route::Home),
            RecoveryAction::FinishSetup => {
                Some(first_missing_selection(preferences).unwrap_or(Route::Home))
            }
            RecoveryAction::Retry | RecoveryAction::Dismiss => None,
        }
    }
}

/// Apply auth and setup guards to a requested route.
#[must_use]
pub fn resolve(requested: Route, auth: &AuthState, preferences: &Preferences) -> Route {
    if auth.loading {
        return Route::Loading;
    }

    let signed_in = auth.session.is_some();
    match requested {
        Route::Loading if signed_in => resolve(Route::Home, auth, preferences),
        Route::Loading => Route::Login,
        Route::Login | Route::SignUp if signed_in => resolve(Route::Home, auth, preferences),
        route @ (Route::Login | Route::SignUp) => route,
        _ if !signed_in => Route::Login,
        Route::LevelSelection if preferences.subject.is_none() => Route::SubjectSelection,
        route if route.requires_setup() => first_missing_selection(preferences).unwrap_or(route),
        route => route,
    }
}

/// Destination after a successful login: the protected screen that was
/// requested, or home.
#[must_use]
pub fn after_login(return_to: Option<Route>) -> Route {
    match return_to {
        Some(route) if !route.is_public() => route,
        _ => Route::Home,
    }
}

fn first_missing_selection(preferences: &Preferences) -> Option<Route> {
    if preferences.subject.is_none() {
        Some(Route::SubjectSelection)
    } else if preferences.level.is_none() {
        Some(Route::LevelSelection)
    } else {
        None
    }
}
