#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod error;
pub mod navigation;
pub mod overview_service;
pub mod preferences_service;
pub mod progress_service;
pub mod sessions;

pub use lingo_core::Clock;

pub use app_services::{AppConfig, AppServices};
pub use auth::{AuthService, AuthSession, AuthState, Credentials, SignUpOutcome};
pub use error::{
    AppServicesError, AuthError, LessonFlowError, OverviewError, PreferencesServiceError,
    ProgressServiceError,
};
pub use navigation::{RecoveryAction, Route};
pub use overview_service::{CatalogOverview, LessonOverview, OverviewService, UnitOverview};
pub use preferences_service::PreferencesService;
pub use progress_service::{ProgressService, UserProfile};
pub use sessions::{ContinueResult, FeedbackView, LessonFlowService, QuestionView, SessionProgress};
