use std::sync::Arc;

use lingo_core::model::{LessonId, Level, Subject};
use lingo_core::time::fixed_now;
use services::auth::LocalAuthProvider;
use services::navigation::{after_login, resolve};
use services::{AppConfig, AppServices, AuthError, Clock, Credentials, Route, SignUpOutcome};

fn app(provider: LocalAuthProvider) -> AppServices {
    AppServices::in_memory(Clock::fixed(fixed_now()), AppConfig::default(), Arc::new(provider))
        .unwrap()
}

#[tokio::test]
async fn new_account_walks_through_setup_to_home() {
    let app = app(LocalAuthProvider::new());
    let auth = app.auth();
    auth.initialize().await.unwrap();

    let prefs = app.preferences().load().await.unwrap();
    let lesson = Route::Lesson(LessonId::new("js-beginner-1"));
    assert_eq!(resolve(lesson.clone(), &auth.state(), &prefs), Route::Login);

    let outcome = auth
        .sign_up(&Credentials::new("bia@example.com", "secret1"))
        .await
        .unwrap();
    assert!(matches!(outcome, SignUpOutcome::Active(_)));

    let target = after_login(Some(lesson.clone()));
    assert_eq!(resolve(target.clone(), &auth.state(), &prefs), Route::SubjectSelection);

    let prefs = app.preferences().set_subject(Subject::Javascript).await.unwrap();
    assert_eq!(resolve(target.clone(), &auth.state(), &prefs), Route::LevelSelection);

    let prefs = app.preferences().set_level(Level::Beginner).await.unwrap();
    assert_eq!(resolve(target, &auth.state(), &prefs), lesson);

    let profile = app
        .progress()
        .profile(&auth.current_session().unwrap())
        .await
        .unwrap();
    assert_eq!(profile.name, "bia");
    assert_eq!(profile.total_xp, 0);
}

#[tokio::test]
async fn logout_returns_protected_routes_to_login() {
    let app = app(LocalAuthProvider::new().with_account("bia@example.com", "secret1"));
    let auth = app.auth();
    auth.initialize().await.unwrap();
    auth.login(&Credentials::new("bia@example.com", "secret1"))
        .await
        .unwrap();
    let prefs = app.preferences().load().await.unwrap();
    assert_eq!(resolve(Route::Login, &auth.state(), &prefs), Route::SubjectSelection);

    auth.logout().await.unwrap();
    assert_eq!(resolve(Route::Home, &auth.state(), &prefs), Route::Login);
}

#[tokio::test]
async fn rejected_login_keeps_user_signed_out() {
    let app = app(LocalAuthProvider::new());
    let auth = app.auth();
    auth.initialize().await.unwrap();

    let err = auth
        .login(&Credentials::new("nobody@example.com", "secret1"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(!auth.state().is_authenticated());
}

#[tokio::test]
async fn sqlite_services_keep_preferences_but_not_accounts() {
    let url = "sqlite:file:memdb_accounts?mode=memory&cache=shared";
    let first = AppServices::new_sqlite(url, Clock::fixed(fixed_now()), AppConfig::default())
        .await
        .unwrap();
    first.auth().initialize().await.unwrap();
    first
        .auth()
        .sign_up(&Credentials::new("dan@example.com", "secret1"))
        .await
        .unwrap();
    first.preferences().set_subject(Subject::Html).await.unwrap();

    let second = AppServices::new_sqlite(url, Clock::fixed(fixed_now()), AppConfig::default())
        .await
        .unwrap();
    assert_eq!(second.auth().initialize().await.unwrap(), None);
    assert!(!second.auth().state().is_authenticated());
    assert_eq!(
        second.preferences().load().await.unwrap().subject,
        Some(Subject::Html)
    );

    let err = second
        .auth()
        .login(&Credentials::new("dan@example.com", "secret1"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
}
