//! Line-oriented screens over the app services.
//!
//! Each screen reads from the input, talks to the services and returns the
//! next `Route` (or `None` to quit). Every requested route goes through the
//! navigation guard first.

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use lingo_core::LessonSession;
use lingo_core::model::{Answer, LessonId, Level, Subject};
use services::auth::AuthState;
use services::navigation::{after_login, resolve};
use services::sessions::LessonFlowService;
use services::{
    AppServices, ContinueResult, Credentials, LessonFlowError, QuestionView, RecoveryAction,
    Route, SessionProgress, SignUpOutcome,
};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

pub struct Terminal<R, W> {
    services: AppServices,
    input: R,
    output: W,
    return_to: Option<Route>,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(services: AppServices, input: R, output: W) -> Self {
        Self {
            services,
            input,
            output,
            return_to: None,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }

    /// Drive screens until the learner quits or input ends.
    ///
    /// The guard reads a copy of the auth state kept current by a
    /// subscription that lives exactly as long as this call.
    pub async fn run(&mut self) -> AppResult<()> {
        let auth = self.services.auth();
        let cached = Arc::new(Mutex::new(AuthState::default()));
        let sink = Arc::clone(&cached);
        let subscription = auth.subscribe(move |state| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        });
        *cached.lock().unwrap_or_else(PoisonError::into_inner) = auth.state();

        let result = self.drive(&cached).await;
        auth.unsubscribe(subscription);
        result?;

        writeln!(self.output, "Bye!")?;
        Ok(())
    }

    async fn drive(&mut self, auth: &Mutex<AuthState>) -> AppResult<()> {
        let mut requested = Route::Loading;

        loop {
            let preferences = self.services.preferences().load().await?;
            let state = auth.lock().unwrap_or_else(PoisonError::into_inner).clone();
            let route = resolve(requested.clone(), &state, &preferences);
            if route == Route::Login && !requested.is_public() {
                self.return_to = Some(requested);
            }
            tracing::debug!(route = %route, "showing screen");

            let next = match &route {
                Route::Loading => self.restore_session().await?,
                Route::Login => self.login().await?,
                Route::SignUp => self.sign_up().await?,
                Route::SubjectSelection => self.choose_subject().await?,
                Route::LevelSelection => self.choose_level().await?,
                Route::Home => self.home().await?,
                Route::Lesson(id) => self.lesson(id).await?,
                Route::LessonSuccess { .. } | Route::LessonResult { .. } => {
                    self.lesson_end(&route)?
                }
            };

            match next {
                Some(next) => requested = next,
                None => return Ok(()),
            }
        }
    }

    async fn restore_session(&mut self) -> AppResult<Option<Route>> {
        if let Err(err) = self.services.auth().initialize().await {
            writeln!(self.output, "! could not restore session: {err}")?;
        }
        Ok(Some(Route::Home))
    }

    async fn login(&mut self) -> AppResult<Option<Route>> {
        writeln!(self.output, "\n== Log in ==  (type 'signup' to create an account)")?;
        let Some(email) = self.prompt("email")? else {
            return Ok(None);
        };
        if email.eq_ignore_ascii_case("signup") {
            return Ok(Some(Route::SignUp));
        }
        let Some(password) = self.prompt("password")? else {
            return Ok(None);
        };

        match self.services.auth().login(&Credentials::new(email, password)).await {
            Ok(session) => {
                writeln!(self.output, "Welcome back, {}!", session.display_name())?;
                Ok(Some(after_login(self.return_to.take())))
            }
            Err(err) => {
                self.report(&err.to_string(), err.recovery())?;
                Ok(Some(Route::Login))
            }
        }
    }

    async fn sign_up(&mut self) -> AppResult<Option<Route>> {
        writeln!(self.output, "\n== Sign up ==  (type 'login' to go back)")?;
        let Some(email) = self.prompt("email")? else {
            return Ok(None);
        };
        if email.eq_ignore_ascii_case("login") {
            return Ok(Some(Route::Login));
        }
        let Some(password) = self.prompt("password")? else {
            return Ok(None);
        };

        match self.services.auth().sign_up(&Credentials::new(email, password)).await {
            Ok(SignUpOutcome::Active(session)) => {
                writeln!(self.output, "Welcome, {}!", session.display_name())?;
                Ok(Some(after_login(self.return_to.take())))
            }
            Ok(SignUpOutcome::PendingConfirmation { email }) => {
                writeln!(self.output, "Check {email} to confirm your account, then log in.")?;
                Ok(Some(Route::Login))
            }
            Err(err) => {
                self.report(&err.to_string(), err.recovery())?;
                Ok(Some(Route::SignUp))
            }
        }
    }

    async fn choose_subject(&mut self) -> AppResult<Option<Route>> {
        writeln!(self.output, "\n== What do you want to learn? ==")?;
        for (index, subject) in Subject::ALL.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, subject.display_name())?;
        }
        let Some(input) = self.prompt("subject")? else {
            return Ok(None);
        };
        let Some(subject) = pick(&input, &Subject::ALL) else {
            writeln!(self.output, "Pick one of the listed subjects.")?;
            return Ok(Some(Route::SubjectSelection));
        };

        match self.services.preferences().set_subject(subject).await {
            Ok(_) => Ok(Some(Route::LevelSelection)),
            Err(err) => {
                self.report(&err.to_string(), RecoveryAction::Retry)?;
                Ok(Some(Route::SubjectSelection))
            }
        }
    }

    async fn choose_level(&mut self) -> AppResult<Option<Route>> {
        writeln!(self.output, "\n== Choose your level ==")?;
        for (index, level) in Level::ALL.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, level.display_name())?;
        }
        let Some(input) = self.prompt("level")? else {
            return Ok(None);
        };
        let Some(level) = pick(&input, &Level::ALL) else {
            writeln!(self.output, "Pick one of the listed levels.")?;
            return Ok(Some(Route::LevelSelection));
        };

        match self.services.preferences().set_level(level).await {
            Ok(_) => Ok(Some(Route::Home)),
            Err(err) => {
                self.report(&err.to_string(), RecoveryAction::Retry)?;
                Ok(Some(Route::LevelSelection))
            }
        }
    }

    async fn home(&mut self) -> AppResult<Option<Route>> {
        let overview_service = self.services.overview();
        let overview = match overview_service.overview().await {
            Ok(overview) => overview,
            Err(err) => {
                if !self.report(&err.to_string(), err.recovery())? {
                    return Ok(None);
                }
                let preferences = self.services.preferences().load().await?;
                return Ok(Some(err.recovery().target(&preferences).unwrap_or(Route::Home)));
            }
        };

        writeln!(
            self.output,
            "\n== {} · {} ==  XP: {}",
            overview.subject, overview.level, overview.total_xp
        )?;
        for unit in &overview.units {
            writeln!(self.output, "Unit {} [{:?}]", unit.unit, unit.status)?;
            for lesson in &unit.lessons {
                let mark = if lesson.completed { "x" } else { " " };
                writeln!(
                    self.output,
                    "  [{mark}] {}  {} (+{} XP)",
                    lesson.id, lesson.title, lesson.xp_reward
                )?;
            }
        }
        writeln!(
            self.output,
            "Type a lesson id, or: subject | level | profile | reset | logout | quit"
        )?;

        let Some(input) = self.prompt("home")? else {
            return Ok(None);
        };
        match input.as_str() {
            "quit" | "q" => Ok(None),
            "subject" => Ok(Some(Route::SubjectSelection)),
            "level" => Ok(Some(Route::LevelSelection)),
            "profile" => {
                self.show_profile().await?;
                Ok(Some(Route::Home))
            }
            "reset" => {
                if let Err(err) = self.services.progress().reset().await {
                    self.report(&err.to_string(), RecoveryAction::Retry)?;
                }
                Ok(Some(Route::Home))
            }
            "logout" => match self.services.auth().logout().await {
                Ok(()) => Ok(Some(Route::Login)),
                Err(err) => {
                    self.report(&err.to_string(), err.recovery())?;
                    Ok(Some(Route::Home))
                }
            },
            raw => {
                let Ok(lesson_id) = raw.parse::<LessonId>() else {
                    return Ok(Some(Route::Home));
                };
                let unit = overview
                    .units
                    .iter()
                    .find(|unit| unit.lessons.iter().any(|lesson| lesson.id == lesson_id))
                    .map(|unit| unit.unit);
                let Some(unit) = unit else {
                    writeln!(self.output, "No lesson '{lesson_id}' here.")?;
                    return Ok(Some(Route::Home));
                };
                match overview_service.open_unit(unit).await {
                    Ok(_) => Ok(Some(Route::Lesson(lesson_id))),
                    Err(err) => {
                        self.report(&err.to_string(), err.recovery())?;
                        Ok(Some(Route::Home))
                    }
                }
            }
        }
    }

    async fn show_profile(&mut self) -> AppResult<()> {
        let Some(session) = self.services.auth().current_session() else {
            return Ok(());
        };
        match self.services.progress().profile(&session).await {
            Ok(profile) => writeln!(
                self.output,
                "{} <{}>  {} XP",
                profile.name, profile.email, profile.total_xp
            )?,
            Err(err) => writeln!(self.output, "! {err}")?,
        }
        Ok(())
    }

    async fn lesson(&mut self, lesson_id: &LessonId) -> AppResult<Option<Route>> {
        let flow = self.services.lesson_flow();
        let mut session = match flow.start_lesson(lesson_id).await {
            Ok(session) => session,
            Err(err) => {
                if !self.report(&err.to_string(), err.recovery())? {
                    return Ok(None);
                }
                let preferences = self.services.preferences().load().await?;
                return Ok(Some(err.recovery().target(&preferences).unwrap_or(Route::Home)));
            }
        };

        loop {
            let progress = SessionProgress::of(&session);
            let view = QuestionView::of(&session);
            writeln!(
                self.output,
                "\n-- {} · question {}/{} · lives {} · {}% --",
                view.lesson_title, progress.question_number, progress.total, progress.lives, progress.percent
            )?;
            writeln!(self.output, "{}", view.prompt)?;
            for (index, option) in view.options.iter().enumerate() {
                writeln!(self.output, "  {}. {option}", index + 1)?;
            }

            let label = if view.options.is_empty() { "answer (s skip, q quit)" } else { "choice (s skip, q quit)" };
            let Some(input) = self.prompt(label)? else {
                return Ok(None);
            };
            match input.as_str() {
                "q" => {
                    let abandoned = session.abandon();
                    tracing::debug!(lesson_id = %abandoned, "lesson abandoned");
                    return Ok(Some(Route::Home));
                }
                "s" => {
                    if !session.skip()? {
                        writeln!(self.output, "The last question cannot be skipped.")?;
                    }
                    continue;
                }
                _ => {}
            }

            let answer = if view.options.is_empty() {
                Answer::Text(input)
            } else {
                match input.parse::<usize>() {
                    Ok(number) if number >= 1 => Answer::Choice(number - 1),
                    _ => {
                        writeln!(self.output, "Enter an option number.")?;
                        continue;
                    }
                }
            };
            if let Err(err) = session.select_answer(answer) {
                writeln!(self.output, "! {err}")?;
                continue;
            }

            let checked = session.check()?;
            let feedback = QuestionView::of(&session).feedback;
            writeln!(self.output, "{}", if checked.correct { "Correct!" } else { "Not quite." })?;
            if let Some(explanation) = feedback.and_then(|feedback| feedback.explanation) {
                writeln!(self.output, "{explanation}")?;
            }
            if checked.out_of_lives {
                writeln!(self.output, "Out of lives! This attempt is over.")?;
                session.abandon();
                return Ok(self.prompt("enter")?.map(|_| Route::Home));
            }
            if self.prompt("enter to continue")?.is_none() {
                return Ok(None);
            }

            match flow.continue_lesson(&mut session).await {
                Ok(ContinueResult {
                    route: Route::Lesson(_),
                    ..
                }) => {}
                Ok(result) => {
                    if result.completion.is_some_and(|record| !record.newly_completed) {
                        writeln!(self.output, "Already completed: no extra XP this time.")?;
                    }
                    return Ok(Some(result.route));
                }
                Err(err) => return self.save_with_retry(&flow, &session, err).await,
            }
        }
    }

    async fn save_with_retry(
        &mut self,
        flow: &Arc<LessonFlowService>,
        session: &LessonSession,
        mut err: LessonFlowError,
    ) -> AppResult<Option<Route>> {
        loop {
            if err.recovery() != RecoveryAction::Retry {
                self.report(&err.to_string(), err.recovery())?;
                return Ok(Some(Route::Home));
            }
            let Some(input) = self.prompt(&format!("! {err}. Retry? [Y/n]"))? else {
                return Ok(None);
            };
            if input.eq_ignore_ascii_case("n") {
                return Ok(Some(Route::Home));
            }
            match flow.finalize_completion(session).await {
                Ok(_) => {
                    return Ok(Some(
                        session.outcome().map_or(Route::Home, Route::from_outcome),
                    ));
                }
                Err(next) => err = next,
            }
        }
    }

    fn lesson_end(&mut self, route: &Route) -> AppResult<Option<Route>> {
        match route {
            Route::LessonSuccess {
                xp_earned,
                accuracy,
            } => writeln!(
                self.output,
                "\n** Lesson complete! +{xp_earned} XP · accuracy {accuracy}% **"
            )?,
            Route::LessonResult {
                correct,
                wrong,
                total,
                ..
            } => writeln!(
                self.output,
                "\n** {correct} of {total} correct, {wrong} wrong. Keep practicing! **"
            )?,
            _ => {}
        }

        let Some(action) = route.recovery() else {
            return Ok(Some(Route::Home));
        };
        let Some(input) = self.prompt(&format!("{} [enter] or 'home'", action.label()))? else {
            return Ok(None);
        };
        if input.eq_ignore_ascii_case("home") {
            return Ok(Some(Route::Home));
        }
        Ok(Some(route.retry_target().unwrap_or(Route::Home)))
    }

    /// Show an error with its recovery action. Returns false on end of input.
    fn report(&mut self, message: &str, action: RecoveryAction) -> AppResult<bool> {
        writeln!(self.output, "! {message}")?;
        Ok(self.prompt(&format!("[{}]", action.label()))?.is_some())
    }

    fn prompt(&mut self, label: &str) -> AppResult<Option<String>> {
        write!(self.output, "{label}> ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// A 1-based menu number or the item's code.
fn pick<T: Copy + FromStr>(input: &str, items: &[T]) -> Option<T> {
    input
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| items.get(index).copied())
        .or_else(|| input.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::time::fixed_now;
    use services::auth::LocalAuthProvider;
    use services::{AppConfig, Clock};
    use std::io::Cursor;

    fn app_services() -> AppServices {
        AppServices::in_memory(
            Clock::fixed(fixed_now()),
            AppConfig::default(),
            Arc::new(LocalAuthProvider::new()),
        )
        .unwrap()
    }

    async fn run_script(services: AppServices, lines: &[&str]) -> String {
        let input = Cursor::new(lines.join("\n") + "\n");
        let mut terminal = Terminal::new(services, input, Vec::new());
        terminal.run().await.unwrap();
        String::from_utf8(terminal.into_output()).unwrap()
    }

    #[test]
    fn pick_accepts_number_or_code() {
        assert_eq!(pick("2", &Subject::ALL), Some(Subject::Css));
        assert_eq!(pick("javascript", &Subject::ALL), Some(Subject::Javascript));
        assert_eq!(pick("0", &Level::ALL), None);
        assert_eq!(pick("9", &Level::ALL), None);
    }

    #[tokio::test]
    async fn sign_up_setup_and_finish_a_lesson() {
        let app = app_services();
        let output = run_script(
            app.clone(),
            &[
                "signup",
                "ana@example.com",
                "secret1",
                "1",
                "1",
                "html-beginner-1",
                "1",
                "",
                "1",
                "",
                "",
                "quit",
            ],
        )
        .await;

        assert!(output.contains("Welcome, ana!"));
        assert!(output.contains("+10 XP · accuracy 100%"));
        assert!(output.ends_with("Bye!\n"));
        assert_eq!(app.progress().load().await.unwrap().total_xp(), 10);
    }

    #[tokio::test]
    async fn locked_unit_is_refused() {
        let app = app_services();
        let output = run_script(
            app,
            &[
                "signup",
                "bo@example.com",
                "secret1",
                "html",
                "beginner",
                "html-beginner-2",
                "",
                "quit",
            ],
        )
        .await;
        assert!(output.contains("unit 2 is locked"));
    }

    #[tokio::test]
    async fn end_of_input_quits() {
        let output = run_script(app_services(), &[]).await;
        assert!(output.contains("== Log in =="));
        assert!(output.ends_with("Bye!\n"));
    }

    #[tokio::test]
    async fn guard_follows_published_auth_changes() {
        let app = app_services();
        let output = run_script(
            app.clone(),
            &[
                "signup",
                "cy@example.com",
                "secret1",
                "css",
                "beginner",
                "logout",
                "cy@example.com",
                "secret1",
                "quit",
            ],
        )
        .await;

        assert_eq!(output.matches("== Log in ==").count(), 2);
        assert!(output.contains("Welcome back, cy!"));
        assert!(output.ends_with("Bye!\n"));
        assert_eq!(app.auth().subscriber_count(), 0);
        assert!(app.auth().state().is_authenticated());
    }
}
