use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} code: {raw}")]
pub struct ParseCodeError {
    kind: &'static str,
    raw: String,
}

impl ParseCodeError {
    pub(crate) fn new(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
        }
    }
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// The language a learner studies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Html,
    Css,
    Javascript,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Html, Subject::Css, Subject::Javascript];

    /// Stable storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Subject::Html => "html",
            Subject::Css => "css",
            Subject::Javascript => "javascript",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Html => "HTML",
            Subject::Css => "CSS",
            Subject::Javascript => "JavaScript",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Subject {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseCodeError::new("subject", s))
    }
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// Proficiency level within a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    /// Stable storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Level {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseCodeError::new("level", s))
    }
}

//
// ─── PREFERENCES ───────────────────────────────────────────────────────────────
//

/// The learner's subject and level choice.
///
/// Starts empty on first run. Setup is complete once both fields are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub subject: Option<Subject>,
    pub level: Option<Level>,
}

impl Preferences {
    #[must_use]
    pub fn new(subject: Option<Subject>, level: Option<Level>) -> Self {
        Self { subject, level }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.subject.is_some() && self.level.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.level.is_none()
    }

    /// Both selections, when setup is complete.
    #[must_use]
    pub fn selection(&self) -> Option<(Subject, Level)> {
        Some((self.subject?, self.level?))
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }
}
