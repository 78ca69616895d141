use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{LessonId, QuestionId, UnitId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson id cannot be empty")]
    EmptyId,

    #[error("lesson {0} has an empty title")]
    EmptyTitle(LessonId),

    #[error("lesson {0} must belong to a unit >= 1")]
    InvalidUnit(LessonId),

    #[error("lesson {0} has no questions")]
    NoQuestions(LessonId),

    #[error("lesson {lesson} repeats question id {question}")]
    DuplicateQuestion {
        lesson: LessonId,
        question: QuestionId,
    },

    #[error("question {question} in lesson {lesson}: {source}")]
    InvalidQuestion {
        lesson: LessonId,
        question: QuestionId,
        #[source]
        source: QuestionError,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("multiple-choice questions need at least two options")]
    TooFewOptions,

    #[error("correct option {index} is outside {len} options")]
    CorrectOutOfRange { index: usize, len: usize },

    #[error("multiple-choice question is missing its correct index")]
    MissingCorrectIndex,

    #[error("expected answer cannot be empty")]
    EmptyAnswer,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// What a question asks for and how it is graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String>, correct: usize },
    FillBlank { answer: String },
    CodeSnippet { answer: String },
}

impl QuestionKind {
    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::MultipleChoice { options, .. } => options,
            QuestionKind::FillBlank { .. } | QuestionKind::CodeSnippet { .. } => &[],
        }
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice { .. })
    }
}

/// A learner's pending answer to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    kind: QuestionKind,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Whether `answer` has the right shape for this question.
    ///
    /// Choices must index into the options of a multiple-choice question; text
    /// answers only apply to fill-blank and code-snippet questions.
    #[must_use]
    pub fn accepts(&self, answer: &Answer) -> bool {
        match (&self.kind, answer) {
            (QuestionKind::MultipleChoice { options, .. }, Answer::Choice(index)) => {
                *index < options.len()
            }
            (
                QuestionKind::FillBlank { .. } | QuestionKind::CodeSnippet { .. },
                Answer::Text(_),
            ) => true,
            _ => false,
        }
    }

    /// Grade an answer against the answer key.
    #[must_use]
    pub fn is_correct(&self, answer: &Answer) -> bool {
        match (&self.kind, answer) {
            (QuestionKind::MultipleChoice { correct, .. }, Answer::Choice(index)) => {
                index == correct
            }
            (
                QuestionKind::FillBlank { answer: expected }
                | QuestionKind::CodeSnippet { answer: expected },
                Answer::Text(given),
            ) => given.trim() == expected.trim(),
            _ => false,
        }
    }
}

/// Question kind as written in catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKindCode {
    MultipleChoice,
    FillBlank,
    CodeSnippet,
}

/// Unvalidated question as authored in catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub id: String,
    pub kind: QuestionKindCode,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: Option<usize>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank or the answer key does
    /// not fit the question kind.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let kind = match self.kind {
            QuestionKindCode::MultipleChoice => {
                if self.options.len() < 2 {
                    return Err(QuestionError::TooFewOptions);
                }
                let correct = self.correct.ok_or(QuestionError::MissingCorrectIndex)?;
                if correct >= self.options.len() {
                    return Err(QuestionError::CorrectOutOfRange {
                        index: correct,
                        len: self.options.len(),
                    });
                }
                QuestionKind::MultipleChoice {
                    options: self.options,
                    correct,
                }
            }
            QuestionKindCode::FillBlank => QuestionKind::FillBlank {
                answer: non_empty_answer(self.answer)?,
            },
            QuestionKindCode::CodeSnippet => QuestionKind::CodeSnippet {
                answer: non_empty_answer(self.answer)?,
            },
        };

        Ok(Question {
            id: QuestionId::new(self.id.trim()),
            prompt,
            kind,
            explanation: self
                .explanation
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        })
    }
}

fn non_empty_answer(answer: Option<String>) -> Result<String, QuestionError> {
    answer
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .ok_or(QuestionError::EmptyAnswer)
}

//
// ─── LESSONS ───────────────────────────────────────────────────────────────────
//

/// An immutable, catalog-defined lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    description: String,
    unit: UnitId,
    xp_reward: u32,
    questions: Vec<Question>,
}

impl Lesson {
    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    #[must_use]
    pub fn xp_reward(&self) -> u32 {
        self.xp_reward
    }

    /// Never empty.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// Unvalidated lesson as authored in catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LessonDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub unit: u32,
    pub xp_reward: u32,
    pub questions: Vec<QuestionDraft>,
}

impl LessonDraft {
    /// Validate the draft and all of its questions.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the id or title is blank, the unit is 0, there
    /// are no questions, question ids repeat, or any question is invalid.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(LessonError::EmptyId);
        }
        let id = LessonId::new(id);

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle(id));
        }
        if self.unit == 0 {
            return Err(LessonError::InvalidUnit(id));
        }
        if self.questions.is_empty() {
            return Err(LessonError::NoQuestions(id));
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        let mut questions = Vec::with_capacity(self.questions.len());
        for draft in self.questions {
            let question_id = QuestionId::new(draft.id.trim());
            let question = draft
                .validate()
                .map_err(|source| LessonError::InvalidQuestion {
                    lesson: id.clone(),
                    question: question_id.clone(),
                    source,
                })?;
            if !seen.insert(question_id.clone()) {
                return Err(LessonError::DuplicateQuestion {
                    lesson: id,
                    question: question_id,
                });
            }
            questions.push(question);
        }

        Ok(Lesson {
            id,
            title,
            description: self.description.trim().to_string(),
            unit: UnitId::new(self.unit),
            xp_reward: self.xp_reward,
            questions,
        })
    }
}
