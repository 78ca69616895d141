use lingo_core::LessonSession;
use lingo_core::model::{Answer, QuestionKind};
use lingo_core::session::FeedbackKind;
use serde::Serialize;

/// Presentation-agnostic snapshot of the current question.
///
/// The answer key is never exposed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub lesson_title: String,
    pub prompt: String,
    pub kind: &'static str,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub typed_answer: Option<String>,
    pub feedback: Option<FeedbackView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub kind: FeedbackKind,
    pub explanation: Option<String>,
}

impl QuestionView {
    #[must_use]
    pub fn of(session: &LessonSession) -> Self {
        let question = session.current_question();
        let kind = match question.kind() {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::FillBlank { .. } => "fill-blank",
            QuestionKind::CodeSnippet { .. } => "code-snippet",
        };
        let (selected_option, typed_answer) = match session.selection() {
            Some(Answer::Choice(index)) => (Some(*index), None),
            Some(Answer::Text(text)) => (None, Some(text.clone())),
            None => (None, None),
        };

        Self {
            lesson_title: session.lesson().title().to_string(),
            prompt: question.prompt().to_string(),
            kind,
            options: question.kind().options().to_vec(),
            selected_option,
            typed_answer,
            feedback: session.feedback().map(|feedback| FeedbackView {
                kind: feedback.kind,
                explanation: feedback.explanation.clone(),
            }),
        }
    }
}
