mod ids;
pub(crate) mod lesson;
mod preferences;
mod progress;

pub use ids::{LessonId, ParseIdError, QuestionId, UnitId};
pub use lesson::{
    Answer, Lesson, LessonDraft, LessonError, Question, QuestionDraft, QuestionError,
    QuestionKind, QuestionKindCode,
};
pub use preferences::{Level, ParseCodeError, Preferences, Subject};
pub use progress::{CompletionRecord, ProgressRecord};
