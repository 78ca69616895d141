mod progress;
mod view;
mod workflow;

// Public API of the lesson session subsystem.
pub use crate::error::LessonFlowError;
pub use progress::SessionProgress;
pub use view::{FeedbackView, QuestionView};
pub use workflow::{ContinueResult, LessonFlowService};
